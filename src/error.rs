use crate::domain::workspace::WorkspaceError;
use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("I/Oエラーが発生しました: {0}")]
    Io(#[from] std::io::Error),

    #[error("出力ディレクトリのエラー: {0}")]
    Workspace(#[from] WorkspaceError),

    #[error("外部プログラム '{program}' を起動できませんでした: {source}")]
    ProgramSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("外部プログラムが異常終了しました ({})", describe_status(.status))]
    ProgramFailed { status: ExitStatus },

    #[error("変換対象の中間画像が見つかりませんでした: {}", .0.display())]
    NoIntermediateImage(PathBuf),

    #[error("変換ツール '{program}' を起動できませんでした: {source}")]
    ConversionSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("変換ツールが異常終了しました ({})", describe_status(.status))]
    ConversionFailed { status: ExitStatus },

    #[error("画像変換エラー: {0}")]
    Image(#[from] image::ImageError),
}

impl AppError {
    /// プロセスの終了コード。失敗した子プロセスの終了コードをそのまま引き継ぐ。
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::ProgramFailed { status } | AppError::ConversionFailed { status } => {
                status_code(*status)
            }
            AppError::ProgramSpawn { .. } | AppError::ConversionSpawn { .. } => 127,
            _ => 1,
        }
    }
}

/// シェルと同じ規則で終了状態を数値にする（シグナル終了は 128 + シグナル番号）。
fn status_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}

fn describe_status(status: &ExitStatus) -> String {
    match status.code() {
        Some(code) => format!("終了コード {}", code),
        None => format!("終了コード {} 相当", status_code(*status)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    fn status(raw: i32) -> ExitStatus {
        use std::os::unix::process::ExitStatusExt;
        ExitStatus::from_raw(raw)
    }

    #[cfg(unix)]
    #[test]
    fn program_failure_keeps_child_exit_code() {
        // wait(2) の生の値では終了コードは上位バイトに入る
        let err = AppError::ProgramFailed { status: status(3 << 8) };
        assert_eq!(err.exit_code(), 3);
        assert!(err.to_string().contains("終了コード 3"));
    }

    #[cfg(unix)]
    #[test]
    fn signal_termination_maps_to_128_plus_signal() {
        let err = AppError::ConversionFailed { status: status(9) };
        assert_eq!(err.exit_code(), 137);
    }

    #[test]
    fn missing_intermediate_is_a_generic_failure() {
        let err = AppError::NoIntermediateImage(PathBuf::from("data"));
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().contains("data"));
    }

    #[test]
    fn spawn_failure_uses_command_not_found_code() {
        let err = AppError::ProgramSpawn {
            program: "cargo".into(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert_eq!(err.exit_code(), 127);
    }
}
