use std::path::PathBuf;
use thiserror::Error;

// 出力ディレクトリ操作のエラー型を定義
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("無効なパスです: {0}")]
    InvalidPath(String),

    #[error("I/Oエラー ({path}): {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("ディレクトリの走査に失敗しました: {0}")]
    Walk(#[from] walkdir::Error),
}

impl WorkspaceError {
    /// パス付きの I/O エラーを組み立てるヘルパー。
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        WorkspaceError::Io {
            path: path.into(),
            source,
        }
    }
}
