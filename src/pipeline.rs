//! 1回の実行の流れを定義するモジュール。
//!
//! 出力ディレクトリの準備、外部プログラムの実行、（有効なら）最新の中間画像の変換を
//! この順に行う。どの段階でも失敗した時点で以降の処理は行わない。

use crate::config::{RunConfig, DEFAULT_ARGUMENT};
use crate::domain::converter::Converter;
use crate::domain::intermediate::{select_latest, IntermediateImage};
use crate::domain::invocation::ProgramInvocation;
use crate::domain::workspace::OutputDir;
use crate::error::AppError;
use crate::tee::{run_teed, TeeError, TeeLog};
use log::{debug, info};
use std::io::Write;
use std::path::PathBuf;

/// 実行結果の概要。
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    /// 外部プログラムへ実際に渡した引数。
    pub args: Vec<String>,
    /// 実行前に削除した中間画像。
    pub removed: Vec<PathBuf>,
    /// 変換を行った場合の (変換元, 変換先)。
    pub converted: Option<(PathBuf, PathBuf)>,
}

/// 出力ディレクトリを用意し、ログファイルを作成（切り詰め）します。
///
/// ログはパイプライン全体の出力を受け取るため、`execute` より前に開いておく。
pub fn open_log(config: &RunConfig) -> Result<TeeLog, AppError> {
    OutputDir::ensure(&config.output_dir)?;
    Ok(TeeLog::create(&config.log_file)?)
}

/// パイプラインを実行します。
///
/// # 引数
/// * `config`: 実行設定。
/// * `log`: 子プロセスの出力を記録するログ（`open_log` で作成したもの）。
/// * `terminal`: 端末側の出力先を作る関数。通常は `std::io::stdout`。
///
/// # 戻り値
/// * `Ok(Outcome)`: すべての段階が成功した場合。
/// * `Err(AppError)`: 最初に失敗した段階のエラー。
pub fn execute<W, F>(config: &RunConfig, log: &TeeLog, terminal: F) -> Result<Outcome, AppError>
where
    W: Write + Send + 'static,
    F: Fn() -> W,
{
    // 1. 引数の既定値
    if config.args.is_empty() {
        info!(
            "引数が指定されていないため既定値 {} を使用します",
            DEFAULT_ARGUMENT
        );
    }
    let args = config.effective_args();

    // 2. 出力ディレクトリの準備と古い中間画像の削除
    let output_dir = OutputDir::ensure(&config.output_dir)?;
    let removed = output_dir.clean_intermediates()?;
    for path in &removed {
        debug!("削除しました: {}", path.display());
    }

    // 3. 診断用の一覧
    info!("{} の内容:", output_dir);
    for line in output_dir.listing()? {
        info!("  {}", line);
    }

    // 4. 外部プログラムの実行
    let invocation = ProgramInvocation::from_config(config, output_dir.as_path());
    info!("実行: {}", invocation.argv().join(" "));
    debug!("子プロセスの環境変数: {:?}", invocation.env());
    let status = run_teed(invocation.command(), log, terminal()).map_err(|e| match e {
        TeeError::Spawn(source) => AppError::ProgramSpawn {
            program: invocation.program().to_string(),
            source,
        },
        TeeError::Relay(source) => AppError::Io(source),
    })?;
    if !status.success() {
        return Err(AppError::ProgramFailed { status });
    }

    // 5. 最新の中間画像の変換
    let converted = match &config.converter {
        Some(converter) => Some(convert_latest(converter, &output_dir, log, terminal())?),
        None => None,
    };

    Ok(Outcome {
        args,
        removed,
        converted,
    })
}

/// 数値キーが最大の中間画像を選んで変換する。候補がなければエラー。
fn convert_latest<W: Write + Send + 'static>(
    converter: &Converter,
    output_dir: &OutputDir,
    log: &TeeLog,
    terminal: W,
) -> Result<(PathBuf, PathBuf), AppError> {
    let names = output_dir.file_names()?;
    let source = select_latest(&names)
        .and_then(IntermediateImage::parse)
        .ok_or_else(|| AppError::NoIntermediateImage(output_dir.as_path().to_path_buf()))?;
    debug!("変換対象: {} (キー {})", source.file_name(), source.key());

    let destination = converter.convert(output_dir, &source, log, terminal)?;
    Ok((output_dir.join(source.file_name()), destination))
}
