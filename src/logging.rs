use crate::tee::TeeLog;
use env_logger::{Env, Target, WriteStyle};
use log::SetLoggerError;
use std::io;

/// `env_logger` を初期化し、診断メッセージを標準エラーとログファイルの両方へ出力します。
///
/// フィルタは `RUST_LOG` で上書きでき、未指定なら `info`。
/// 2回目以降の呼び出しは `Err` を返し、最初の設定がそのまま使われます。
pub fn init(log: &TeeLog) -> Result<(), SetLoggerError> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .write_style(WriteStyle::Never)
        .target(Target::Pipe(Box::new(log.writer(io::stderr()))))
        .try_init()
}
