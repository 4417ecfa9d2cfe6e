//! アプリケーションのメインワークフローを定義するモジュール。
//!
//! UI層（`cli`）の引数を実行設定に変換し、ロガーを準備してからパイプラインを実行します。

use crate::cli::{Args, ConverterKind};
use log::info;
use std::io::{self, Write};
use wave_runner::config::{discover_project_root, RunConfig};
use wave_runner::domain::converter::Converter;
use wave_runner::error::AppError;
use wave_runner::{logging, pipeline};

// --- public な main 関数 ---

/// アプリケーションを実行し、プロセスの終了コードを返します。
///
/// ログファイルを開いた後のエラーは、端末とログファイルの両方に出力されます。
pub fn run(args: Args) -> i32 {
    // 1. 実行設定の組み立て
    let config = match build_config(args) {
        Ok(config) => config,
        Err(e) => return report_without_log(&e),
    };

    // 2. 出力ディレクトリとログファイルの準備
    let log = match pipeline::open_log(&config) {
        Ok(log) => log,
        Err(e) => return report_without_log(&e),
    };
    if let Err(e) = logging::init(&log) {
        eprintln!("[警告] ロガーを初期化できませんでした: {}", e);
    }
    info!("ログファイル: {}", log.path().display());

    // 3. パイプラインの実行
    match pipeline::execute(&config, &log, io::stdout) {
        Ok(outcome) => {
            match outcome.converted {
                Some((_, destination)) => info!("完了しました: {}", destination.display()),
                None => info!("完了しました"),
            }
            0
        }
        Err(e) => {
            // ロガーのフィルタに関係なく必ずログファイルへ残す
            let mut out = log.writer(io::stderr());
            let _ = writeln!(out, "[エラー] {}", e);
            e.exit_code()
        }
    }
}

// --- private なヘルパー関数 ---

/// CLI 引数から実行設定を作ります。
///
/// 外部プログラムはプロジェクトルートで実行されるため、ルートは絶対パスにしておく。
fn build_config(args: Args) -> Result<RunConfig, AppError> {
    let project_root = match args.project_root {
        Some(root) => std::path::absolute(root)?,
        None => discover_project_root(&std::env::current_dir()?),
    };

    let mut config = RunConfig::new(project_root);
    // ファイル名を先に決めておくと、出力先の変更時にそのまま引き継がれる
    if let Some(name) = &args.log_file {
        config.set_log_file_name(name);
    }
    if let Some(dir) = &args.output_dir {
        config.set_output_dir(dir);
    }
    if let Some(program) = &args.program {
        config.launcher = split_words(program);
    }
    config.args = args.args;
    config.child_log_level = args.child_log_level;

    if args.convert {
        config.converter = Some(match args.converter {
            ConverterKind::Container => Converter::Container {
                engine: args.container_engine,
                image: args.converter_image,
                tool: args.converter_tool,
            },
            ConverterKind::Local => Converter::local(split_words(&args.local_converter)),
            ConverterKind::Builtin => Converter::Builtin,
        });
    }

    Ok(config)
}

fn split_words(s: &str) -> Vec<String> {
    s.split_whitespace().map(str::to_string).collect()
}

fn report_without_log(e: &AppError) -> i32 {
    eprintln!("[エラー] {}", e);
    e.exit_code()
}
