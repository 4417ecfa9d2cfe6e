use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use wave_runner::config::DEFAULT_CHILD_LOG_LEVEL;
use wave_runner::domain::converter::{
    DEFAULT_CONTAINER_ENGINE, DEFAULT_CONVERTER_IMAGE, DEFAULT_CONVERTER_TOOL,
};

/// 外部の wave プログラムを実行し、出力をログに残し、最新の中間画像をPNGに変換するツール
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// 外部プログラムへそのまま渡す引数 (省略時は 34)
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,

    /// 実行後、数値キーが最大の中間画像をPNGに変換する
    #[arg(long, env = "WAVE_RUNNER_CONVERT")]
    pub convert: bool,

    /// プロジェクトルート (オプション: デフォルトは Cargo.toml を持つ最も近い親ディレクトリ)
    #[arg(long, env = "WAVE_RUNNER_PROJECT_ROOT")]
    pub project_root: Option<PathBuf>,

    /// 出力先フォルダのパス (オプション: デフォルトは <プロジェクトルート>/data)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// 出力先フォルダ内のログファイル名 (オプション: デフォルトは wave.log)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// 外部プログラムの起動コマンド (空白区切り。デフォルトは "cargo run --release --")
    #[arg(long)]
    pub program: Option<String>,

    /// 変換方法
    #[arg(long, value_enum, default_value_t = ConverterKind::Container)]
    pub converter: ConverterKind,

    /// コンテナの実行エンジン
    #[arg(long, default_value = DEFAULT_CONTAINER_ENGINE)]
    pub container_engine: String,

    /// 変換ツールを含むコンテナイメージ
    #[arg(long, default_value = DEFAULT_CONVERTER_IMAGE)]
    pub converter_image: String,

    /// コンテナ内で実行する変換ツール
    #[arg(long, default_value = DEFAULT_CONVERTER_TOOL)]
    pub converter_tool: String,

    /// --converter local のときに実行するコマンド (空白区切り)
    #[arg(long, default_value = DEFAULT_CONVERTER_TOOL)]
    pub local_converter: String,

    /// 外部プログラムに渡す RUST_LOG の値
    #[arg(long, default_value = DEFAULT_CHILD_LOG_LEVEL)]
    pub child_log_level: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ConverterKind {
    /// コンテナ内の変換ツールを使う
    Container,
    /// ローカルの変換コマンドを使う
    Local,
    /// 組み込みの変換を使う
    Builtin,
}
