//! 実行設定と既定値を定義するモジュール。
//!
//! CLI 層はここで定義された `RunConfig` を組み立て、パイプラインはそれだけを参照する。

use crate::domain::converter::Converter;
use std::path::{Path, PathBuf};

// --- 既定値 ---

/// 引数が一つも指定されなかった場合に外部プログラムへ渡す値。
pub const DEFAULT_ARGUMENT: &str = "34";
/// プロジェクトルートからの出力ディレクトリ。
pub const DEFAULT_OUTPUT_DIR: &str = "data";
/// 出力ディレクトリ内のログファイル名。
pub const DEFAULT_LOG_FILE: &str = "wave.log";
/// 外部プログラムの起動コマンド。
pub const DEFAULT_LAUNCHER: &[&str] = &["cargo", "run", "--release", "--"];
pub const WAVE_SUBCOMMAND: &str = "wave";
pub const EXPORT_FLAG: &str = "--export-dir";
/// 外部プログラムに渡す `RUST_LOG` の既定値。
pub const DEFAULT_CHILD_LOG_LEVEL: &str = "info";
/// 削除・変換の対象となる中間画像の拡張子（小文字）。
pub const INTERMEDIATE_EXTENSIONS: &[&str] = &["pgm", "pnm"];
pub const CONVERTED_EXTENSION: &str = "png";

/// 1回の実行に必要な設定一式。
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// 外部プログラムの作業ディレクトリ。
    pub project_root: PathBuf,
    pub output_dir: PathBuf,
    pub log_file: PathBuf,
    pub launcher: Vec<String>,
    pub subcommand: String,
    pub export_flag: String,
    /// 外部プログラムへそのまま渡す引数。空なら `DEFAULT_ARGUMENT` に置き換わる。
    pub args: Vec<String>,
    pub child_log_level: String,
    /// `Some` の場合のみ、最新の中間画像をPNGに変換する。
    pub converter: Option<Converter>,
}

impl RunConfig {
    /// プロジェクトルートを基準に、すべて既定値の設定を作成します。
    pub fn new<P: Into<PathBuf>>(project_root: P) -> Self {
        let project_root = project_root.into();
        let output_dir = project_root.join(DEFAULT_OUTPUT_DIR);
        let log_file = output_dir.join(DEFAULT_LOG_FILE);
        Self {
            project_root,
            output_dir,
            log_file,
            launcher: DEFAULT_LAUNCHER.iter().map(|s| s.to_string()).collect(),
            subcommand: WAVE_SUBCOMMAND.to_string(),
            export_flag: EXPORT_FLAG.to_string(),
            args: Vec::new(),
            child_log_level: DEFAULT_CHILD_LOG_LEVEL.to_string(),
            converter: None,
        }
    }

    /// 出力ディレクトリを変更します。相対パスはプロジェクトルート基準で解釈し、
    /// ログファイルは同じファイル名のまま新しいディレクトリへ移します。
    pub fn set_output_dir<P: AsRef<Path>>(&mut self, dir: P) {
        let log_name = self
            .log_file
            .file_name()
            .map(|s| s.to_os_string())
            .unwrap_or_else(|| DEFAULT_LOG_FILE.into());
        self.output_dir = self.project_root.join(dir);
        self.log_file = self.output_dir.join(log_name);
    }

    /// ログファイル名を変更します。常に出力ディレクトリ内に置かれます。
    pub fn set_log_file_name<S: AsRef<Path>>(&mut self, name: S) {
        self.log_file = self.output_dir.join(name);
    }

    /// 実際に外部プログラムへ渡す引数。
    pub fn effective_args(&self) -> Vec<String> {
        if self.args.is_empty() {
            vec![DEFAULT_ARGUMENT.to_string()]
        } else {
            self.args.clone()
        }
    }

    /// 外部プログラムの実行中だけ設定する環境変数。
    pub fn child_env(&self) -> Vec<(String, String)> {
        vec![
            ("RUST_LOG".to_string(), self.child_log_level.clone()),
            ("RUST_BACKTRACE".to_string(), "1".to_string()),
        ]
    }
}

/// `start` から親方向へたどり、最初に `Cargo.toml` を持つディレクトリを返します。
/// 見つからない場合は `start` 自体を返します。
pub fn discover_project_root(start: &Path) -> PathBuf {
    start
        .ancestors()
        .find(|dir| dir.join("Cargo.toml").is_file())
        .unwrap_or(start)
        .to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn defaults_live_under_project_root() {
        let config = RunConfig::new("/srv/project");
        assert_eq!(config.output_dir, PathBuf::from("/srv/project/data"));
        assert_eq!(config.log_file, PathBuf::from("/srv/project/data/wave.log"));
        assert_eq!(config.launcher, vec!["cargo", "run", "--release", "--"]);
        assert!(config.converter.is_none());
    }

    #[test]
    fn empty_args_fall_back_to_default() {
        let config = RunConfig::new("/p");
        assert_eq!(config.effective_args(), vec!["34"]);
    }

    #[test]
    fn given_args_are_kept_in_order() {
        let mut config = RunConfig::new("/p");
        config.args = vec!["12".into(), "-3".into(), "--fast".into()];
        assert_eq!(config.effective_args(), vec!["12", "-3", "--fast"]);
    }

    #[test]
    fn child_env_sets_log_level_and_backtrace() {
        let mut config = RunConfig::new("/p");
        config.child_log_level = "debug".into();
        assert_eq!(
            config.child_env(),
            vec![
                ("RUST_LOG".to_string(), "debug".to_string()),
                ("RUST_BACKTRACE".to_string(), "1".to_string()),
            ]
        );
    }

    #[test]
    fn output_dir_override_moves_log_file() {
        let mut config = RunConfig::new("/p");
        config.set_log_file_name("run.log");
        config.set_output_dir("out/images");
        assert_eq!(config.output_dir, PathBuf::from("/p/out/images"));
        assert_eq!(config.log_file, PathBuf::from("/p/out/images/run.log"));

        config.set_output_dir("/abs");
        assert_eq!(config.log_file, PathBuf::from("/abs/run.log"));
    }

    #[test]
    fn discover_finds_nearest_cargo_toml() {
        let dir = tempdir().expect("Failed to create temp directory");
        let root = dir.path().join("project");
        let nested = root.join("scripts").join("wave");
        fs::create_dir_all(&nested).unwrap();
        fs::write(root.join("Cargo.toml"), "[package]\n").unwrap();

        assert_eq!(discover_project_root(&nested), root);
    }

    #[test]
    fn discover_without_manifest_returns_start() {
        let dir = tempdir().expect("Failed to create temp directory");
        assert!(
            dir.path().ancestors().all(|d| !d.join("Cargo.toml").is_file()),
            "一時ディレクトリの親に Cargo.toml があるとこのテストは成り立ちません"
        );
        let start = dir.path().join("a");
        fs::create_dir_all(&start).unwrap();

        assert_eq!(discover_project_root(&start), start);
    }
}
