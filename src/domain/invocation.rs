use crate::config::RunConfig;
use std::path::{Path, PathBuf};
use std::process::Command;

/// 外部の wave プログラムの呼び出し内容。
///
/// 起動コマンド・サブコマンド・引数・出力先フラグを決まった順序で並べ、
/// 環境変数はこの子プロセスにだけ設定する。
#[derive(Debug, Clone, PartialEq)]
pub struct ProgramInvocation {
    launcher: Vec<String>,
    subcommand: String,
    args: Vec<String>,
    export_flag: String,
    output_dir: PathBuf,
    env: Vec<(String, String)>,
    working_dir: PathBuf,
}

impl ProgramInvocation {
    /// 設定から呼び出し内容を組み立てます。引数が空なら既定値が入ります。
    pub fn from_config(config: &RunConfig, output_dir: &Path) -> Self {
        Self {
            launcher: config.launcher.clone(),
            subcommand: config.subcommand.clone(),
            args: config.effective_args(),
            export_flag: config.export_flag.clone(),
            output_dir: output_dir.to_path_buf(),
            env: config.child_env(),
            working_dir: config.project_root.clone(),
        }
    }

    /// 実行されるプログラム名（起動コマンドの先頭）。
    pub fn program(&self) -> &str {
        self.launcher
            .first()
            .map(String::as_str)
            .unwrap_or(self.subcommand.as_str())
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn env(&self) -> &[(String, String)] {
        &self.env
    }

    /// 実行されるコマンドライン全体。ログ表示とテスト用。
    pub fn argv(&self) -> Vec<String> {
        let mut argv = self.launcher.clone();
        argv.push(self.subcommand.clone());
        argv.extend(self.args.iter().cloned());
        argv.push(self.export_flag.clone());
        argv.push(self.output_dir.display().to_string());
        argv
    }

    /// `std::process::Command` を組み立てます。
    pub fn command(&self) -> Command {
        let argv = self.argv();
        let mut command = Command::new(&argv[0]);
        command.args(&argv[1..]).current_dir(&self.working_dir);
        for (key, value) in &self.env {
            command.env(key, value);
        }
        command
    }
}
