mod cli;
mod workflow;

use clap::Parser;

fn main() {
    // コマンドライン引数を解析します
    let args = cli::Args::parse();
    std::process::exit(workflow::run(args));
}
