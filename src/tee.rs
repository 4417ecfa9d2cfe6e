//! 端末とログファイルへ同じバイト列を書き出す仕組み。
//!
//! 子プロセスの標準出力・標準エラーは1本のパイプにまとめて読み出すため、
//! 端末とログファイルには到着した順序のまま記録される。

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// 子プロセスを中継付きで実行した際のエラー。
#[derive(Debug, Error)]
pub enum TeeError {
    #[error("プロセスを起動できませんでした: {0}")]
    Spawn(#[source] io::Error),

    #[error("出力の中継に失敗しました: {0}")]
    Relay(#[source] io::Error),
}

/// 1回の実行ぶんの出力を記録するログファイル。
///
/// 複製しても同じファイルを共有する。ロガーと子プロセスの中継が同じファイルに書くため、
/// 書き込みは `Mutex` で直列化している。
#[derive(Debug, Clone)]
pub struct TeeLog {
    path: PathBuf,
    file: Arc<Mutex<File>>,
}

impl TeeLog {
    /// ログファイルを作成します。既存のファイルは切り詰められます。
    pub fn create<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref();
        let file = File::create(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            file: Arc::new(Mutex::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `terminal` とログファイルの両方へ書き込む `Write` を返します。
    pub fn writer<W: Write + Send + 'static>(&self, terminal: W) -> TeeWriter {
        TeeWriter {
            terminal: Box::new(terminal),
            file: Arc::clone(&self.file),
        }
    }
}

/// 端末側とログファイル側へ同じ内容を書き込むライター。
pub struct TeeWriter {
    terminal: Box<dyn Write + Send>,
    file: Arc<Mutex<File>>,
}

impl TeeWriter {
    fn with_file<T>(&self, f: impl FnOnce(&mut File) -> io::Result<T>) -> io::Result<T> {
        let mut file = self
            .file
            .lock()
            .map_err(|_| io::Error::other("ログファイルのロックを取得できませんでした"))?;
        f(&mut *file)
    }
}

impl Write for TeeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.terminal.write_all(buf)?;
        self.with_file(|file| file.write_all(buf))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.terminal.flush()?;
        self.with_file(|file| file.flush())
    }
}

/// 子プロセスを実行し、標準出力と標準エラーを `terminal` とログの両方へ流します。
///
/// 子プロセスが終了するまで戻りません。終了コードの判定は呼び出し側で行います。
pub fn run_teed<W: Write + Send + 'static>(
    command: Command,
    log: &TeeLog,
    terminal: W,
) -> Result<ExitStatus, TeeError> {
    run_through_pipe(command, log, terminal, None)
}

/// `run_teed` と同様だが、子プロセスの標準出力は `stdout_file` に書き出し、
/// 標準エラーだけを中継します。変換ツールの出力をファイルへリダイレクトする用途。
pub fn run_teed_to<W: Write + Send + 'static>(
    command: Command,
    log: &TeeLog,
    terminal: W,
    stdout_file: File,
) -> Result<ExitStatus, TeeError> {
    run_through_pipe(command, log, terminal, Some(stdout_file))
}

fn run_through_pipe<W: Write + Send + 'static>(
    mut command: Command,
    log: &TeeLog,
    terminal: W,
    stdout_file: Option<File>,
) -> Result<ExitStatus, TeeError> {
    let (mut reader, writer) = io::pipe().map_err(TeeError::Spawn)?;
    match stdout_file {
        Some(file) => {
            command.stdout(file);
        }
        None => {
            command.stdout(writer.try_clone().map_err(TeeError::Spawn)?);
        }
    }
    command.stderr(writer);

    let mut child = command.spawn().map_err(TeeError::Spawn)?;
    // Command が書き込み側を保持したままだと EOF が届かない
    drop(command);

    let mut out = log.writer(terminal);
    if let Err(e) = io::copy(&mut reader, &mut out).and_then(|_| out.flush()) {
        // 読み手を閉じてから待つ。閉じないと子プロセスがパイプ書き込みで止まる
        drop(reader);
        let _ = child.wait();
        return Err(TeeError::Relay(e));
    }

    child.wait().map_err(TeeError::Relay)
}
