use super::workspace_error::WorkspaceError;
use crate::domain::intermediate::is_intermediate;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 外部プログラムの出力先ディレクトリ。
///
/// `ensure` を通じてのみ生成され、その時点でディレクトリが存在することが保証される。
/// 中間画像の削除は行うが、ディレクトリ自体を削除することはない。
#[derive(Debug, Clone)]
pub struct OutputDir {
    path: PathBuf,
}

impl OutputDir {
    // --- Public Methods ---

    /// ディレクトリを（必要であれば）作成し、`OutputDir` を返す。
    ///
    /// 既に存在する場合は何もしないので、繰り返し呼び出してもエラーにならない。
    /// 同名のファイルが存在する場合は `InvalidPath` を返す。
    /// 相対パスは現在のディレクトリを基準に絶対パスへ変換して保持する。
    pub fn ensure<P: AsRef<Path>>(path: P) -> Result<Self, WorkspaceError> {
        let path = path.as_ref();
        let absolute = std::path::absolute(path).map_err(|e| WorkspaceError::io(path, e))?;
        let path = absolute.as_path();

        if path.exists() && !path.is_dir() {
            return Err(WorkspaceError::InvalidPath(format!(
                "パス '{}' はディレクトリではありません。",
                path.display()
            )));
        }
        fs::create_dir_all(path).map_err(|e| WorkspaceError::io(path, e))?;

        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    /// 内部の `Path` への参照を返す。
    pub fn as_path(&self) -> &Path {
        &self.path
    }

    /// ディレクトリ直下のファイルへのパスを組み立てる。
    pub fn join<P: AsRef<Path>>(&self, name: P) -> PathBuf {
        self.path.join(name)
    }

    /// 直下の通常ファイル名をソートして返す。サブディレクトリは含まない。
    pub fn file_names(&self) -> Result<Vec<String>, WorkspaceError> {
        Ok(self
            .files()?
            .iter()
            .filter_map(|p| p.file_name().and_then(|s| s.to_str()))
            .map(str::to_string)
            .collect())
    }

    /// 直下にある中間画像ファイルをすべて削除し、削除したパスを返す。
    ///
    /// 対象がひとつもないのはエラーではない。ほかの拡張子のファイル（ログや過去のPNG）は残す。
    pub fn clean_intermediates(&self) -> Result<Vec<PathBuf>, WorkspaceError> {
        let mut removed = Vec::new();
        for path in self.files()? {
            if !is_intermediate(&path) {
                continue;
            }
            match fs::remove_file(&path) {
                Ok(()) => removed.push(path),
                // 走査と削除の間に消えていた場合は削除済みとみなす
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(WorkspaceError::io(&path, e)),
            }
        }
        Ok(removed)
    }

    /// 診断用のディレクトリ一覧を `名前<TAB>サイズ` の形式で返す。
    ///
    /// ディレクトリは末尾に `/` を付け、サイズは表示しない。
    pub fn listing(&self) -> Result<Vec<String>, WorkspaceError> {
        let mut lines = Vec::new();
        for entry in self.walk() {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if entry.file_type().is_dir() {
                lines.push(format!("{}/", name));
            } else {
                let size = entry.metadata()?.len();
                lines.push(format!("{}\t{}", name, size));
            }
        }
        Ok(lines)
    }

    // --- Private Helper Methods ---

    /// 直下のエントリをファイル名順に走査するイテレータ。
    fn walk(&self) -> walkdir::IntoIter {
        WalkDir::new(&self.path)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
    }

    fn files(&self) -> Result<Vec<PathBuf>, WorkspaceError> {
        let mut files = Vec::new();
        for entry in self.walk() {
            let entry = entry?;
            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }
}

// Displayトレイトの実装（表示用）
impl fmt::Display for OutputDir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}
