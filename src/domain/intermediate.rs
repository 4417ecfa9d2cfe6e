// 中間画像ファイル名の解釈と、変換対象の選択を扱うモジュール。

use crate::config::{CONVERTED_EXTENSION, INTERMEDIATE_EXTENSIONS};
use std::cmp::Ordering;
use std::fmt;
use std::path::Path;

// --- 構造体定義 ---

/// 数値キーを持つ中間画像ファイル名。
///
/// `parse` を通じてのみ生成でき、その際に以下の点が保証されます。
/// - 拡張子が中間画像のもの（`pgm` / `pnm`）であること
/// - 最初のハイフンの直後に10進数のキーがあること（例: `wave-12.pgm` のキーは 12）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntermediateImage {
    file_name: String,
    key: NumericKey,
}

/// ファイル名に埋め込まれた10進数のキー。
///
/// 桁数に上限はなく、先頭のゼロを除いた数字列として保持する。
/// 比較は桁数、次に数字列の辞書順で行うので、数値としての大小と一致する。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NumericKey(String);

impl NumericKey {
    fn from_digits(digits: &str) -> Self {
        let trimmed = digits.trim_start_matches('0');
        if trimmed.is_empty() {
            Self("0".to_string())
        } else {
            Self(trimmed.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Ord for NumericKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for NumericKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for NumericKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// --- 実装ブロック ---

impl IntermediateImage {
    /// ファイル名を解釈して `IntermediateImage` を作成します。
    ///
    /// # 戻り値
    /// * `Some(IntermediateImage)`: 中間画像の拡張子と数値キーを持つ場合。
    /// * `None`: それ以外のファイル名の場合。
    pub fn parse(file_name: &str) -> Option<Self> {
        if !is_intermediate(Path::new(file_name)) {
            return None;
        }
        let key = numeric_key(file_name)?;
        Some(Self {
            file_name: file_name.to_string(),
            key,
        })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }
    pub fn key(&self) -> &NumericKey {
        &self.key
    }

    /// 変換後のファイル名（拡張子を `png` に置き換えたもの）。
    pub fn destination_name(&self) -> String {
        destination_name(&self.file_name)
    }
}

// --- 関数 ---

/// パスが中間画像ファイルであるか、拡張子で判定します。大文字・小文字は区別しません。
pub fn is_intermediate(path: &Path) -> bool {
    match path.extension().and_then(|s| s.to_str()) {
        Some(ext) => INTERMEDIATE_EXTENSIONS.contains(&ext.to_lowercase().as_str()),
        None => false,
    }
}

/// 最初のハイフンより後ろの先頭の数字列をキーとして取り出します。
///
/// `wave-12.pgm` → `Some(12)`、`wave-x.pgm` や `wave.pgm` → `None`。
pub fn numeric_key(file_name: &str) -> Option<NumericKey> {
    let (_, rest) = file_name.split_once('-')?;
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    if end == 0 {
        return None;
    }
    Some(NumericKey::from_digits(&rest[..end]))
}

/// ファイル名の一覧から、数値キーが最大の中間画像を選びます。
///
/// 辞書順ではなく数値で比較するため、`wave-12.pgm` は `wave-7.pgm` より後になります。
/// キーが同じ場合は辞書順で最後のものを選びます。候補がない場合は `None` を返します。
pub fn select_latest<S: AsRef<str>>(names: &[S]) -> Option<&str> {
    names
        .iter()
        .filter_map(|name| {
            let name: &str = name.as_ref();
            IntermediateImage::parse(name).map(|img| (img.key, name))
        })
        .max()
        .map(|(_, name)| name)
}

/// 拡張子を変換後のものに置き換えたファイル名を返します。
pub fn destination_name(file_name: &str) -> String {
    Path::new(file_name)
        .with_extension(CONVERTED_EXTENSION)
        .to_string_lossy()
        .into_owned()
}

// --- テストモジュール ---
