//! Security Module
//!
//! カタログファイルの読み込み前に適用する入力制限。
//! 巨大な入力、ZIP bomb、アーカイブ内のパストラバーサルを拒否します。

use crate::error::DatasheetError;

/// 入力制限の設定
#[derive(Debug, Clone)]
pub(crate) struct SecurityConfig {
    /// 展開後の合計サイズの上限（1GB）
    pub max_decompressed_size: u64,
    /// アーカイブ内のエントリ数の上限（10,000）
    pub max_file_count: usize,
    /// 単一エントリの展開後サイズの上限（100MB）
    pub max_file_size: u64,
    /// 入力ファイルのサイズ上限（2GB）
    pub max_input_file_size: u64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_decompressed_size: 1 << 30,
            max_file_count: 10_000,
            max_file_size: 100 << 20,
            max_input_file_size: 2 << 30,
        }
    }
}

impl SecurityConfig {
    /// 入力全体のサイズを検査
    pub fn check_input_size(&self, len: usize) -> Result<(), DatasheetError> {
        if len as u64 > self.max_input_file_size {
            return Err(violation(format!(
                "Input file size exceeds maximum: {} bytes (max: {} bytes)",
                len, self.max_input_file_size
            )));
        }
        Ok(())
    }

    /// アーカイブのエントリ数を検査
    pub fn check_entry_count(&self, count: usize) -> Result<(), DatasheetError> {
        if count > self.max_file_count {
            return Err(violation(format!(
                "ZIP archive contains too many files: {} (max: {})",
                count, self.max_file_count
            )));
        }
        Ok(())
    }

    /// 展開サイズの集計を開始
    pub fn budget(&self) -> ExtractionBudget<'_> {
        ExtractionBudget {
            config: self,
            total: 0,
        }
    }
}

/// アーカイブ全体の展開サイズを集計しながら、エントリごとの制限を検査する
pub(crate) struct ExtractionBudget<'a> {
    config: &'a SecurityConfig,
    total: u64,
}

impl ExtractionBudget<'_> {
    /// エントリを1つ計上する
    ///
    /// パスの安全性、単一エントリのサイズ、合計サイズの順に検査します。
    pub fn admit(&mut self, name: &str, size: u64) -> Result<(), DatasheetError> {
        validate_zip_path(name)?;

        if size > self.config.max_file_size {
            return Err(violation(format!(
                "File '{}' exceeds maximum size: {} bytes (max: {} bytes)",
                name, size, self.config.max_file_size
            )));
        }

        self.total = self
            .total
            .checked_add(size)
            .ok_or_else(|| violation("Total decompressed size overflow".to_string()))?;

        if self.total > self.config.max_decompressed_size {
            return Err(violation(format!(
                "Total decompressed size exceeds maximum: {} bytes (max: {} bytes)",
                self.total, self.config.max_decompressed_size
            )));
        }
        Ok(())
    }

    /// これまでに計上した展開後サイズ
    pub fn total(&self) -> u64 {
        self.total
    }
}

/// アーカイブ内のエントリ名を検証
///
/// 空の名前、絶対パス（`/`始まり、ドライブ文字付き）、`..`、バックスラッシュを拒否します。
pub(crate) fn validate_zip_path(path: &str) -> Result<(), DatasheetError> {
    let reason = if path.is_empty() {
        Some("Empty path is not allowed".to_string())
    } else if path.starts_with('/') || has_drive_prefix(path) {
        Some(format!("Absolute path is not allowed: {}", path))
    } else if path.split(['/', '\\']).any(|part| part == "..") {
        Some(format!("Path traversal detected: {}", path))
    } else if path.contains('\\') {
        Some(format!("Backslash in path is not allowed: {}", path))
    } else {
        None
    };

    match reason {
        Some(reason) => Err(violation(format!("Invalid ZIP path: {}", reason))),
        None => Ok(()),
    }
}

/// `C:`のようなドライブ文字で始まるか
fn has_drive_prefix(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

fn violation(message: String) -> DatasheetError {
    DatasheetError::SecurityViolation(message)
}
