//! Catalog Cache Module
//!
//! 読み込み済みカタログをファイルパスと更新時刻をキーに保持する明示的なキャッシュ。
//! ソースファイルが変更されると次回の取得時に再読み込みします。

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use crate::catalog::{Catalog, CatalogLoader};
use crate::error::DatasheetError;

/// キャッシュエントリの鮮度判定に使うファイル情報
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileStamp {
    modified: Option<SystemTime>,
    len: u64,
}

impl FileStamp {
    fn read(path: &Path) -> Result<Self, DatasheetError> {
        let metadata = std::fs::metadata(path)?;
        Ok(Self {
            modified: metadata.modified().ok(),
            len: metadata.len(),
        })
    }
}

#[derive(Debug)]
struct CacheEntry {
    stamp: FileStamp,
    catalog: Arc<Catalog>,
}

/// カタログキャッシュ
///
/// プロセス全体で共有されるシングルトンではなく、呼び出し側が所有します。
///
/// ```rust,no_run
/// use xlsxdatasheet::{CatalogCache, CatalogLoader};
///
/// # fn main() -> Result<(), xlsxdatasheet::DatasheetError> {
/// let mut cache = CatalogCache::new(CatalogLoader::new());
/// let first = cache.get("bd.xlsx")?;
/// let second = cache.get("bd.xlsx")?; // ファイルが変更されていなければ再利用
/// assert!(std::sync::Arc::ptr_eq(&first, &second));
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct CatalogCache {
    loader: CatalogLoader,
    entries: HashMap<PathBuf, CacheEntry>,
}

impl CatalogCache {
    pub fn new(loader: CatalogLoader) -> Self {
        Self {
            loader,
            entries: HashMap::new(),
        }
    }

    /// カタログを取得する（未読み込み、またはファイルが変更されていれば読み込む）
    pub fn get(&mut self, path: impl AsRef<Path>) -> Result<Arc<Catalog>, DatasheetError> {
        let key = std::fs::canonicalize(path.as_ref())?;
        let stamp = FileStamp::read(&key)?;

        if let Some(entry) = self.entries.get(&key) {
            if entry.stamp == stamp {
                tracing::trace!(path = %key.display(), "catalog cache hit");
                return Ok(Arc::clone(&entry.catalog));
            }
            tracing::info!(path = %key.display(), "catalog changed on disk, reloading");
        }

        let catalog = Arc::new(self.loader.load_path(&key)?);
        self.entries.insert(
            key,
            CacheEntry {
                stamp,
                catalog: Arc::clone(&catalog),
            },
        );
        Ok(catalog)
    }

    /// エントリを破棄する。破棄した場合は`true`
    pub fn invalidate(&mut self, path: impl AsRef<Path>) -> bool {
        match std::fs::canonicalize(path.as_ref()) {
            Ok(key) => self.entries.remove(&key).is_some(),
            Err(_) => false,
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
