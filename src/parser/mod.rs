//! Parser Module
//!
//! calamineを使用したカタログファイル解析の実装。
//! 読み込み前のアーカイブ検査と、セル値の`Option<CellValue>`への正規化を担当します。

mod metadata;
mod workbook;

pub(crate) use workbook::{RawTable, WorkbookParser};
