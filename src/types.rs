//! Types Module
//!
//! クレート全体で使用する共通データ型を定義するモジュール。

use std::fmt;
use std::sync::Arc;

use chrono::NaiveDateTime;

/// セルの値を表す列挙型
///
/// 空セルはこの型では表現しません。読み込み境界で`Option<CellValue>`の
/// `None`に正規化されます（空文字列、`nan`文字列、エラーセルを含む）。
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// 文字列（前後の空白は除去済み、空でない）
    Text(String),

    /// 数値（f64）
    Number(f64),

    /// 論理値
    Bool(bool),

    /// 日付・日時（スプレッドシートの日付セル）
    DateTime(NaiveDateTime),
}

impl CellValue {
    /// 文字列値の場合はその参照を返す
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// 行の識別子（`id`列の値）
///
/// 整数値の`12.0`は`"12"`として保持されます。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowId(pub(crate) String);

impl RowId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// カタログの1行（1製品）
///
/// 列名はカタログ全体で共有されます。行は選択後に変更されません。
#[derive(Debug, Clone)]
pub struct ProductRow {
    id: RowId,
    columns: Arc<[String]>,
    values: Vec<Option<CellValue>>,
}

impl ProductRow {
    pub(crate) fn new(id: RowId, columns: Arc<[String]>, values: Vec<Option<CellValue>>) -> Self {
        debug_assert_eq!(columns.len(), values.len());
        Self {
            id,
            columns,
            values,
        }
    }

    /// 行の識別子
    pub fn id(&self) -> &RowId {
        &self.id
    }

    /// 列名で値を取得（存在しない列・空の値は`None`）
    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.columns
            .iter()
            .position(|c| c == column)
            .and_then(|idx| self.values[idx].as_ref())
    }

    /// 値を持つ列を列順に返す
    pub fn fields(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.columns
            .iter()
            .zip(self.values.iter())
            .filter_map(|(column, value)| value.as_ref().map(|v| (column.as_str(), v)))
    }

    /// すべての列名（値の有無を問わない）
    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}
