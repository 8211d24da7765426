//! Workbook Parser
//!
//! calamineを使用してカタログシートを読み込み、ヘッダー行と正規化済みの
//! セル値からなる表を構築します。

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader, Sheets};

use crate::api::SheetSelector;
use crate::error::DatasheetError;
use crate::formatter::serial_to_datetime;
use crate::parser::metadata::{WorkbookInspector, WorkbookMetadata};
use crate::security::SecurityConfig;
use crate::types::CellValue;

/// 読み込み済みのシート（ヘッダー + データ行）
#[derive(Debug, Clone)]
pub(crate) struct RawTable {
    /// シート名
    pub sheet_name: String,
    /// ヘッダー行の列名（前後の空白を除去済み）
    pub columns: Vec<String>,
    /// データ行（列数はヘッダーと同じ）
    pub rows: Vec<Vec<Option<CellValue>>>,
}

/// ワークブックパーサー
///
/// calamineのラッパーとして、ワークブックレベルの操作を提供します。
pub(crate) struct WorkbookParser {
    workbook: Sheets<Cursor<Vec<u8>>>,
    metadata: WorkbookMetadata,
}

impl WorkbookParser {
    /// ファイル内容からワークブックを開く
    ///
    /// calamineに渡す前に`WorkbookInspector`でセキュリティ検査を行います。
    pub fn open(bytes: Vec<u8>) -> Result<Self, DatasheetError> {
        let metadata = WorkbookInspector::inspect(&bytes, &SecurityConfig::default())?;
        tracing::trace!(
            entries = metadata.entry_count,
            is_1904 = metadata.is_1904,
            "workbook inspected"
        );
        let workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
        Ok(Self { workbook, metadata })
    }

    /// すべてのシート名を取得
    pub fn sheet_names(&self) -> Vec<String> {
        self.workbook.sheet_names()
    }

    /// シート選択方式に基づいてシート名を解決
    pub fn select_sheet(&self, selector: &SheetSelector) -> Result<String, DatasheetError> {
        let all_sheet_names = self.sheet_names();

        match selector {
            SheetSelector::First => all_sheet_names
                .into_iter()
                .next()
                .ok_or_else(|| DatasheetError::Load("Workbook contains no sheets".to_string())),

            SheetSelector::Index(index) => {
                all_sheet_names.get(*index).cloned().ok_or_else(|| {
                    DatasheetError::Load(format!(
                        "Sheet index {} is out of range (total: {})",
                        index,
                        all_sheet_names.len()
                    ))
                })
            }

            SheetSelector::Name(name) => {
                if !all_sheet_names.contains(name) {
                    return Err(DatasheetError::Load(format!("Sheet '{}' not found", name)));
                }
                Ok(name.clone())
            }
        }
    }

    /// シートを読み込み、最初の行をヘッダーとした表を返す
    ///
    /// 空の行（すべての値が`None`）は読み飛ばします。
    pub fn read_table(&mut self, selector: &SheetSelector) -> Result<RawTable, DatasheetError> {
        let sheet_name = self.select_sheet(selector)?;
        let range: Range<Data> = self.workbook.worksheet_range(&sheet_name)?;

        let mut rows_iter = range.rows();
        let header = rows_iter
            .next()
            .ok_or_else(|| DatasheetError::Load(format!("Sheet '{}' is empty", sheet_name)))?;

        let columns: Vec<String> = header.iter().map(header_name).collect();

        let mut rows = Vec::new();
        for row in rows_iter {
            let values: Vec<Option<CellValue>> = (0..columns.len())
                .map(|col_idx| row.get(col_idx).and_then(|cell| self.normalize(cell)))
                .collect();

            if values.iter().all(Option::is_none) {
                continue;
            }
            rows.push(values);
        }

        tracing::debug!(
            sheet = %sheet_name,
            columns = columns.len(),
            rows = rows.len(),
            is_1904 = self.metadata.is_1904,
            "sheet loaded"
        );

        Ok(RawTable {
            sheet_name,
            columns,
            rows,
        })
    }

    /// calamineのセル値を`Option<CellValue>`に正規化する
    ///
    /// 空白のみの文字列、`nan`（大文字小文字を区別しない）、エラーセルは`None`。
    fn normalize(&self, cell: &Data) -> Option<CellValue> {
        match cell {
            Data::Int(i) => Some(CellValue::Number(*i as f64)),
            Data::Float(f) if f.is_nan() => None,
            Data::Float(f) => Some(CellValue::Number(*f)),
            Data::String(s) => normalize_text(s),
            Data::Bool(b) => Some(CellValue::Bool(*b)),
            Data::DateTime(dt) => {
                let serial = dt.as_f64();
                match serial_to_datetime(serial, self.metadata.is_1904) {
                    Some(value) => Some(CellValue::DateTime(value)),
                    None => Some(CellValue::Number(serial)),
                }
            }
            Data::DateTimeIso(s) | Data::DurationIso(s) => normalize_text(s),
            Data::Error(e) => {
                tracing::debug!(error = ?e, "error cell treated as empty");
                None
            }
            Data::Empty => None,
        }
    }
}

/// ヘッダーセルを列名に変換
fn header_name(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Empty => String::new(),
        other => other.to_string().trim().to_string(),
    }
}

/// 文字列セルの正規化
fn normalize_text(raw: &str) -> Option<CellValue> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") {
        None
    } else {
        Some(CellValue::Text(trimmed.to_string()))
    }
}
