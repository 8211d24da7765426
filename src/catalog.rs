//! Catalog Module
//!
//! スプレッドシート全体をメモリ上のカタログとして読み込み、製品名の一覧と
//! 製品名による行の選択を提供するモジュール。

use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::api::{DateFormat, SheetSelector};
use crate::error::DatasheetError;
use crate::formatter::ValueFormatter;
use crate::parser::{RawTable, WorkbookParser};
use crate::schema::{DatasheetSchema, SchemaReport, NAME_COLUMN};
use crate::types::{CellValue, ProductRow, RowId};

/// 識別子列のデフォルト名
const ID_COLUMN: &str = "id";

/// カタログローダー
///
/// # 使用例
///
/// ```rust,no_run
/// use xlsxdatasheet::{CatalogLoader, SheetSelector};
///
/// # fn main() -> Result<(), xlsxdatasheet::DatasheetError> {
/// let catalog = CatalogLoader::new()
///     .with_sheet_selector(SheetSelector::Name("Produits".to_string()))
///     .load_path("bd.xlsx")?;
///
/// for name in catalog.product_names() {
///     println!("{}", name);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct CatalogLoader {
    sheet_selector: SheetSelector,
    id_column: String,
    name_column: String,
    schema: DatasheetSchema,
}

impl Default for CatalogLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogLoader {
    pub fn new() -> Self {
        Self {
            sheet_selector: SheetSelector::First,
            id_column: ID_COLUMN.to_string(),
            name_column: NAME_COLUMN.to_string(),
            schema: DatasheetSchema::default(),
        }
    }

    pub fn with_sheet_selector(mut self, selector: SheetSelector) -> Self {
        self.sheet_selector = selector;
        self
    }

    pub fn with_id_column(mut self, column: impl Into<String>) -> Self {
        self.id_column = column.into();
        self
    }

    pub fn with_name_column(mut self, column: impl Into<String>) -> Self {
        self.name_column = column.into();
        self
    }

    pub fn with_schema(mut self, schema: DatasheetSchema) -> Self {
        self.schema = schema;
        self
    }

    /// ファイルパスからカタログを読み込む
    pub fn load_path(&self, path: impl AsRef<Path>) -> Result<Catalog, DatasheetError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        tracing::debug!(path = %path.display(), bytes = bytes.len(), "reading catalog");
        let mut catalog = self.load_bytes(bytes)?;
        catalog.source = Some(path.to_path_buf());
        Ok(catalog)
    }

    /// リーダーからカタログを読み込む
    pub fn load<R: Read>(&self, mut reader: R) -> Result<Catalog, DatasheetError> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        self.load_bytes(bytes)
    }

    /// ファイル内容からカタログを読み込む
    ///
    /// # 発生し得るエラー
    ///
    /// * `DatasheetError::Load` - 識別子列・製品名列がない、シートが空
    /// * `DatasheetError::Parse` - スプレッドシートとして解析できない
    /// * `DatasheetError::SecurityViolation` - 入力の制限違反
    pub fn load_bytes(&self, bytes: Vec<u8>) -> Result<Catalog, DatasheetError> {
        let mut parser = WorkbookParser::open(bytes)?;
        let table = parser.read_table(&self.sheet_selector)?;
        self.build(table)
    }

    fn build(&self, table: RawTable) -> Result<Catalog, DatasheetError> {
        let RawTable {
            sheet_name,
            columns,
            rows,
        } = table;

        let id_idx = column_index(&columns, &self.id_column).ok_or_else(|| {
            DatasheetError::Load(format!(
                "Sheet '{}' has no identifier column '{}'",
                sheet_name, self.id_column
            ))
        })?;
        let name_idx = column_index(&columns, &self.name_column).ok_or_else(|| {
            DatasheetError::Load(format!(
                "Sheet '{}' has no product name column '{}'",
                sheet_name, self.name_column
            ))
        })?;

        let schema_report = self.schema.validate(&columns);
        for issue in schema_report.issues() {
            tracing::warn!(sheet = %sheet_name, "{}", issue);
        }

        let key_formatter = ValueFormatter::new(DateFormat::Iso8601);
        let columns: Arc<[String]> = columns.into();

        let mut products = Vec::with_capacity(rows.len());
        let mut names = Vec::new();
        let mut name_positions: HashMap<String, usize> = HashMap::new();
        let mut seen_ids: HashSet<RowId> = HashSet::new();
        let mut duplicate_names = Vec::new();
        let mut duplicate_ids = Vec::new();

        for (row_idx, values) in rows.into_iter().enumerate() {
            // ヘッダー行の次が1行目（Excelの行番号は2）
            let excel_row = row_idx + 2;

            let Some(id) = values[id_idx].as_ref().map(|v| row_id(v, &key_formatter)) else {
                tracing::warn!(row = excel_row, "row without identifier skipped");
                continue;
            };

            if !seen_ids.insert(id.clone()) {
                tracing::warn!(row = excel_row, id = %id, "duplicate identifier");
                duplicate_ids.push(id.clone());
            }

            let name = values[name_idx]
                .as_ref()
                .map(|v| key_formatter.format(v));

            products.push(ProductRow::new(id, Arc::clone(&columns), values));

            if let Some(name) = name {
                match name_positions.get(&name) {
                    Some(_) => {
                        if !duplicate_names.contains(&name) {
                            tracing::warn!(
                                name = %name,
                                "duplicate product name, the first row is used"
                            );
                            duplicate_names.push(name);
                        }
                    }
                    None => {
                        name_positions.insert(name.clone(), products.len() - 1);
                        names.push(name);
                    }
                }
            }
        }

        tracing::debug!(
            sheet = %sheet_name,
            rows = products.len(),
            products = names.len(),
            "catalog built"
        );

        Ok(Catalog {
            source: None,
            sheet_name,
            columns,
            products,
            names,
            name_positions,
            duplicate_names,
            duplicate_ids,
            schema_report,
        })
    }
}

/// 読み込み済みのカタログ
///
/// 読み込み後は変更されません。
#[derive(Debug, Clone)]
pub struct Catalog {
    source: Option<PathBuf>,
    sheet_name: String,
    columns: Arc<[String]>,
    products: Vec<ProductRow>,
    names: Vec<String>,
    name_positions: HashMap<String, usize>,
    duplicate_names: Vec<String>,
    duplicate_ids: Vec<RowId>,
    schema_report: SchemaReport,
}

impl Catalog {
    /// 読み込んだファイルのパス（ファイルから読み込んだ場合のみ）
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// 読み込んだシート名
    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    /// ヘッダー行の列名
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// 行数（識別子のない行を除く）
    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// すべての行
    pub fn rows(&self) -> impl Iterator<Item = &ProductRow> {
        self.products.iter()
    }

    /// 製品名の一覧（空の値を除き、重複を除いた出現順）
    pub fn product_names(&self) -> &[String] {
        &self.names
    }

    /// 製品名に一致する最初の行
    pub fn find(&self, name: &str) -> Option<&ProductRow> {
        self.name_positions
            .get(name)
            .map(|&idx| &self.products[idx])
    }

    /// 製品名に一致する最初の行（存在しない場合はエラー）
    pub fn select(&self, name: &str) -> Result<&ProductRow, DatasheetError> {
        self.find(name)
            .ok_or_else(|| DatasheetError::ProductNotFound(name.to_string()))
    }

    /// 複数の行で使われている製品名
    pub fn duplicate_names(&self) -> &[String] {
        &self.duplicate_names
    }

    /// 複数の行で使われている識別子
    pub fn duplicate_ids(&self) -> &[RowId] {
        &self.duplicate_ids
    }

    /// ヘッダー行の検証結果
    pub fn schema_report(&self) -> &SchemaReport {
        &self.schema_report
    }
}

fn column_index(columns: &[String], name: &str) -> Option<usize> {
    columns.iter().position(|c| c == name)
}

/// 識別子セルの値を`RowId`に変換（整数値の数値は小数点なし）
fn row_id(value: &CellValue, formatter: &ValueFormatter) -> RowId {
    match value {
        CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
            RowId(format!("{}", *n as i64))
        }
        other => RowId(formatter.format(other)),
    }
}
