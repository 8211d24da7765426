//! Builder Module
//!
//! Fluent Builder APIを提供し、`Viewer`インスタンスを段階的に構築する。

use std::collections::HashMap;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::format::{Item, StrftimeItems};
use rayon::prelude::*;

use crate::api::{DateFormat, OutputFormat, SheetSelector};
use crate::assets::Footer;
use crate::cache::CatalogCache;
use crate::catalog::{Catalog, CatalogLoader};
use crate::datasheet::Datasheet;
use crate::error::DatasheetError;
use crate::formatter::{is_renderable_pattern, ValueFormatter};
use crate::output::OutputFormatter;
use crate::schema::{DatasheetSchema, NAME_COLUMN};

/// 表示処理の設定を保持する内部構造体
#[derive(Debug, Clone)]
pub(crate) struct ViewerConfig {
    /// シート選択方式
    pub sheet_selector: SheetSelector,

    /// 日付形式
    pub date_format: DateFormat,

    /// 出力フォーマット
    pub output_format: OutputFormat,

    /// フッター画像のルート（Noneの場合はカタログと同じディレクトリ）
    pub assets_dir: Option<PathBuf>,

    /// グループの定義
    pub schema: DatasheetSchema,

    /// 識別子列
    pub id_column: String,

    /// 製品名列
    pub name_column: String,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            sheet_selector: SheetSelector::First,
            date_format: DateFormat::DayMonthYear,
            output_format: OutputFormat::Markdown,
            assets_dir: None,
            schema: DatasheetSchema::default(),
            id_column: "id".to_string(),
            name_column: NAME_COLUMN.to_string(),
        }
    }
}

/// Fluent Builder APIを提供する構造体
///
/// すべての設定項目にデフォルト値が設定されており、必要な設定のみをオーバーライドできます。
///
/// # 使用例
///
/// ```rust,no_run
/// use xlsxdatasheet::{OutputFormat, SheetSelector, ViewerBuilder};
///
/// # fn main() -> Result<(), xlsxdatasheet::DatasheetError> {
/// let viewer = ViewerBuilder::new()
///     .with_sheet_selector(SheetSelector::Index(0))
///     .with_output_format(OutputFormat::Html)
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ViewerBuilder {
    config: ViewerConfig,
}

impl ViewerBuilder {
    /// デフォルト設定を持つビルダーインスタンスを生成する
    ///
    /// # デフォルト設定
    ///
    /// - シート選択: 最初のシート
    /// - 日付形式: `%d/%m/%Y`
    /// - 出力形式: Markdown
    /// - 画像のルート: カタログと同じディレクトリ
    /// - 識別子列 / 製品名列: `id` / `nom`
    pub fn new() -> Self {
        Self::default()
    }

    /// カタログとして読み込むシートを選択する
    pub fn with_sheet_selector(mut self, selector: SheetSelector) -> Self {
        self.config.sheet_selector = selector;
        self
    }

    /// 日付の出力形式を指定する
    ///
    /// # 引数
    ///
    /// * `format: DateFormat`: 日付形式
    pub fn with_date_format(mut self, format: DateFormat) -> Self {
        self.config.date_format = format;
        self
    }

    /// 出力フォーマットを指定する
    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.config.output_format = format;
        self
    }

    /// フッター画像のルートディレクトリを指定する
    ///
    /// 画像は`<dir>/images/afaq.png`と`<dir>/images/latty.jpg`から読み込まれます。
    pub fn with_assets_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.assets_dir = Some(dir.into());
        self
    }

    pub fn with_schema(mut self, schema: DatasheetSchema) -> Self {
        self.config.schema = schema;
        self
    }

    pub fn with_id_column(mut self, column: impl Into<String>) -> Self {
        self.config.id_column = column.into();
        self
    }

    pub fn with_name_column(mut self, column: impl Into<String>) -> Self {
        self.config.name_column = column.into();
        self
    }

    /// 設定を検証し、`Viewer`インスタンスを構築する
    ///
    /// # 戻り値
    ///
    /// * `Ok(Viewer)` - 設定が有効な場合
    /// * `Err(DatasheetError::Config)` - 設定が無効な場合
    ///   * カスタム日付形式が空、不正な書式指定子やタイムゾーン指定子（`%z`など）を含む
    ///   * 識別子列・製品名列の名前が空
    ///   * スキーマにグループがない、またはプレフィックスが空のグループがある
    pub fn build(self) -> Result<Viewer, DatasheetError> {
        // 1. カスタム日付形式の検証
        if let DateFormat::Custom(ref format_str) = self.config.date_format {
            let invalid = format_str.trim().is_empty()
                || StrftimeItems::new(format_str).any(|item| matches!(item, Item::Error))
                || !is_renderable_pattern(format_str);
            if invalid {
                return Err(DatasheetError::Config(format!(
                    "Invalid date format string: '{}'",
                    format_str
                )));
            }
        }

        // 2. 列名の検証
        if self.config.id_column.trim().is_empty() {
            return Err(DatasheetError::Config(
                "Identifier column name must not be empty".to_string(),
            ));
        }
        if self.config.name_column.trim().is_empty() {
            return Err(DatasheetError::Config(
                "Product name column name must not be empty".to_string(),
            ));
        }

        // 3. スキーマの検証
        let groups = self.config.schema.groups();
        if groups.is_empty() {
            return Err(DatasheetError::Config(
                "Schema must define at least one group".to_string(),
            ));
        }
        if let Some(group) = groups
            .iter()
            .find(|g| g.prefixes().is_empty() || g.prefixes().iter().any(|p| p.is_empty()))
        {
            return Err(DatasheetError::Config(format!(
                "Group '{}' has an empty prefix",
                group.title()
            )));
        }

        Ok(Viewer::new(self.config))
    }
}

/// データシート表示のファサード
///
/// # 使用例
///
/// ```rust,no_run
/// use xlsxdatasheet::ViewerBuilder;
///
/// # fn main() -> Result<(), xlsxdatasheet::DatasheetError> {
/// let viewer = ViewerBuilder::new().build()?;
/// let catalog = viewer.open_catalog("bd.xlsx")?;
/// let markdown = viewer.render_to_string(&catalog, "Produit A")?;
/// println!("{}", markdown);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Viewer {
    config: ViewerConfig,
    formatter: ValueFormatter,
}

impl Viewer {
    pub(crate) fn new(config: ViewerConfig) -> Self {
        Self {
            formatter: ValueFormatter::new(config.date_format.clone()),
            config,
        }
    }

    /// この設定に対応するカタログローダー
    pub fn loader(&self) -> CatalogLoader {
        CatalogLoader::new()
            .with_sheet_selector(self.config.sheet_selector.clone())
            .with_id_column(self.config.id_column.clone())
            .with_name_column(self.config.name_column.clone())
            .with_schema(self.config.schema.clone())
    }

    /// この設定でカタログを読み込むキャッシュ
    pub fn cache(&self) -> CatalogCache {
        CatalogCache::new(self.loader())
    }

    /// カタログを読み込む
    pub fn open_catalog(&self, path: impl AsRef<Path>) -> Result<Catalog, DatasheetError> {
        self.loader().load_path(path)
    }

    /// 出力フォーマット
    pub fn output_format(&self) -> OutputFormat {
        self.config.output_format
    }

    /// 製品のデータシートを組み立てる
    ///
    /// # 発生し得るエラー
    ///
    /// * `DatasheetError::ProductNotFound` - 製品名がカタログに存在しない
    /// * `DatasheetError::AssetMissing` - フッター画像が存在しない
    pub fn datasheet(&self, catalog: &Catalog, name: &str) -> Result<Datasheet, DatasheetError> {
        let row = catalog.select(name)?;
        let footer = Footer::load(self.assets_root(catalog))?;
        Ok(self.assemble(name, row, footer))
    }

    /// 製品のデータシートを出力する
    ///
    /// # 引数
    ///
    /// * `catalog` - 読み込み済みのカタログ
    /// * `name` - 製品名
    /// * `output` - 出力先のライター
    ///
    /// # 使用例
    ///
    /// ```rust,no_run
    /// use xlsxdatasheet::ViewerBuilder;
    ///
    /// # fn main() -> Result<(), xlsxdatasheet::DatasheetError> {
    /// let viewer = ViewerBuilder::new().build()?;
    /// let catalog = viewer.open_catalog("bd.xlsx")?;
    /// viewer.render(&catalog, "Produit A", std::io::stdout())?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn render<W: Write>(
        &self,
        catalog: &Catalog,
        name: &str,
        mut output: W,
    ) -> Result<(), DatasheetError> {
        let sheet = self.datasheet(catalog, name)?;
        let mut writer = BufWriter::new(&mut output);
        OutputFormatter::from_format(self.config.output_format).render(&sheet, &mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// 製品のデータシートを文字列として出力する
    pub fn render_to_string(&self, catalog: &Catalog, name: &str) -> Result<String, DatasheetError> {
        let mut buffer = Vec::new();
        self.render(catalog, name, &mut buffer)?;

        let result = String::from_utf8(buffer).map_err(|e| {
            DatasheetError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })?;

        Ok(result)
    }

    /// すべての製品のデータシートを1製品1ファイルで出力する
    ///
    /// ファイル名は製品名から生成され、拡張子は出力フォーマットに従います。
    /// フッター画像は出力ファイルから参照できるよう`dir/images/`に複製されます。
    /// 製品ごとの描画は並列に実行されます。
    ///
    /// # 戻り値
    ///
    /// 書き出したファイルのパス（製品名の出現順）
    pub fn export_all(
        &self,
        catalog: &Catalog,
        dir: impl AsRef<Path>,
    ) -> Result<Vec<PathBuf>, DatasheetError> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;

        // フッターは全製品で共通のため、最初に1回だけ読み込む
        let footer = Footer::load(self.assets_root(catalog))?;
        footer.publish(dir)?;
        let formatter = OutputFormatter::from_format(self.config.output_format);
        let targets = export_targets(catalog.product_names(), dir, self.config.output_format);

        targets
            .par_iter()
            .map(|(name, path)| -> Result<PathBuf, DatasheetError> {
                let row = catalog.select(name)?;
                let sheet = self.assemble(name, row, footer.clone());

                let file = std::fs::File::create(path)?;
                let mut writer = BufWriter::new(file);
                formatter.render(&sheet, &mut writer)?;
                writer.flush()?;

                tracing::debug!(product = %name, path = %path.display(), "datasheet written");
                Ok(path.clone())
            })
            .collect()
    }

    fn assemble(&self, name: &str, row: &crate::types::ProductRow, footer: Footer) -> Datasheet {
        Datasheet::build(name, row, &self.config.schema, &self.formatter, footer)
    }

    fn assets_root(&self, catalog: &Catalog) -> PathBuf {
        if let Some(dir) = &self.config.assets_dir {
            return dir.clone();
        }
        catalog
            .source()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// 製品名と出力先パスの組（ファイル名の衝突は連番で回避）
fn export_targets(
    names: &[String],
    dir: &Path,
    format: OutputFormat,
) -> Vec<(String, PathBuf)> {
    let mut used: HashMap<String, usize> = HashMap::new();

    names
        .iter()
        .map(|name| {
            let stem = sanitize_file_stem(name);
            let count = used.entry(stem.clone()).or_insert(0);
            *count += 1;
            let file_name = if *count == 1 {
                format!("{}.{}", stem, format.extension())
            } else {
                format!("{}-{}.{}", stem, count, format.extension())
            };
            (name.clone(), dir.join(file_name))
        })
        .collect()
}

/// 製品名をファイル名として使える文字列に変換
fn sanitize_file_stem(name: &str) -> String {
    let stem: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let stem = stem.trim_start_matches('.').to_string();

    if stem.is_empty() {
        "product".to_string()
    } else {
        stem
    }
}
