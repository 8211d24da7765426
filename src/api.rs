//! Public API Types
//!
//! 公開APIで使用する列挙型を定義するモジュール。

/// 日付の出力形式
///
/// `date_maj`列（最終更新日）および日付セルを表示する際の形式を指定します。
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DateFormat {
    /// 日/月/年（`%d/%m/%Y`、デフォルト）
    ///
    /// 例: `01/05/2023`
    DayMonthYear,

    /// ISO 8601形式（YYYY-MM-DD）
    ///
    /// 例: `2023-05-01`
    Iso8601,

    /// カスタム形式（chrono互換フォーマット文字列）
    ///
    /// # 使用例
    ///
    /// ```rust,no_run
    /// use xlsxdatasheet::{DateFormat, ViewerBuilder};
    ///
    /// # fn main() -> Result<(), xlsxdatasheet::DatasheetError> {
    /// let viewer = ViewerBuilder::new()
    ///     .with_date_format(DateFormat::Custom("%d.%m.%Y".to_string()))
    ///     .build()?;
    /// # Ok(())
    /// # }
    /// ```
    Custom(String),
}

impl DateFormat {
    /// chrono互換のフォーマット文字列を返す
    pub fn pattern(&self) -> &str {
        match self {
            DateFormat::DayMonthYear => "%d/%m/%Y",
            DateFormat::Iso8601 => "%Y-%m-%d",
            DateFormat::Custom(pattern) => pattern,
        }
    }
}

/// シート選択方式
///
/// カタログとして読み込むシートを選択します。カタログは常に1シートです。
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SheetSelector {
    /// 最初のシート（デフォルト）
    First,

    /// インデックス指定（0始まり）
    Index(usize),

    /// シート名指定
    Name(String),
}

/// 出力フォーマット
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum OutputFormat {
    /// Markdown形式（デフォルト）
    ///
    /// ```markdown
    /// # Produit A
    ///
    /// *Fiche technique: 3 (dernière mise à jour : 01/05/2023)*
    ///
    /// #### 🔬 Composition moyenne
    ///
    /// | Désignation | Valeur |
    /// |-------------|--------|
    /// | graphite    | 40 %   |
    /// ```
    Markdown,

    /// 単一ファイルで完結するHTMLページ
    Html,

    /// データシートの構造をJSONで出力
    Json,
}

impl OutputFormat {
    /// 出力ファイルの拡張子
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Markdown => "md",
            OutputFormat::Html => "html",
            OutputFormat::Json => "json",
        }
    }
}
