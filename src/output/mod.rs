//! Output Format Module
//!
//! Strategy Patternによる出力フォーマットの抽象化を提供するモジュール。

mod formatters;

use std::io::Write;

use crate::api::OutputFormat;
use crate::datasheet::Datasheet;
use crate::error::DatasheetError;

pub use formatters::*;

/// 出力フォーマッター（Strategy Pattern）
///
/// 各出力フォーマット（Markdown, HTML, JSON）をenumとして表現します。
#[derive(Debug, Clone, Copy)]
pub enum OutputFormatter {
    Markdown,
    Html,
    Json,
}

impl OutputFormatter {
    /// 出力フォーマットからフォーマッターを生成
    pub fn from_format(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Markdown => OutputFormatter::Markdown,
            OutputFormat::Html => OutputFormatter::Html,
            OutputFormat::Json => OutputFormatter::Json,
        }
    }

    /// データシートを指定されたフォーマットで出力する
    ///
    /// # 引数
    ///
    /// * `sheet` - 出力するデータシート
    /// * `writer` - 出力先のライター
    ///
    /// # 戻り値
    ///
    /// * `Ok(())` - 出力に成功した場合
    /// * `Err(DatasheetError)` - 書き込みに失敗した場合
    pub fn render<W: Write>(
        &self,
        sheet: &Datasheet,
        writer: &mut W,
    ) -> Result<(), DatasheetError> {
        match self {
            OutputFormatter::Markdown => MarkdownFormatter.render(sheet, writer),
            OutputFormatter::Html => HtmlFormatter.render(sheet, writer),
            OutputFormatter::Json => JsonFormatter.render(sheet, writer),
        }
    }
}
