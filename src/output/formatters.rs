//! Output Formatters Implementation
//!
//! 各出力フォーマットの実装を提供するモジュール。

use std::io::Write;

use serde_json::json;
use unicode_width::UnicodeWidthStr;

use crate::assets::{Footer, FooterImage, STORAGE_DOCUMENT, STORAGE_NOTICE_LEAD, STORAGE_NOTICE_TAIL};
use crate::certification::CertificationBlock;
use crate::classifier::GroupedField;
use crate::datasheet::{Block, Datasheet, Section};
use crate::error::DatasheetError;

/// 項目テーブルの見出し
const LABEL_HEADER: &str = "Désignation";
const VALUE_HEADER: &str = "Valeur";

/// Markdown形式のフォーマッター
pub struct MarkdownFormatter;

impl MarkdownFormatter {
    pub fn render<W: Write>(
        &self,
        sheet: &Datasheet,
        writer: &mut W,
    ) -> Result<(), DatasheetError> {
        writeln!(writer, "# {}", escape_markdown(&sheet.title))?;
        writeln!(writer)?;

        if let Some(caption) = sheet.caption() {
            writeln!(writer, "*{}*", escape_markdown(&caption))?;
            writeln!(writer)?;
        }

        if let Some(description) = &sheet.description {
            writeln!(writer, "**{}**", escape_markdown(description))?;
            writeln!(writer)?;
        }

        for block in &sheet.blocks {
            writeln!(writer, "#### {}", block.title())?;
            writeln!(writer)?;

            match block {
                Block::Fields(section) => self.render_table(section, writer)?,
                Block::Certifications { block, .. } => {
                    self.render_certifications(block, writer)?
                }
                Block::Remarks { items, .. } => {
                    for item in items {
                        writeln!(writer, "- {}", escape_markdown(item))?;
                    }
                    writeln!(writer)?;
                    writeln!(writer, "---")?;
                }
            }
            writeln!(writer)?;
        }

        self.render_footer(&sheet.footer, writer)?;
        writer.flush()?;
        Ok(())
    }

    /// 項目をラベルと値の2列のテーブルとして出力
    ///
    /// 列幅は表示幅（全角文字は2）で揃え、最小幅は3文字です。
    fn render_table<W: Write>(&self, section: &Section, writer: &mut W) -> Result<(), DatasheetError> {
        let rows: Vec<[String; 2]> = section
            .fields
            .iter()
            .map(|field| {
                [
                    escape_markdown(&field.label),
                    escape_markdown(&field.display_value()),
                ]
            })
            .collect();

        let header = [LABEL_HEADER.to_string(), VALUE_HEADER.to_string()];
        let mut widths = [3usize; 2];
        for row in std::iter::once(&header).chain(rows.iter()) {
            for (col_idx, cell) in row.iter().enumerate() {
                widths[col_idx] = widths[col_idx].max(cell.width());
            }
        }

        write_table_row(writer, &header, &widths)?;
        let separator: String = widths
            .iter()
            .map(|&width| format!("{}|", "-".repeat(width + 2)))
            .collect();
        writeln!(writer, "|{}", separator)?;
        for row in &rows {
            write_table_row(writer, row, &widths)?;
        }
        Ok(())
    }

    fn render_certifications<W: Write>(
        &self,
        block: &CertificationBlock,
        writer: &mut W,
    ) -> Result<(), DatasheetError> {
        writeln!(writer, "**- {}**", escape_markdown(&block.joined_labels()))?;

        if let Some(pmuc_ref) = &block.pmuc_ref {
            writeln!(writer)?;
            writeln!(writer, "**Référence PMUC**: {}", escape_markdown(pmuc_ref))?;
        }

        for detail in &block.bam_details {
            writeln!(writer)?;
            if let Some(icon) = detail.field.icon() {
                write!(writer, "{} ", icon)?;
            }
            writeln!(
                writer,
                "**{}**: {}",
                detail.field.caption(),
                escape_markdown(&detail.value)
            )?;
        }
        Ok(())
    }

    fn render_footer<W: Write>(&self, footer: &Footer, writer: &mut W) -> Result<(), DatasheetError> {
        let image = |image: &FooterImage| format!("![{}]({})", image.alt, image.href);
        writeln!(writer, "{} {}", image(&footer.left), image(&footer.right))?;
        writeln!(writer)?;
        writeln!(
            writer,
            "{} **{}** {}",
            STORAGE_NOTICE_LEAD, STORAGE_DOCUMENT, STORAGE_NOTICE_TAIL
        )?;
        writeln!(writer)?;
        writeln!(writer, "{}", footer.address())?;
        Ok(())
    }
}

fn write_table_row<W: Write>(
    writer: &mut W,
    cells: &[String; 2],
    widths: &[usize; 2],
) -> Result<(), DatasheetError> {
    write!(writer, "|")?;
    for (cell, &width) in cells.iter().zip(widths.iter()) {
        let padding = width.saturating_sub(cell.width());
        write!(writer, " {}{} |", cell, " ".repeat(padding))?;
    }
    writeln!(writer)?;
    Ok(())
}

/// 単一ファイルで完結するHTMLページのフォーマッター
pub struct HtmlFormatter;

/// ページに埋め込むスタイル
const HTML_STYLE: &str = "\
body { font-family: sans-serif; font-size: 1rem; line-height: 1.2; max-width: 48rem; margin: 2rem auto; color: #333; }
h4 { font-size: 1.25rem; margin: 1.25rem 0 0.5rem; }
.caption { color: #666; font-size: 0.85rem; }
.description { text-align: justify; line-height: 1.7rem; font-weight: bold; }
.section { border: 1px solid #ddd; border-radius: 0.5rem; padding: 0.5rem 1rem; }
table.fields { width: 100%; border-collapse: collapse; }
table.fields th { text-align: left; font-weight: bold; width: 80%; }
ul.remarks li { margin-bottom: 0.2rem; font-size: 0.9rem; }
hr { margin: 0.5rem 0; }
footer { display: flex; align-items: center; gap: 1rem; margin-top: 1.5rem; }
footer .notice { flex: 1; text-align: center; font-size: 0.75rem; line-height: 1.1rem; }
footer .address { font-size: 0.85rem; }
";

impl HtmlFormatter {
    pub fn render<W: Write>(
        &self,
        sheet: &Datasheet,
        writer: &mut W,
    ) -> Result<(), DatasheetError> {
        let title = escape_html(&sheet.title);

        writeln!(writer, "<!DOCTYPE html>")?;
        writeln!(writer, "<html lang=\"fr\">")?;
        writeln!(writer, "<head>")?;
        writeln!(writer, "<meta charset=\"utf-8\">")?;
        writeln!(writer, "<title>{}</title>", title)?;
        write!(writer, "<style>\n{}</style>\n", HTML_STYLE)?;
        writeln!(writer, "</head>")?;
        writeln!(writer, "<body>")?;
        writeln!(writer, "<h1>{}</h1>", title)?;

        if let Some(caption) = sheet.caption() {
            writeln!(writer, "<p class=\"caption\">{}</p>", escape_html(&caption))?;
        }
        if let Some(description) = &sheet.description {
            writeln!(
                writer,
                "<div class=\"description\">{}</div>",
                escape_html(description)
            )?;
        }

        for block in &sheet.blocks {
            writeln!(writer, "<h4>{}</h4>", escape_html(block.title()))?;
            match block {
                Block::Fields(section) => {
                    writeln!(writer, "<div class=\"section\">")?;
                    writeln!(writer, "<table class=\"fields\">")?;
                    for field in &section.fields {
                        writeln!(
                            writer,
                            "  <tr><th>{}</th><td>{}</td></tr>",
                            escape_html(&field.label),
                            html_value(field)
                        )?;
                    }
                    writeln!(writer, "</table>")?;
                    writeln!(writer, "</div>")?;
                }
                Block::Certifications { block, .. } => {
                    writeln!(writer, "<div class=\"section\">")?;
                    writeln!(
                        writer,
                        "<p><strong>- {}</strong></p>",
                        escape_html(&block.joined_labels())
                    )?;
                    if let Some(pmuc_ref) = &block.pmuc_ref {
                        writeln!(
                            writer,
                            "<p><strong>Référence PMUC</strong>: {}</p>",
                            escape_html(pmuc_ref)
                        )?;
                    }
                    for detail in &block.bam_details {
                        let icon = detail
                            .field
                            .icon()
                            .map(|icon| format!("{} ", icon))
                            .unwrap_or_default();
                        writeln!(
                            writer,
                            "<p>{}<strong>{}</strong>: {}</p>",
                            icon,
                            detail.field.caption(),
                            escape_html(&detail.value)
                        )?;
                    }
                    writeln!(writer, "</div>")?;
                }
                Block::Remarks { items, .. } => {
                    writeln!(writer, "<ul class=\"remarks\">")?;
                    for item in items {
                        writeln!(writer, "  <li>{}</li>", escape_html(item))?;
                    }
                    writeln!(writer, "</ul>")?;
                    writeln!(writer, "<hr>")?;
                }
            }
        }

        let footer = &sheet.footer;
        writeln!(writer, "<footer>")?;
        writeln!(writer, "{}", html_image(&footer.left))?;
        writeln!(writer, "<div class=\"notice\">")?;
        writeln!(
            writer,
            "<div>{} <strong>{}</strong> {}</div>",
            STORAGE_NOTICE_LEAD, STORAGE_DOCUMENT, STORAGE_NOTICE_TAIL
        )?;
        writeln!(
            writer,
            "<div class=\"address\">{}</div>",
            escape_html(footer.address())
        )?;
        writeln!(writer, "</div>")?;
        writeln!(writer, "{}", html_image(&footer.right))?;
        writeln!(writer, "</footer>")?;
        writeln!(writer, "</body>")?;
        writeln!(writer, "</html>")?;

        writer.flush()?;
        Ok(())
    }
}

/// 値と単位（`cm3`は上付き表記）
fn html_value(field: &GroupedField) -> String {
    let value = escape_html(&field.value);
    match field.unit.symbol() {
        Some(symbol) => format!(
            "{} {}",
            value,
            escape_html(symbol).replace("cm3", "cm<sup>3</sup>")
        ),
        None => value,
    }
}

fn html_image(image: &FooterImage) -> String {
    format!(
        "<img src=\"{}\" alt=\"{}\" width=\"{}\" height=\"{}\">",
        escape_html(&image.href),
        image.alt,
        image.width,
        image.height
    )
}

/// JSON形式のフォーマッター
pub struct JsonFormatter;

impl JsonFormatter {
    pub fn render<W: Write>(
        &self,
        sheet: &Datasheet,
        writer: &mut W,
    ) -> Result<(), DatasheetError> {
        let blocks: Vec<serde_json::Value> = sheet
            .blocks
            .iter()
            .map(|block| match block {
                Block::Fields(section) => json!({
                    "kind": "fields",
                    "title": section.title,
                    "fields": section.fields.iter().map(|field| json!({
                        "label": field.label,
                        "value": field.value,
                        "unit": field.unit.display(),
                        "display": field.display_value(),
                    })).collect::<Vec<_>>(),
                }),
                Block::Certifications { title, block } => json!({
                    "kind": "certifications",
                    "title": title,
                    "labels": block.labels,
                    "pmuc_ref": block.pmuc_ref,
                    "bam": block.bam_details.iter().map(|detail| json!({
                        "column": detail.field.column(),
                        "caption": detail.field.caption(),
                        "icon": detail.field.icon(),
                        "value": detail.value,
                    })).collect::<Vec<_>>(),
                }),
                Block::Remarks { title, items } => json!({
                    "kind": "remarks",
                    "title": title,
                    "items": items,
                }),
            })
            .collect();

        let image = |image: &FooterImage| {
            json!({
                "src": image.href,
                "alt": image.alt,
                "width": image.width,
                "height": image.height,
            })
        };

        let json_output = json!({
            "title": sheet.title,
            "version": sheet.version,
            "updated": sheet.updated,
            "caption": sheet.caption(),
            "description": sheet.description,
            "blocks": blocks,
            "footer": {
                "images": [image(&sheet.footer.left), image(&sheet.footer.right)],
                "storage_notice": sheet.footer.storage_notice(),
                "address": sheet.footer.address(),
            },
        });

        serde_json::to_writer_pretty(&mut *writer, &json_output).map_err(std::io::Error::from)?;
        writeln!(writer)?;
        writer.flush()?;

        Ok(())
    }
}

/// Markdown特殊文字をエスケープ
/// Markdownのテキストとしてエスケープ
///
/// 表の区切り（`|`）と強調・コード・リンクの記号はどこにあってもエスケープします。
/// 見出し・引用・リストとして解釈される先頭の記号もエスケープします。
/// 改行は`<br>`になります。
fn escape_markdown(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len() + 4);

    let leading_digits = s.chars().take_while(char::is_ascii_digit).count();
    let ordered_marker = leading_digits > 0
        && matches!(s[leading_digits..].chars().next(), Some('.') | Some(')'));

    for (idx, c) in s.chars().enumerate() {
        match c {
            '\\' | '|' | '*' | '_' | '`' | '[' | ']' => {
                escaped.push('\\');
                escaped.push(c);
            }
            '#' | '-' | '+' | '>' | '=' if idx == 0 => {
                escaped.push('\\');
                escaped.push(c);
            }
            '.' | ')' if ordered_marker && idx == leading_digits => {
                escaped.push('\\');
                escaped.push(c);
            }
            '\n' => escaped.push_str("<br>"),
            '\r' => {}
            _ => escaped.push(c),
        }
    }
    escaped
}

fn escape_html(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
