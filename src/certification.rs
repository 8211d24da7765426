//! Certification Module
//!
//! `homologation_*`列から認証ラベルを収集し、PMUC/BAMの関連項目を解決するモジュール。

use crate::formatter::ValueFormatter;
use crate::schema::FieldGroup;
use crate::types::ProductRow;

/// PMUC参照番号の列
const PMUC_REF_COLUMN: &str = "pmuc_ref";
const PMUC_MARKER: &str = "pmuc";
const BAM_MARKER: &str = "bam";

/// BAMの関連項目
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BamField {
    Reference,
    Application,
    Conditions1,
    Conditions2,
}

impl BamField {
    /// 表示順
    pub const ALL: [BamField; 4] = [
        BamField::Reference,
        BamField::Application,
        BamField::Conditions1,
        BamField::Conditions2,
    ];

    pub fn column(&self) -> &'static str {
        match self {
            BamField::Reference => "bam_ref",
            BamField::Application => "bam_application",
            BamField::Conditions1 => "bam_tmax_pressionox_1",
            BamField::Conditions2 => "bam_tmax_pressionox_2",
        }
    }

    pub fn caption(&self) -> &'static str {
        match self {
            BamField::Reference => "Référence BAM",
            BamField::Application => "Application BAM",
            BamField::Conditions1 => "Conditions BAM (1)",
            BamField::Conditions2 => "Conditions BAM (2)",
        }
    }

    pub fn icon(&self) -> Option<&'static str> {
        match self {
            BamField::Reference => None,
            BamField::Application => Some("📄"),
            BamField::Conditions1 | BamField::Conditions2 => Some("🔥"),
        }
    }
}

/// BAMの関連項目とその値
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BamDetail {
    pub field: BamField,
    pub value: String,
}

/// 認証ブロック
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificationBlock {
    /// 認証ラベル（列順）
    pub labels: Vec<String>,
    /// PMUC参照（ラベルに`pmuc`を含み、かつ値がある場合）
    pub pmuc_ref: Option<String>,
    /// BAMの関連項目（ラベルに`bam`を含む場合、値のある項目のみ）
    pub bam_details: Vec<BamDetail>,
}

impl CertificationBlock {
    /// 行から認証ブロックを構築する
    ///
    /// 認証ラベルが1つもない場合は`None`（見出しも表示しない）。
    pub(crate) fn from_row(
        row: &ProductRow,
        group: &FieldGroup,
        formatter: &ValueFormatter,
    ) -> Option<Self> {
        let labels: Vec<String> = row
            .fields()
            .filter(|(column, _)| group.strip(column).is_some())
            .map(|(_, value)| formatter.format(value))
            .collect();

        if labels.is_empty() {
            return None;
        }

        let mentions = |marker: &str| {
            labels
                .iter()
                .any(|label| label.to_lowercase().contains(marker))
        };

        let pmuc_ref = if mentions(PMUC_MARKER) {
            row.get(PMUC_REF_COLUMN).map(|v| formatter.format(v))
        } else {
            None
        };

        let bam_details = if mentions(BAM_MARKER) {
            BamField::ALL
                .iter()
                .filter_map(|field| {
                    row.get(field.column()).map(|value| BamDetail {
                        field: *field,
                        value: formatter.format(value),
                    })
                })
                .collect()
        } else {
            Vec::new()
        };

        Some(Self {
            labels,
            pmuc_ref,
            bam_details,
        })
    }

    /// ラベルを1行に連結（`, `区切り）
    pub fn joined_labels(&self) -> String {
        self.labels.join(", ")
    }

    /// プレーンテキストの行（ラベル行、PMUC行、BAM行の順）
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![self.joined_labels()];
        if let Some(pmuc_ref) = &self.pmuc_ref {
            lines.push(format!("Référence PMUC: {}", pmuc_ref));
        }
        for detail in &self.bam_details {
            lines.push(format!("{}: {}", detail.field.caption(), detail.value));
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::DateFormat;
    use crate::types::{CellValue, RowId};
    use std::sync::Arc;

    fn row(cells: &[(&str, &str)]) -> ProductRow {
        let columns: Arc<[String]> = cells.iter().map(|(c, _)| c.to_string()).collect();
        // 空文字列は読み込み境界で`None`になる
        let values = cells
            .iter()
            .map(|(_, v)| (!v.is_empty()).then(|| CellValue::Text(v.to_string())))
            .collect();
        ProductRow::new(RowId("7".to_string()), columns, values)
    }

    fn block(row: &ProductRow) -> Option<CertificationBlock> {
        let group = FieldGroup::certification("Homologation(s)", "homologation_");
        CertificationBlock::from_row(row, &group, &ValueFormatter::new(DateFormat::DayMonthYear))
    }

    #[test]
    fn test_no_labels_no_block() {
        let row = row(&[("homologation_1", ""), ("pmuc_ref", "REF-123")]);
        assert_eq!(block(&row), None);
    }

    #[test]
    fn test_pmuc_reference() {
        let row = row(&[
            ("homologation_1", "PMUC approved"),
            ("homologation_2", "DVGW"),
            ("pmuc_ref", "REF-123"),
        ]);
        let block = block(&row).unwrap();
        assert_eq!(
            block.lines(),
            vec![
                "PMUC approved, DVGW".to_string(),
                "Référence PMUC: REF-123".to_string(),
            ]
        );
        assert!(block.bam_details.is_empty());
    }

    #[test]
    fn test_pmuc_without_reference() {
        let row = row(&[("homologation_1", "pmuc"), ("pmuc_ref", "")]);
        let block = block(&row).unwrap();
        assert_eq!(block.pmuc_ref, None);
        assert_eq!(block.lines().len(), 1);
    }

    #[test]
    fn test_bam_all_companions() {
        let row = row(&[
            ("homologation_1", "BAM"),
            ("bam_ref", "BAM-42"),
            ("bam_application", "Oxygène gazeux"),
            ("bam_tmax_pressionox_1", "60 °C / 40 bar"),
            ("bam_tmax_pressionox_2", "100 °C / 25 bar"),
        ]);
        let block = block(&row).unwrap();
        let fields: Vec<BamField> = block.bam_details.iter().map(|d| d.field).collect();
        assert_eq!(fields, BamField::ALL.to_vec());
        assert_eq!(block.lines()[1], "Référence BAM: BAM-42");
        assert_eq!(block.lines()[4], "Conditions BAM (2): 100 °C / 25 bar");
    }

    #[test]
    fn test_bam_partial_companions() {
        let row = row(&[
            ("homologation_1", "Homologué bam"),
            ("bam_ref", "BAM-42"),
            ("bam_application", ""),
            ("bam_tmax_pressionox_1", "60 °C / 40 bar"),
        ]);
        let block = block(&row).unwrap();
        let fields: Vec<BamField> = block.bam_details.iter().map(|d| d.field).collect();
        assert_eq!(fields, vec![BamField::Reference, BamField::Conditions1]);
    }

    #[test]
    fn test_bam_and_pmuc_both_fire() {
        let row = row(&[
            ("homologation_1", "PMUC"),
            ("homologation_2", "BAM"),
            ("pmuc_ref", "P-1"),
            ("bam_ref", "B-1"),
        ]);
        let block = block(&row).unwrap();
        assert_eq!(block.pmuc_ref.as_deref(), Some("P-1"));
        assert_eq!(block.bam_details.len(), 1);
    }

    #[test]
    fn test_companions_ignored_without_marker() {
        let row = row(&[
            ("homologation_1", "DVGW"),
            ("pmuc_ref", "P-1"),
            ("bam_ref", "B-1"),
        ]);
        let block = block(&row).unwrap();
        assert_eq!(block.pmuc_ref, None);
        assert!(block.bam_details.is_empty());
    }
}
