//! Datasheet Model Module
//!
//! 選択された1行から、出力形式に依存しないデータシートの構造を組み立てるモジュール。
//! 各出力フォーマッターはこの構造だけを参照します。

use crate::assets::Footer;
use crate::certification::CertificationBlock;
use crate::classifier::{classify, GroupedField};
use crate::formatter::ValueFormatter;
use crate::remarks::collect_remarks;
use crate::schema::{
    DatasheetSchema, GroupKind, DESCRIPTION_COLUMN, UPDATED_COLUMN, VERSION_COLUMN,
};
use crate::types::ProductRow;

/// ラベルと値を持つ項目の一覧
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub title: String,
    pub fields: Vec<GroupedField>,
}

/// データシートの本文ブロック（スキーマのグループ順）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// 組成・技術特性・運転条件など
    Fields(Section),

    /// 認証
    Certifications {
        title: String,
        block: CertificationBlock,
    },

    /// 備考（箇条書き）
    Remarks { title: String, items: Vec<String> },
}

impl Block {
    pub fn title(&self) -> &str {
        match self {
            Block::Fields(section) => &section.title,
            Block::Certifications { title, .. } | Block::Remarks { title, .. } => title,
        }
    }
}

/// 1製品分のデータシート
///
/// 値はすべて表示用に整形済みです。同じ入力からは常に同じ構造が得られます。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Datasheet {
    /// 製品名
    pub title: String,
    /// 技術資料のバージョン（`version_ft`）
    pub version: Option<String>,
    /// 最終更新日（`date_maj`、日付形式に再フォーマット済み）
    pub updated: Option<String>,
    /// 説明文
    pub description: Option<String>,
    /// 本文ブロック（値のないグループは含まない）
    pub blocks: Vec<Block>,
    /// フッター
    pub footer: Footer,
}

impl Datasheet {
    /// 行からデータシートを組み立てる
    ///
    /// # 引数
    ///
    /// * `title` - 製品名
    /// * `row` - 選択された行
    /// * `schema` - グループの定義
    /// * `formatter` - 値の整形
    /// * `footer` - 読み込み済みのフッター
    pub(crate) fn build(
        title: &str,
        row: &ProductRow,
        schema: &DatasheetSchema,
        formatter: &ValueFormatter,
        footer: Footer,
    ) -> Self {
        let blocks = schema
            .groups()
            .iter()
            .filter_map(|group| match group.kind() {
                GroupKind::Measured => {
                    let fields = classify(row, group, formatter);
                    (!fields.is_empty()).then(|| {
                        Block::Fields(Section {
                            title: group.title().to_string(),
                            fields,
                        })
                    })
                }
                GroupKind::Certification => CertificationBlock::from_row(row, group, formatter)
                    .map(|block| Block::Certifications {
                        title: group.title().to_string(),
                        block,
                    }),
                GroupKind::Remarks => {
                    let items = collect_remarks(row, group, formatter);
                    (!items.is_empty()).then(|| Block::Remarks {
                        title: group.title().to_string(),
                        items,
                    })
                }
            })
            .collect();

        Self {
            title: title.to_string(),
            version: row.get(VERSION_COLUMN).map(|v| formatter.format(v)),
            updated: row
                .get(UPDATED_COLUMN)
                .map(|v| formatter.format_update_date(v)),
            description: row.get(DESCRIPTION_COLUMN).map(|v| formatter.format(v)),
            blocks,
            footer,
        }
    }

    /// 見出し下のキャプション
    ///
    /// バージョンも更新日もない場合は`None`。片方だけの場合はその部分だけを表示します。
    pub fn caption(&self) -> Option<String> {
        match (&self.version, &self.updated) {
            (Some(version), Some(updated)) => Some(format!(
                "Fiche technique: {} (dernière mise à jour : {})",
                version, updated
            )),
            (Some(version), None) => Some(format!("Fiche technique: {}", version)),
            (None, Some(updated)) => {
                Some(format!("Fiche technique (dernière mise à jour : {})", updated))
            }
            (None, None) => None,
        }
    }
}
