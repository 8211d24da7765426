//! Schema Module
//!
//! 列名の命名規則（`<prefix>_<label>[_<unit>]`）を宣言的なスキーマとして表現し、
//! カタログ読み込み時にヘッダー行を検証するモジュール。

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::classifier::ColumnName;

/// 製品名の列
pub(crate) const NAME_COLUMN: &str = "nom";
/// 最終更新日の列
pub(crate) const UPDATED_COLUMN: &str = "date_maj";
/// 技術資料のバージョンの列
pub(crate) const VERSION_COLUMN: &str = "version_ft";
/// 説明文の列
pub(crate) const DESCRIPTION_COLUMN: &str = "description";

/// 欠けていても描画は続行されるが、警告の対象となる固定列
const EXPECTED_COLUMNS: &[&str] = &[UPDATED_COLUMN, VERSION_COLUMN, DESCRIPTION_COLUMN];

/// グループの種類
///
/// 種類によって、列名の2番目以降のトークンの意味が変わります。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKind {
    /// `<prefix>_<label>[_<unit>]`: ラベルと単位を持つ数値・文字列項目
    Measured,
    /// 認証ラベル（PMUC/BAMの関連項目を伴う）
    Certification,
    /// 自由記述の備考（列名の残りは無視される）
    Remarks,
}

/// 表示グループの定義
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldGroup {
    title: String,
    prefixes: Vec<String>,
    kind: GroupKind,
}

impl FieldGroup {
    /// ラベルと単位を持つグループ
    pub fn measured(title: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            prefixes: vec![prefix.into()],
            kind: GroupKind::Measured,
        }
    }

    /// 認証グループ
    pub fn certification(title: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            prefixes: vec![prefix.into()],
            kind: GroupKind::Certification,
        }
    }

    /// 備考グループ（複数のプレフィックスを受け付ける）
    pub fn remarks<I, S>(title: impl Into<String>, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            title: title.into(),
            prefixes: prefixes.into_iter().map(Into::into).collect(),
            kind: GroupKind::Remarks,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    pub fn kind(&self) -> GroupKind {
        self.kind
    }

    /// 列名がこのグループに属する場合、プレフィックスを除いた残りを返す
    pub fn strip<'a>(&self, column: &'a str) -> Option<&'a str> {
        self.prefixes
            .iter()
            .find_map(|prefix| column.strip_prefix(prefix.as_str()))
    }
}

/// データシートのスキーマ
///
/// グループは表示順に並びます。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasheetSchema {
    groups: Vec<FieldGroup>,
}

impl Default for DatasheetSchema {
    fn default() -> Self {
        Self {
            groups: vec![
                FieldGroup::measured("🔬 Composition moyenne", "composition_"),
                FieldGroup::measured("📐 Caractéristiques techniques", "caract_"),
                FieldGroup::measured("⚙️ Paramètres de fonctionnement (non associés)", "param_"),
                FieldGroup::certification("🛡️ Homologation(s)", "homologation_"),
                FieldGroup::remarks(
                    "🗨️ Informations complémentaires",
                    ["obs_", "observation_"],
                ),
            ],
        }
    }
}

impl DatasheetSchema {
    pub fn new(groups: Vec<FieldGroup>) -> Self {
        Self { groups }
    }

    pub fn groups(&self) -> &[FieldGroup] {
        &self.groups
    }

    /// 指定した種類の最初のグループ
    pub fn group_of_kind(&self, kind: GroupKind) -> Option<&FieldGroup> {
        self.groups.iter().find(|g| g.kind == kind)
    }

    /// 列名が属するグループ（最初に一致したもの）
    pub fn group_for<'a, 'c>(&'a self, column: &'c str) -> Option<(&'a FieldGroup, &'c str)> {
        self.groups
            .iter()
            .find_map(|group| group.strip(column).map(|rest| (group, rest)))
    }

    /// ヘッダー行を検証する
    ///
    /// 問題のある列は報告されるだけで、読み込みは失敗しません。
    pub fn validate(&self, columns: &[String]) -> SchemaReport {
        let mut issues = Vec::new();
        let mut seen_columns: HashMap<&str, usize> = HashMap::new();
        let mut seen_labels: HashMap<(usize, &str), &str> = HashMap::new();

        for (col_idx, column) in columns.iter().enumerate() {
            if column.is_empty() {
                issues.push(SchemaIssue::new(
                    format!("#{}", col_idx + 1),
                    SchemaIssueKind::EmptyHeader,
                ));
                continue;
            }

            if seen_columns.insert(column.as_str(), col_idx).is_some() {
                issues.push(SchemaIssue::new(column, SchemaIssueKind::DuplicateColumn));
                continue;
            }

            let Some((group, rest)) = self.group_for(column) else {
                continue;
            };
            if group.kind != GroupKind::Measured {
                continue;
            }

            let group_idx = self
                .groups
                .iter()
                .position(|g| g == group)
                .unwrap_or_default();

            match ColumnName::parse(rest) {
                None => issues.push(SchemaIssue::new(column, SchemaIssueKind::MissingLabel)),
                Some(parsed) => {
                    if !parsed.ignored.is_empty() {
                        issues.push(SchemaIssue::new(
                            column,
                            SchemaIssueKind::ExtraTokens {
                                ignored: parsed.ignored.join("_"),
                            },
                        ));
                    }
                    let key = (group_idx, parsed.label);
                    if let Some(first) = seen_labels.insert(key, column.as_str()) {
                        issues.push(SchemaIssue::new(
                            column,
                            SchemaIssueKind::DuplicateLabel {
                                label: parsed.label.to_string(),
                                first: first.to_string(),
                            },
                        ));
                    }
                }
            }
        }

        for expected in EXPECTED_COLUMNS {
            if !columns.iter().any(|c| c == expected) {
                issues.push(SchemaIssue::new(*expected, SchemaIssueKind::MissingColumn));
            }
        }

        SchemaReport { issues }
    }
}

/// スキーマ違反の種類
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SchemaIssueKind {
    /// ヘッダーが空の列
    EmptyHeader,
    /// 同名の列が複数存在する（最初の列のみ使用）
    DuplicateColumn,
    /// プレフィックスの後にラベルがない（例: `caract_`）
    MissingLabel,
    /// 単位より後ろのトークンは無視される（例: `param_temp_max_c`）
    ExtraTokens { ignored: String },
    /// 同じグループ内で同じラベルを持つ列（後の列の値で上書き）
    DuplicateLabel { label: String, first: String },
    /// 固定列（`date_maj`など）が存在しない
    MissingColumn,
}

/// スキーマ違反
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaIssue {
    pub column: String,
    #[serde(flatten)]
    pub kind: SchemaIssueKind,
}

impl SchemaIssue {
    fn new(column: impl Into<String>, kind: SchemaIssueKind) -> Self {
        Self {
            column: column.into(),
            kind,
        }
    }
}

impl fmt::Display for SchemaIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            SchemaIssueKind::EmptyHeader => write!(f, "column {} has an empty header", self.column),
            SchemaIssueKind::DuplicateColumn => {
                write!(f, "column '{}' appears more than once", self.column)
            }
            SchemaIssueKind::MissingLabel => {
                write!(f, "column '{}' has no label after its prefix", self.column)
            }
            SchemaIssueKind::ExtraTokens { ignored } => write!(
                f,
                "column '{}' has extra tokens after the unit ('{}' ignored)",
                self.column, ignored
            ),
            SchemaIssueKind::DuplicateLabel { label, first } => write!(
                f,
                "column '{}' repeats label '{}' already used by '{}'",
                self.column, label, first
            ),
            SchemaIssueKind::MissingColumn => {
                write!(f, "expected column '{}' is missing", self.column)
            }
        }
    }
}

/// ヘッダー検証の結果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchemaReport {
    issues: Vec<SchemaIssue>,
}

impl SchemaReport {
    pub fn issues(&self) -> &[SchemaIssue] {
        &self.issues
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}
