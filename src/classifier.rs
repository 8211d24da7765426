//! Field Classifier Module
//!
//! 選択された行の列を、列名のプレフィックスに従ってグループ化するモジュール。
//!
//! 列名は`<prefix>_<label>[_<unit>]`の形式です。プレフィックスを除いた残りを
//! `_`で分割し、最初のトークンをラベル、2番目のトークンを単位として扱います。
//! 不正な列や空の値はエラーにせず、表示から省略します。

use crate::formatter::ValueFormatter;
use crate::schema::FieldGroup;
use crate::types::ProductRow;

/// 無次元を表す単位トークン（単位を表示しない）
const DIMENSIONLESS_TOKEN: &str = "adim";

/// 上付き3で表示する単位トークン
const CUBIC_CENTIMETER_TOKEN: &str = "cm3";
const CUBIC_CENTIMETER_DISPLAY: &str = "cm³";

/// プレフィックスを除いた列名の解析結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ColumnName<'a> {
    /// 表示ラベル
    pub label: &'a str,
    /// 単位トークン（なければ空文字列）
    pub unit: &'a str,
    /// 単位より後ろの無視されるトークン
    pub ignored: Vec<&'a str>,
}

impl<'a> ColumnName<'a> {
    /// プレフィックスを除いた列名を解析する
    ///
    /// ラベルが空の場合（`caract_`、`caract__x`）は`None`。
    pub fn parse(rest: &'a str) -> Option<Self> {
        let mut tokens = rest.split('_');
        let label = tokens.next().filter(|label| !label.is_empty())?;
        let unit = tokens.next().unwrap_or("");
        Some(Self {
            label,
            unit,
            ignored: tokens.collect(),
        })
    }
}

/// 単位
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unit {
    /// 単位トークンなし
    None,
    /// `adim`（無次元）: 表示しない
    Dimensionless,
    /// 単位トークン（そのまま保持）
    Measure(String),
}

impl Unit {
    pub fn from_token(token: &str) -> Self {
        match token {
            "" => Unit::None,
            DIMENSIONLESS_TOKEN => Unit::Dimensionless,
            other => Unit::Measure(other.to_string()),
        }
    }

    /// 元の単位トークン（`Measure`のみ）
    pub fn symbol(&self) -> Option<&str> {
        match self {
            Unit::Measure(symbol) => Some(symbol),
            _ => None,
        }
    }

    /// テキスト表示用の単位（`cm3` → `cm³`）
    pub fn display(&self) -> Option<String> {
        self.symbol()
            .map(|symbol| symbol.replace(CUBIC_CENTIMETER_TOKEN, CUBIC_CENTIMETER_DISPLAY))
    }
}

/// グループ化された1項目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupedField {
    /// 表示ラベル（`_`は空白に置換済み）
    pub label: String,
    /// 表示用に整形された値
    pub value: String,
    /// 単位
    pub unit: Unit,
}

impl GroupedField {
    /// 値と単位を空白区切りで連結（例: `120 cm³`）
    pub fn display_value(&self) -> String {
        match self.unit.display() {
            Some(unit) => format!("{} {}", self.value, unit),
            None => self.value.clone(),
        }
    }
}

/// 行の中から、グループに属し値を持つ列を列順に抽出する
///
/// 同じラベルが複数回現れた場合は、最初の位置のまま後の値で上書きします。
pub(crate) fn classify(
    row: &ProductRow,
    group: &FieldGroup,
    formatter: &ValueFormatter,
) -> Vec<GroupedField> {
    let mut fields: Vec<GroupedField> = Vec::new();

    for (column, value) in row.fields() {
        let Some(rest) = group.strip(column) else {
            continue;
        };
        let Some(parsed) = ColumnName::parse(rest) else {
            continue;
        };

        let field = GroupedField {
            label: parsed.label.replace('_', " "),
            value: formatter.format(value),
            unit: Unit::from_token(parsed.unit),
        };

        match fields.iter_mut().find(|f| f.label == field.label) {
            Some(existing) => *existing = field,
            None => fields.push(field),
        }
    }

    fields
}
