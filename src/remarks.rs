//! Remarks Module
//!
//! `obs_*` / `observation_*`列の自由記述を列順に収集する。

use crate::formatter::ValueFormatter;
use crate::schema::FieldGroup;
use crate::types::ProductRow;

/// 備考を列順に収集する（値のない列は含まない）
pub(crate) fn collect_remarks(
    row: &ProductRow,
    group: &FieldGroup,
    formatter: &ValueFormatter,
) -> Vec<String> {
    row.fields()
        .filter(|(column, _)| group.strip(column).is_some())
        .map(|(_, value)| formatter.format(value))
        .collect()
}
