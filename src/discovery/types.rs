//! Column type compatibility.

use crate::model::ColumnInfo;

/// Types that compare as equal regardless of declared precision.
const NUMERIC_FAMILY: &[&str] = &[
    "INTEGER", "INT", "BIGINT", "SMALLINT", "DECIMAL", "NUMERIC", "FLOAT", "REAL", "DOUBLE",
];

fn is_numeric(data_type: &str) -> bool {
    NUMERIC_FAMILY
        .iter()
        .any(|t| t.eq_ignore_ascii_case(data_type.trim()))
}

fn is_character(data_type: &str) -> bool {
    let upper = data_type.trim().to_uppercase();
    upper.starts_with("CHAR") || upper.starts_with("VARCHAR")
}

/// Whether values of `child` could reference values of `parent`.
///
/// Compatible when the type, length and scale match exactly; when both are
/// numeric; or when both are character types and the child is no longer
/// than the parent (unknown lengths are accepted).
pub fn is_type_compatible(child: &ColumnInfo, parent: &ColumnInfo) -> bool {
    if child.data_type.trim().eq_ignore_ascii_case(parent.data_type.trim())
        && child.length == parent.length
        && child.scale == parent.scale
    {
        return true;
    }

    if is_numeric(&child.data_type) && is_numeric(&parent.data_type) {
        return true;
    }

    if is_character(&child.data_type) && is_character(&parent.data_type) {
        return match (child.length, parent.length) {
            (Some(c), Some(p)) => c <= p,
            _ => true,
        };
    }

    false
}
