//! Shared constants for the declarations and trace formats.

/// Value written when a column value is absent and the category has no `null` literal.
pub const NONSENSICAL: &str = "nonsensical";

/// Literal used for a missing string or hashcode value.
pub const NULL_LITERAL: &str = "null";

/// Value written for a null indicator when the column holds a value.
///
/// Indicators are declared as `hashcode`, so any non-zero hashcode works; `1` is used
/// everywhere so traces stay diffable across runs.
pub const NOT_NULL_SENTINEL: &str = "1";

/// Suffix appended to the escaped field name to build its null indicator name.
pub const NULL_INDICATOR_SUFFIX: &str = "__IS_NULL__";

/// Representation type of a null indicator variable.
pub const NULL_INDICATOR_REP_TYPE: &str = "hashcode";

/// Comparability tag shared by all null indicator variables.
pub const NULL_INDICATOR_COMPARABILITY: &str = "8";

/// Suffix of every program point name.
pub const POINT_SUFFIX: &str = ":::POINT";

/// Modifier written next to a present value.
pub const MODIFIED: &str = "1";

/// Modifier written next to a `nonsensical` value.
pub const MODIFIED_NONSENSICAL: &str = "2";
