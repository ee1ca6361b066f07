//! Reserved column labels of storage tables.

/// Column holding the point timestamp.
pub const DEFAULT_TIME_COL: &str = "_time";
/// Column holding the measured field value.
pub const DEFAULT_VALUE_COL: &str = "_value";
/// Column holding the window start of the table.
pub const DEFAULT_START_COL: &str = "_start";
/// Column holding the window stop of the table.
pub const DEFAULT_STOP_COL: &str = "_stop";
/// Tag carrying the measurement name.
pub const MEASUREMENT_COL: &str = "_measurement";
/// Tag carrying the field key.
pub const FIELD_COL: &str = "_field";

/// Whether `column` names the time or value column, which storage cannot group on.
pub fn is_time_or_value(column: &str) -> bool {
    column == DEFAULT_TIME_COL || column == DEFAULT_VALUE_COL
}
