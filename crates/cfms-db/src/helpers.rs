//! Row-to-entity parsing helpers.
//!
//! Every repo converts `libsql::Row` (column-indexed) into typed entity
//! structs. These helpers isolate the parsing logic and handle both
//! `SQLite`'s `datetime('now')` format and Rust's `to_rfc3339()`.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;

use crate::error::DatabaseError;

/// Parse a required TEXT column as `DateTime<Utc>`.
///
/// Handles both RFC 3339 (`"2026-02-09T14:30:00+00:00"`) and `SQLite`'s default
/// format (`"2026-02-09 14:30:00"`).
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the string cannot be parsed as either format.
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, DatabaseError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|e| DatabaseError::Query(format!("Failed to parse datetime '{s}': {e}")))
}

/// Parse an optional TEXT column as `Option<DateTime<Utc>>`.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if a non-empty string cannot be parsed.
pub fn parse_optional_datetime(s: Option<&str>) -> Result<Option<DateTime<Utc>>, DatabaseError> {
    match s {
        Some(s) if !s.is_empty() => Ok(Some(parse_datetime(s)?)),
        _ => Ok(None),
    }
}

/// Parse a TEXT column into a serde-deserializable enum.
///
/// Works with every `cfms-core` enum, whatever its `rename_all` casing.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the string does not match any enum variant.
pub fn parse_enum<T: DeserializeOwned>(s: &str) -> Result<T, DatabaseError> {
    serde_json::from_value(serde_json::Value::String(s.to_string()))
        .map_err(|e| DatabaseError::Query(format!("Failed to parse enum from '{s}': {e}")))
}

/// Read a nullable TEXT column. Returns `None` for both SQL NULL and empty string.
///
/// `row.get::<String>(idx)` on a NULL column returns an error, not `""`.
///
/// # Errors
///
/// Returns `DatabaseError` if the column read fails.
pub fn get_opt_string(row: &libsql::Row, idx: i32) -> Result<Option<String>, DatabaseError> {
    match row.get::<Option<String>>(idx)? {
        Some(s) if s.is_empty() => Ok(None),
        other => Ok(other),
    }
}

/// Read an optional datetime column.
///
/// # Errors
///
/// Returns `DatabaseError` if the column read or parse fails.
pub fn get_opt_datetime(row: &libsql::Row, idx: i32) -> Result<Option<DateTime<Utc>>, DatabaseError> {
    parse_optional_datetime(get_opt_string(row, idx)?.as_deref())
}

/// Read an INTEGER 0/1 column as a bool.
///
/// # Errors
///
/// Returns `DatabaseError` if the column read fails.
pub fn get_bool(row: &libsql::Row, idx: i32) -> Result<bool, DatabaseError> {
    Ok(row.get::<i64>(idx)? != 0)
}

/// Parse a JSON TEXT column into `T`. An empty string parses as `T::default()`.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the column holds invalid JSON for `T`.
pub fn parse_json_column<T: DeserializeOwned + Default>(s: &str) -> Result<T, DatabaseError> {
    if s.is_empty() {
        return Ok(T::default());
    }
    serde_json::from_str(s).map_err(|e| DatabaseError::Query(format!("Invalid JSON in column: {e}")))
}

/// Serialize a value for a JSON TEXT column.
///
/// # Errors
///
/// Returns `DatabaseError::Other` if serialization fails.
pub fn to_json_text<T: serde::Serialize>(value: &T) -> Result<String, DatabaseError> {
    serde_json::to_string(value).map_err(|e| DatabaseError::Other(e.into()))
}

/// Bind an optional timestamp as RFC 3339 or NULL.
#[must_use]
pub fn opt_datetime_value(dt: Option<DateTime<Utc>>) -> libsql::Value {
    dt.map_or(libsql::Value::Null, |d| d.to_rfc3339().into())
}

/// Bind an optional string as TEXT or NULL.
#[must_use]
pub fn opt_text_value(s: Option<&str>) -> libsql::Value {
    s.map_or(libsql::Value::Null, Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfms_core::enums::{FolderStatus, Role};
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_both_datetime_formats() {
        let a = parse_datetime("2026-10-19T09:00:00+00:00").unwrap();
        let b = parse_datetime("2026-10-19 09:00:00").unwrap();
        assert_eq!(a, b);
        assert!(parse_datetime("yesterday").is_err());
    }

    #[test]
    fn optional_datetime_treats_empty_as_none() {
        assert_eq!(parse_optional_datetime(Some("")).unwrap(), None);
        assert_eq!(parse_optional_datetime(None).unwrap(), None);
    }

    #[test]
    fn enums_parse_from_stored_tokens() {
        assert_eq!(parse_enum::<FolderStatus>("REJECTED_BY_HOD").unwrap(), FolderStatus::RejectedByHod);
        assert_eq!(parse_enum::<Role>("EVALUATOR").unwrap(), Role::AuditMember);
        assert!(parse_enum::<FolderStatus>("rejected_by_hod").is_err());
    }

    #[test]
    fn json_column_defaults_on_empty() {
        let v: Vec<String> = parse_json_column("").unwrap();
        assert!(v.is_empty());
        let v: Vec<String> = parse_json_column(r#"["a","b"]"#).unwrap();
        assert_eq!(v, vec!["a".to_string(), "b".to_string()]);
        assert!(parse_json_column::<Vec<String>>("{").is_err());
    }
}
