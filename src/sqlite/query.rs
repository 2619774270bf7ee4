use rusqlite::Statement;
use rusqlite::types::Value;

use super::params::Bound;
use crate::error::SqlWebError;
use crate::results::ResultSet;
use crate::types::RowValues;

/// Extract a `RowValues` from a `SQLite` row.
///
/// # Errors
///
/// Returns `SqlWebError` if the value cannot be read.
pub fn sqlite_extract_value_sync(
    row: &rusqlite::Row,
    idx: usize,
) -> Result<RowValues, SqlWebError> {
    let value: Value = row.get(idx)?;
    match value {
        Value::Null => Ok(RowValues::Null),
        Value::Integer(i) => Ok(RowValues::Int(i)),
        Value::Real(f) => Ok(RowValues::Float(f)),
        Value::Text(s) => Ok(RowValues::Text(s)),
        Value::Blob(b) => Ok(RowValues::Blob(b)),
    }
}

/// Run a prepared statement and collect its rows.
///
/// `limit` stops reading after that many rows; `select_one` only ever needs the first.
///
/// # Errors
/// Returns `SqlWebError` if binding, execution or value extraction fails.
pub fn build_result_set(
    stmt: &mut Statement<'_>,
    params: &Bound,
    limit: Option<usize>,
) -> Result<ResultSet, SqlWebError> {
    let column_names: Vec<String> = stmt
        .column_names()
        .iter()
        .map(std::string::ToString::to_string)
        .collect();
    let col_count = column_names.len();

    let mut result_set = ResultSet::with_capacity(column_names, limit.unwrap_or(10).min(64));
    let mut rows_iter = params.query(stmt)?;

    while let Some(row) = rows_iter.next()? {
        let mut row_values = Vec::with_capacity(col_count);
        for i in 0..col_count {
            row_values.push(sqlite_extract_value_sync(row, i)?);
        }
        result_set.add_row_values(row_values);

        if limit.is_some_and(|max| result_set.len() >= max) {
            break;
        }
    }

    Ok(result_set)
}
