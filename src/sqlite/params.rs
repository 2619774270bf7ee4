use rusqlite::types::Value;
use rusqlite::{Rows, Statement, ToSql};

use crate::types::{Params, RowValues};

/// Convert a single `RowValue` to a rusqlite `Value`.
#[must_use]
pub fn row_value_to_sqlite_value(value: &RowValues) -> Value {
    match value {
        RowValues::Int(i) => Value::Integer(*i),
        RowValues::Float(f) => Value::Real(*f),
        RowValues::Text(s) => Value::Text(s.clone()),
        RowValues::Bool(b) => Value::Integer(i64::from(*b)),
        RowValues::Timestamp(dt) => Value::Text(dt.format("%F %T%.f").to_string()),
        RowValues::Null => Value::Null,
        RowValues::JSON(jval) => Value::Text(jval.to_string()),
        RowValues::Blob(bytes) => Value::Blob(bytes.clone()),
    }
}

/// Parameters converted to `SQLite` values, in the style the caller chose.
#[derive(Debug, Clone)]
pub enum Bound {
    Positional(Vec<Value>),
    /// Keys carry their `:` prefix, as rusqlite expects.
    Named(Vec<(String, Value)>),
}

impl Bound {
    #[must_use]
    pub fn convert(params: &Params) -> Self {
        match params {
            Params::Positional(values) => {
                Bound::Positional(values.iter().map(row_value_to_sqlite_value).collect())
            }
            Params::Named(pairs) => Bound::Named(
                pairs
                    .iter()
                    .map(|(name, value)| (format!(":{name}"), row_value_to_sqlite_value(value)))
                    .collect(),
            ),
        }
    }

    fn named_refs(pairs: &[(String, Value)]) -> Vec<(&str, &dyn ToSql)> {
        pairs
            .iter()
            .map(|(name, value)| (name.as_str(), value as &dyn ToSql))
            .collect()
    }

    /// Bind and run a statement that does not return rows.
    ///
    /// # Errors
    /// Returns the driver error if binding or execution fails.
    pub fn execute(&self, stmt: &mut Statement<'_>) -> rusqlite::Result<usize> {
        match self {
            Bound::Positional(values) => stmt.execute(rusqlite::params_from_iter(values.iter())),
            Bound::Named(pairs) => stmt.execute(Self::named_refs(pairs).as_slice()),
        }
    }

    /// Bind and start iterating a row-returning statement.
    ///
    /// # Errors
    /// Returns the driver error if binding fails.
    pub fn query<'s>(&self, stmt: &'s mut Statement<'_>) -> rusqlite::Result<Rows<'s>> {
        match self {
            Bound::Positional(values) => stmt.query(rusqlite::params_from_iter(values.iter())),
            Bound::Named(pairs) => stmt.query(Self::named_refs(pairs).as_slice()),
        }
    }
}
