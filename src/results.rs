//! Rows and result sets returned by the statement executor.

mod result_set;
mod row;

pub use result_set::ResultSet;
pub use row::Row;
