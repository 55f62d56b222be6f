//! Driver-independent pieces of LuaSQL Rust.
//!
//! - `Error` with the messages scripts see
//! - `Value`, `Row` and `RowCursor` for buffered results
//! - fetch-mode handling and the `nil, message` failure convention

pub mod error;
pub mod fetch;
pub mod lua;
pub mod row;
pub mod value;

pub use error::{
    ConfigError, ConnectionError, ConnectionErrorKind, Error, QueryError, QueryErrorKind, Result,
};
pub use fetch::{FetchMode, fill_table, row_to_values, string_list};
pub use lua::{LUASQL_PREFIX, ObjectKind, already_closed, fail, respond, set_info};
pub use row::{ColumnInfo, DeferredError, NextSet, ResultSet, Row, RowCursor};
pub use value::Value;
