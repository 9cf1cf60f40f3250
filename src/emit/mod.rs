//! Report emission.
//!
//! Turns a materialized [`QueryResult`](crate::db::QueryResult) into either a
//! console line or a CSV file.

mod console;
mod csv;

pub use console::{render_line, write_line};
pub use csv::{escape_field, to_csv, write_csv};
