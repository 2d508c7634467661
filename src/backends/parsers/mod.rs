pub mod table;

pub use table::{TableRow, parse_table};
