// Output module
pub mod table;

pub use table::{UsageReport, UsageRow, render_table, usage_rows};
