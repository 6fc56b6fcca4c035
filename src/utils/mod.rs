// Utility functions module
pub mod date_format;
pub mod format;

pub use date_format::{DateFormat, DateFormatter, DisplayTimezone};
pub use format::{format_gb, format_percent};
