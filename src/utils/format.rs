/// Format a GiB figure the way the usage panel shows it, e.g. "12.50 GB"
pub fn format_gb(amount: f64, decimal_places: u8) -> String {
    format!("{:.width$} GB", amount, width = decimal_places as usize)
}

/// Format a ratio (0.0-1.0+) as a percentage with one decimal
pub fn format_percent(ratio: f64) -> String {
    format!("{:.1}%", ratio * 100.0)
}
