use anyhow::{Result, anyhow};
use chrono::{DateTime, Local, Utc};
use chrono_tz::Tz;

/// Supported date format options for billing period display
#[derive(Debug, Clone, PartialEq)]
pub enum DateFormat {
    Long,         // Thursday, 1 October 2026
    YearMonthDay, // yyyy-mm-dd (ISO)
    DayMonthYear, // dd-mm-yyyy (European)
    MonthDayYear, // mm-dd-yyyy (American)
}

impl DateFormat {
    /// Parse a date format string from config
    pub fn from_config_str(format_str: &str) -> Result<Self> {
        match format_str.to_lowercase().as_str() {
            "long" => Ok(DateFormat::Long),
            "yyyy-mm-dd" => Ok(DateFormat::YearMonthDay),
            "dd-mm-yyyy" => Ok(DateFormat::DayMonthYear),
            "mm-dd-yyyy" => Ok(DateFormat::MonthDayYear),
            _ => Err(anyhow!(
                "Invalid date format '{}'. Supported formats: long, yyyy-mm-dd, dd-mm-yyyy, mm-dd-yyyy",
                format_str
            )),
        }
    }

    /// Get the chrono format string for this date format
    pub fn to_chrono_format(&self) -> &'static str {
        match self {
            DateFormat::Long => "%A, %-d %B %Y",
            DateFormat::YearMonthDay => "%Y-%m-%d",
            DateFormat::DayMonthYear => "%d-%m-%Y",
            DateFormat::MonthDayYear => "%m-%d-%Y",
        }
    }

    fn to_chrono_format_with_time(&self) -> &'static str {
        match self {
            DateFormat::Long => "%A, %-d %B %Y %H:%M",
            DateFormat::YearMonthDay => "%Y-%m-%d %H:%M",
            DateFormat::DayMonthYear => "%d-%m-%Y %H:%M",
            DateFormat::MonthDayYear => "%m-%d-%Y %H:%M",
        }
    }
}

/// Timezone used when rendering timestamps
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayTimezone {
    Local,
    Named(Tz),
}

impl DisplayTimezone {
    pub fn parse(name: &str) -> Result<Self> {
        if name.eq_ignore_ascii_case("local") {
            return Ok(DisplayTimezone::Local);
        }
        name.parse::<Tz>()
            .map(DisplayTimezone::Named)
            .map_err(|_| anyhow!("Unknown timezone '{}'. Use \"local\" or an IANA name such as Europe/London", name))
    }

    fn format(&self, datetime: &DateTime<Utc>, pattern: &str) -> String {
        match self {
            DisplayTimezone::Local => datetime.with_timezone(&Local).format(pattern).to_string(),
            DisplayTimezone::Named(tz) => datetime.with_timezone(tz).format(pattern).to_string(),
        }
    }
}

/// Utility struct for formatting dates according to configuration
#[derive(Debug, Clone)]
pub struct DateFormatter {
    format: DateFormat,
    timezone: DisplayTimezone,
}

impl DateFormatter {
    pub fn new(config_format: &str, timezone: &str) -> Result<Self> {
        Ok(Self {
            format: DateFormat::from_config_str(config_format)?,
            timezone: DisplayTimezone::parse(timezone)?,
        })
    }

    pub fn format_date(&self, datetime: &DateTime<Utc>) -> String {
        self.timezone.format(datetime, self.format.to_chrono_format())
    }

    pub fn format_datetime_with_time(&self, datetime: &DateTime<Utc>) -> String {
        self.timezone.format(datetime, self.format.to_chrono_format_with_time())
    }

    /// JSON output always uses RFC 3339 regardless of config
    pub fn format_for_json(&self, datetime: &DateTime<Utc>) -> String {
        datetime.to_rfc3339()
    }
}
