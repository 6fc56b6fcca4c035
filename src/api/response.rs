use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::api::error::UsageError;

/// Value of the `response` element when the hash key was accepted
pub const RESPONSE_VALID: &str = "Valid";

/// Usage payload returned by the usage-xml endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageResponse {
    /// Version of the API called
    pub version: String,
    /// `Valid` if all OK, otherwise a free-text error from the server
    pub response: String,
    /// Hash key used for the request
    pub key: String,
    /// Friendly start date string, en-GB locale
    pub usage_start_date: String,
    /// Friendly end date string, en-GB locale
    pub usage_end_date: String,
    /// Period start as a Unix timestamp
    pub usage_start_timestamp: i64,
    /// Period end as a Unix timestamp
    pub usage_end_timestamp: i64,
    /// Peak usage in GiB
    pub usage_peak: f64,
    /// Off-peak usage in GiB
    pub usage_off_peak: f64,
    /// Total usage in GiB
    pub usage_total: f64,
}

impl UsageResponse {
    pub fn is_valid(&self) -> bool {
        self.response == RESPONSE_VALID
    }
}

/// Parse the usage XML document.
///
/// Only leaf elements are read. Element names are compared after lowercasing
/// and stripping `_` and `-`, so `UsagePeak`, `usage_peak` and `usage-peak`
/// all populate the same field. Missing numeric fields default to zero.
pub fn parse_usage_xml(xml: &str) -> Result<UsageResponse, UsageError> {
    let elements = extract_leaf_elements(xml)?;

    let response = elements
        .get("response")
        .cloned()
        .ok_or_else(|| UsageError::Malformed("missing <response> element".to_string()))?;

    let text = |names: &[&str]| -> String {
        names
            .iter()
            .find_map(|name| elements.get(*name))
            .cloned()
            .unwrap_or_default()
    };

    Ok(UsageResponse {
        version: text(&["version"]),
        response,
        key: text(&["key", "hashkey"]),
        usage_start_date: text(&["usagestartdate"]),
        usage_end_date: text(&["usageenddate"]),
        usage_start_timestamp: parse_number(
            &text(&["usagestartdatestring", "usagestarttimestamp"]),
            "usage start timestamp",
        )?,
        usage_end_timestamp: parse_number(
            &text(&["usageenddatestring", "usageendtimestamp"]),
            "usage end timestamp",
        )?,
        usage_peak: parse_number(&text(&["usagepeak"]), "peak usage")?,
        usage_off_peak: parse_number(&text(&["usageoffpeak"]), "off-peak usage")?,
        usage_total: parse_number(&text(&["usagetotal"]), "total usage")?,
    })
}

fn extract_leaf_elements(xml: &str) -> Result<HashMap<String, String>, UsageError> {
    // Leaf elements only: the body may not contain another tag
    let re = Regex::new(r"<([A-Za-z_][\w.\-]*)(?:\s[^>]*)?>([^<]*)</([A-Za-z_][\w.\-]*)\s*>")
        .map_err(|e| UsageError::Malformed(format!("failed to build element pattern: {e}")))?;

    let mut elements = HashMap::new();
    for captures in re.captures_iter(xml) {
        let (open, body, close) = (&captures[1], &captures[2], &captures[3]);
        if open != close {
            continue;
        }
        elements
            .entry(normalize_name(open))
            .or_insert_with(|| decode_entities(body.trim()));
    }

    if elements.is_empty() {
        return Err(UsageError::Malformed("no XML elements found".to_string()));
    }

    Ok(elements)
}

fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

fn parse_number<T>(value: &str, field: &str) -> Result<T, UsageError>
where
    T: std::str::FromStr + Default,
{
    if value.is_empty() {
        return Ok(T::default());
    }
    value
        .parse()
        .map_err(|_| UsageError::Malformed(format!("invalid {field}: '{value}'")))
}
