use thiserror::Error;

/// Failures talking to the usage API
#[derive(Debug, Error)]
pub enum UsageError {
    #[error("Invalid Hash Code")]
    InvalidHashCode,

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("usage API returned HTTP {0}")]
    Status(reqwest::StatusCode),

    #[error("malformed usage response: {0}")]
    Malformed(String),
}

impl UsageError {
    /// Message shown to the user when a fetch fails
    pub fn user_message(&self) -> String {
        format!("Could not get usage information: {}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_wraps_error() {
        assert_eq!(
            UsageError::InvalidHashCode.user_message(),
            "Could not get usage information: Invalid Hash Code"
        );
        assert_eq!(
            UsageError::Malformed("missing <response> element".to_string()).user_message(),
            "Could not get usage information: malformed usage response: missing <response> element"
        );
    }
}
