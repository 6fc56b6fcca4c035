// Aquiss usage API
pub mod client;
pub mod error;
pub mod response;

pub use client::UsageApiClient;
pub use error::UsageError;
pub use response::{UsageResponse, parse_usage_xml};
