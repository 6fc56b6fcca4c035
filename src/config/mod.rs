pub mod settings;

pub use settings::{AlertsConfig, ApiConfig, Config, OutputConfig, PollingConfig};
