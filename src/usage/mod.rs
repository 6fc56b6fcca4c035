// Usage snapshot and the periodic checker
pub mod checker;
pub mod snapshot;

pub use checker::{UsageChecker, UsageCheckerHandle, UsageEvent};
pub use snapshot::{UsageLevel, UsageSnapshot};
