pub mod notifications;
pub mod system;
pub mod thresholds;

pub use notifications::NotificationHandler;
pub use system::AlertSystem;
pub use thresholds::{AlertPriority, AlertType, NotificationState, ThresholdTracker};
