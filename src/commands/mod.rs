// Command handlers module
pub mod config;
pub mod context;
pub mod dashboard;
pub mod login;
pub mod settings;
pub mod status;
pub mod watch;

// Re-export command handlers for easy access
pub use config::handle_config_action;
pub use context::{AppContext, handle_error};
pub use dashboard::handle_dashboard_command;
pub use login::{handle_login_command, handle_logout_command};
pub use settings::{handle_settings_command, handle_test_notification_command};
pub use status::handle_status_command;
pub use watch::handle_watch_command;
