// Full-screen usage dashboard
pub mod state;
pub mod terminal;
pub mod ui;

pub use state::{DashboardAction, DashboardState};
pub use terminal::{Dashboard, DashboardExit};
pub use ui::RenderContext;
