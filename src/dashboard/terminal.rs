// Terminal lifecycle and event loop for the usage dashboard
use anyhow::Result;
use chrono::Utc;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::time::interval;

use crate::dashboard::state::{DashboardAction, DashboardState};
use crate::dashboard::ui::{self, RenderContext};
use crate::storage::SettingsStore;
use crate::usage::{UsageChecker, UsageCheckerHandle, UsageEvent};

const REFRESH_RATE: Duration = Duration::from_millis(200);

/// How the dashboard was closed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardExit {
    Quit,
    Logout,
}

pub struct Dashboard {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    state: DashboardState,
}

impl Dashboard {
    pub fn new(allowance_gib: Option<f64>) -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(Dashboard {
            terminal,
            state: DashboardState::new(allowance_gib),
        })
    }

    pub async fn run(
        &mut self,
        checker: &Arc<UsageChecker>,
        handle: &UsageCheckerHandle,
        store: &SettingsStore,
        mut events: broadcast::Receiver<UsageEvent>,
        render_ctx: &RenderContext<'_>,
    ) -> Result<DashboardExit> {
        let mut refresh_timer = interval(REFRESH_RATE);
        let mut last_terminal_size = self.terminal.size()?;

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Ok(usage_event) => {
                        self.state.apply_event(usage_event, Utc::now());
                        self.state.sync_cached(checker.current_usage());
                        self.state.set_allowance(store.allowance().unwrap_or_else(|e| {
                            tracing::warn!(error = %e, "cannot read allowance");
                            None
                        }));
                    }
                    Err(RecvError::Lagged(_)) => {
                        self.state.catch_up(checker.current_usage());
                    }
                    Err(RecvError::Closed) => return Ok(DashboardExit::Quit),
                },

                _ = refresh_timer.tick() => {
                    let current_size = self.terminal.size()?;
                    if current_size != last_terminal_size {
                        last_terminal_size = current_size;
                        self.terminal.clear()?;
                    }

                    let state = &self.state;
                    self.terminal.draw(|f| ui::render(f, state, render_ctx))?;

                    if crossterm::event::poll(Duration::from_millis(10))? {
                        if let Event::Key(key) = event::read()? {
                            match self.state.handle_key(key) {
                                DashboardAction::Quit => return Ok(DashboardExit::Quit),
                                DashboardAction::Logout => return Ok(DashboardExit::Logout),
                                DashboardAction::Refresh => handle.refresh(),
                                DashboardAction::None => {}
                            }
                        }
                    }
                }
            }
        }
    }

    pub fn cleanup(&mut self) -> Result<()> {
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

impl Drop for Dashboard {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}
