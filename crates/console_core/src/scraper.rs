//! Service-wide scraper indicator and the start-all / stop-all control.
//!
//! Unlike the view controllers this lives for the whole run; navigation never
//! resets it and its replies carry no generation.

use std::time::Duration;

use crate::effect::RunAction;
use crate::model::{RemoteResult, SystemStatus};

/// Pause between a successful start-all / stop-all and the status re-read.
pub const STATUS_SETTLE_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScraperState {
    #[default]
    Unknown,
    Running,
    Stopped,
}

impl ScraperState {
    pub fn as_str(self) -> &'static str {
        match self {
            ScraperState::Unknown => "unknown",
            ScraperState::Running => "running",
            ScraperState::Stopped => "stopped",
        }
    }
}

/// Why a start-all / stop-all request was not sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScraperRefusal {
    /// Another start-all / stop-all is still settling.
    Busy,
    /// The scraper is already in the requested state.
    AlreadyThere(ScraperState),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScraperControl {
    state: ScraperState,
    pending: Option<RunAction>,
}

impl ScraperControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ScraperState {
        self.state
    }

    pub fn pending(&self) -> Option<RunAction> {
        self.pending
    }

    /// Locks the control for `action`. It stays locked until the next
    /// status reply arrives, successful or not.
    pub fn begin(&mut self, action: RunAction) -> Result<(), ScraperRefusal> {
        if self.pending.is_some() {
            return Err(ScraperRefusal::Busy);
        }
        match (action, self.state) {
            (RunAction::Start, ScraperState::Running) | (RunAction::Stop, ScraperState::Stopped) => {
                Err(ScraperRefusal::AlreadyThere(self.state))
            }
            _ => {
                self.pending = Some(action);
                Ok(())
            }
        }
    }

    /// Installs a status reply and releases the control.
    pub fn apply_status(&mut self, result: &RemoteResult<SystemStatus>) {
        self.state = match result {
            Ok(status) => state_of(status),
            Err(err) => {
                console_logging::console_debug!("Scraper status unavailable: {}", err);
                ScraperState::Unknown
            }
        };
        self.pending = None;
    }

    /// Updates the indicator from a status read elsewhere without touching
    /// the lock.
    pub fn observe(&mut self, status: &SystemStatus) {
        self.state = state_of(status);
    }

    pub fn control_label(&self) -> &'static str {
        match (self.pending, self.state) {
            (Some(RunAction::Start), _) => "Starting all...",
            (Some(RunAction::Stop), _) => "Stopping all...",
            (None, ScraperState::Running) => "Stop all",
            (None, _) => "Start all",
        }
    }
}

fn state_of(status: &SystemStatus) -> ScraperState {
    if status.scraper_running {
        ScraperState::Running
    } else {
        ScraperState::Stopped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RemoteError;

    #[test]
    fn second_request_is_refused_while_pending() {
        let mut control = ScraperControl::new();
        assert_eq!(control.begin(RunAction::Start), Ok(()));
        assert_eq!(control.control_label(), "Starting all...");
        assert_eq!(control.begin(RunAction::Stop), Err(ScraperRefusal::Busy));
    }

    #[test]
    fn failed_status_releases_lock_as_unknown() {
        let mut control = ScraperControl::new();
        control.begin(RunAction::Stop).unwrap();
        control.apply_status(&Err(RemoteError::Transport("refused".to_string())));
        assert_eq!(control.pending(), None);
        assert_eq!(control.state(), ScraperState::Unknown);
        assert_eq!(control.control_label(), "Start all");
    }
}
