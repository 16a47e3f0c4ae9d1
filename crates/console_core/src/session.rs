use crate::effect::{Effect, Generation, TimerKind};

/// Top-level sections of the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Tasks,
    Results,
    Logs,
    Settings,
}

impl View {
    pub const ALL: [View; 4] = [View::Tasks, View::Results, View::Logs, View::Settings];

    /// Timers a view may own while it is active.
    pub fn timers(self) -> &'static [TimerKind] {
        match self {
            View::Tasks => &[TimerKind::TaskPoll],
            View::Logs => &[TimerKind::LogAutoRefresh],
            View::Results | View::Settings => &[],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            View::Tasks => "tasks",
            View::Results => "results",
            View::Logs => "logs",
            View::Settings => "settings",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        View::ALL
            .into_iter()
            .find(|view| view.as_str().eq_ignore_ascii_case(raw.trim()))
    }
}

/// Lifetime owner for whatever view is on screen.
///
/// Every activation opens a new generation. Effects are tagged with the
/// generation that issued them and replies carrying any other generation are
/// dropped, so nothing started by a torn-down view can touch the next one.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ViewSession {
    active: Option<View>,
    generation: Generation,
}

impl ViewSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<View> {
        self.active
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        self.active.is_some() && generation == self.generation
    }

    /// Tears down the active view and opens a fresh generation for `view`.
    /// Returns the teardown effects; the caller appends activation effects.
    pub fn enter(&mut self, view: View) -> Vec<Effect> {
        let effects = self.teardown();
        self.generation += 1;
        self.active = Some(view);
        console_logging::set_session_generation(self.generation);
        console_logging::console_info!(
            "Entered view {} (generation {})",
            view.as_str(),
            self.generation
        );
        effects
    }

    /// Cancels every timer owned by the active view and leaves no view active.
    pub fn teardown(&mut self) -> Vec<Effect> {
        let Some(view) = self.active.take() else {
            return Vec::new();
        };
        console_logging::console_info!(
            "Tearing down view {} (generation {})",
            view.as_str(),
            self.generation
        );
        view.timers()
            .iter()
            .map(|&timer| Effect::CancelTimer { timer })
            .collect()
    }
}
