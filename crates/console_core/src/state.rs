use std::collections::VecDeque;

use crate::log_tail::LogTail;
use crate::results::ResultView;
use crate::scraper::ScraperControl;
use crate::session::{View, ViewSession};
use crate::settings::SettingsView;
use crate::task_list::TaskList;
use crate::view_model::{self, AppViewModel, PaneView};

/// How many notifications are kept on screen.
pub const MAX_NOTIFICATIONS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    pub(crate) session: ViewSession,
    pub(crate) logs: LogTail,
    pub(crate) tasks: TaskList,
    pub(crate) results: ResultView,
    pub(crate) settings: SettingsView,
    pub(crate) scraper: ScraperControl,
    notifications: VecDeque<Notification>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self) -> &ViewSession {
        &self.session
    }

    pub fn logs(&self) -> &LogTail {
        &self.logs
    }

    pub fn tasks(&self) -> &TaskList {
        &self.tasks
    }

    pub fn results(&self) -> &ResultView {
        &self.results
    }

    pub fn settings(&self) -> &SettingsView {
        &self.settings
    }

    pub fn scraper(&self) -> &ScraperControl {
        &self.scraper
    }

    pub fn notifications(&self) -> impl Iterator<Item = &Notification> {
        self.notifications.iter()
    }

    pub fn view(&self) -> AppViewModel {
        let pane = match self.session.active() {
            None => PaneView::Blank,
            Some(View::Tasks) => PaneView::Tasks(view_model::tasks_pane(&self.tasks)),
            Some(View::Results) => PaneView::Results(view_model::results_pane(&self.results)),
            Some(View::Logs) => PaneView::Logs(view_model::log_pane(&self.logs)),
            Some(View::Settings) => PaneView::Settings(view_model::settings_pane(&self.settings)),
        };
        AppViewModel {
            view: self.session.active(),
            generation: self.session.generation(),
            scraper: view_model::scraper_view(&self.scraper),
            notifications: self.notifications.iter().cloned().collect(),
            pane,
            dirty: self.dirty,
        }
    }

    /// Returns whether a render is due and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn is_active(&self, view: View) -> bool {
        self.session.active() == Some(view)
    }

    pub(crate) fn notify(&mut self, level: NotificationLevel, text: impl Into<String>) {
        if self.notifications.len() == MAX_NOTIFICATIONS {
            self.notifications.pop_front();
        }
        self.notifications.push_back(Notification {
            level,
            text: text.into(),
        });
        self.dirty = true;
    }

    pub(crate) fn dismiss_notifications(&mut self) {
        if !self.notifications.is_empty() {
            self.notifications.clear();
            self.dirty = true;
        }
    }
}
