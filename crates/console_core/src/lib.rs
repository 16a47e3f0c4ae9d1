//! Console core: pure state machines keeping the live views consistent with
//! the server.
//!
//! Nothing here performs I/O. The app feeds [`Msg`]s into [`update`] and
//! executes the returned [`Effect`]s; replies come back as further messages.
mod effect;
mod log_tail;
mod model;
mod msg;
mod results;
mod scraper;
mod session;
mod settings;
mod state;
mod task_list;
mod update;
mod view_model;

pub use effect::{
    Effect, Generation, PatchOrigin, RunAction, TaskMutation, TimerKind, LOG_REFRESH_PERIOD,
    TASK_POLL_PERIOD,
};
pub use log_tail::{
    scroll_after, AutoRefresh, LogApply, LogCursor, LogFetchKind, LogRequest, LogTail,
    ScrollAction, Viewport, LOG_EMPTY_PLACEHOLDER, LOG_LOADING_PLACEHOLDER, SCROLL_EPSILON,
};
pub use model::{
    EnvFile, LogChunk, LoginStateFile, NewTask, Recommendation, RemoteError, RemoteResult,
    ResultItem, ResultPage, SortBy, SortOrder, SystemStatus, Task, TaskId, TaskPatch,
};
pub use msg::Msg;
pub use results::{
    restore_selection, ResultFetch, ResultQuery, ResultRequest, ResultView, ResultsStatus,
    DEFAULT_PAGE_LIMIT, REMEMBERED_SOURCE_KEY,
};
pub use scraper::{ScraperControl, ScraperRefusal, ScraperState, STATUS_SETTLE_DELAY};
pub use session::{View, ViewSession};
pub use settings::{Loadable, PromptEditor, SettingsView};
pub use state::{AppState, Notification, NotificationLevel, MAX_NOTIFICATIONS};
pub use task_list::{
    coerce_max_pages, coerce_text, DraftError, DraftField, EditSession, TaskDraft, TaskList,
    TasksApply, DEFAULT_MAX_PAGES,
};
pub use update::update;
pub use view_model::{
    AppViewModel, LogPane, PaneView, ResultCardView, ResultsPane, ScraperView, SettingsPane,
    TaskRowView, TasksPane,
};
