use crate::effect::{Generation, RunAction, TaskMutation, TimerKind};
use crate::log_tail::{AutoRefresh, LogRequest};
use crate::model::{
    LogChunk, NewTask, RemoteResult, ResultPage, SortBy, SortOrder, SystemStatus, Task, TaskId,
};
use crate::session::View;
use crate::task_list::DraftField;

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// Operator switched to another section (or reloaded the current one).
    Navigate(View),
    /// A recurring timer fired.
    TimerFired {
        timer: TimerKind,
        generation: Generation,
    },

    /// Operator toggled log auto-refresh.
    LogAutoRefreshSet(AutoRefresh),
    /// Operator asked for a full log reload.
    LogRefreshClicked,
    /// Operator asked to clear the remote log.
    LogClearClicked,
    /// Operator scrolled the log pane to the given first visible line.
    LogScrolled { top: usize },
    /// Log pane height changed.
    LogViewportResized { height: usize },
    LogFetched {
        generation: Generation,
        request: LogRequest,
        result: RemoteResult<LogChunk>,
    },
    LogCleared {
        generation: Generation,
        result: RemoteResult<()>,
    },

    TaskEditStarted(TaskId),
    TaskDraftChanged {
        id: TaskId,
        field: DraftField,
        value: String,
    },
    TaskEditSaved(TaskId),
    TaskEditCancelled(TaskId),
    TaskEnabledToggled { id: TaskId, enabled: bool },
    TaskRunRequested { id: TaskId, action: RunAction },
    TaskDeleteRequested(TaskId),
    TaskCreateSubmitted(NewTask),
    TasksFetched {
        generation: Generation,
        seq: u64,
        forced: bool,
        result: RemoteResult<Vec<Task>>,
    },
    /// A mutating task request finished; `Ok` carries the server message.
    TaskMutationDone {
        generation: Generation,
        mutation: TaskMutation,
        result: RemoteResult<String>,
    },

    ResultSourcesLoaded {
        generation: Generation,
        result: RemoteResult<Vec<String>>,
        /// Source persisted by an earlier session, read at activation.
        remembered: Option<String>,
    },
    ResultSourceSelected(String),
    RecommendedOnlySet(bool),
    ResultSortSet { by: SortBy, order: SortOrder },
    ResultPageSet(u32),
    ResultsRefreshClicked,
    /// Operator opened the raw record of the card at this index on the page.
    ResultJsonOpened(usize),
    ResultJsonClosed,
    ResultsFetched {
        generation: Generation,
        request: u64,
        result: RemoteResult<ResultPage>,
    },

    StatusLoaded {
        generation: Generation,
        result: RemoteResult<SystemStatus>,
    },
    PromptsListed {
        generation: Generation,
        result: RemoteResult<Vec<String>>,
    },
    PromptSelected(Option<String>),
    PromptEdited(String),
    PromptSaveClicked,
    PromptLoaded {
        generation: Generation,
        filename: String,
        result: RemoteResult<String>,
    },
    PromptSaved {
        generation: Generation,
        filename: String,
        result: RemoteResult<String>,
    },

    /// Operator asked for the service-wide scraper status.
    ScraperStatusRequested,
    ScraperStatusLoaded {
        result: RemoteResult<SystemStatus>,
    },
    /// Operator pressed start-all or stop-all.
    ScraperRunRequested(RunAction),
    ScraperRunDone {
        action: RunAction,
        result: RemoteResult<String>,
    },

    NotificationsDismissed,
    NoOp,
}
