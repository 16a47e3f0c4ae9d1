use std::time::Duration;

use crate::log_tail::LogRequest;
use crate::model::{NewTask, TaskId, TaskPatch};
use crate::results::ResultFetch;

/// Identifies the view session that issued an effect.
pub type Generation = u64;

pub const LOG_REFRESH_PERIOD: Duration = Duration::from_secs(1);
pub const TASK_POLL_PERIOD: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    LogAutoRefresh,
    TaskPoll,
}

impl TimerKind {
    pub fn period(self) -> Duration {
        match self {
            TimerKind::LogAutoRefresh => LOG_REFRESH_PERIOD,
            TimerKind::TaskPoll => TASK_POLL_PERIOD,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunAction {
    Start,
    Stop,
}

/// Where a task patch came from; echoed back so the reply can be routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOrigin {
    Edit,
    Toggle,
}

/// A mutating task request, echoed back in its completion message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskMutation {
    Edit(TaskId),
    Toggle(TaskId),
    Delete(TaskId),
    Run(TaskId, RunAction),
    Create,
}

impl TaskMutation {
    pub(crate) fn fallback_error(self) -> &'static str {
        match self {
            TaskMutation::Edit(_) | TaskMutation::Toggle(_) => "Failed to update task.",
            TaskMutation::Delete(_) => "Failed to delete task.",
            TaskMutation::Run(_, RunAction::Start) => "Failed to start task.",
            TaskMutation::Run(_, RunAction::Stop) => "Failed to stop task.",
            TaskMutation::Create => "Failed to create task.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    StartTimer {
        timer: TimerKind,
        period: Duration,
        generation: Generation,
    },
    CancelTimer {
        timer: TimerKind,
    },
    FetchLog {
        generation: Generation,
        request: LogRequest,
    },
    ClearLog {
        generation: Generation,
    },
    FetchTasks {
        generation: Generation,
        seq: u64,
        forced: bool,
    },
    CreateTask {
        generation: Generation,
        task: NewTask,
    },
    PatchTask {
        generation: Generation,
        id: TaskId,
        patch: TaskPatch,
        origin: PatchOrigin,
    },
    DeleteTask {
        generation: Generation,
        id: TaskId,
    },
    RunTask {
        generation: Generation,
        id: TaskId,
        action: RunAction,
    },
    ListResultSources {
        generation: Generation,
    },
    FetchResults {
        generation: Generation,
        fetch: ResultFetch,
    },
    RememberSource {
        source: String,
    },
    FetchStatus {
        generation: Generation,
    },
    ListPrompts {
        generation: Generation,
    },
    LoadPrompt {
        generation: Generation,
        filename: String,
    },
    SavePrompt {
        generation: Generation,
        filename: String,
        content: String,
    },
    /// Reads the scraper status after `delay`; not tied to any view.
    FetchScraperStatus {
        delay: Duration,
    },
    RunAllTasks {
        action: RunAction,
    },
}

impl Effect {
    pub(crate) fn start_timer(timer: TimerKind, generation: Generation) -> Self {
        Effect::StartTimer {
            timer,
            period: timer.period(),
            generation,
        }
    }
}
