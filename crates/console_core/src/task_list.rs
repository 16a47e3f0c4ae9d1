//! Periodically refreshed task table with inline editing.
//!
//! Edit drafts live beside the rendered rows, never inside them. A background
//! poll reply is dropped whole while any row is being edited; a refresh that
//! follows the operator's own action replaces the rows regardless.

use std::collections::{BTreeMap, BTreeSet};

use crate::effect::RunAction;
use crate::model::{RemoteResult, Task, TaskId, TaskPatch};

/// Page count used when the draft value is blank or not a positive integer.
pub const DEFAULT_MAX_PAGES: u32 = 3;

/// Parses a page-count field, falling back to [`DEFAULT_MAX_PAGES`].
pub fn coerce_max_pages(raw: &str) -> u32 {
    match raw.trim().parse::<u32>() {
        Ok(pages) if pages >= 1 => pages,
        _ => DEFAULT_MAX_PAGES,
    }
}

/// Blank or whitespace-only text means "unset", not an empty string.
pub fn coerce_text(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "on" | "yes"
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftField {
    TaskName,
    Keyword,
    MinPrice,
    MaxPrice,
    MaxPages,
    Cron,
    PersonalOnly,
    Enabled,
}

impl DraftField {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "task_name" | "name" => Some(DraftField::TaskName),
            "keyword" => Some(DraftField::Keyword),
            "min_price" => Some(DraftField::MinPrice),
            "max_price" => Some(DraftField::MaxPrice),
            "max_pages" => Some(DraftField::MaxPages),
            "cron" => Some(DraftField::Cron),
            "personal_only" => Some(DraftField::PersonalOnly),
            "enabled" => Some(DraftField::Enabled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftError {
    MissingName,
    MissingKeyword,
}

impl DraftError {
    pub fn message(self) -> &'static str {
        match self {
            DraftError::MissingName | DraftError::MissingKeyword => {
                "Task name and keyword must not be empty."
            }
        }
    }
}

/// Raw input values of a row under edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    pub task_name: String,
    pub keyword: String,
    pub min_price: String,
    pub max_price: String,
    pub max_pages: String,
    pub cron: String,
    pub personal_only: bool,
    pub enabled: bool,
}

impl TaskDraft {
    pub fn from_task(task: &Task) -> Self {
        Self {
            task_name: task.task_name.clone(),
            keyword: task.keyword.clone(),
            min_price: task.min_price.clone().unwrap_or_default(),
            max_price: task.max_price.clone().unwrap_or_default(),
            max_pages: task.max_pages.to_string(),
            cron: task.cron.clone().unwrap_or_default(),
            personal_only: task.personal_only,
            enabled: task.enabled,
        }
    }

    pub fn set(&mut self, field: DraftField, value: &str) {
        match field {
            DraftField::TaskName => self.task_name = value.to_string(),
            DraftField::Keyword => self.keyword = value.to_string(),
            DraftField::MinPrice => self.min_price = value.to_string(),
            DraftField::MaxPrice => self.max_price = value.to_string(),
            DraftField::MaxPages => self.max_pages = value.to_string(),
            DraftField::Cron => self.cron = value.to_string(),
            DraftField::PersonalOnly => self.personal_only = parse_flag(value),
            DraftField::Enabled => self.enabled = parse_flag(value),
        }
    }

    /// Builds the patch sent on save, applying the coercion rules.
    pub fn to_patch(&self) -> Result<TaskPatch, DraftError> {
        let task_name = coerce_text(&self.task_name).ok_or(DraftError::MissingName)?;
        let keyword = coerce_text(&self.keyword).ok_or(DraftError::MissingKeyword)?;
        Ok(TaskPatch {
            task_name: Some(task_name),
            keyword: Some(keyword),
            min_price: Some(coerce_text(&self.min_price)),
            max_price: Some(coerce_text(&self.max_price)),
            personal_only: Some(self.personal_only),
            enabled: Some(self.enabled),
            max_pages: Some(coerce_max_pages(&self.max_pages)),
            cron: Some(coerce_text(&self.cron)),
        })
    }
}

/// A row in edit mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    pub task_id: TaskId,
    pub draft: TaskDraft,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingRun {
    action: RunAction,
    /// Sequence of the refresh that ends the transitional state.
    settle_after: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TasksApply {
    Applied,
    /// Poll reply dropped because a row is under edit.
    Suppressed,
    /// Reply older than one already applied.
    Stale,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskList {
    tasks: Vec<Task>,
    loaded: bool,
    load_failed: bool,
    edits: BTreeMap<TaskId, EditSession>,
    pending: BTreeMap<TaskId, PendingRun>,
    deleting: BTreeSet<TaskId>,
    next_seq: u64,
    applied_seq: u64,
    suppressed_polls: u64,
}

impl TaskList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn load_failed(&self) -> bool {
        self.load_failed
    }

    pub fn suppressed_polls(&self) -> u64 {
        self.suppressed_polls
    }

    /// Whether any row is locked for editing.
    pub fn is_editing(&self) -> bool {
        !self.edits.is_empty()
    }

    pub fn edit_session(&self, id: TaskId) -> Option<&EditSession> {
        self.edits.get(&id)
    }

    pub fn run_pending(&self, id: TaskId) -> Option<RunAction> {
        self.pending.get(&id).map(|pending| pending.action)
    }

    pub fn is_deleting(&self, id: TaskId) -> bool {
        self.deleting.contains(&id)
    }

    /// Allocates the sequence number of the next list fetch.
    pub fn next_fetch(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    /// Reconciles a list reply into the rendered rows.
    pub fn apply_fetch(&mut self, seq: u64, forced: bool, result: RemoteResult<Vec<Task>>) -> TasksApply {
        self.pending
            .retain(|_, pending| pending.settle_after.map_or(true, |settle| seq < settle));

        if seq <= self.applied_seq {
            console_logging::console_debug!(
                "Dropping task list reply {} (already applied {})",
                seq,
                self.applied_seq
            );
            return TasksApply::Stale;
        }

        match result {
            Err(err) => {
                console_logging::console_debug!("Task list fetch {} failed: {}", seq, err);
                if !self.loaded {
                    self.load_failed = true;
                }
                TasksApply::Failed
            }
            Ok(_) if !forced && self.is_editing() => {
                self.suppressed_polls += 1;
                console_logging::console_debug!(
                    "Suppressing poll render {} while {} row(s) are being edited",
                    seq,
                    self.edits.len()
                );
                TasksApply::Suppressed
            }
            Ok(tasks) => {
                self.edits
                    .retain(|id, _| tasks.iter().any(|task| task.id == *id));
                self.deleting
                    .retain(|id| tasks.iter().any(|task| task.id == *id));
                self.tasks = tasks;
                self.loaded = true;
                self.load_failed = false;
                self.applied_seq = seq;
                TasksApply::Applied
            }
        }
    }

    /// Puts a row into edit mode; `false` if unknown or already editing.
    pub fn begin_edit(&mut self, id: TaskId) -> bool {
        if self.edits.contains_key(&id) {
            return false;
        }
        let Some(task) = self.task(id) else {
            return false;
        };
        let draft = TaskDraft::from_task(task);
        self.edits.insert(id, EditSession { task_id: id, draft });
        true
    }

    pub fn change_draft(&mut self, id: TaskId, field: DraftField, value: &str) -> bool {
        match self.edits.get_mut(&id) {
            Some(session) => {
                session.draft.set(field, value);
                true
            }
            None => false,
        }
    }

    /// Patch for the row's draft, or `None` if the row is not being edited.
    pub fn draft_patch(&self, id: TaskId) -> Option<Result<TaskPatch, DraftError>> {
        self.edits.get(&id).map(|session| session.draft.to_patch())
    }

    /// Drops the row's edit session; `true` if there was one.
    pub fn end_edit(&mut self, id: TaskId) -> bool {
        self.edits.remove(&id).is_some()
    }

    /// Marks a start/stop as in flight; `false` if one already is.
    pub fn begin_run(&mut self, id: TaskId, action: RunAction) -> bool {
        if self.pending.contains_key(&id) || self.task(id).is_none() {
            return false;
        }
        self.pending.insert(
            id,
            PendingRun {
                action,
                settle_after: None,
            },
        );
        true
    }

    /// Keeps the transitional label until the refresh `seq` lands.
    pub fn settle_run_after(&mut self, id: TaskId, seq: u64) {
        if let Some(pending) = self.pending.get_mut(&id) {
            pending.settle_after = Some(seq);
        }
    }

    pub fn begin_delete(&mut self, id: TaskId) -> bool {
        self.task(id).is_some() && self.deleting.insert(id)
    }

    pub fn end_delete(&mut self, id: TaskId) {
        self.deleting.remove(&id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_page_count_falls_back() {
        assert_eq!(coerce_max_pages(""), 3);
        assert_eq!(coerce_max_pages("  "), 3);
        assert_eq!(coerce_max_pages("0"), 3);
        assert_eq!(coerce_max_pages("-2"), 3);
        assert_eq!(coerce_max_pages("abc"), 3);
        assert_eq!(coerce_max_pages(" 7 "), 7);
    }

    #[test]
    fn blank_text_is_unset() {
        assert_eq!(coerce_text("   "), None);
        assert_eq!(coerce_text(""), None);
        assert_eq!(coerce_text(" 100 "), Some("100".to_string()));
    }
}
