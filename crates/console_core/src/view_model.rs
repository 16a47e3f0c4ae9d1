use crate::effect::{Generation, RunAction};
use crate::log_tail::{AutoRefresh, LogTail};
use crate::model::{Recommendation, ResultItem, SortBy, SortOrder, SystemStatus};
use crate::results::{ResultView, ResultsStatus};
use crate::scraper::{ScraperControl, ScraperState};
use crate::session::View;
use crate::settings::{Loadable, PromptEditor, SettingsView};
use crate::state::Notification;
use crate::task_list::{TaskDraft, TaskList};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppViewModel {
    pub view: Option<View>,
    pub generation: Generation,
    pub scraper: ScraperView,
    pub notifications: Vec<Notification>,
    pub pane: PaneView,
    pub dirty: bool,
}

/// Header indicator and start-all / stop-all control, shown on every view.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScraperView {
    pub state: ScraperState,
    pub control_label: &'static str,
    pub control_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum PaneView {
    #[default]
    Blank,
    Tasks(TasksPane),
    Results(ResultsPane),
    Logs(LogPane),
    Settings(SettingsPane),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TasksPane {
    pub placeholder: Option<&'static str>,
    pub rows: Vec<TaskRowView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRowView {
    pub id: u64,
    pub task_name: String,
    pub keyword: String,
    pub price_range: String,
    pub personal_only: bool,
    pub criteria: String,
    pub max_pages: u32,
    pub cron: Option<String>,
    pub enabled: bool,
    pub is_running: bool,
    pub run_label: &'static str,
    pub run_enabled: bool,
    pub deleting: bool,
    /// Input values while the row is in edit mode.
    pub draft: Option<TaskDraft>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultsPane {
    pub sources: Vec<String>,
    pub selected: Option<String>,
    pub recommended_only: bool,
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
    pub page: u32,
    pub limit: u32,
    pub total_items: u64,
    pub placeholder: Option<&'static str>,
    pub cards: Vec<ResultCardView>,
    /// Pretty-printed raw record opened from a card, with its card number.
    pub raw_json: Option<(usize, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultCardView {
    pub title: String,
    pub price: String,
    pub recommendation: Recommendation,
    pub reason: String,
    pub seller: String,
    pub publish_time: String,
    pub crawl_time: String,
    pub link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogPane {
    pub lines: Vec<String>,
    pub cursor: u64,
    pub auto_refresh: AutoRefresh,
    pub scroll_top: usize,
    pub total_lines: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsPane {
    pub status: Loadable<SystemStatus>,
    pub prompts: Loadable<Vec<String>>,
    pub selected: Option<String>,
    pub editor: PromptEditor,
    pub saving: bool,
}

const ANY_PRICE: &str = "any";
const UNKNOWN: &str = "unknown";

pub(crate) fn scraper_view(control: &ScraperControl) -> ScraperView {
    ScraperView {
        state: control.state(),
        control_label: control.control_label(),
        control_enabled: control.pending().is_none(),
    }
}

pub(crate) fn tasks_pane(list: &TaskList) -> TasksPane {
    let placeholder = if list.load_failed() {
        Some("Could not load tasks.")
    } else if !list.is_loaded() {
        Some("Loading tasks...")
    } else if list.tasks().is_empty() {
        Some("No tasks yet. Create one to get started.")
    } else {
        None
    };

    let rows = list
        .tasks()
        .iter()
        .map(|task| {
            let pending = list.run_pending(task.id);
            let run_label = match (pending, task.is_running) {
                (Some(RunAction::Start), _) => "Starting...",
                (Some(RunAction::Stop), _) => "Stopping...",
                (None, true) => "Stop",
                (None, false) => "Start",
            };
            TaskRowView {
                id: task.id,
                task_name: task.task_name.clone(),
                keyword: task.keyword.clone(),
                price_range: format!(
                    "{} - {}",
                    task.min_price.as_deref().unwrap_or(ANY_PRICE),
                    task.max_price.as_deref().unwrap_or(ANY_PRICE)
                ),
                personal_only: task.personal_only,
                criteria: task
                    .ai_prompt_criteria_file
                    .as_deref()
                    .map(|file| file.strip_prefix("prompts/").unwrap_or(file).to_string())
                    .unwrap_or_else(|| "N/A".to_string()),
                max_pages: task.max_pages,
                cron: task.cron.clone(),
                enabled: task.enabled,
                is_running: task.is_running,
                run_label,
                run_enabled: pending.is_none(),
                deleting: list.is_deleting(task.id),
                draft: list.edit_session(task.id).map(|session| session.draft.clone()),
            }
        })
        .collect();

    TasksPane { placeholder, rows }
}

pub(crate) fn results_pane(view: &ResultView) -> ResultsPane {
    let placeholder = match view.status() {
        ResultsStatus::LoadingSources => Some("Loading result files..."),
        ResultsStatus::NoSources => Some("No result files found. Run a monitoring task first."),
        ResultsStatus::SourcesFailed => Some("Could not load result files."),
        ResultsStatus::Loading => Some("Loading results..."),
        ResultsStatus::Failed => Some("Could not load results."),
        ResultsStatus::Ready if view.items().is_empty() => Some("No matching records."),
        ResultsStatus::Ready => None,
    };
    let query = view.query();
    ResultsPane {
        sources: view.sources().to_vec(),
        selected: query.source.clone(),
        recommended_only: query.recommended_only,
        sort_by: query.sort_by,
        sort_order: query.sort_order,
        page: query.page,
        limit: query.limit,
        total_items: view.total_items(),
        placeholder,
        cards: view.items().iter().map(result_card).collect(),
        raw_json: view.inspected().map(|(index, item)| {
            let text = serde_json::to_string_pretty(&item.0).unwrap_or_else(|_| item.0.to_string());
            (index + 1, text)
        }),
    }
}

fn result_card(item: &ResultItem) -> ResultCardView {
    ResultCardView {
        title: item.title().unwrap_or("untitled").to_string(),
        price: item.price().unwrap_or("price unknown").to_string(),
        recommendation: item.recommendation(),
        reason: item.reason().unwrap_or("no analysis").to_string(),
        seller: item.seller().unwrap_or(UNKNOWN).to_string(),
        publish_time: item.publish_time().unwrap_or(UNKNOWN).to_string(),
        crawl_time: item
            .crawl_time()
            .map(short_timestamp)
            .unwrap_or_else(|| UNKNOWN.to_string()),
        link: item.link().map(ToOwned::to_owned),
    }
}

/// `2024-05-01T12:34:56.789` -> `2024-05-01 12:34`.
fn short_timestamp(raw: &str) -> String {
    raw.replacen('T', " ", 1).chars().take(16).collect()
}

pub(crate) fn log_pane(tail: &LogTail) -> LogPane {
    LogPane {
        lines: tail
            .visible_lines()
            .into_iter()
            .map(ToOwned::to_owned)
            .collect(),
        cursor: tail.cursor().position(),
        auto_refresh: tail.auto_refresh(),
        scroll_top: tail.viewport().scroll_top,
        total_lines: tail.scroll_height(),
    }
}

pub(crate) fn settings_pane(settings: &SettingsView) -> SettingsPane {
    SettingsPane {
        status: settings.status().clone(),
        prompts: settings.prompts().clone(),
        selected: settings.selected().map(ToOwned::to_owned),
        editor: settings.editor().clone(),
        saving: settings.is_saving(),
    }
}
