use std::time::Duration;

use crate::effect::{Effect, Generation, PatchOrigin, RunAction, TaskMutation, TimerKind};
use crate::log_tail::{AutoRefresh, LogApply, LogRequest, LogTail};
use crate::model::TaskPatch;
use crate::results::{ResultFetch, ResultView};
use crate::scraper::{ScraperRefusal, STATUS_SETTLE_DELAY};
use crate::session::View;
use crate::settings::SettingsView;
use crate::state::NotificationLevel;
use crate::task_list::{TaskList, TasksApply};
use crate::{AppState, Msg};

const EDIT_IN_PROGRESS: &str = "Finish or cancel the edit first.";

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::Navigate(view) => navigate(&mut state, view),
        Msg::TimerFired { timer, generation } => {
            if is_stale(&state, generation) {
                return (state, Vec::new());
            }
            match timer {
                TimerKind::LogAutoRefresh
                    if state.is_active(View::Logs)
                        && state.logs.auto_refresh() == AutoRefresh::On =>
                {
                    state
                        .logs
                        .fetch_increment()
                        .map(|request| vec![fetch_log(&state, request)])
                        .unwrap_or_default()
                }
                TimerKind::TaskPoll if state.is_active(View::Tasks) => {
                    vec![fetch_tasks(&mut state, false)]
                }
                _ => Vec::new(),
            }
        }

        Msg::LogAutoRefreshSet(mode) => {
            if !state.is_active(View::Logs) || !state.logs.set_auto_refresh(mode) {
                return (state, Vec::new());
            }
            state.mark_dirty();
            match mode {
                AutoRefresh::On => vec![Effect::start_timer(
                    TimerKind::LogAutoRefresh,
                    state.session.generation(),
                )],
                AutoRefresh::Off => vec![Effect::CancelTimer {
                    timer: TimerKind::LogAutoRefresh,
                }],
            }
        }
        Msg::LogRefreshClicked if state.is_active(View::Logs) => reload_log(&mut state),
        Msg::LogClearClicked if state.is_active(View::Logs) => vec![Effect::ClearLog {
            generation: state.session.generation(),
        }],
        Msg::LogScrolled { top } => {
            state.logs.scroll_to(top);
            state.mark_dirty();
            Vec::new()
        }
        Msg::LogViewportResized { height } => {
            state.logs.resize(height);
            state.mark_dirty();
            Vec::new()
        }
        Msg::LogFetched {
            generation,
            request,
            result,
        } => {
            if is_stale(&state, generation) {
                return (state, Vec::new());
            }
            match state.logs.apply(request, result) {
                LogApply::Discarded => Vec::new(),
                LogApply::Rendered(_) => {
                    state.mark_dirty();
                    Vec::new()
                }
                LogApply::Truncated => reload_log(&mut state),
            }
        }
        Msg::LogCleared { generation, result } => {
            if is_stale(&state, generation) {
                return (state, Vec::new());
            }
            match result {
                Ok(()) => reload_log(&mut state),
                Err(err) => {
                    state.notify(
                        NotificationLevel::Error,
                        err.user_message("Failed to clear log."),
                    );
                    Vec::new()
                }
            }
        }

        Msg::TaskEditStarted(id) if state.is_active(View::Tasks) => {
            if state.tasks.begin_edit(id) {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::TaskDraftChanged { id, field, value } if state.is_active(View::Tasks) => {
            if state.tasks.change_draft(id, field, &value) {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::TaskEditSaved(id) if state.is_active(View::Tasks) => {
            match state.tasks.draft_patch(id) {
                None => Vec::new(),
                Some(Err(err)) => {
                    state.notify(NotificationLevel::Error, err.message());
                    Vec::new()
                }
                Some(Ok(patch)) => vec![patch_task(&state, id, patch, PatchOrigin::Edit)],
            }
        }
        Msg::TaskEditCancelled(id) if state.is_active(View::Tasks) => {
            if !state.tasks.end_edit(id) {
                return (state, Vec::new());
            }
            state.mark_dirty();
            vec![fetch_tasks(&mut state, true)]
        }
        Msg::TaskEnabledToggled { id, enabled } if state.is_active(View::Tasks) => {
            if state.tasks.task(id).is_none() {
                return (state, Vec::new());
            }
            if state.tasks.edit_session(id).is_some() {
                state.notify(NotificationLevel::Error, EDIT_IN_PROGRESS);
                return (state, Vec::new());
            }
            vec![patch_task(
                &state,
                id,
                TaskPatch::enabled(enabled),
                PatchOrigin::Toggle,
            )]
        }
        Msg::TaskRunRequested { id, action } if state.is_active(View::Tasks) => {
            if !state.tasks.begin_run(id, action) {
                return (state, Vec::new());
            }
            state.mark_dirty();
            vec![Effect::RunTask {
                generation: state.session.generation(),
                id,
                action,
            }]
        }
        Msg::TaskDeleteRequested(id) if state.is_active(View::Tasks) => {
            if !state.tasks.begin_delete(id) {
                return (state, Vec::new());
            }
            state.mark_dirty();
            vec![Effect::DeleteTask {
                generation: state.session.generation(),
                id,
            }]
        }
        Msg::TaskCreateSubmitted(task) if state.is_active(View::Tasks) => {
            vec![Effect::CreateTask {
                generation: state.session.generation(),
                task,
            }]
        }
        Msg::TasksFetched {
            generation,
            seq,
            forced,
            result,
        } => {
            if is_stale(&state, generation) || !state.is_active(View::Tasks) {
                return (state, Vec::new());
            }
            if state.tasks.apply_fetch(seq, forced, result) != TasksApply::Suppressed {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::TaskMutationDone {
            generation,
            mutation,
            result,
        } => {
            if is_stale(&state, generation) || !state.is_active(View::Tasks) {
                return (state, Vec::new());
            }
            finish_mutation(&mut state, mutation, result)
        }

        Msg::ResultSourcesLoaded {
            generation,
            result,
            remembered,
        } => {
            if is_stale(&state, generation) {
                return (state, Vec::new());
            }
            state.mark_dirty();
            let fetch = state.results.apply_sources(result, remembered.as_deref());
            fetch_results(&mut state, fetch)
        }
        Msg::ResultSourceSelected(source) if state.is_active(View::Results) => {
            let fetch = state.results.select_source(&source);
            if fetch.is_none() {
                return (state, Vec::new());
            }
            let mut effects = vec![Effect::RememberSource { source }];
            effects.extend(fetch_results(&mut state, fetch));
            effects
        }
        Msg::RecommendedOnlySet(recommended_only) if state.is_active(View::Results) => {
            let fetch = state.results.set_recommended_only(recommended_only);
            fetch_results(&mut state, fetch)
        }
        Msg::ResultSortSet { by, order } if state.is_active(View::Results) => {
            let fetch = state.results.set_sort(by, order);
            fetch_results(&mut state, fetch)
        }
        Msg::ResultPageSet(page) if state.is_active(View::Results) => {
            let fetch = state.results.set_page(page);
            fetch_results(&mut state, fetch)
        }
        Msg::ResultsRefreshClicked if state.is_active(View::Results) => {
            let fetch = state.results.refetch();
            fetch_results(&mut state, fetch)
        }
        Msg::ResultJsonOpened(index) if state.is_active(View::Results) => {
            if state.results.inspect(index) {
                state.mark_dirty();
            } else {
                state.notify(
                    NotificationLevel::Error,
                    format!("No result {} on this page.", index + 1),
                );
            }
            Vec::new()
        }
        Msg::ResultJsonClosed if state.is_active(View::Results) => {
            if state.results.close_inspector() {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::ResultsFetched {
            generation,
            request,
            result,
        } => {
            if is_stale(&state, generation) {
                return (state, Vec::new());
            }
            if state.results.apply_page(request, result) {
                state.mark_dirty();
            }
            Vec::new()
        }

        Msg::StatusLoaded { generation, result } => {
            if is_stale(&state, generation) {
                return (state, Vec::new());
            }
            if let Ok(status) = &result {
                state.scraper.observe(status);
            }
            state.settings.apply_status(result);
            state.mark_dirty();
            Vec::new()
        }
        Msg::PromptsListed { generation, result } => {
            if is_stale(&state, generation) {
                return (state, Vec::new());
            }
            state.settings.apply_prompt_list(result);
            state.mark_dirty();
            Vec::new()
        }
        Msg::PromptSelected(filename) if state.is_active(View::Settings) => {
            state.mark_dirty();
            match state.settings.select(filename) {
                Some(filename) => vec![Effect::LoadPrompt {
                    generation: state.session.generation(),
                    filename,
                }],
                None => Vec::new(),
            }
        }
        Msg::PromptLoaded {
            generation,
            filename,
            result,
        } => {
            if is_stale(&state, generation) {
                return (state, Vec::new());
            }
            if state.settings.apply_content(&filename, result) {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::PromptEdited(text) => {
            if state.settings.edit(text) {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::PromptSaveClicked if state.is_active(View::Settings) => {
            match state.settings.begin_save() {
                Some((filename, content)) => {
                    state.mark_dirty();
                    vec![Effect::SavePrompt {
                        generation: state.session.generation(),
                        filename,
                        content,
                    }]
                }
                None => {
                    if state.settings.selected().is_none() {
                        state.notify(
                            NotificationLevel::Error,
                            "Select a prompt file to save first.",
                        );
                    }
                    Vec::new()
                }
            }
        }
        Msg::PromptSaved {
            generation,
            filename,
            result,
        } => {
            if is_stale(&state, generation) {
                return (state, Vec::new());
            }
            state.settings.finish_save();
            match result {
                Ok(message) if !message.trim().is_empty() => {
                    state.notify(NotificationLevel::Info, message)
                }
                Ok(_) => state.notify(NotificationLevel::Info, format!("Saved {filename}.")),
                Err(err) => state.notify(
                    NotificationLevel::Error,
                    err.user_message("Failed to save prompt."),
                ),
            }
            Vec::new()
        }

        Msg::ScraperStatusRequested => vec![Effect::FetchScraperStatus {
            delay: Duration::ZERO,
        }],
        Msg::ScraperStatusLoaded { result } => {
            state.scraper.apply_status(&result);
            state.mark_dirty();
            Vec::new()
        }
        Msg::ScraperRunRequested(action) => match state.scraper.begin(action) {
            Ok(()) => {
                state.mark_dirty();
                vec![Effect::RunAllTasks { action }]
            }
            Err(ScraperRefusal::Busy) => Vec::new(),
            Err(ScraperRefusal::AlreadyThere(current)) => {
                state.notify(
                    NotificationLevel::Info,
                    format!("Scraper is already {}.", current.as_str()),
                );
                Vec::new()
            }
        },
        Msg::ScraperRunDone { action, result } => match result {
            Ok(_) => vec![Effect::FetchScraperStatus {
                delay: STATUS_SETTLE_DELAY,
            }],
            Err(err) => {
                let fallback = match action {
                    RunAction::Start => "Failed to start all tasks.",
                    RunAction::Stop => "Failed to stop all tasks.",
                };
                state.notify(NotificationLevel::Error, err.user_message(fallback));
                vec![Effect::FetchScraperStatus {
                    delay: Duration::ZERO,
                }]
            }
        },

        Msg::NotificationsDismissed => {
            state.dismiss_notifications();
            Vec::new()
        }
        // View-scoped commands arriving while their view is not active.
        Msg::LogRefreshClicked
        | Msg::LogClearClicked
        | Msg::TaskEditStarted(_)
        | Msg::TaskDraftChanged { .. }
        | Msg::TaskEditSaved(_)
        | Msg::TaskEditCancelled(_)
        | Msg::TaskEnabledToggled { .. }
        | Msg::TaskRunRequested { .. }
        | Msg::TaskDeleteRequested(_)
        | Msg::TaskCreateSubmitted(_)
        | Msg::ResultSourceSelected(_)
        | Msg::RecommendedOnlySet(_)
        | Msg::ResultSortSet { .. }
        | Msg::ResultPageSet(_)
        | Msg::ResultsRefreshClicked
        | Msg::ResultJsonOpened(_)
        | Msg::ResultJsonClosed
        | Msg::PromptSelected(_)
        | Msg::PromptSaveClicked
        | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

/// Tears down the current view and activates `view` from default state.
fn navigate(state: &mut AppState, view: View) -> Vec<Effect> {
    let mut effects = state.session.enter(view);
    let generation = state.session.generation();
    match view {
        View::Tasks => {
            state.tasks = TaskList::new();
            effects.push(fetch_tasks(state, false));
            effects.push(Effect::start_timer(TimerKind::TaskPoll, generation));
        }
        View::Results => {
            state.results = ResultView::new();
            effects.push(Effect::ListResultSources { generation });
        }
        View::Logs => {
            let height = state.logs.viewport().client_height;
            state.logs = LogTail::new();
            state.logs.resize(height);
            let request = state.logs.activate();
            effects.push(fetch_log(state, request));
        }
        View::Settings => {
            state.settings = SettingsView::new();
            effects.push(Effect::FetchStatus { generation });
            effects.push(Effect::ListPrompts { generation });
        }
    }
    state.mark_dirty();
    effects
}

fn is_stale(state: &AppState, generation: Generation) -> bool {
    let stale = !state.session.is_current(generation);
    if stale {
        console_logging::console_debug!(
            "Discarding reply from generation {} (current {})",
            generation,
            state.session.generation()
        );
    }
    stale
}

fn reload_log(state: &mut AppState) -> Vec<Effect> {
    let request = state.logs.activate();
    state.mark_dirty();
    vec![fetch_log(state, request)]
}

fn fetch_log(state: &AppState, request: LogRequest) -> Effect {
    Effect::FetchLog {
        generation: state.session.generation(),
        request,
    }
}

fn fetch_tasks(state: &mut AppState, forced: bool) -> Effect {
    Effect::FetchTasks {
        generation: state.session.generation(),
        seq: state.tasks.next_fetch(),
        forced,
    }
}

fn patch_task(state: &AppState, id: u64, patch: TaskPatch, origin: PatchOrigin) -> Effect {
    Effect::PatchTask {
        generation: state.session.generation(),
        id,
        patch,
        origin,
    }
}

fn fetch_results(state: &mut AppState, fetch: Option<ResultFetch>) -> Vec<Effect> {
    let Some(fetch) = fetch else {
        return Vec::new();
    };
    state.mark_dirty();
    vec![Effect::FetchResults {
        generation: state.session.generation(),
        fetch,
    }]
}

/// Reports the outcome of a mutating task request and refreshes the list.
fn finish_mutation(
    state: &mut AppState,
    mutation: TaskMutation,
    result: crate::model::RemoteResult<String>,
) -> Vec<Effect> {
    match &result {
        Ok(message) if mutation == TaskMutation::Create => {
            let text = if message.trim().is_empty() {
                "Task created."
            } else {
                message.as_str()
            };
            state.notify(NotificationLevel::Info, text);
        }
        Ok(_) => {}
        Err(err) => {
            console_logging::console_warn!("Task mutation {:?} failed: {}", mutation, err);
            state.notify(
                NotificationLevel::Error,
                err.user_message(mutation.fallback_error()),
            );
        }
    }

    match mutation {
        TaskMutation::Edit(id) if result.is_ok() => {
            state.tasks.end_edit(id);
        }
        TaskMutation::Delete(id) => {
            state.tasks.end_delete(id);
            if result.is_ok() {
                state.tasks.end_edit(id);
            }
        }
        _ => {}
    }

    state.mark_dirty();
    let refresh = fetch_tasks(state, true);
    if let (TaskMutation::Run(id, _), Effect::FetchTasks { seq, .. }) = (mutation, &refresh) {
        state.tasks.settle_run_after(id, *seq);
    }
    vec![refresh]
}
