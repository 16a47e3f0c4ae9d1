//! Executes core effects: spawns gateway calls, drives timers, and feeds the
//! outcomes back as messages.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use console_core::{
    Effect, Generation, Msg, PatchOrigin, RemoteResult, RunAction, TaskMutation, TimerKind,
    REMEMBERED_SOURCE_KEY,
};
use console_logging::{console_debug, console_error, console_warn};
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::gateway::Gateway;
use crate::persist::SelectionStore;
use crate::types::GatewayError;

/// Runs effects on the ambient tokio runtime.
///
/// Must be driven from inside a runtime; every spawned task reports back
/// through `msg_tx`. At most one timer per [`TimerKind`] exists at a time.
pub struct Engine {
    gateway: Arc<dyn Gateway>,
    store: Arc<dyn SelectionStore>,
    msg_tx: UnboundedSender<Msg>,
    timers: HashMap<TimerKind, CancellationToken>,
    shutdown: CancellationToken,
}

impl Engine {
    pub fn new(
        gateway: Arc<dyn Gateway>,
        store: Arc<dyn SelectionStore>,
        msg_tx: UnboundedSender<Msg>,
    ) -> Self {
        Self {
            gateway,
            store,
            msg_tx,
            timers: HashMap::new(),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn has_timer(&self, timer: TimerKind) -> bool {
        self.timers.contains_key(&timer)
    }

    pub fn run(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            self.run_one(effect);
        }
    }

    /// Cancels every timer and abandons in-flight requests.
    pub fn shutdown(&mut self) {
        self.timers.clear();
        self.shutdown.cancel();
    }

    fn run_one(&mut self, effect: Effect) {
        let gateway = self.gateway.clone();
        match effect {
            Effect::StartTimer {
                timer,
                period,
                generation,
            } => self.start_timer(timer, period, generation),
            Effect::CancelTimer { timer } => self.cancel_timer(timer),

            Effect::FetchLog {
                generation,
                request,
            } => self.spawn(async move {
                let result = gateway.fetch_log(request.from_pos).await;
                Msg::LogFetched {
                    generation,
                    request,
                    result: remote("fetch log", result),
                }
            }),
            Effect::ClearLog { generation } => self.spawn(async move {
                let result = gateway.clear_log().await;
                Msg::LogCleared {
                    generation,
                    result: remote("clear log", result),
                }
            }),

            Effect::FetchTasks {
                generation,
                seq,
                forced,
            } => self.spawn(async move {
                let result = gateway.list_tasks().await;
                Msg::TasksFetched {
                    generation,
                    seq,
                    forced,
                    result: remote("list tasks", result),
                }
            }),
            Effect::CreateTask { generation, task } => self.spawn(async move {
                let result = gateway.create_task(&task).await;
                mutation_done(generation, TaskMutation::Create, result)
            }),
            Effect::PatchTask {
                generation,
                id,
                patch,
                origin,
            } => self.spawn(async move {
                let result = gateway.patch_task(id, &patch).await;
                let mutation = match origin {
                    PatchOrigin::Edit => TaskMutation::Edit(id),
                    PatchOrigin::Toggle => TaskMutation::Toggle(id),
                };
                mutation_done(generation, mutation, result)
            }),
            Effect::DeleteTask { generation, id } => self.spawn(async move {
                let result = gateway.delete_task(id).await;
                mutation_done(generation, TaskMutation::Delete(id), result)
            }),
            Effect::RunTask {
                generation,
                id,
                action,
            } => self.spawn(async move {
                let result = match action {
                    RunAction::Start => gateway.start_task(id).await,
                    RunAction::Stop => gateway.stop_task(id).await,
                };
                mutation_done(generation, TaskMutation::Run(id, action), result)
            }),

            Effect::ListResultSources { generation } => {
                let remembered = self.store.load(REMEMBERED_SOURCE_KEY);
                self.spawn(async move {
                    let result = gateway.list_result_files().await;
                    Msg::ResultSourcesLoaded {
                        generation,
                        result: remote("list result files", result),
                        remembered,
                    }
                })
            }
            Effect::FetchResults { generation, fetch } => self.spawn(async move {
                let result = gateway.fetch_results(&fetch.params).await;
                Msg::ResultsFetched {
                    generation,
                    request: fetch.request,
                    result: remote("fetch results", result),
                }
            }),
            Effect::RememberSource { source } => {
                if let Err(err) = self.store.save(REMEMBERED_SOURCE_KEY, &source) {
                    console_error!("Failed to remember result source {}: {}", source, err);
                }
            }

            Effect::FetchStatus { generation } => self.spawn(async move {
                let result = gateway.system_status().await;
                Msg::StatusLoaded {
                    generation,
                    result: remote("system status", result),
                }
            }),
            Effect::ListPrompts { generation } => self.spawn(async move {
                let result = gateway.list_prompts().await;
                Msg::PromptsListed {
                    generation,
                    result: remote("list prompts", result),
                }
            }),
            Effect::LoadPrompt {
                generation,
                filename,
            } => self.spawn(async move {
                let result = gateway.load_prompt(&filename).await;
                Msg::PromptLoaded {
                    generation,
                    filename,
                    result: remote("load prompt", result),
                }
            }),
            Effect::SavePrompt {
                generation,
                filename,
                content,
            } => self.spawn(async move {
                let result = gateway.save_prompt(&filename, &content).await;
                Msg::PromptSaved {
                    generation,
                    filename,
                    result: remote("save prompt", result),
                }
            }),

            Effect::FetchScraperStatus { delay } => self.spawn(async move {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                let result = gateway.system_status().await;
                Msg::ScraperStatusLoaded {
                    result: remote("scraper status", result),
                }
            }),
            Effect::RunAllTasks { action } => self.spawn(async move {
                let result = gateway.run_all(action).await;
                Msg::ScraperRunDone {
                    action,
                    result: remote("run all tasks", result),
                }
            }),
        }
    }

    fn spawn<F>(&self, request: F)
    where
        F: Future<Output = Msg> + Send + 'static,
    {
        let msg_tx = self.msg_tx.clone();
        let shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = shutdown.cancelled() => {}
                msg = request => {
                    let _ = msg_tx.send(msg);
                }
            }
        });
    }

    /// Starts a repeating timer, replacing any running timer of the same kind.
    /// The first tick fires one full period after the start.
    fn start_timer(&mut self, timer: TimerKind, period: Duration, generation: Generation) {
        self.cancel_timer(timer);
        let token = self.shutdown.child_token();
        let cancelled = token.clone();
        let msg_tx = self.msg_tx.clone();
        tokio::spawn(async move {
            let mut ticks = interval_at(Instant::now() + period, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = cancelled.cancelled() => break,
                    _ = ticks.tick() => {
                        if msg_tx.send(Msg::TimerFired { timer, generation }).is_err() {
                            break;
                        }
                    }
                }
            }
        });
        console_debug!(
            "Started timer {:?} every {:?} for generation {}",
            timer,
            period,
            generation
        );
        self.timers.insert(timer, token);
    }

    fn cancel_timer(&mut self, timer: TimerKind) {
        if let Some(token) = self.timers.remove(&timer) {
            token.cancel();
            console_debug!("Cancelled timer {:?}", timer);
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

fn remote<T>(operation: &str, result: Result<T, GatewayError>) -> RemoteResult<T> {
    result.map_err(|err| {
        console_warn!("Gateway call '{}' failed: {}", operation, err);
        err.into()
    })
}

fn mutation_done(
    generation: Generation,
    mutation: TaskMutation,
    result: Result<String, GatewayError>,
) -> Msg {
    Msg::TaskMutationDone {
        generation,
        mutation,
        result: remote("task mutation", result),
    }
}
