use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use console_core::{
    Effect, LogChunk, LogFetchKind, LogRequest, Msg, NewTask, PatchOrigin, RemoteError,
    ResultFetch, ResultPage, ResultRequest, RunAction, SortBy, SortOrder, SystemStatus, Task, TaskId,
    TaskMutation, TaskPatch, TimerKind, REMEMBERED_SOURCE_KEY,
};
use console_gateway::{Engine, Gateway, GatewayError, PersistError, SelectionStore};
use pretty_assertions::assert_eq;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

/// Gateway double answering from canned data and recording calls.
#[derive(Default)]
struct FakeGateway {
    calls: Mutex<Vec<String>>,
    files: Vec<String>,
    fail_delete: bool,
}

impl FakeGateway {
    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Gateway for FakeGateway {
    async fn list_tasks(&self) -> Result<Vec<Task>, GatewayError> {
        self.record("list_tasks");
        Ok(Vec::new())
    }

    async fn create_task(&self, task: &NewTask) -> Result<String, GatewayError> {
        self.record(format!("create {}", task.task_name));
        Ok("created".to_string())
    }

    async fn patch_task(&self, id: TaskId, _patch: &TaskPatch) -> Result<String, GatewayError> {
        self.record(format!("patch {id}"));
        Ok("updated".to_string())
    }

    async fn delete_task(&self, id: TaskId) -> Result<String, GatewayError> {
        self.record(format!("delete {id}"));
        if self.fail_delete {
            return Err(GatewayError::Status {
                code: 404,
                detail: Some("task not found".to_string()),
            });
        }
        Ok("deleted".to_string())
    }

    async fn start_task(&self, id: TaskId) -> Result<String, GatewayError> {
        self.record(format!("start {id}"));
        Ok(String::new())
    }

    async fn stop_task(&self, id: TaskId) -> Result<String, GatewayError> {
        self.record(format!("stop {id}"));
        Ok(String::new())
    }

    async fn run_all(&self, action: RunAction) -> Result<String, GatewayError> {
        self.record(format!("run all {action:?}"));
        Ok(String::new())
    }

    async fn fetch_log(&self, from_pos: u64) -> Result<LogChunk, GatewayError> {
        self.record(format!("log {from_pos}"));
        Ok(LogChunk {
            new_content: Some("x\n".to_string()),
            new_pos: from_pos + 2,
        })
    }

    async fn clear_log(&self) -> Result<(), GatewayError> {
        self.record("clear");
        Err(GatewayError::Transport("connection reset".to_string()))
    }

    async fn list_result_files(&self) -> Result<Vec<String>, GatewayError> {
        self.record("files");
        Ok(self.files.clone())
    }

    async fn fetch_results(&self, request: &ResultRequest) -> Result<ResultPage, GatewayError> {
        self.record(format!("results {} p{}", request.source, request.page));
        Ok(ResultPage::default())
    }

    async fn system_status(&self) -> Result<SystemStatus, GatewayError> {
        self.record("status");
        Ok(SystemStatus::default())
    }

    async fn list_prompts(&self) -> Result<Vec<String>, GatewayError> {
        self.record("prompts");
        Ok(vec!["base_prompt.txt".to_string()])
    }

    async fn load_prompt(&self, filename: &str) -> Result<String, GatewayError> {
        self.record(format!("load {filename}"));
        Ok("text".to_string())
    }

    async fn save_prompt(&self, filename: &str, _content: &str) -> Result<String, GatewayError> {
        self.record(format!("save {filename}"));
        Ok("saved".to_string())
    }
}

#[derive(Default)]
struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl SelectionStore for MemoryStore {
    fn load(&self, key: &str) -> Option<String> {
        self.values.lock().unwrap().get(key).cloned()
    }

    fn save(&self, key: &str, value: &str) -> Result<(), PersistError> {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

fn engine_with(
    gateway: Arc<FakeGateway>,
    store: Arc<MemoryStore>,
) -> (Engine, UnboundedReceiver<Msg>) {
    let (tx, rx) = unbounded_channel();
    (Engine::new(gateway, store, tx), rx)
}

async fn next(rx: &mut UnboundedReceiver<Msg>) -> Msg {
    tokio::time::timeout(Duration::from_secs(30), rx.recv())
        .await
        .expect("message within timeout")
        .expect("channel open")
}

#[tokio::test]
async fn fetch_log_reply_echoes_request() {
    let gateway = Arc::new(FakeGateway::default());
    let (mut engine, mut rx) = engine_with(gateway.clone(), Arc::default());
    let request = LogRequest {
        kind: LogFetchKind::Increment,
        from_pos: 10,
        epoch: 2,
    };
    engine.run(vec![Effect::FetchLog {
        generation: 4,
        request,
    }]);

    assert_eq!(
        next(&mut rx).await,
        Msg::LogFetched {
            generation: 4,
            request,
            result: Ok(LogChunk {
                new_content: Some("x\n".to_string()),
                new_pos: 12,
            }),
        }
    );
    assert_eq!(gateway.calls(), vec!["log 10".to_string()]);
}

#[tokio::test]
async fn gateway_failures_become_remote_errors() {
    let gateway = Arc::new(FakeGateway {
        fail_delete: true,
        ..FakeGateway::default()
    });
    let (mut engine, mut rx) = engine_with(gateway, Arc::default());
    engine.run(vec![Effect::DeleteTask {
        generation: 1,
        id: 9,
    }]);
    assert_eq!(
        next(&mut rx).await,
        Msg::TaskMutationDone {
            generation: 1,
            mutation: TaskMutation::Delete(9),
            result: Err(RemoteError::Status {
                code: 404,
                detail: Some("task not found".to_string()),
            }),
        }
    );

    engine.run(vec![Effect::ClearLog { generation: 1 }]);
    assert_eq!(
        next(&mut rx).await,
        Msg::LogCleared {
            generation: 1,
            result: Err(RemoteError::Transport("connection reset".to_string())),
        }
    );
}

#[tokio::test]
async fn patch_reply_is_routed_by_origin() {
    let (mut engine, mut rx) = engine_with(Arc::default(), Arc::default());
    engine.run(vec![Effect::PatchTask {
        generation: 3,
        id: 2,
        patch: TaskPatch::enabled(true),
        origin: PatchOrigin::Toggle,
    }]);
    assert!(matches!(
        next(&mut rx).await,
        Msg::TaskMutationDone {
            mutation: TaskMutation::Toggle(2),
            result: Ok(_),
            ..
        }
    ));
}

#[tokio::test]
async fn source_list_reply_carries_remembered_selection() {
    let gateway = Arc::new(FakeGateway {
        files: vec!["a.jsonl".to_string(), "b.jsonl".to_string()],
        ..FakeGateway::default()
    });
    let store = Arc::new(MemoryStore::default());
    let (mut engine, mut rx) = engine_with(gateway.clone(), store.clone());

    engine.run(vec![Effect::RememberSource {
        source: "b.jsonl".to_string(),
    }]);
    assert_eq!(store.load(REMEMBERED_SOURCE_KEY).as_deref(), Some("b.jsonl"));

    engine.run(vec![Effect::ListResultSources { generation: 5 }]);
    assert_eq!(
        next(&mut rx).await,
        Msg::ResultSourcesLoaded {
            generation: 5,
            result: Ok(vec!["a.jsonl".to_string(), "b.jsonl".to_string()]),
            remembered: Some("b.jsonl".to_string()),
        }
    );

    engine.run(vec![Effect::FetchResults {
        generation: 5,
        fetch: ResultFetch {
            request: 7,
            params: ResultRequest {
                source: "b.jsonl".to_string(),
                recommended_only: false,
                sort_by: SortBy::CrawlTime,
                sort_order: SortOrder::Desc,
                page: 1,
                limit: 100,
            },
        },
    }]);
    assert!(matches!(
        next(&mut rx).await,
        Msg::ResultsFetched {
            generation: 5,
            request: 7,
            result: Ok(_)
        }
    ));
    assert_eq!(
        gateway.calls(),
        vec!["files".to_string(), "results b.jsonl p1".to_string()]
    );
}

#[tokio::test(start_paused = true)]
async fn timer_ticks_after_one_period_with_its_generation() {
    let (mut engine, mut rx) = engine_with(Arc::default(), Arc::default());
    let started = tokio::time::Instant::now();
    engine.run(vec![Effect::StartTimer {
        timer: TimerKind::LogAutoRefresh,
        period: Duration::from_secs(1),
        generation: 3,
    }]);
    assert!(engine.has_timer(TimerKind::LogAutoRefresh));

    assert_eq!(
        next(&mut rx).await,
        Msg::TimerFired {
            timer: TimerKind::LogAutoRefresh,
            generation: 3
        }
    );
    assert!(started.elapsed() >= Duration::from_secs(1));
    assert_eq!(
        next(&mut rx).await,
        Msg::TimerFired {
            timer: TimerKind::LogAutoRefresh,
            generation: 3
        }
    );
}

#[tokio::test(start_paused = true)]
async fn restarting_a_timer_replaces_it() {
    let (mut engine, mut rx) = engine_with(Arc::default(), Arc::default());
    for generation in [1, 2] {
        engine.run(vec![Effect::StartTimer {
            timer: TimerKind::TaskPoll,
            period: Duration::from_secs(5),
            generation,
        }]);
    }
    for _ in 0..3 {
        assert_eq!(
            next(&mut rx).await,
            Msg::TimerFired {
                timer: TimerKind::TaskPoll,
                generation: 2
            }
        );
    }
}

#[tokio::test(start_paused = true)]
async fn cancelled_timer_stops_ticking() {
    let (mut engine, mut rx) = engine_with(Arc::default(), Arc::default());
    engine.run(vec![Effect::StartTimer {
        timer: TimerKind::TaskPoll,
        period: Duration::from_secs(5),
        generation: 1,
    }]);
    engine.run(vec![Effect::CancelTimer {
        timer: TimerKind::TaskPoll,
    }]);
    assert!(!engine.has_timer(TimerKind::TaskPoll));

    let waited = tokio::time::timeout(Duration::from_secs(60), rx.recv()).await;
    assert!(waited.is_err(), "no tick after cancel: {waited:?}");
}

#[tokio::test(start_paused = true)]
async fn shutdown_stops_timers() {
    let (mut engine, mut rx) = engine_with(Arc::default(), Arc::default());
    engine.run(vec![Effect::StartTimer {
        timer: TimerKind::LogAutoRefresh,
        period: Duration::from_secs(1),
        generation: 1,
    }]);
    engine.shutdown();
    let waited = tokio::time::timeout(Duration::from_secs(10), rx.recv()).await;
    assert!(waited.is_err(), "no tick after shutdown: {waited:?}");
}

#[tokio::test(start_paused = true)]
async fn start_all_reply_then_status_after_delay() {
    let gateway = Arc::new(FakeGateway::default());
    let (mut engine, mut rx) = engine_with(gateway.clone(), Arc::default());
    engine.run(vec![Effect::RunAllTasks {
        action: RunAction::Start,
    }]);
    assert_eq!(
        next(&mut rx).await,
        Msg::ScraperRunDone {
            action: RunAction::Start,
            result: Ok(String::new())
        }
    );

    let started = tokio::time::Instant::now();
    engine.run(vec![Effect::FetchScraperStatus {
        delay: Duration::from_secs(1),
    }]);
    assert_eq!(
        next(&mut rx).await,
        Msg::ScraperStatusLoaded {
            result: Ok(SystemStatus::default())
        }
    );
    assert!(started.elapsed() >= Duration::from_secs(1));
    assert_eq!(
        gateway.calls(),
        vec!["run all Start".to_string(), "status".to_string()]
    );
}
