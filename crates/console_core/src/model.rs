//! Wire-level data shared by the state machines and the gateway.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub type TaskId = u64;

/// A scrape task as the server reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub task_name: String,
    pub keyword: String,
    #[serde(default)]
    pub min_price: Option<String>,
    #[serde(default)]
    pub max_price: Option<String>,
    #[serde(default)]
    pub personal_only: bool,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub is_running: bool,
    pub max_pages: u32,
    #[serde(default)]
    pub cron: Option<String>,
    #[serde(default)]
    pub ai_prompt_criteria_file: Option<String>,
}

/// Partial task update.
///
/// Outer `None` leaves a field untouched. For clearable text fields the inner
/// `None` is sent as JSON `null`, which the server stores as "unset".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_price: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_price: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub personal_only: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_pages: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cron: Option<Option<String>>,
}

impl TaskPatch {
    pub fn enabled(enabled: bool) -> Self {
        Self {
            enabled: Some(enabled),
            ..Self::default()
        }
    }
}

/// Request to create a task from a natural-language description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewTask {
    pub task_name: String,
    pub keyword: String,
    pub description: String,
    pub personal_only: bool,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
}

/// One incremental read of the remote log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LogChunk {
    #[serde(default)]
    pub new_content: Option<String>,
    pub new_pos: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    #[default]
    CrawlTime,
    PublishTime,
    Price,
}

impl SortBy {
    pub fn as_str(self) -> &'static str {
        match self {
            SortBy::CrawlTime => "crawl_time",
            SortBy::PublishTime => "publish_time",
            SortBy::Price => "price",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "crawl_time" => Some(SortBy::CrawlTime),
            "publish_time" => Some(SortBy::PublishTime),
            "price" => Some(SortBy::Price),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }
}

/// One page of results as returned by the server.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ResultPage {
    #[serde(default)]
    pub total_items: u64,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub items: Vec<ResultItem>,
}

/// AI verdict attached to a result record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recommendation {
    Recommended,
    NotRecommended,
    Undecided,
}

/// A scraped record. Kept opaque; accessors read the fields the views show.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct ResultItem(pub Value);

impl ResultItem {
    fn product(&self, key: &str) -> Option<&str> {
        self.0.get("商品信息")?.get(key)?.as_str()
    }

    fn analysis(&self) -> Option<&Value> {
        self.0.get("ai_analysis")
    }

    pub fn title(&self) -> Option<&str> {
        self.product("商品标题")
    }

    pub fn price(&self) -> Option<&str> {
        self.product("当前售价")
    }

    pub fn link(&self) -> Option<&str> {
        self.product("商品链接")
    }

    pub fn publish_time(&self) -> Option<&str> {
        self.product("发布时间")
    }

    pub fn crawl_time(&self) -> Option<&str> {
        self.0.get("爬取时间")?.as_str()
    }

    /// Seller nickname, preferring the copy on the product record.
    pub fn seller(&self) -> Option<&str> {
        self.product("卖家昵称").or_else(|| {
            self.0
                .get("卖家信息")
                .and_then(|seller| seller.get("卖家昵称"))
                .and_then(Value::as_str)
        })
    }

    pub fn recommendation(&self) -> Recommendation {
        match self
            .analysis()
            .and_then(|ai| ai.get("is_recommended"))
            .and_then(Value::as_bool)
        {
            Some(true) => Recommendation::Recommended,
            Some(false) => Recommendation::NotRecommended,
            None => Recommendation::Undecided,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        self.analysis()?.get("reason")?.as_str()
    }
}

/// Aggregate health of the backend as shown on the settings view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SystemStatus {
    #[serde(default)]
    pub scraper_running: bool,
    #[serde(default)]
    pub login_state_file: LoginStateFile,
    #[serde(default)]
    pub env_file: EnvFile,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LoginStateFile {
    #[serde(default)]
    pub exists: bool,
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EnvFile {
    #[serde(default)]
    pub exists: bool,
    #[serde(default)]
    pub openai_api_key_set: bool,
    #[serde(default)]
    pub openai_base_url_set: bool,
    #[serde(default)]
    pub openai_model_name_set: bool,
    #[serde(default)]
    pub ntfy_topic_url_set: bool,
}

/// Failure of a remote call, as seen by the state machines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// Connection, DNS, TLS or timeout failure.
    Transport(String),
    /// Non-success status; `detail` is the server's message when it sent one.
    Status { code: u16, detail: Option<String> },
    /// The body did not have the expected shape.
    Malformed(String),
}

impl RemoteError {
    /// Text for an operator notification: the server's detail verbatim, or
    /// `fallback` when there is none.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            RemoteError::Status {
                detail: Some(detail),
                ..
            } if !detail.trim().is_empty() => detail.clone(),
            _ => fallback.to_string(),
        }
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteError::Transport(message) => write!(f, "network error: {message}"),
            RemoteError::Status {
                code,
                detail: Some(detail),
            } => write!(f, "http status {code}: {detail}"),
            RemoteError::Status { code, detail: None } => write!(f, "http status {code}"),
            RemoteError::Malformed(message) => write!(f, "unexpected response: {message}"),
        }
    }
}

pub type RemoteResult<T> = Result<T, RemoteError>;
