use std::time::Duration;

use console_core::{
    LogChunk, NewTask, ResultPage, ResultRequest, RunAction, SystemStatus, Task, TaskId,
    TaskPatch,
};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crate::types::{ErrorBody, FilesBody, GatewayError, MessageBody, PromptBody};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

#[derive(Debug, Clone)]
pub struct GatewaySettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    /// Upper bound for a whole request; a stuck call surfaces as a transport
    /// failure instead of hanging its controller.
    pub request_timeout: Duration,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Request/response access to the scraping service.
#[async_trait::async_trait]
pub trait Gateway: Send + Sync {
    async fn list_tasks(&self) -> Result<Vec<Task>, GatewayError>;
    /// Creates a task from natural-language criteria; returns the server message.
    async fn create_task(&self, task: &NewTask) -> Result<String, GatewayError>;
    async fn patch_task(&self, id: TaskId, patch: &TaskPatch) -> Result<String, GatewayError>;
    async fn delete_task(&self, id: TaskId) -> Result<String, GatewayError>;
    async fn start_task(&self, id: TaskId) -> Result<String, GatewayError>;
    async fn stop_task(&self, id: TaskId) -> Result<String, GatewayError>;
    /// Starts or stops every enabled task at once.
    async fn run_all(&self, action: RunAction) -> Result<String, GatewayError>;

    /// Everything after byte `from_pos`; 0 reads the whole log.
    async fn fetch_log(&self, from_pos: u64) -> Result<LogChunk, GatewayError>;
    async fn clear_log(&self) -> Result<(), GatewayError>;

    async fn list_result_files(&self) -> Result<Vec<String>, GatewayError>;
    async fn fetch_results(&self, request: &ResultRequest) -> Result<ResultPage, GatewayError>;

    async fn system_status(&self) -> Result<SystemStatus, GatewayError>;
    async fn list_prompts(&self) -> Result<Vec<String>, GatewayError>;
    async fn load_prompt(&self, filename: &str) -> Result<String, GatewayError>;
    async fn save_prompt(&self, filename: &str, content: &str) -> Result<String, GatewayError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestGateway {
    base: Url,
    client: reqwest::Client,
}

impl ReqwestGateway {
    pub fn new(settings: GatewaySettings) -> Result<Self, GatewayError> {
        let base = Url::parse(&settings.base_url)
            .map_err(|err| GatewayError::InvalidInput(format!("base url: {err}")))?;
        if base.cannot_be_a_base() {
            return Err(GatewayError::InvalidInput(format!(
                "base url cannot carry a path: {}",
                settings.base_url
            )));
        }
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| GatewayError::Transport(err.to_string()))?;
        Ok(Self { base, client })
    }

    /// `{base}/api/{segments...}` with every segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push("api").extend(segments);
        }
        url
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client
            .request(method, url)
            .header(ACCEPT, "application/json")
    }

    fn with_json<B: Serialize>(
        builder: RequestBuilder,
        body: &B,
    ) -> Result<RequestBuilder, GatewayError> {
        let bytes = serde_json::to_vec(body)
            .map_err(|err| GatewayError::InvalidInput(err.to_string()))?;
        Ok(builder.header(CONTENT_TYPE, "application/json").body(bytes))
    }

    /// Sends the request and returns the body of a successful response.
    async fn send(&self, builder: RequestBuilder) -> Result<Vec<u8>, GatewayError> {
        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(map_reqwest_error)?;
        if !status.is_success() {
            let detail = serde_json::from_slice::<ErrorBody>(&body)
                .ok()
                .and_then(ErrorBody::message);
            return Err(GatewayError::Status {
                code: status.as_u16(),
                detail,
            });
        }
        Ok(body.to_vec())
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<T, GatewayError> {
        let body = self.send(builder).await?;
        serde_json::from_slice(&body).map_err(|err| GatewayError::Malformed(err.to_string()))
    }

    async fn send_for_message(&self, builder: RequestBuilder) -> Result<String, GatewayError> {
        let body = self.send(builder).await?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(String::new());
        }
        let reply: MessageBody =
            serde_json::from_slice(&body).map_err(|err| GatewayError::Malformed(err.to_string()))?;
        Ok(reply.message.unwrap_or_default())
    }

    async fn run_task(&self, verb: &str, id: TaskId) -> Result<String, GatewayError> {
        let id = id.to_string();
        let url = self.endpoint(&["tasks", verb, &id]);
        self.send_for_message(self.request(Method::POST, url)).await
    }
}

#[async_trait::async_trait]
impl Gateway for ReqwestGateway {
    async fn list_tasks(&self) -> Result<Vec<Task>, GatewayError> {
        let url = self.endpoint(&["tasks"]);
        self.send_json(self.request(Method::GET, url)).await
    }

    async fn create_task(&self, task: &NewTask) -> Result<String, GatewayError> {
        let url = self.endpoint(&["tasks", "generate"]);
        let builder = Self::with_json(self.request(Method::POST, url), task)?;
        self.send_for_message(builder).await
    }

    async fn patch_task(&self, id: TaskId, patch: &TaskPatch) -> Result<String, GatewayError> {
        let id = id.to_string();
        let url = self.endpoint(&["tasks", &id]);
        let builder = Self::with_json(self.request(Method::PATCH, url), patch)?;
        self.send_for_message(builder).await
    }

    async fn delete_task(&self, id: TaskId) -> Result<String, GatewayError> {
        let id = id.to_string();
        let url = self.endpoint(&["tasks", &id]);
        self.send_for_message(self.request(Method::DELETE, url)).await
    }

    async fn start_task(&self, id: TaskId) -> Result<String, GatewayError> {
        self.run_task("start", id).await
    }

    async fn stop_task(&self, id: TaskId) -> Result<String, GatewayError> {
        self.run_task("stop", id).await
    }

    async fn run_all(&self, action: RunAction) -> Result<String, GatewayError> {
        let route = match action {
            RunAction::Start => "start-all",
            RunAction::Stop => "stop-all",
        };
        let url = self.endpoint(&["tasks", route]);
        self.send_for_message(self.request(Method::POST, url)).await
    }

    async fn fetch_log(&self, from_pos: u64) -> Result<LogChunk, GatewayError> {
        let mut url = self.endpoint(&["logs"]);
        url.query_pairs_mut()
            .append_pair("from_pos", &from_pos.to_string());
        self.send_json(self.request(Method::GET, url)).await
    }

    async fn clear_log(&self) -> Result<(), GatewayError> {
        let url = self.endpoint(&["logs"]);
        self.send(self.request(Method::DELETE, url)).await?;
        Ok(())
    }

    async fn list_result_files(&self) -> Result<Vec<String>, GatewayError> {
        let url = self.endpoint(&["results", "files"]);
        let reply: FilesBody = self.send_json(self.request(Method::GET, url)).await?;
        Ok(reply.files)
    }

    async fn fetch_results(&self, request: &ResultRequest) -> Result<ResultPage, GatewayError> {
        check_filename(&request.source)?;
        let mut url = self.endpoint(&["results", &request.source]);
        url.query_pairs_mut()
            .append_pair("page", &request.page.to_string())
            .append_pair("limit", &request.limit.to_string())
            .append_pair(
                "recommended_only",
                if request.recommended_only { "true" } else { "false" },
            )
            .append_pair("sort_by", request.sort_by.as_str())
            .append_pair("sort_order", request.sort_order.as_str());
        self.send_json(self.request(Method::GET, url)).await
    }

    async fn system_status(&self) -> Result<SystemStatus, GatewayError> {
        let url = self.endpoint(&["settings", "status"]);
        self.send_json(self.request(Method::GET, url)).await
    }

    async fn list_prompts(&self) -> Result<Vec<String>, GatewayError> {
        let url = self.endpoint(&["prompts"]);
        self.send_json(self.request(Method::GET, url)).await
    }

    async fn load_prompt(&self, filename: &str) -> Result<String, GatewayError> {
        check_filename(filename)?;
        let url = self.endpoint(&["prompts", filename]);
        let reply: PromptBody = self.send_json(self.request(Method::GET, url)).await?;
        Ok(reply.content)
    }

    async fn save_prompt(&self, filename: &str, content: &str) -> Result<String, GatewayError> {
        check_filename(filename)?;
        let url = self.endpoint(&["prompts", filename]);
        let body = serde_json::json!({ "content": content });
        let builder = Self::with_json(self.request(Method::PUT, url), &body)?;
        self.send_for_message(builder).await
    }
}

/// Rejects names that would leave the server-side directory.
fn check_filename(filename: &str) -> Result<(), GatewayError> {
    if filename.trim().is_empty() || filename.contains('/') || filename.contains("..") {
        return Err(GatewayError::InvalidInput(format!(
            "invalid filename: {filename}"
        )));
    }
    Ok(())
}

fn map_reqwest_error(err: reqwest::Error) -> GatewayError {
    if err.is_timeout() {
        return GatewayError::Transport(format!("timed out: {err}"));
    }
    if err.is_decode() {
        return GatewayError::Malformed(err.to_string());
    }
    GatewayError::Transport(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filenames_outside_directory_are_rejected() {
        assert!(check_filename("a.jsonl").is_ok());
        assert!(check_filename("../secrets").is_err());
        assert!(check_filename("sub/a.jsonl").is_err());
        assert!(check_filename(" ").is_err());
    }

    #[test]
    fn endpoint_keeps_base_path_and_encodes_segments() {
        let gateway = ReqwestGateway::new(GatewaySettings {
            base_url: "http://localhost:9000/console/".to_string(),
            ..GatewaySettings::default()
        })
        .unwrap();
        assert_eq!(
            gateway.endpoint(&["results", "my file.jsonl"]).as_str(),
            "http://localhost:9000/console/api/results/my%20file.jsonl"
        );
    }
}
