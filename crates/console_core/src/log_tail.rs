//! Incremental tail of the remote append-only log.
//!
//! The controller owns a byte cursor into the server log and the text already
//! shown. A full fetch (activation, manual refresh, after clear) replaces the
//! buffer; an increment asks for everything after the cursor and appends it.
//! Failed increments never move the cursor, so the next attempt retries the
//! same offset.

use crate::model::{LogChunk, RemoteError, RemoteResult};

/// Lines of slack when deciding whether the operator is following the tail.
pub const SCROLL_EPSILON: usize = 1;
pub const DEFAULT_VIEWPORT_HEIGHT: usize = 20;

pub const LOG_LOADING_PLACEHOLDER: &str = "Loading log...";
pub const LOG_EMPTY_PLACEHOLDER: &str = "Log is empty.";

/// Byte offset of the remote log already delivered to this client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LogCursor {
    position: u64,
}

impl LogCursor {
    pub fn position(&self) -> u64 {
        self.position
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AutoRefresh {
    #[default]
    Off,
    On,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFetchKind {
    Full,
    Increment,
}

/// Parameters of one log fetch, echoed back with its reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogRequest {
    pub kind: LogFetchKind,
    pub from_pos: u64,
    /// Full-fetch epoch the request belongs to.
    pub epoch: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollAction {
    ToBottom,
    Preserve,
}

/// Scroll decision after an update.
pub fn scroll_after(kind: LogFetchKind, was_at_bottom: bool) -> ScrollAction {
    if kind == LogFetchKind::Full || was_at_bottom {
        ScrollAction::ToBottom
    } else {
        ScrollAction::Preserve
    }
}

/// Visible window over the buffer, measured in lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub scroll_top: usize,
    pub client_height: usize,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            scroll_top: 0,
            client_height: DEFAULT_VIEWPORT_HEIGHT,
        }
    }
}

impl Viewport {
    pub fn is_at_bottom(&self, scroll_height: usize) -> bool {
        scroll_height.saturating_sub(self.client_height) <= self.scroll_top + SCROLL_EPSILON
    }

    fn max_top(&self, scroll_height: usize) -> usize {
        scroll_height.saturating_sub(self.client_height)
    }

    fn scroll_to(&mut self, top: usize, scroll_height: usize) {
        self.scroll_top = top.min(self.max_top(scroll_height));
    }

    fn scroll_to_bottom(&mut self, scroll_height: usize) {
        self.scroll_top = self.max_top(scroll_height);
    }
}

/// What applying a reply did to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogApply {
    /// The reply was superseded and ignored.
    Discarded,
    /// The buffer changed.
    Rendered(ScrollAction),
    /// The server log shrank under the cursor; a full reload is needed.
    Truncated,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LogTail {
    cursor: LogCursor,
    buffer: String,
    loaded: bool,
    epoch: u64,
    auto_refresh: AutoRefresh,
    viewport: Viewport,
}

impl LogTail {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cursor(&self) -> LogCursor {
        self.cursor
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn auto_refresh(&self) -> AutoRefresh {
        self.auto_refresh
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn scroll_height(&self) -> usize {
        self.buffer.lines().count()
    }

    /// Resets cursor and buffer and returns the full fetch to issue.
    ///
    /// Manual refresh and post-clear reload go through here as well.
    pub fn activate(&mut self) -> LogRequest {
        self.cursor = LogCursor::default();
        self.buffer.clear();
        self.loaded = false;
        self.viewport.scroll_top = 0;
        self.epoch += 1;
        LogRequest {
            kind: LogFetchKind::Full,
            from_pos: 0,
            epoch: self.epoch,
        }
    }

    /// Next incremental fetch, or `None` while the initial full fetch is
    /// still outstanding.
    pub fn fetch_increment(&self) -> Option<LogRequest> {
        self.loaded.then_some(LogRequest {
            kind: LogFetchKind::Increment,
            from_pos: self.cursor.position,
            epoch: self.epoch,
        })
    }

    /// Records the new mode; returns `true` if it changed.
    pub fn set_auto_refresh(&mut self, mode: AutoRefresh) -> bool {
        if self.auto_refresh == mode {
            return false;
        }
        self.auto_refresh = mode;
        true
    }

    pub fn scroll_to(&mut self, top: usize) {
        let height = self.scroll_height();
        self.viewport.scroll_to(top, height);
    }

    pub fn resize(&mut self, client_height: usize) {
        self.viewport.client_height = client_height.max(1);
        let (top, height) = (self.viewport.scroll_top, self.scroll_height());
        self.viewport.scroll_to(top, height);
    }

    /// Applies the reply to `request`.
    pub fn apply(&mut self, request: LogRequest, result: RemoteResult<LogChunk>) -> LogApply {
        if request.epoch != self.epoch {
            return LogApply::Discarded;
        }
        let was_at_bottom = self.viewport.is_at_bottom(self.scroll_height());

        match request.kind {
            LogFetchKind::Full => {
                match result {
                    Ok(chunk) => {
                        self.buffer = chunk.new_content.unwrap_or_default();
                        self.cursor.position = chunk.new_pos;
                    }
                    Err(err) => {
                        self.buffer = error_line(&err);
                        self.cursor = LogCursor::default();
                    }
                }
                self.loaded = true;
            }
            LogFetchKind::Increment => {
                if request.from_pos != self.cursor.position {
                    return LogApply::Discarded;
                }
                match result {
                    Ok(chunk) if chunk.new_pos < request.from_pos => {
                        console_logging::console_warn!(
                            "Log shrank from {} to {}; reloading",
                            request.from_pos,
                            chunk.new_pos
                        );
                        return LogApply::Truncated;
                    }
                    Ok(chunk) => {
                        if let Some(content) = chunk.new_content.filter(|c| !c.is_empty()) {
                            self.buffer.push_str(&content);
                        }
                        self.cursor.position = chunk.new_pos;
                    }
                    Err(err) => {
                        console_logging::console_debug!(
                            "Log increment from {} failed: {}",
                            request.from_pos,
                            err
                        );
                        if !self.buffer.is_empty() && !self.buffer.ends_with('\n') {
                            self.buffer.push('\n');
                        }
                        self.buffer.push_str(&error_line(&err));
                    }
                }
            }
        }

        let action = scroll_after(request.kind, was_at_bottom);
        let height = self.scroll_height();
        match action {
            ScrollAction::ToBottom => self.viewport.scroll_to_bottom(height),
            ScrollAction::Preserve => {
                let top = self.viewport.scroll_top;
                self.viewport.scroll_to(top, height);
            }
        }
        LogApply::Rendered(action)
    }

    /// Text for the pane: buffer, or a placeholder telling "not loaded yet"
    /// apart from "loaded and empty".
    pub fn display_text(&self) -> &str {
        if !self.loaded {
            LOG_LOADING_PLACEHOLDER
        } else if self.buffer.is_empty() {
            LOG_EMPTY_PLACEHOLDER
        } else {
            &self.buffer
        }
    }

    /// Lines inside the viewport.
    pub fn visible_lines(&self) -> Vec<&str> {
        self.display_text()
            .lines()
            .skip(self.viewport.scroll_top)
            .take(self.viewport.client_height)
            .collect()
    }
}

fn error_line(err: &RemoteError) -> String {
    format!("[log fetch failed: {err}]\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(content: &str, new_pos: u64) -> LogChunk {
        LogChunk {
            new_content: Some(content.to_string()),
            new_pos,
        }
    }

    fn loaded_with(lines: usize) -> LogTail {
        let mut tail = LogTail::new();
        let request = tail.activate();
        let content: String = (0..lines).map(|i| format!("line{i}\n")).collect();
        let len = content.len() as u64;
        tail.apply(request, Ok(chunk(&content, len)));
        tail
    }

    #[test]
    fn at_bottom_allows_epsilon() {
        let viewport = Viewport {
            scroll_top: 9,
            client_height: 10,
        };
        assert!(viewport.is_at_bottom(20));
        assert!(!viewport.is_at_bottom(21));
    }

    #[test]
    fn full_fetch_always_scrolls_to_bottom() {
        assert_eq!(scroll_after(LogFetchKind::Full, false), ScrollAction::ToBottom);
        assert_eq!(scroll_after(LogFetchKind::Increment, true), ScrollAction::ToBottom);
        assert_eq!(scroll_after(LogFetchKind::Increment, false), ScrollAction::Preserve);
    }

    #[test]
    fn increment_preserves_scroll_when_reading_history() {
        let mut tail = loaded_with(50);
        tail.scroll_to(5);
        let request = tail.fetch_increment().unwrap();
        let from = request.from_pos;
        let applied = tail.apply(request, Ok(chunk("more\n", from + 5)));
        assert_eq!(applied, LogApply::Rendered(ScrollAction::Preserve));
        assert_eq!(tail.viewport().scroll_top, 5);
    }

    #[test]
    fn increment_follows_tail_when_at_bottom() {
        let mut tail = loaded_with(50);
        assert_eq!(tail.viewport().scroll_top, 30);
        let request = tail.fetch_increment().unwrap();
        let from = request.from_pos;
        tail.apply(request, Ok(chunk("a\nb\n", from + 4)));
        assert_eq!(tail.viewport().scroll_top, 32);
    }

    #[test]
    fn no_increment_before_initial_load() {
        let mut tail = LogTail::new();
        tail.activate();
        assert!(tail.fetch_increment().is_none());
        assert_eq!(tail.display_text(), LOG_LOADING_PLACEHOLDER);
    }

    #[test]
    fn shrinking_log_requests_reload() {
        let mut tail = loaded_with(3);
        let request = tail.fetch_increment().unwrap();
        assert_eq!(tail.apply(request, Ok(chunk("", 2))), LogApply::Truncated);
        assert_eq!(tail.cursor().position(), request.from_pos);
    }
}
