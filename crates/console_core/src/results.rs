//! Filtered, sorted, paginated view over one result source.

use crate::model::{RemoteResult, ResultItem, ResultPage, SortBy, SortOrder};

pub const DEFAULT_PAGE_LIMIT: u32 = 100;

/// Storage key of the durably remembered source selection.
pub const REMEMBERED_SOURCE_KEY: &str = "last_selected_result_file";

/// Everything that determines the fetched page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultQuery {
    pub source: Option<String>,
    pub recommended_only: bool,
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
    pub page: u32,
    pub limit: u32,
}

impl Default for ResultQuery {
    fn default() -> Self {
        Self {
            source: None,
            recommended_only: false,
            sort_by: SortBy::default(),
            sort_order: SortOrder::default(),
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

/// A page request bound to a concrete source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRequest {
    pub source: String,
    pub recommended_only: bool,
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
    pub page: u32,
    pub limit: u32,
}

impl ResultQuery {
    pub fn request(&self) -> Option<ResultRequest> {
        let source = self.source.clone()?;
        Some(ResultRequest {
            source,
            recommended_only: self.recommended_only,
            sort_by: self.sort_by,
            sort_order: self.sort_order,
            page: self.page,
            limit: self.limit,
        })
    }
}

/// A numbered fetch; only the highest number may render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultFetch {
    pub request: u64,
    pub params: ResultRequest,
}

/// Picks the source to preselect: the remembered one if it still exists,
/// else the first available.
pub fn restore_selection(sources: &[String], remembered: Option<&str>) -> Option<String> {
    remembered
        .and_then(|name| sources.iter().find(|source| source.as_str() == name))
        .or_else(|| sources.first())
        .cloned()
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum ResultsStatus {
    #[default]
    LoadingSources,
    /// The server has no result sources at all.
    NoSources,
    SourcesFailed,
    Loading,
    Ready,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultView {
    sources: Vec<String>,
    query: ResultQuery,
    status: ResultsStatus,
    items: Vec<ResultItem>,
    total_items: u64,
    latest_request: u64,
    /// Card whose raw record is open.
    inspected: Option<usize>,
}

impl ResultView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    pub fn query(&self) -> &ResultQuery {
        &self.query
    }

    pub fn status(&self) -> &ResultsStatus {
        &self.status
    }

    pub fn items(&self) -> &[ResultItem] {
        &self.items
    }

    pub fn total_items(&self) -> u64 {
        self.total_items
    }

    pub fn inspected(&self) -> Option<(usize, &ResultItem)> {
        let index = self.inspected?;
        self.items.get(index).map(|item| (index, item))
    }

    /// Opens the raw record of the card at `index`; `false` if there is none.
    pub fn inspect(&mut self, index: usize) -> bool {
        if index >= self.items.len() {
            return false;
        }
        self.inspected = Some(index);
        true
    }

    pub fn close_inspector(&mut self) -> bool {
        self.inspected.take().is_some()
    }

    /// Installs the source list and preselects a source. Returns the first
    /// page fetch, or `None` when there is nothing to show.
    pub fn apply_sources(
        &mut self,
        result: RemoteResult<Vec<String>>,
        remembered: Option<&str>,
    ) -> Option<ResultFetch> {
        match result {
            Err(err) => {
                console_logging::console_debug!("Listing result sources failed: {}", err);
                self.status = ResultsStatus::SourcesFailed;
                None
            }
            Ok(sources) if sources.is_empty() => {
                self.sources.clear();
                self.status = ResultsStatus::NoSources;
                None
            }
            Ok(sources) => {
                self.query.source = restore_selection(&sources, remembered);
                self.sources = sources;
                self.refetch()
            }
        }
    }

    /// Switches source. `None` if it is unknown or already selected.
    pub fn select_source(&mut self, source: &str) -> Option<ResultFetch> {
        if self.query.source.as_deref() == Some(source) || !self.sources.iter().any(|s| s == source) {
            return None;
        }
        self.query.source = Some(source.to_string());
        self.query.page = 1;
        self.refetch()
    }

    pub fn set_recommended_only(&mut self, recommended_only: bool) -> Option<ResultFetch> {
        if self.query.recommended_only == recommended_only {
            return None;
        }
        self.query.recommended_only = recommended_only;
        self.query.page = 1;
        self.refetch()
    }

    pub fn set_sort(&mut self, sort_by: SortBy, sort_order: SortOrder) -> Option<ResultFetch> {
        if self.query.sort_by == sort_by && self.query.sort_order == sort_order {
            return None;
        }
        self.query.sort_by = sort_by;
        self.query.sort_order = sort_order;
        self.query.page = 1;
        self.refetch()
    }

    pub fn set_page(&mut self, page: u32) -> Option<ResultFetch> {
        let page = page.max(1);
        if self.query.page == page {
            return None;
        }
        self.query.page = page;
        self.refetch()
    }

    /// Issues a fetch for the current query; supersedes any in flight.
    pub fn refetch(&mut self) -> Option<ResultFetch> {
        let params = self.query.request()?;
        self.latest_request += 1;
        self.status = ResultsStatus::Loading;
        self.inspected = None;
        Some(ResultFetch {
            request: self.latest_request,
            params,
        })
    }

    /// Replaces the displayed page if `request` is the latest fetch.
    pub fn apply_page(&mut self, request: u64, result: RemoteResult<ResultPage>) -> bool {
        if request != self.latest_request {
            console_logging::console_debug!(
                "Dropping result page {} (latest is {})",
                request,
                self.latest_request
            );
            return false;
        }
        match result {
            Ok(page) => {
                self.items = page.items;
                self.total_items = page.total_items;
                self.status = ResultsStatus::Ready;
            }
            Err(err) => {
                console_logging::console_debug!("Result page {} failed: {}", request, err);
                self.items.clear();
                self.total_items = 0;
                self.status = ResultsStatus::Failed;
            }
        }
        true
    }
}
