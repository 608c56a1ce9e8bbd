//! Immutable per-screen query state.
//!
//! A [`ViewQuery`] bundles the paging mode, active filters and the page
//! cursor. Changing filters or page size produces a new value with the page
//! reset to 1; nothing is mutated in place.

use serde::{Deserialize, Serialize};

use crate::filter::FilterState;
use crate::paginate::DEFAULT_PAGE_SIZE;

/// Default number of records fetched up front in client-paged mode.
pub const DEFAULT_CLIENT_WINDOW: u64 = 50;

/// Which counting semantics a screen uses. Fixed per screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PagingMode {
    /// The remote list query fetches one page; totals come from the count
    /// query and ignore the local text filter.
    ServerPaged,
    /// A bounded recent window of `fetch_limit` records is fetched once and
    /// every filter runs locally before slicing.
    ClientPaged { fetch_limit: u64 },
}

impl PagingMode {
    /// Client-paged mode fetching at most `fetch_limit` records (at least 1).
    pub fn client(fetch_limit: u64) -> Self {
        PagingMode::ClientPaged {
            fetch_limit: fetch_limit.max(1),
        }
    }

    /// `"server"` or `"client"`, for logs and error messages.
    pub fn label(self) -> &'static str {
        match self {
            PagingMode::ServerPaged => "server",
            PagingMode::ClientPaged { .. } => "client",
        }
    }
}

/// Everything needed to run one query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewQuery {
    pub mode: PagingMode,
    pub filters: FilterState,
    /// Requested page; clamped by the paginator, not here.
    pub page: i64,
    pub page_size: i64,
}

impl ViewQuery {
    /// Page 1 with default size and no filters.
    pub fn new(mode: PagingMode) -> Self {
        Self {
            mode,
            filters: FilterState::default(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE as i64,
        }
    }

    /// Replace the filters; resets to page 1 if they changed.
    pub fn with_filters(self, filters: FilterState) -> Self {
        if filters == self.filters {
            return self;
        }
        Self {
            filters,
            page: 1,
            ..self
        }
    }

    /// Replace the page size; resets to page 1 if it changed.
    pub fn with_page_size(self, page_size: i64) -> Self {
        if page_size == self.page_size {
            return self;
        }
        Self {
            page_size,
            page: 1,
            ..self
        }
    }

    /// Jump to `page` without touching filters or size.
    pub fn with_page(self, page: i64) -> Self {
        Self { page, ..self }
    }

    /// One page forward. The paginator clamps past the last page.
    pub fn next_page(self) -> Self {
        let page = self.page.saturating_add(1);
        self.with_page(page)
    }

    /// One page back, never below 1.
    pub fn prev_page(self) -> Self {
        let page = (self.page - 1).max(1);
        self.with_page(page)
    }
}
