//! Page windows under the two pagination strategies.
//!
//! Pages are 1-indexed and `total_pages` is never below one. Out-of-range
//! requests are clamped, never rejected. The [`PageTotal`] carried by each
//! window records which counting semantics produced it.

use std::future::Future;

use serde::Serialize;

use crate::error::CoreError;

/// Default page size for image grids.
pub const DEFAULT_PAGE_SIZE: u64 = 12;

// ---------------------------------------------------------------------------
// PageWindow
// ---------------------------------------------------------------------------

/// How the window's page count was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PageTotal {
    /// Client-paged: exact size of the filtered collection.
    Filtered { total_items: u64 },
    /// Server-paged: total reported by the separate count query. Not
    /// guaranteed consistent with the items visible after local filtering.
    ServerKnown { total_known_items: u64 },
}

/// The visible slice of a collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageWindow<T> {
    pub items: Vec<T>,
    /// 1-indexed, already clamped into `1..=total_pages`.
    pub page: u64,
    pub total_pages: u64,
    pub total: PageTotal,
}

impl<T> PageWindow<T> {
    /// Transform the items while keeping page bookkeeping intact.
    pub fn map_items<U>(self, f: impl FnOnce(Vec<T>) -> Vec<U>) -> PageWindow<U> {
        PageWindow {
            items: f(self.items),
            page: self.page,
            total_pages: self.total_pages,
            total: self.total,
        }
    }

    pub fn is_server_counted(&self) -> bool {
        matches!(self.total, PageTotal::ServerKnown { .. })
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }
}

// ---------------------------------------------------------------------------
// Clamping helpers
// ---------------------------------------------------------------------------

/// Floor a requested page size at one.
pub fn normalize_page_size(page_size: i64) -> u64 {
    page_size.max(1) as u64
}

/// `max(1, ceil(total / page_size))`.
pub fn total_pages(total: u64, page_size: u64) -> u64 {
    let page_size = page_size.max(1);
    total.div_ceil(page_size).max(1)
}

/// Clamp a requested page into `1..=total_pages`.
pub fn clamp_page(page: i64, total_pages: u64) -> u64 {
    let total_pages = total_pages.max(1);
    if page < 1 {
        1
    } else {
        (page as u64).min(total_pages)
    }
}

// ---------------------------------------------------------------------------
// Client mode
// ---------------------------------------------------------------------------

/// Slice an in-memory collection.
pub fn paginate<T: Clone>(collection: &[T], page: i64, page_size: i64) -> PageWindow<T> {
    let page_size = normalize_page_size(page_size);
    let total = collection.len() as u64;
    let total_pages = total_pages(total, page_size);
    let page = clamp_page(page, total_pages);

    let start = ((page - 1) * page_size).min(total) as usize;
    let end = (page * page_size).min(total) as usize;

    PageWindow {
        items: collection[start..end].to_vec(),
        page,
        total_pages,
        total: PageTotal::Filtered { total_items: total },
    }
}

// ---------------------------------------------------------------------------
// Server mode
// ---------------------------------------------------------------------------

/// Remote call parameters for one clamped page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteSlice {
    pub skip: u64,
    pub limit: u64,
    pub page: u64,
    pub total_pages: u64,
}

/// Work out `{skip, limit}` for a page given the separately counted total.
pub fn plan_remote(page: i64, page_size: i64, known_total: u64) -> RemoteSlice {
    let limit = normalize_page_size(page_size);
    let total_pages = total_pages(known_total, limit);
    let page = clamp_page(page, total_pages);

    RemoteSlice {
        skip: (page - 1) * limit,
        limit,
        page,
        total_pages,
    }
}

/// Fetch one page through `fetch(skip, limit)` and wrap it in a window
/// counted against `known_total`.
pub async fn paginate_remote<T, F, Fut>(
    fetch: F,
    page: i64,
    page_size: i64,
    known_total: u64,
) -> Result<PageWindow<T>, CoreError>
where
    F: FnOnce(u64, u64) -> Fut,
    Fut: Future<Output = Result<Vec<T>, CoreError>>,
{
    let slice = plan_remote(page, page_size, known_total);
    let items = fetch(slice.skip, slice.limit).await?;

    Ok(PageWindow {
        items,
        page: slice.page,
        total_pages: slice.total_pages,
        total: PageTotal::ServerKnown {
            total_known_items: known_total,
        },
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
