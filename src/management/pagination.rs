use serde::{Deserialize, Serialize};

use crate::types::PageMeta;

/// Position within a paginated result set.
///
/// `total_pages` is never below 1, so an empty result set still has a
/// single (empty) page to sit on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationState {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
}

impl PaginationState {
    pub fn new(limit: u32) -> Self {
        Self {
            page: 1,
            limit: limit.max(1),
            total: 0,
            total_pages: 1,
        }
    }

    /// Builds the state reported by a list response. Missing `totalPages` is
    /// derived from `total` and `limit`.
    pub fn from_meta(meta: &PageMeta) -> Self {
        let limit = meta.limit.max(1);
        let total_pages = meta
            .total_pages
            .unwrap_or_else(|| total_pages(meta.total, limit))
            .max(1);
        Self {
            page: meta.page.max(1),
            limit,
            total: meta.total,
            total_pages,
        }
    }

    /// Like [`from_meta`](Self::from_meta), but keeps the page and limit that
    /// were requested. A server clamping either one must not move the view
    /// off the query it is showing; the totals still come from the server.
    pub fn for_request(meta: &PageMeta, page: u32, limit: u32) -> Self {
        Self {
            page: page.max(1),
            limit: limit.max(1),
            ..Self::from_meta(meta)
        }
    }

    /// Moves to `page` if it lies within `1..=total_pages`. Returns whether
    /// the page changed.
    pub fn go_to(&mut self, page: u32) -> bool {
        if !self.accepts(page) || page == self.page {
            return false;
        }
        self.page = page;
        true
    }

    pub fn next(&mut self) -> bool {
        self.go_to(self.page.saturating_add(1))
    }

    pub fn prev(&mut self) -> bool {
        self.go_to(self.page.saturating_sub(1))
    }

    pub fn accepts(&self, page: u32) -> bool {
        page >= 1 && page <= self.total_pages
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    /// Back to the first page, keeping the page size.
    pub fn rewind(&mut self) {
        self.page = 1;
    }
}

/// `ceil(total / limit)` with a floor of 1.
pub fn total_pages(total: u64, limit: u32) -> u32 {
    let limit = u64::from(limit.max(1));
    let pages = total.div_ceil(limit).max(1);
    u32::try_from(pages).unwrap_or(u32::MAX)
}
