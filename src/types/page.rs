//! Pagination types shared by the persistence port and its callers

use serde::{Deserialize, Serialize};

/// Page size used when a request asks for zero items
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// One-based page request
///
/// A zero `page` falls back to the first page and a zero `page_size` to
/// [`DEFAULT_PAGE_SIZE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub fn new(page: u32, page_size: u32) -> Self {
        PageRequest { page, page_size }.normalized()
    }

    /// Apply the zero-value fallbacks
    pub fn normalized(self) -> Self {
        PageRequest {
            page: self.page.max(1),
            page_size: if self.page_size == 0 {
                DEFAULT_PAGE_SIZE
            } else {
                self.page_size
            },
        }
    }

    /// Number of items skipped before this page
    pub fn offset(&self) -> usize {
        let request = self.normalized();
        (request.page as usize - 1) * request.page_size as usize
    }

    /// Slice one page out of an already ordered collection
    pub fn paginate<T>(self, items: Vec<T>) -> Page<T> {
        let request = self.normalized();
        let total = items.len();
        let page_items = items
            .into_iter()
            .skip(request.offset())
            .take(request.page_size as usize)
            .collect();

        Page {
            items: page_items,
            page: request.page,
            page_size: request.page_size,
            total,
            total_pages: total.div_ceil(request.page_size as usize),
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// One page of results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub page_size: u32,
    pub total: usize,
    pub total_pages: usize,
}
