use serde::{Deserialize, Serialize};

/// Page-based list request.
///
/// Out-of-range values are normalized rather than rejected: a page below 1
/// becomes 1, a missing or zero page size becomes [`PageRequest::DEFAULT_PAGE_SIZE`]
/// and anything above [`PageRequest::MAX_PAGE_SIZE`] is clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PageRequest {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub page_size: Option<u32>,
}

impl PageRequest {
    pub const DEFAULT_PAGE_SIZE: u32 = 10;
    pub const MAX_PAGE_SIZE: u32 = 100;

    /// Creates a request for the given page and size.
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: Some(page),
            page_size: Some(page_size),
        }
    }

    /// Returns the 1-based page number.
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    /// Returns the page size, clamped to `1..=MAX_PAGE_SIZE`.
    pub fn page_size(&self) -> u32 {
        match self.page_size {
            None | Some(0) => Self::DEFAULT_PAGE_SIZE,
            Some(size) => size.min(Self::MAX_PAGE_SIZE),
        }
    }

    /// Number of records to skip.
    pub fn offset(&self) -> usize {
        (self.page() as usize - 1) * self.page_size() as usize
    }

    /// Maximum number of records to return.
    pub fn limit(&self) -> usize {
        self.page_size() as usize
    }
}

/// One page of results plus the totals needed to render pagination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u64,
}

impl<T> Page<T> {
    /// Builds a page from the slice a repository returned for `request`.
    pub fn new(items: Vec<T>, total: u64, request: PageRequest) -> Self {
        let page_size = request.page_size();
        Self {
            items,
            total,
            page: request.page(),
            page_size,
            total_pages: total.div_ceil(u64::from(page_size)),
        }
    }

    /// Converts the items while keeping the pagination totals.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            page_size: self.page_size,
            total_pages: self.total_pages,
        }
    }
}
