//! Offset pagination shared by every listing query.

use serde::{Deserialize, Serialize};

/// Hard cap on `page_size`, whatever the caller asks for.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Raw paging query parameters. Both fields are optional so each endpoint
/// can pick its own default size via [`PageParams::normalize`].
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl PageParams {
    /// Clamp into a usable request: pages below one snap to the first page,
    /// a missing or non-positive size falls back to `default_size`, and
    /// anything above [`MAX_PAGE_SIZE`] is capped.
    pub fn normalize(&self, default_size: i64) -> PageRequest {
        let page = self.page.unwrap_or(1).max(1);
        let page_size = match self.page_size {
            Some(size) if size >= 1 => size.min(MAX_PAGE_SIZE),
            _ => default_size.clamp(1, MAX_PAGE_SIZE),
        };
        PageRequest { page, page_size }
    }
}

/// A clamped page request. Only produced by [`PageParams::normalize`], so
/// `page >= 1` and `1 <= page_size <= MAX_PAGE_SIZE` always hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: i64,
    page_size: i64,
}

impl PageRequest {
    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn page_size(&self) -> i64 {
        self.page_size
    }

    pub fn limit(&self) -> i64 {
        self.page_size
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.page_size
    }
}

/// One page of results plus the counters clients need to render pagers.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub page_size: i64,
    pub total_items: i64,
    pub total_pages: i64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: &PageRequest, total_items: i64) -> Self {
        let total_items = total_items.max(0);
        let total_pages = if total_items == 0 {
            0
        } else {
            (total_items + request.page_size - 1) / request.page_size
        };
        Page {
            items,
            page: request.page,
            page_size: request.page_size,
            total_items,
            total_pages,
            has_next: request.page < total_pages,
            has_previous: request.page > 1,
        }
    }

    pub fn empty(request: &PageRequest) -> Self {
        Page::new(Vec::new(), request, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_applies_defaults() {
        let request = PageParams::default().normalize(10);
        assert_eq!(request.page(), 1);
        assert_eq!(request.page_size(), 10);
        assert_eq!(request.offset(), 0);
    }

    #[test]
    fn normalize_clamps_out_of_range_values() {
        let request = PageParams {
            page: Some(0),
            page_size: Some(-3),
        }
        .normalize(20);
        assert_eq!(request.page(), 1);
        assert_eq!(request.page_size(), 20);

        let request = PageParams {
            page: Some(-7),
            page_size: Some(500),
        }
        .normalize(20);
        assert_eq!(request.page(), 1);
        assert_eq!(request.page_size(), MAX_PAGE_SIZE);
    }

    #[test]
    fn offset_skips_previous_pages() {
        let request = PageParams {
            page: Some(3),
            page_size: Some(25),
        }
        .normalize(10);
        assert_eq!(request.offset(), 50);
        assert_eq!(request.limit(), 25);
    }

    #[test]
    fn page_counters_cover_partial_last_page() {
        let request = PageParams {
            page: Some(2),
            page_size: Some(10),
        }
        .normalize(10);
        let page = Page::new(vec![0u8; 10], &request, 45);
        assert_eq!(page.total_pages, 5);
        assert!(page.has_next);
        assert!(page.has_previous);

        let request = PageParams {
            page: Some(5),
            page_size: Some(10),
        }
        .normalize(10);
        let page = Page::new(vec![0u8; 5], &request, 45);
        assert!(!page.has_next);
        assert!(page.has_previous);
    }

    #[test]
    fn empty_page_has_no_neighbours() {
        let request = PageParams::default().normalize(10);
        let page = Page::<u8>::empty(&request);
        assert_eq!(page.total_items, 0);
        assert_eq!(page.total_pages, 0);
        assert!(!page.has_next);
        assert!(!page.has_previous);
    }
}
