//! Fixed-size pagination
//!
//! Pages are 1-based. An empty list is still "page 1 of 1". Requests for a
//! page outside `[1, total_pages]` are prevented by callers (navigation is
//! disabled at the boundaries); if one slips through, the slice is empty.

use serde::Serialize;

/// Records per page
pub const PAGE_SIZE: usize = 4;

/// One page of a filtered list
#[derive(Debug, PartialEq)]
pub struct Page<'a, T> {
    pub items: &'a [T],
    pub page: usize,
    pub total_pages: usize,
}

/// `max(1, ceil(len / page_size))`
pub fn total_pages(len: usize, page_size: usize) -> usize {
    len.div_ceil(page_size.max(1)).max(1)
}

/// Slice out page `page`, covering `[(page-1)*size, page*size)`
pub fn paginate<T>(records: &[T], page: usize, page_size: usize) -> Page<'_, T> {
    let page_size = page_size.max(1);
    let start = page.saturating_sub(1).saturating_mul(page_size);
    let items = if start >= records.len() {
        &records[..0]
    } else {
        let end = start.saturating_add(page_size).min(records.len());
        &records[start..end]
    };
    Page {
        items,
        page,
        total_pages: total_pages(records.len(), page_size),
    }
}

/// Bring a requested page into `[1, total_pages]`
pub fn clamp_page(page: usize, total_pages: usize) -> usize {
    page.clamp(1, total_pages.max(1))
}

/// Current page of the active viewing context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaginationState {
    page: usize,
}

impl Default for PaginationState {
    fn default() -> Self {
        Self { page: 1 }
    }
}

impl PaginationState {
    pub fn page(&self) -> usize {
        self.page
    }

    pub fn reset(&mut self) {
        self.page = 1;
    }

    /// Jump to a page; no range validation beyond keeping it positive
    pub fn set(&mut self, page: usize) {
        self.page = page.max(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(0, PAGE_SIZE), 1);
        assert_eq!(total_pages(1, PAGE_SIZE), 1);
        assert_eq!(total_pages(4, PAGE_SIZE), 1);
        assert_eq!(total_pages(5, PAGE_SIZE), 2);
        assert_eq!(total_pages(9, PAGE_SIZE), 3);
    }

    #[test]
    fn test_paginate_slices() {
        let records: Vec<u32> = (1..=10).collect();
        assert_eq!(paginate(&records, 1, 4).items, &[1, 2, 3, 4]);
        assert_eq!(paginate(&records, 3, 4).items, &[9, 10]);
        assert_eq!(paginate(&records, 3, 4).total_pages, 3);
    }

    #[test]
    fn test_paginate_empty_is_page_one_of_one() {
        let records: Vec<u32> = Vec::new();
        let page = paginate(&records, 1, PAGE_SIZE);
        assert!(page.items.is_empty());
        assert_eq!(page.total_pages, 1);
    }

    #[test]
    fn test_paginate_out_of_range_is_empty() {
        let records: Vec<u32> = (1..=3).collect();
        assert!(paginate(&records, 7, PAGE_SIZE).items.is_empty());
        assert!(paginate(&records, usize::MAX, PAGE_SIZE).items.is_empty());
    }

    #[test]
    fn test_clamp_page() {
        assert_eq!(clamp_page(0, 3), 1);
        assert_eq!(clamp_page(5, 3), 3);
        assert_eq!(clamp_page(2, 0), 1);
    }

    #[test]
    fn test_pagination_state_boundaries() {
        let mut state = PaginationState::default();
        assert_eq!(state.page(), 1);
        state.set(2);
        assert_eq!(state.page(), 2);
        state.reset();
        assert_eq!(state.page(), 1);
        state.set(0);
        assert_eq!(state.page(), 1);
    }
}
