//! Page windows for list endpoints
//!
//! The server turns `?page=&per_page=` into LIMIT/OFFSET with [`Pagination`];
//! both sides of the wire share the [`Paginated`] body.

use serde::{Deserialize, Serialize};

const DEFAULT_PER_PAGE: u32 = 20;
const MAX_PER_PAGE: u32 = 100;

/// Requested window: 1-based page, `per_page` in `1..=100`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
}

impl Pagination {
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, MAX_PER_PAGE),
        }
    }

    /// Window from raw query values; missing values take the defaults.
    pub fn from_query(page: Option<u32>, per_page: Option<u32>) -> Self {
        Self::new(page.unwrap_or(1), per_page.unwrap_or(DEFAULT_PER_PAGE))
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * self.limit()
    }

    /// Attach this window's metadata to one page of rows.
    pub fn wrap<T>(&self, items: Vec<T>, total: i64) -> Paginated<T> {
        Paginated {
            items,
            total,
            page: self.page,
            per_page: self.per_page,
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::from_query(None, None)
    }
}

/// One page of a list plus the count across all pages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
}

impl<T> Paginated<T> {
    /// Number of pages; an empty list still has one.
    pub fn total_pages(&self) -> u32 {
        let total = u64::try_from(self.total).unwrap_or(0);
        let pages = total.div_ceil(u64::from(self.per_page.max(1))).max(1);
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_is_clamped() {
        assert_eq!(Pagination::new(0, 0), Pagination { page: 1, per_page: 1 });
        assert_eq!(Pagination::new(4, 500).per_page, 100);
        assert_eq!(Pagination::default(), Pagination { page: 1, per_page: 20 });
    }

    #[test]
    fn query_values_become_limit_and_offset() {
        let p = Pagination::from_query(Some(3), Some(25));
        assert_eq!((p.limit(), p.offset()), (25, 50));

        let p = Pagination::from_query(None, Some(10));
        assert_eq!((p.limit(), p.offset()), (10, 0));
    }

    #[test]
    fn last_page_has_no_next() {
        let window = Pagination::new(1, 20);
        let first = window.wrap(vec!['a'; 20], 45);
        assert_eq!(first.total_pages(), 3);
        assert!(first.has_next());

        let last = Pagination::new(3, 20).wrap(vec!['z'; 5], 45);
        assert!(!last.has_next());

        let empty: Paginated<char> = window.wrap(Vec::new(), 0);
        assert_eq!(empty.total_pages(), 1);
        assert!(!empty.has_next());
    }
}
