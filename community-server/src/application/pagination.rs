//! Page-number pagination over an ordered result set.
//!
//! Page numbers are 1-based. A missing or malformed page number selects the
//! first page; a number outside `1..=num_pages` selects the last page.

use serde::Serialize;

pub const PAGE_PARAM: &str = "page";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    count: u64,
    per_page: u64,
}

impl Paginator {
    pub fn new(count: u64, per_page: u64) -> Self {
        Self {
            count,
            per_page: per_page.max(1),
        }
    }

    pub fn per_page(&self) -> u64 {
        self.per_page
    }

    /// An empty result set still has one (empty) page.
    pub fn num_pages(&self) -> u64 {
        self.count.div_ceil(self.per_page).max(1)
    }

    pub fn resolve(&self, requested: Option<&str>) -> u64 {
        let Some(number) = requested.and_then(|raw| raw.trim().parse::<i64>().ok()) else {
            return 1;
        };
        let last = self.num_pages();
        if number >= 1 && (number as u64) <= last {
            number as u64
        } else {
            last
        }
    }

    pub fn offset(&self, number: u64) -> u64 {
        number.saturating_sub(1) * self.per_page
    }

    pub fn page<T>(&self, number: u64, items: Vec<T>) -> Page<T> {
        let num_pages = self.num_pages();
        let has_next = number < num_pages;
        let has_previous = number > 1;
        Page {
            len: items.len(),
            items,
            number,
            num_pages,
            count: self.count,
            has_next,
            has_previous,
            next_page_number: has_next.then_some(number + 1),
            previous_page_number: has_previous.then_some(number - 1),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u64,
    pub num_pages: u64,
    /// Total number of items across all pages.
    pub count: u64,
    /// Number of items on this page.
    pub len: usize,
    pub has_next: bool,
    pub has_previous: bool,
    pub next_page_number: Option<u64>,
    pub previous_page_number: Option<u64>,
}
