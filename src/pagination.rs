use std::collections::BTreeSet;
use std::ops::RangeInclusive;

use crate::models::filter::{HoursOld, JobType};
use crate::models::site::JobSite;
use crate::query::QueryKey;

/// Page math for one result set. Pages are 1-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub current_page: u32,
    pub total: u64,
    pub page_size: u32,
}

impl Pagination {
    pub fn new(current_page: u32, total: u64, page_size: u32) -> Self {
        Self {
            current_page: current_page.max(1),
            total,
            page_size: page_size.max(1),
        }
    }

    pub fn total_pages(&self) -> u32 {
        let pages = self.total.div_ceil(u64::from(self.page_size));
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    /// A single page of results needs no controls.
    pub fn shows_controls(&self) -> bool {
        self.total_pages() > 1
    }

    pub fn clamp(&self, page: u32) -> u32 {
        page.clamp(1, self.total_pages().max(1))
    }

    pub fn go_to(&self, page: u32) -> u32 {
        self.clamp(page)
    }

    pub fn next(&self) -> u32 {
        self.clamp(self.current_page.saturating_add(1))
    }

    pub fn previous(&self) -> u32 {
        self.clamp(self.current_page.saturating_sub(1))
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages()
    }

    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    pub fn pages(&self) -> RangeInclusive<u32> {
        1..=self.total_pages()
    }

    /// Zero-based index of the first job on the current page.
    pub fn start_index(&self) -> u64 {
        u64::from(self.current_page - 1) * u64::from(self.page_size)
    }

    /// Results summary for `shown` rendered jobs.
    pub fn summary(&self, shown: usize) -> String {
        if self.total == 0 {
            return "No jobs found".to_string();
        }
        let start = self.start_index();
        format!(
            "Showing {}-{} of {} jobs",
            start + 1,
            start + shown as u64,
            self.total
        )
    }
}

/// Settled filter values other than the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterTuple {
    search_query: String,
    job_type: JobType,
    location: String,
    hours_old: HoursOld,
    include_remote: bool,
    job_sites: BTreeSet<JobSite>,
}

impl From<&QueryKey> for FilterTuple {
    fn from(key: &QueryKey) -> Self {
        Self {
            search_query: key.search_query.clone(),
            job_type: key.job_type,
            location: key.location.clone(),
            hours_old: key.hours_old,
            include_remote: key.include_remote,
            job_sites: key.job_sites.clone(),
        }
    }
}

/// Sends the user back to page 1 when a settled filter changes.
///
/// The page is not part of the compared tuple, so the reset it asks for
/// cannot trigger another one.
#[derive(Debug)]
pub struct FilterResetGuard {
    previous: FilterTuple,
}

impl FilterResetGuard {
    pub fn new(key: &QueryKey) -> Self {
        Self {
            previous: FilterTuple::from(key),
        }
    }

    /// Returns `true` when the caller should reset to page 1.
    pub fn check(&mut self, key: &QueryKey) -> bool {
        let current = FilterTuple::from(key);
        let changed = current != self.previous;
        self.previous = current;
        changed && key.current_page != 1
    }
}

/// Emits a scroll-to-top once the data for a newly selected page has loaded.
#[derive(Debug)]
pub struct ScrollTracker {
    last_page: u32,
    pending: bool,
}

impl ScrollTracker {
    pub fn new(initial_page: u32) -> Self {
        Self {
            last_page: initial_page,
            pending: false,
        }
    }

    pub fn check(&mut self, page: u32, loading: bool) -> bool {
        if page != self.last_page {
            self.last_page = page;
            self.pending = true;
        }
        if self.pending && !loading {
            self.pending = false;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::filter::FilterState;
    use crate::query::PAGE_SIZE;

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(Pagination::new(1, 0, PAGE_SIZE).total_pages(), 0);
        assert_eq!(Pagination::new(1, 4, PAGE_SIZE).total_pages(), 1);
        assert_eq!(Pagination::new(1, 5, PAGE_SIZE).total_pages(), 2);
        assert_eq!(Pagination::new(1, 12, PAGE_SIZE).total_pages(), 3);
    }

    #[test]
    fn controls_hidden_for_single_page() {
        assert!(!Pagination::new(1, 0, PAGE_SIZE).shows_controls());
        assert!(!Pagination::new(1, 4, PAGE_SIZE).shows_controls());
        assert!(Pagination::new(1, 5, PAGE_SIZE).shows_controls());
    }

    #[test]
    fn navigation_clamps_at_boundaries() {
        let first = Pagination::new(1, 12, PAGE_SIZE);
        assert_eq!(first.previous(), 1);
        assert_eq!(first.next(), 2);
        assert!(!first.has_previous());

        let last = Pagination::new(3, 12, PAGE_SIZE);
        assert_eq!(last.next(), 3);
        assert!(!last.has_next());
        assert_eq!(last.go_to(99), 3);
        assert_eq!(last.go_to(0), 1);
        assert_eq!(Pagination::new(1, 0, PAGE_SIZE).go_to(5), 1);
    }

    #[test]
    fn summary_reports_visible_range() {
        assert_eq!(Pagination::new(1, 12, PAGE_SIZE).summary(4), "Showing 1-4 of 12 jobs");
        assert_eq!(Pagination::new(3, 10, PAGE_SIZE).summary(2), "Showing 9-10 of 10 jobs");
        assert_eq!(Pagination::new(1, 0, PAGE_SIZE).summary(0), "No jobs found");
    }

    fn key(query: &str, page: u32) -> QueryKey {
        let mut state = FilterState::default();
        state.search_query = query.to_string();
        state.current_page = page;
        QueryKey::from_state(&state)
    }

    #[test]
    fn reset_guard_fires_once_per_filter_change() {
        let mut guard = FilterResetGuard::new(&key("rust", 3));
        assert!(!guard.check(&key("rust", 3)));
        assert!(guard.check(&key("go", 3)));
        // The reset itself only changes the page.
        assert!(!guard.check(&key("go", 1)));
        assert!(!guard.check(&key("go", 2)));
    }

    #[test]
    fn reset_guard_ignores_changes_on_first_page() {
        let mut guard = FilterResetGuard::new(&key("rust", 1));
        assert!(!guard.check(&key("go", 1)));
    }

    #[test]
    fn scroll_waits_for_page_data() {
        let mut scroll = ScrollTracker::new(1);
        assert!(!scroll.check(1, false));
        assert!(!scroll.check(2, true));
        assert!(!scroll.check(2, true));
        assert!(scroll.check(2, false));
        assert!(!scroll.check(2, false));
    }

    #[test]
    fn scroll_fires_immediately_for_cached_page() {
        let mut scroll = ScrollTracker::new(2);
        assert!(scroll.check(1, false));
    }
}
