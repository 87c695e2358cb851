use std::time::Duration;

use tokio::sync::watch;

use crate::cache::{QueryCache, QueryStatus};
use crate::debounce::Debounced;
use crate::models::filter::{FilterState, HoursOld, JobType};
use crate::models::job::JobResult;
use crate::models::site::JobSite;
use crate::pagination::{FilterResetGuard, Pagination, ScrollTracker};
use crate::query::QueryKey;
use crate::store::{SearchStateStore, UrlState};

/// Main content of the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub enum Panel {
    Loading,
    Error { message: String },
    Empty,
    Results { jobs: Vec<JobResult> },
}

/// Everything a front end needs to draw one frame.
#[derive(Debug, Clone)]
pub struct DashboardView {
    pub filters: FilterState,
    pub key: QueryKey,
    pub summary: String,
    pub panel: Panel,
    /// Present only when there is more than one page to move between.
    pub pagination: Option<Pagination>,
    pub refreshing: bool,
    /// The API sent more jobs than a page holds; only one page is shown.
    pub paging_mismatch: bool,
    pub scroll_to_top: bool,
}

impl DashboardView {
    pub fn from_status(
        filters: FilterState,
        key: QueryKey,
        status: &QueryStatus,
        page_size: u32,
    ) -> Self {
        let mut view = DashboardView {
            filters,
            key,
            summary: String::new(),
            panel: Panel::Loading,
            pagination: None,
            refreshing: false,
            paging_mismatch: false,
            scroll_to_top: false,
        };

        match status {
            QueryStatus::Loading => view.summary = "Loading jobs...".to_string(),
            QueryStatus::Error(e) => {
                view.summary = "Error loading jobs".to_string();
                view.panel = Panel::Error {
                    message: e.to_string(),
                };
            }
            QueryStatus::Success { page, is_fetching } => {
                view.refreshing = *is_fetching;
                let pagination = Pagination::new(view.key.current_page, page.total, page_size);

                // Paging is assumed to happen server side, driven by offset
                // and results_wanted.
                let mut jobs = page.jobs.clone();
                if jobs.len() > page_size as usize {
                    tracing::warn!(
                        "Job API returned {} jobs for a page of {page_size}; showing the first {page_size}",
                        jobs.len()
                    );
                    jobs.truncate(page_size as usize);
                    view.paging_mismatch = true;
                }
                if pagination.start_index() + jobs.len() as u64 > page.total {
                    tracing::warn!(
                        "Job API reported total {} below the jobs shown on page {}",
                        page.total,
                        view.key.current_page
                    );
                    view.paging_mismatch = true;
                }

                if jobs.is_empty() {
                    view.summary = "No jobs found".to_string();
                    view.panel = Panel::Empty;
                } else {
                    view.summary = pagination.summary(jobs.len());
                    view.panel = Panel::Results { jobs };
                }
                if pagination.shows_controls() {
                    view.pagination = Some(pagination);
                }
            }
        }
        view
    }
}

/// One user's search session: URL-backed filters, debounced text inputs,
/// the response cache and the pagination bookkeeping around them.
///
/// Dropping the session cancels pending debounce timers and stops the cache
/// from applying any response that arrives afterwards.
pub struct Dashboard<L: UrlState> {
    store: SearchStateStore<L>,
    search_query: Debounced<String>,
    location: Debounced<String>,
    cache: QueryCache,
    updates: watch::Receiver<u64>,
    reset_guard: FilterResetGuard,
    scroll: ScrollTracker,
    last_pagination: Option<Pagination>,
    /// Page the view stays on while edited text is still settling.
    held_page: Option<u32>,
}

impl<L: UrlState> Dashboard<L> {
    pub fn new(store: SearchStateStore<L>, cache: QueryCache, debounce: Duration) -> Self {
        let state = store.state().clone();
        let key = QueryKey::from_state(&state);
        let updates = cache.subscribe();
        Self {
            search_query: Debounced::new(state.search_query, debounce),
            location: Debounced::new(state.location, debounce),
            reset_guard: FilterResetGuard::new(&key),
            scroll: ScrollTracker::new(key.current_page),
            store,
            cache,
            updates,
            last_pagination: None,
            held_page: None,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> &FilterState {
        self.store.state()
    }

    pub fn query(&self) -> String {
        self.store.query()
    }

    /// The key the current view is bound to, built from settled text.
    ///
    /// A text edit resets the stored page at once, but the key keeps the
    /// page on screen until that text settles.
    pub fn key(&self) -> QueryKey {
        let state = self.store.state();
        let mut key = QueryKey::settled(state, &self.search_query.get(), &self.location.get());
        if let Some(page) = self.held_page
            && !self.text_settled()
        {
            key.current_page = page;
        }
        key
    }

    fn text_settled(&self) -> bool {
        let state = self.store.state();
        self.search_query.get() == state.search_query && self.location.get() == state.location
    }

    fn hold_page(&mut self) {
        if self.held_page.is_none() {
            self.held_page = Some(self.key().current_page);
        }
    }

    /// Typed text is still inside its quiet period.
    pub fn is_settling(&self) -> bool {
        self.search_query.is_pending() || self.location.is_pending()
    }

    pub fn set_search_query(&mut self, text: &str) {
        self.hold_page();
        self.store.set_search_query(text);
        self.search_query.set(text.to_string());
    }

    pub fn set_location(&mut self, text: &str) {
        self.hold_page();
        self.store.set_location(text);
        self.location.set(text.to_string());
    }

    pub fn set_job_type(&mut self, job_type: JobType) {
        self.held_page = None;
        self.store.set_job_type(job_type);
    }

    pub fn set_hours_old(&mut self, hours_old: HoursOld) {
        self.held_page = None;
        self.store.set_hours_old(hours_old);
    }

    pub fn set_include_remote(&mut self, include_remote: bool) {
        self.held_page = None;
        self.store.set_include_remote(include_remote);
    }

    pub fn toggle_job_site(&mut self, site: JobSite) -> bool {
        let toggled = self.store.toggle_job_site(site);
        if toggled {
            self.held_page = None;
        }
        toggled
    }

    /// Jump to `page`, clamped to the pages on screen. Does nothing while
    /// pagination is hidden.
    pub fn go_to_page(&mut self, page: u32) -> bool {
        let Some(pagination) = self.last_pagination else {
            return false;
        };
        let target = pagination.go_to(page);
        if target == self.key().current_page {
            return false;
        }
        self.store.set_current_page(target);
        self.held_page = None;
        true
    }

    pub fn next_page(&mut self) -> bool {
        match self.last_pagination {
            Some(p) if p.has_next() => self.go_to_page(p.next()),
            _ => false,
        }
    }

    pub fn previous_page(&mut self) -> bool {
        match self.last_pagination {
            Some(p) if p.has_previous() => self.go_to_page(p.previous()),
            _ => false,
        }
    }

    pub fn clear_all_filters(&mut self) {
        self.store.clear_all();
        self.held_page = None;
        self.search_query.reset(String::new());
        self.location.reset(String::new());
    }

    /// Start over as if the page had been reloaded. Filters survive through
    /// the URL; cached responses do not.
    pub fn try_again(&mut self) {
        self.cache.reload();
    }

    pub fn render(&mut self) -> DashboardView {
        if self.held_page.is_some() && self.text_settled() {
            self.held_page = None;
        }
        let mut key = self.key();
        if self.reset_guard.check(&key) {
            tracing::debug!("Filters changed, returning to page 1");
            self.store.set_current_page(1);
            key = self.key();
        }

        let status = self.cache.observe(&key);
        let mut view = DashboardView::from_status(
            self.store.state().clone(),
            key,
            &status,
            self.cache.settings().page_size,
        );
        view.scroll_to_top = self
            .scroll
            .check(view.key.current_page, status.is_loading());
        self.last_pagination = view.pagination;
        view
    }

    /// Resolves when a settled input changes or a request finishes, i.e.
    /// whenever a new render may differ.
    pub async fn changed(&mut self) {
        tokio::select! {
            _ = self.search_query.changed() => {}
            _ = self.location.changed() => {}
            _ = self.updates.changed() => {}
        }
    }
}

impl<L: UrlState> Drop for Dashboard<L> {
    fn drop(&mut self) {
        self.search_query.cancel();
        self.location.cancel();
        self.cache.shutdown();
    }
}
