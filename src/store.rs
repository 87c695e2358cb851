use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::models::filter::{FilterChange, FilterState, HoursOld, JobType};
use crate::models::site::JobSite;

/// Where the serialized search state lives between renders: a browser URL,
/// an in-process string, a file on disk.
pub trait UrlState: Send {
    /// Current query component, without the leading `?`.
    fn read(&self) -> String;

    /// Overwrite the current entry in place. Never adds a history entry.
    fn replace(&mut self, query: &str) -> std::io::Result<()>;
}

/// In-process location. Tracks how often it was written so callers can
/// assert that edits never grow the history.
#[derive(Debug, Default, Clone)]
pub struct MemoryUrl {
    query: String,
    replacements: usize,
}

impl MemoryUrl {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            replacements: 0,
        }
    }

    #[cfg(test)]
    pub fn replacements(&self) -> usize {
        self.replacements
    }
}

impl UrlState for MemoryUrl {
    fn read(&self) -> String {
        self.query.clone()
    }

    fn replace(&mut self, query: &str) -> std::io::Result<()> {
        self.query = query.to_string();
        self.replacements += 1;
        Ok(())
    }
}

/// Query string persisted to a file so a terminal session can resume.
#[derive(Debug, Clone)]
pub struct FileUrl {
    path: PathBuf,
}

impl FileUrl {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl UrlState for FileUrl {
    fn read(&self) -> String {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents.trim().to_string(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => {
                tracing::warn!("Failed to read state file {}: {e}", self.path.display());
                String::new()
            }
        }
    }

    fn replace(&mut self, query: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, query)
    }
}

/// Holds the current [`FilterState`] and writes every edit back to its
/// [`UrlState`] in canonical, default-stripped form.
pub struct SearchStateStore<L> {
    state: FilterState,
    location: L,
}

impl<L: UrlState> SearchStateStore<L> {
    /// Restore state from the location. Malformed values fall back to
    /// defaults field by field.
    pub fn new(location: L) -> Self {
        let state = FilterState::from_query(&location.read());
        Self { state, location }
    }

    pub fn state(&self) -> &FilterState {
        &self.state
    }

    #[cfg(test)]
    pub fn location(&self) -> &L {
        &self.location
    }

    /// Canonical query for the current state.
    pub fn query(&self) -> String {
        self.state.to_query()
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.apply(FilterChange::SearchQuery(query.into()));
    }

    pub fn set_job_type(&mut self, job_type: JobType) {
        self.apply(FilterChange::JobType(job_type));
    }

    pub fn set_location(&mut self, location: impl Into<String>) {
        self.apply(FilterChange::Location(location.into()));
    }

    pub fn set_hours_old(&mut self, hours_old: HoursOld) {
        self.apply(FilterChange::HoursOld(hours_old));
    }

    pub fn set_include_remote(&mut self, include_remote: bool) {
        self.apply(FilterChange::IncludeRemote(include_remote));
    }

    /// Replace the site selection. An empty selection is refused.
    pub fn set_job_sites(&mut self, sites: BTreeSet<JobSite>) -> bool {
        if sites.is_empty() {
            tracing::warn!("Refusing to deselect every job site");
            return false;
        }
        self.apply(FilterChange::JobSites(sites));
        true
    }

    /// Flip one site in or out of the selection. The last selected site
    /// cannot be removed.
    pub fn toggle_job_site(&mut self, site: JobSite) -> bool {
        let mut sites = self.state.job_sites.clone();
        if !sites.remove(&site) {
            sites.insert(site);
        }
        self.set_job_sites(sites)
    }

    pub fn set_current_page(&mut self, page: u32) {
        self.apply(FilterChange::CurrentPage(page));
    }

    /// Back to every default.
    pub fn clear_all(&mut self) {
        self.commit(FilterState::default());
    }

    fn apply(&mut self, change: FilterChange) {
        let next = self.state.apply(change);
        self.commit(next);
    }

    fn commit(&mut self, next: FilterState) {
        self.state = next;
        let query = self.state.to_query();
        if let Err(e) = self.location.replace(&query) {
            tracing::warn!("Failed to persist search state: {e}");
        }
    }
}
