use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::FetchError;
use crate::models::job::JobPage;
use crate::query::{PAGE_SIZE, QueryKey, build_query};
use crate::source::JobSource;

pub const DEFAULT_STALE_TIME: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_GC_TIME: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Clone)]
pub struct CacheSettings {
    /// Age after which cached data is revalidated in the background.
    pub stale_time: Duration,
    /// Idle time after which an entry is dropped.
    pub gc_time: Duration,
    pub page_size: u32,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            stale_time: DEFAULT_STALE_TIME,
            gc_time: DEFAULT_GC_TIME,
            page_size: PAGE_SIZE,
        }
    }
}

pub type FetchResult = Result<Arc<JobPage>, FetchError>;
type InFlight = Shared<BoxFuture<'static, FetchResult>>;

/// What a view should show for one key.
#[derive(Debug, Clone)]
pub enum QueryStatus {
    Loading,
    Error(FetchError),
    Success {
        page: Arc<JobPage>,
        /// A background revalidation is running; `page` stays valid.
        is_fetching: bool,
    },
}

impl QueryStatus {
    pub fn is_loading(&self) -> bool {
        matches!(self, QueryStatus::Loading)
    }

    #[cfg(test)]
    pub fn page(&self) -> Option<&Arc<JobPage>> {
        match self {
            QueryStatus::Success { page, .. } => Some(page),
            _ => None,
        }
    }
}

struct Entry {
    data: Option<Arc<JobPage>>,
    error: Option<FetchError>,
    updated_at: Option<Instant>,
    last_used: Instant,
    in_flight: Option<InFlight>,
}

impl Entry {
    fn new(now: Instant) -> Self {
        Self {
            data: None,
            error: None,
            updated_at: None,
            last_used: now,
            in_flight: None,
        }
    }

    fn is_stale(&self, now: Instant, stale_time: Duration) -> bool {
        self.updated_at
            .is_none_or(|at| now.duration_since(at) >= stale_time)
    }

    fn status(&self) -> QueryStatus {
        if let Some(error) = &self.error {
            return QueryStatus::Error(error.clone());
        }
        match &self.data {
            Some(page) => QueryStatus::Success {
                page: Arc::clone(page),
                is_fetching: self.in_flight.is_some(),
            },
            None => QueryStatus::Loading,
        }
    }
}

struct State {
    /// Bumped by `reload`; results started under an older epoch are dropped.
    epoch: u64,
    entries: HashMap<QueryKey, Entry>,
}

impl State {
    fn evict_idle(&mut self, now: Instant, gc_time: Duration) {
        let before = self.entries.len();
        self.entries
            .retain(|_, e| e.in_flight.is_some() || now.duration_since(e.last_used) < gc_time);
        let evicted = before - self.entries.len();
        if evicted > 0 {
            tracing::debug!("Evicted {evicted} idle cache entries");
        }
    }
}

struct Inner {
    source: Arc<dyn JobSource>,
    settings: CacheSettings,
    state: Mutex<State>,
    updates: watch::Sender<u64>,
    shutdown: CancellationToken,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn settle(&self, key: &QueryKey, epoch: u64, result: &FetchResult) {
        if self.shutdown.is_cancelled() {
            tracing::debug!("Discarding jobs response received after shutdown");
            return;
        }
        {
            let mut state = self.lock();
            if state.epoch != epoch {
                tracing::debug!("Discarding jobs response from before reload");
                return;
            }
            let Some(entry) = state.entries.get_mut(key) else {
                return;
            };
            entry.in_flight = None;
            match result {
                Ok(page) => {
                    entry.data = Some(Arc::clone(page));
                    entry.error = None;
                    entry.updated_at = Some(Instant::now());
                }
                Err(e) => {
                    tracing::error!("Job fetch failed: {e}");
                    entry.error = Some(e.clone());
                }
            }
        }
        self.updates.send_modify(|version| *version += 1);
    }
}

/// Time-boxed response cache keyed by [`QueryKey`].
///
/// At most one request per key is in flight; every caller asking for that
/// key while it runs shares its outcome. Results land under their own key,
/// so a slow response for a superseded key never shows up for the current
/// one.
#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<Inner>,
}

impl QueryCache {
    pub fn new(source: Arc<dyn JobSource>, settings: CacheSettings) -> Self {
        let (updates, _) = watch::channel(0);
        Self {
            inner: Arc::new(Inner {
                source,
                settings,
                state: Mutex::new(State {
                    epoch: 0,
                    entries: HashMap::new(),
                }),
                updates,
                shutdown: CancellationToken::new(),
            }),
        }
    }

    pub fn settings(&self) -> &CacheSettings {
        &self.inner.settings
    }

    /// Ticks whenever a request settles.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.updates.subscribe()
    }

    /// Current status for `key`, starting a request when nothing usable is
    /// cached. Stale data is returned as-is while a background refetch runs.
    /// A failed key is left alone until [`load`](Self::load) or
    /// [`reload`](Self::reload).
    pub fn observe(&self, key: &QueryKey) -> QueryStatus {
        let now = Instant::now();
        let settings = &self.inner.settings;
        let mut state = self.inner.lock();
        state.evict_idle(now, settings.gc_time);
        let epoch = state.epoch;

        let entry = state
            .entries
            .entry(key.clone())
            .or_insert_with(|| Entry::new(now));
        entry.last_used = now;

        if entry.in_flight.is_none()
            && entry.error.is_none()
            && entry.is_stale(now, settings.stale_time)
        {
            entry.in_flight = Some(self.spawn_fetch(key.clone(), epoch));
        }
        entry.status()
    }

    /// Data for `key`, awaiting the network only when nothing is cached.
    /// Unlike `observe`, a key whose last attempt failed is tried again.
    pub async fn load(&self, key: &QueryKey) -> FetchResult {
        let pending = {
            let now = Instant::now();
            let settings = &self.inner.settings;
            let mut state = self.inner.lock();
            state.evict_idle(now, settings.gc_time);
            let epoch = state.epoch;

            let entry = state
                .entries
                .entry(key.clone())
                .or_insert_with(|| Entry::new(now));
            entry.last_used = now;

            if entry.error.is_none()
                && let Some(page) = entry.data.clone()
            {
                if entry.in_flight.is_none() && entry.is_stale(now, settings.stale_time) {
                    entry.in_flight = Some(self.spawn_fetch(key.clone(), epoch));
                } else {
                    tracing::debug!("Serving jobs from cache");
                }
                return Ok(page);
            }

            match &entry.in_flight {
                Some(in_flight) => in_flight.clone(),
                None => {
                    entry.error = None;
                    let in_flight = self.spawn_fetch(key.clone(), epoch);
                    entry.in_flight = Some(in_flight.clone());
                    in_flight
                }
            }
        };
        pending.await
    }

    /// Forget everything, including requests still in flight.
    pub fn reload(&self) {
        {
            let mut state = self.inner.lock();
            state.epoch += 1;
            state.entries.clear();
        }
        tracing::info!("Job cache cleared");
        self.inner.updates.send_modify(|version| *version += 1);
    }

    /// Stop applying results. Requests still running are abandoned.
    pub fn shutdown(&self) {
        self.inner.shutdown.cancel();
    }

    fn spawn_fetch(&self, key: QueryKey, epoch: u64) -> InFlight {
        let inner = Arc::clone(&self.inner);
        let fetch = async move {
            let params = build_query(&key, inner.settings.page_size);
            tracing::info!(
                "Fetching jobs from {} (page {}, offset {})",
                inner.source.name(),
                key.current_page,
                params.get("offset").unwrap_or("0")
            );
            let result = inner.source.fetch_jobs(&params).await.map(Arc::new);
            inner.settle(&key, epoch, &result);
            result
        }
        .boxed()
        .shared();

        let driver = fetch.clone();
        let shutdown = self.inner.shutdown.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = shutdown.cancelled() => {}
                _ = driver => {}
            }
        });
        fetch
    }

    #[cfg(test)]
    fn entry_count(&self) -> usize {
        self.inner.lock().entries.len()
    }

    #[cfg(test)]
    pub(crate) fn peek(&self, key: &QueryKey) -> Option<QueryStatus> {
        self.inner.lock().entries.get(key).map(Entry::status)
    }
}
