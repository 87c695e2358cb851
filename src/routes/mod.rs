pub mod api;
pub mod ui;

use axum::Router;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;

use crate::cache::QueryCache;

#[derive(Clone)]
pub struct AppState {
    pub cache: QueryCache,
}

async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .merge(ui::router())
        .merge(api::router())
        .with_state(state)
}

/// Dashboard URL for a canonical filter query.
pub fn dashboard_href(query: &str) -> String {
    if query.is_empty() {
        "/".to_string()
    } else {
        format!("/?{query}")
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::cache::{CacheSettings, QueryCache};
    use crate::error::FetchError;
    use crate::models::job::{JobPage, JobResult};
    use crate::query::ExternalQueryParams;
    use crate::source::JobSource;

    use super::AppState;

    /// Serves `total` jobs in API-sized pages, or fails with a 500.
    pub struct StubSource {
        pub total: u64,
        pub fail: bool,
        pub calls: AtomicUsize,
    }

    impl StubSource {
        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl JobSource for StubSource {
        fn name(&self) -> &str {
            "stub"
        }

        async fn fetch_jobs(&self, params: &ExternalQueryParams) -> Result<JobPage, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(FetchError::Status {
                    status: 500,
                    status_text: "Internal Server Error".to_string(),
                });
            }
            let offset: u64 = params.get("offset").unwrap_or("0").parse().unwrap();
            let wanted: u64 = params.get("results_wanted").unwrap_or("4").parse().unwrap();
            let jobs = (offset..(offset + wanted).min(self.total))
                .map(|i| JobResult {
                    id: format!("job-{i}"),
                    title: format!("Engineer <{i}>"),
                    company: Some("Acme".to_string()),
                    location: Some("Atlanta, GA".to_string()),
                    date_posted: Some("2024-05-01".to_string()),
                    min_amount: Some(90000.0),
                    max_amount: Some(120000.0),
                    site: "linkedin".to_string(),
                    description: Some("Build things".to_string()),
                    job_url: None,
                })
                .collect();
            Ok(JobPage {
                jobs,
                total: self.total,
            })
        }
    }

    pub fn state(total: u64, fail: bool) -> (AppState, Arc<StubSource>) {
        let source = Arc::new(StubSource {
            total,
            fail,
            calls: AtomicUsize::new(0),
        });
        let cache = QueryCache::new(source.clone(), CacheSettings::default());
        (AppState { cache }, source)
    }
}
