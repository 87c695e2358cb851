use axum::Json;
use axum::extract::{RawQuery, State};
use serde::Serialize;

use crate::cache::QueryStatus;
use crate::dashboard::{DashboardView, Panel};
use crate::error::AppError;
use crate::models::filter::FilterState;
use crate::models::job::JobResult;
use crate::pagination::Pagination;
use crate::query::QueryKey;
use crate::routes::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobListResponse {
    pub jobs: Vec<JobResult>,
    pub total: u64,
    pub page: u32,
    pub total_pages: u32,
    pub summary: String,
    pub paging_mismatch: bool,
    pub filters: FilterState,
}

/// GET /api/jobs
///
/// Accepts the same query string as the dashboard. Malformed values fall
/// back to their defaults rather than failing the request.
pub async fn list(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
) -> Result<Json<JobListResponse>, AppError> {
    let filters = FilterState::from_query(raw.as_deref().unwrap_or_default());
    let key = QueryKey::from_state(&filters);
    let page = state.cache.load(&key).await?;
    let total = page.total;

    let page_size = state.cache.settings().page_size;
    let status = QueryStatus::Success {
        page,
        is_fetching: false,
    };
    let view = DashboardView::from_status(filters, key, &status, page_size);

    let jobs = match view.panel {
        Panel::Results { jobs } => jobs,
        _ => Vec::new(),
    };
    Ok(Json(JobListResponse {
        jobs,
        total,
        page: view.key.current_page,
        total_pages: Pagination::new(view.key.current_page, total, page_size).total_pages(),
        summary: view.summary,
        paging_mismatch: view.paging_mismatch,
        filters: view.filters,
    }))
}

#[cfg(test)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use pretty_assertions::assert_eq;
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::routes::router;
    use crate::routes::test_support::state;

    async fn get_json(app: axum::Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn lists_requested_page() {
        let (state, source) = state(10, false);
        let (status, body) = get_json(router(state), "/api/jobs?currentPage=3").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 10);
        assert_eq!(body["page"], 3);
        assert_eq!(body["totalPages"], 3);
        assert_eq!(body["summary"], "Showing 9-10 of 10 jobs");
        assert_eq!(body["jobs"].as_array().unwrap().len(), 2);
        assert_eq!(body["jobs"][0]["id"], "job-8");
        assert_eq!(body["filters"]["currentPage"], 3);
        assert_eq!(body["pagingMismatch"], false);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn malformed_values_fall_back_to_defaults() {
        let (state, _) = state(10, false);
        let (status, body) =
            get_json(router(state), "/api/jobs?jobType=gig&hoursOld=5&currentPage=-2").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["filters"]["jobType"], "all");
        assert_eq!(body["filters"]["hoursOld"], 72);
        assert_eq!(body["page"], 1);
    }

    #[tokio::test]
    async fn huge_total_saturates_page_count() {
        let (state, _) = state(u64::MAX, false);
        let (status, body) = get_json(router(state), "/api/jobs").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["totalPages"], u64::from(u32::MAX));
        assert_eq!(body["jobs"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn upstream_failure_is_bad_gateway() {
        let (state, _) = state(10, true);
        let (status, body) = get_json(router(state), "/api/jobs").await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(
            body["error"],
            "Failed to fetch jobs: 500 Internal Server Error"
        );
    }

    #[tokio::test]
    async fn healthz_responds() {
        let (state, _) = state(0, false);
        let response = router(state)
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
