use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use url::Url;

use crate::error::{AppError, FetchError};
use crate::models::job::{JobPage, JobsResponse};
use crate::query::ExternalQueryParams;
use crate::source::JobSource;

/// Client for the aggregation API's `GET /jobs` endpoint.
pub struct HttpJobSource {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpJobSource {
    pub fn new(api_url: &str, timeout: Duration) -> Result<Self, AppError> {
        let mut base = Url::parse(api_url)
            .map_err(|e| AppError::Internal(format!("Invalid job API URL '{api_url}': {e}")))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let endpoint = base
            .join("jobs")
            .map_err(|e| AppError::Internal(format!("Invalid job API URL '{api_url}': {e}")))?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl JobSource for HttpJobSource {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch_jobs(&self, params: &ExternalQueryParams) -> Result<JobPage, FetchError> {
        let mut url = self.endpoint.clone();
        url.set_query(Some(&params.to_query_string()));
        tracing::debug!("GET {url}");

        let resp = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        let parsed: JobsResponse =
            serde_json::from_slice(&body).map_err(|e| FetchError::Decode(e.to_string()))?;

        let page = JobPage::from(parsed);
        tracing::debug!("Fetched {} jobs (total {})", page.jobs.len(), page.total);
        Ok(page)
    }
}
