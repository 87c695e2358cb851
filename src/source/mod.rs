// Job sources: where result pages come from.

pub mod http;

use async_trait::async_trait;

use crate::error::FetchError;
use crate::models::job::JobPage;
use crate::query::ExternalQueryParams;

pub use http::HttpJobSource;

/// Trait every job backend implements. The cache calls it at most once per
/// in-flight key.
#[async_trait]
pub trait JobSource: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Fetch one page of jobs for the given parameters.
    async fn fetch_jobs(&self, params: &ExternalQueryParams) -> Result<JobPage, FetchError>;
}
