pub mod jobs;

use axum::Router;
use axum::routing::get;

use crate::routes::AppState;

pub fn router() -> Router<AppState> {
    let api = Router::new().route("/jobs", get(jobs::list));

    Router::new().nest("/api", api)
}
