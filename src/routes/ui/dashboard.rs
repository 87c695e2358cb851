use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{RawQuery, State};
use axum::response::{IntoResponse, Redirect, Response};
use url::Url;

use crate::cache::QueryStatus;
use crate::dashboard::{DashboardView, Panel};
use crate::models::filter::{FilterChange, FilterState, HoursOld, JobType};
use crate::models::job::JobResult;
use crate::models::site::JobSite;
use crate::query::QueryKey;
use crate::routes::{AppState, dashboard_href};
use crate::store::{MemoryUrl, SearchStateStore};

struct SelectOption {
    value: String,
    label: String,
    selected: bool,
}

struct JobCard {
    title: String,
    company: String,
    location: String,
    posted: String,
    salary: String,
    site: String,
    description: String,
    url: String,
}

impl From<&JobResult> for JobCard {
    fn from(job: &JobResult) -> Self {
        Self {
            title: job.title.clone(),
            company: job.company_name().to_string(),
            location: job.location_text().to_string(),
            posted: job.posted_text(),
            salary: job.salary_text(),
            site: job.site_name(),
            description: job.description.clone().unwrap_or_default(),
            url: job.job_url.as_deref().map(link_target).unwrap_or_default(),
        }
    }
}

/// Only web links are rendered as `href`s; anything else is dropped.
fn link_target(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => url.into(),
        _ => String::new(),
    }
}

struct PageLink {
    number: u32,
    href: String,
    current: bool,
}

#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
struct DashboardTemplate {
    search_query: String,
    location: String,
    include_remote: bool,
    job_types: Vec<SelectOption>,
    hours_options: Vec<SelectOption>,
    sites: Vec<SelectOption>,
    summary: String,
    loading: bool,
    error: String,
    empty: bool,
    jobs: Vec<JobCard>,
    paging_mismatch: bool,
    pages: Vec<PageLink>,
    prev_href: String,
    next_href: String,
    current_href: String,
}

impl DashboardTemplate {
    fn from_view(view: &DashboardView) -> Self {
        let filters = &view.filters;
        let page_href =
            |page: u32| dashboard_href(&filters.apply(FilterChange::CurrentPage(page)).to_query());

        let (pages, prev_href, next_href) = match view.pagination {
            Some(p) => (
                p.pages()
                    .map(|number| PageLink {
                        number,
                        href: page_href(number),
                        current: number == p.current_page,
                    })
                    .collect(),
                if p.has_previous() {
                    page_href(p.previous())
                } else {
                    String::new()
                },
                if p.has_next() {
                    page_href(p.next())
                } else {
                    String::new()
                },
            ),
            None => (Vec::new(), String::new(), String::new()),
        };

        let (jobs, error) = match &view.panel {
            Panel::Results { jobs } => (jobs.iter().map(JobCard::from).collect(), String::new()),
            Panel::Error { message } => (Vec::new(), message.clone()),
            Panel::Loading | Panel::Empty => (Vec::new(), String::new()),
        };

        Self {
            search_query: filters.search_query.clone(),
            location: filters.location.clone(),
            include_remote: filters.include_remote,
            job_types: JobType::ALL
                .into_iter()
                .map(|t| SelectOption {
                    value: t.as_str().to_string(),
                    label: t.label().to_string(),
                    selected: t == filters.job_type,
                })
                .collect(),
            hours_options: HoursOld::ALL
                .into_iter()
                .map(|h| SelectOption {
                    value: h.to_string(),
                    label: h.label().to_string(),
                    selected: h == filters.hours_old,
                })
                .collect(),
            sites: JobSite::ALL
                .into_iter()
                .map(|s| SelectOption {
                    value: s.as_str().to_string(),
                    label: s.display_name().to_string(),
                    selected: filters.job_sites.contains(&s),
                })
                .collect(),
            summary: view.summary.clone(),
            loading: view.panel == Panel::Loading,
            error,
            empty: view.panel == Panel::Empty,
            jobs,
            paging_mismatch: view.paging_mismatch,
            pages,
            prev_href,
            next_href,
            current_href: dashboard_href(&filters.to_query()),
        }
    }
}

/// GET /
///
/// The query string is the search state. Anything that is not already in
/// canonical form (a submitted filter form, stray keys, malformed values)
/// is redirected to it first.
pub async fn index(State(state): State<AppState>, RawQuery(raw): RawQuery) -> Response {
    let raw = raw.unwrap_or_default();
    let store = SearchStateStore::new(MemoryUrl::new(raw.as_str()));
    let canonical = store.query();
    if canonical != raw {
        return Redirect::to(&dashboard_href(&canonical)).into_response();
    }

    let filters: FilterState = store.state().clone();
    let key = QueryKey::from_state(&filters);
    let status = match state.cache.load(&key).await {
        Ok(page) => QueryStatus::Success {
            page,
            is_fetching: false,
        },
        Err(e) => QueryStatus::Error(e),
    };

    let view = DashboardView::from_status(filters, key, &status, state.cache.settings().page_size);
    DashboardTemplate::from_view(&view).into_response()
}
