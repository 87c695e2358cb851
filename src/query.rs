use std::collections::BTreeSet;

use url::form_urlencoded;

use crate::models::filter::{FilterState, HoursOld, JobType};
use crate::models::site::JobSite;

/// Jobs requested per page.
pub const PAGE_SIZE: u32 = 4;

/// Sent as `search_term` when the user has not typed anything, so the API is
/// never asked for an empty search.
pub const FALLBACK_SEARCH_TERM: &str = "software engineer (javascript OR typescript OR react OR nodejs OR express OR python OR postgresql OR mysql OR mongo OR redis)";

/// Settled filter values that identify one request. Equal keys share a
/// cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub search_query: String,
    pub job_type: JobType,
    pub location: String,
    pub hours_old: HoursOld,
    pub include_remote: bool,
    pub job_sites: BTreeSet<JobSite>,
    pub current_page: u32,
}

impl QueryKey {
    /// Key for a state whose text fields are already settled.
    pub fn from_state(state: &FilterState) -> Self {
        Self::settled(state, &state.search_query, &state.location)
    }

    /// Key built from the store's state and the debounced text fields.
    pub fn settled(state: &FilterState, search_query: &str, location: &str) -> Self {
        Self {
            search_query: search_query.to_string(),
            job_type: state.job_type,
            location: location.to_string(),
            hours_old: state.hours_old,
            include_remote: state.include_remote,
            job_sites: state.job_sites.clone(),
            current_page: state.current_page.max(1),
        }
    }

    pub fn offset(&self, page_size: u32) -> u64 {
        u64::from(self.current_page.max(1) - 1) * u64::from(page_size)
    }
}

/// Ordered query parameters for `GET /jobs`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalQueryParams {
    pairs: Vec<(&'static str, String)>,
}

impl ExternalQueryParams {
    #[cfg(test)]
    pub fn pairs(&self) -> &[(&'static str, String)] {
        &self.pairs
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn to_query_string(&self) -> String {
        let mut out = form_urlencoded::Serializer::new(String::new());
        for (key, value) in &self.pairs {
            out.append_pair(key, value);
        }
        out.finish()
    }
}

/// Map a key onto the API's parameter vocabulary.
pub fn build_query(key: &QueryKey, page_size: u32) -> ExternalQueryParams {
    let search_term = if key.search_query.is_empty() {
        FALLBACK_SEARCH_TERM.to_string()
    } else {
        key.search_query.clone()
    };

    let mut pairs = vec![
        ("search_term", search_term),
        ("is_remote", key.include_remote.to_string()),
        ("location", key.location.clone()),
        ("results_wanted", page_size.to_string()),
        ("interval", "yearly".to_string()),
        ("country", "USA".to_string()),
        ("job_type", key.job_type.api_value().to_string()),
        ("hours_old", key.hours_old.to_string()),
        ("offset", key.offset(page_size).to_string()),
    ];
    pairs.extend(key.job_sites.iter().map(|site| ("site_name", site.as_str().to_string())));

    ExternalQueryParams { pairs }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn engineer_in_atlanta() -> FilterState {
        FilterState {
            search_query: "engineer".to_string(),
            job_type: JobType::Fulltime,
            location: "Atlanta, GA".to_string(),
            hours_old: HoursOld::ThreeDays,
            include_remote: true,
            job_sites: BTreeSet::from([JobSite::Indeed, JobSite::LinkedIn]),
            current_page: 2,
        }
    }

    #[test]
    fn builds_expected_parameters() {
        let query = build_query(&QueryKey::from_state(&engineer_in_atlanta()), PAGE_SIZE)
            .to_query_string();
        for fragment in [
            "job_type=fulltime",
            "hours_old=72",
            "offset=4",
            "site_name=indeed&site_name=linkedin",
            "is_remote=true",
            "location=Atlanta%2C+GA",
            "search_term=engineer",
            "results_wanted=4",
            "interval=yearly",
            "country=USA",
        ] {
            assert!(query.contains(fragment), "{fragment} missing from {query}");
        }
    }

    #[test]
    fn is_deterministic() {
        let key = QueryKey::from_state(&engineer_in_atlanta());
        assert_eq!(
            build_query(&key, PAGE_SIZE).to_query_string(),
            build_query(&key.clone(), PAGE_SIZE).to_query_string()
        );
    }

    #[test]
    fn empty_search_uses_fallback_and_all_type_is_blank() {
        let params = build_query(&QueryKey::from_state(&FilterState::default()), PAGE_SIZE);
        assert_eq!(params.get("search_term"), Some(FALLBACK_SEARCH_TERM));
        assert_eq!(params.get("job_type"), Some(""));
        assert_eq!(params.get("location"), Some(""));
        assert_eq!(params.get("offset"), Some("0"));
        let sites: Vec<_> = params
            .pairs()
            .iter()
            .filter(|(k, _)| *k == "site_name")
            .map(|(_, v)| v.as_str())
            .collect();
        assert_eq!(sites, vec!["indeed", "linkedin", "google"]);
    }

    #[test]
    fn offset_follows_page() {
        for page in 1..=50u32 {
            let mut state = FilterState::default();
            state.current_page = page;
            let key = QueryKey::from_state(&state);
            assert_eq!(key.offset(PAGE_SIZE), u64::from(page - 1) * 4);
        }
    }

    #[test]
    fn settled_key_uses_debounced_text() {
        let state = engineer_in_atlanta();
        let key = QueryKey::settled(&state, "eng", "Atl");
        assert_eq!(key.search_query, "eng");
        assert_eq!(key.location, "Atl");
        assert_eq!(key.current_page, 2);
    }
}
