use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::models::site::JobSite;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobType {
    #[default]
    All,
    Fulltime,
    Parttime,
    Internship,
    Contract,
}

impl JobType {
    pub const ALL: [JobType; 5] = [
        JobType::All,
        JobType::Fulltime,
        JobType::Parttime,
        JobType::Internship,
        JobType::Contract,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            JobType::All => "all",
            JobType::Fulltime => "fulltime",
            JobType::Parttime => "parttime",
            JobType::Internship => "internship",
            JobType::Contract => "contract",
        }
    }

    /// Value sent as `job_type`; the API treats an empty value as "any".
    pub fn api_value(self) -> &'static str {
        match self {
            JobType::All => "",
            other => other.as_str(),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            JobType::All => "All Types",
            JobType::Fulltime => "Full-time",
            JobType::Parttime => "Part-time",
            JobType::Internship => "Internship",
            JobType::Contract => "Contract",
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JobType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("Unknown job type: {s}"))
    }
}

/// Upper bound on a posting's age.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "u32", try_from = "u32")]
pub enum HoursOld {
    Day,
    #[default]
    ThreeDays,
    Week,
    Month,
    Year,
}

impl HoursOld {
    pub const ALL: [HoursOld; 5] = [
        HoursOld::Day,
        HoursOld::ThreeDays,
        HoursOld::Week,
        HoursOld::Month,
        HoursOld::Year,
    ];

    pub fn hours(self) -> u32 {
        match self {
            HoursOld::Day => 24,
            HoursOld::ThreeDays => 72,
            HoursOld::Week => 168,
            HoursOld::Month => 720,
            HoursOld::Year => 8760,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            HoursOld::Day => "Past 24 hours",
            HoursOld::ThreeDays => "Past 3 days",
            HoursOld::Week => "Past week",
            HoursOld::Month => "Past month",
            HoursOld::Year => "Past year",
        }
    }
}

impl From<HoursOld> for u32 {
    fn from(value: HoursOld) -> Self {
        value.hours()
    }
}

impl TryFrom<u32> for HoursOld {
    type Error = String;

    fn try_from(hours: u32) -> Result<Self, Self::Error> {
        HoursOld::ALL
            .into_iter()
            .find(|h| h.hours() == hours)
            .ok_or_else(|| format!("Unsupported hours-old window: {hours}"))
    }
}

impl FromStr for HoursOld {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hours: u32 = s
            .trim()
            .parse()
            .map_err(|_| format!("Invalid hours-old window: {s}"))?;
        HoursOld::try_from(hours)
    }
}

impl fmt::Display for HoursOld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.hours())
    }
}

pub fn default_job_sites() -> BTreeSet<JobSite> {
    BTreeSet::from([JobSite::Indeed, JobSite::LinkedIn, JobSite::Google])
}

/// The user's complete search intent, persisted in the URL query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    pub search_query: String,
    pub job_type: JobType,
    pub location: String,
    pub hours_old: HoursOld,
    pub include_remote: bool,
    pub job_sites: BTreeSet<JobSite>,
    pub current_page: u32,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            search_query: String::new(),
            job_type: JobType::default(),
            location: String::new(),
            hours_old: HoursOld::default(),
            include_remote: true,
            job_sites: default_job_sites(),
            current_page: 1,
        }
    }
}

/// A single-field edit of a [`FilterState`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterChange {
    SearchQuery(String),
    JobType(JobType),
    Location(String),
    HoursOld(HoursOld),
    IncludeRemote(bool),
    JobSites(BTreeSet<JobSite>),
    CurrentPage(u32),
}

impl FilterState {
    /// Merge one field into a copy of this state. Any change other than the
    /// page itself sends the user back to page 1.
    pub fn apply(&self, change: FilterChange) -> FilterState {
        let mut next = self.clone();
        match change {
            FilterChange::CurrentPage(page) => {
                next.current_page = page.max(1);
                return next;
            }
            FilterChange::SearchQuery(q) => next.search_query = q,
            FilterChange::JobType(t) => next.job_type = t,
            FilterChange::Location(l) => next.location = l,
            FilterChange::HoursOld(h) => next.hours_old = h,
            FilterChange::IncludeRemote(r) => next.include_remote = r,
            FilterChange::JobSites(sites) => next.job_sites = sites,
        }
        next.current_page = 1;
        next
    }

    /// Serialize to the URL query form, omitting every default-valued field.
    pub fn to_query(&self) -> String {
        let defaults = FilterState::default();
        let mut out = form_urlencoded::Serializer::new(String::new());

        if self.search_query != defaults.search_query {
            out.append_pair("searchQuery", &self.search_query);
        }
        if self.job_type != defaults.job_type {
            out.append_pair("jobType", self.job_type.as_str());
        }
        if self.location != defaults.location {
            out.append_pair("location", &self.location);
        }
        if self.hours_old != defaults.hours_old {
            out.append_pair("hoursOld", &self.hours_old.to_string());
        }
        if self.current_page != defaults.current_page {
            out.append_pair("currentPage", &self.current_page.to_string());
        }
        if self.include_remote != defaults.include_remote {
            out.append_pair("includeRemote", if self.include_remote { "true" } else { "false" });
        }
        if self.job_sites != defaults.job_sites {
            for site in &self.job_sites {
                out.append_pair("jobSites", site.as_str());
            }
        }

        out.finish()
    }

    /// Parse the URL query form. Unknown keys are ignored and each malformed
    /// field falls back to its default on its own; this never fails.
    pub fn from_query(query: &str) -> FilterState {
        let mut state = FilterState::default();
        let mut sites: Option<BTreeSet<JobSite>> = None;

        let query = query.strip_prefix('?').unwrap_or(query);
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "searchQuery" => state.search_query = value.into_owned(),
                "location" => state.location = value.into_owned(),
                "jobType" => match value.parse() {
                    Ok(t) => state.job_type = t,
                    Err(e) => coerced("jobType", &e),
                },
                "hoursOld" => match value.parse() {
                    Ok(h) => state.hours_old = h,
                    Err(e) => coerced("hoursOld", &e),
                },
                "currentPage" => match value.trim().parse::<u32>() {
                    Ok(page) if page >= 1 => state.current_page = page,
                    _ => coerced("currentPage", &value),
                },
                "includeRemote" => match value.as_ref() {
                    "true" => state.include_remote = true,
                    "false" => state.include_remote = false,
                    other => coerced("includeRemote", &other),
                },
                "jobSites" => {
                    let set = sites.get_or_insert_with(BTreeSet::new);
                    for raw in value.split(',').filter(|s| !s.trim().is_empty()) {
                        match raw.parse::<JobSite>() {
                            Ok(site) => {
                                set.insert(site);
                            }
                            Err(e) => coerced("jobSites", &e),
                        }
                    }
                }
                _ => {}
            }
        }

        // An empty selection is not a valid search; fall back to the defaults.
        if let Some(sites) = sites.filter(|s| !s.is_empty()) {
            state.job_sites = sites;
        }

        state
    }
}

fn coerced(field: &str, detail: &dyn fmt::Display) {
    tracing::warn!("Ignoring malformed '{field}' in URL state: {detail}");
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn sample() -> FilterState {
        FilterState {
            search_query: "rust & go = fun".to_string(),
            job_type: JobType::Contract,
            location: "Atlanta, GA".to_string(),
            hours_old: HoursOld::Month,
            include_remote: false,
            job_sites: BTreeSet::from([JobSite::Bdjobs, JobSite::ZipRecruiter]),
            current_page: 7,
        }
    }

    #[test]
    fn default_state_serializes_to_empty_query() {
        assert_eq!(FilterState::default().to_query(), "");
        assert_eq!(FilterState::from_query(""), FilterState::default());
    }

    #[test]
    fn round_trips_through_query() {
        let state = sample();
        assert_eq!(FilterState::from_query(&state.to_query()), state);

        let mut only_page = FilterState::default();
        only_page.current_page = 2;
        assert_eq!(only_page.to_query(), "currentPage=2");
        assert_eq!(FilterState::from_query("currentPage=2"), only_page);
    }

    #[test]
    fn every_combination_round_trips() {
        let site_sets = [
            default_job_sites(),
            BTreeSet::from([JobSite::Bdjobs]),
            BTreeSet::from([JobSite::ZipRecruiter, JobSite::Glassdoor, JobSite::Naukri]),
            JobSite::ALL.into_iter().collect(),
        ];
        let texts = [
            "",
            "rust & go = fun",
            "c++ 100%",
            "a+b=c&d",
            "São Paulo, Brasil",
            "日本 東京",
            "%20 %2C ?#",
        ];

        for job_type in JobType::ALL {
            for hours_old in HoursOld::ALL {
                for include_remote in [true, false] {
                    for (i, job_sites) in site_sets.iter().enumerate() {
                        let text = texts[i % texts.len()];
                        let state = FilterState {
                            search_query: text.to_string(),
                            job_type,
                            location: texts[(i + 3) % texts.len()].to_string(),
                            hours_old,
                            include_remote,
                            job_sites: job_sites.clone(),
                            current_page: 1 + i as u32,
                        };
                        assert_eq!(FilterState::from_query(&state.to_query()), state);
                    }
                }
            }
        }

        for text in texts {
            let state = FilterState {
                search_query: text.to_string(),
                location: text.to_string(),
                ..FilterState::default()
            };
            assert_eq!(FilterState::from_query(&state.to_query()), state);
        }
    }

    #[test]
    fn round_trip_omits_default_fields() {
        let mut state = FilterState::default();
        state.search_query = "engineer".to_string();
        state.job_type = JobType::Fulltime;
        assert_eq!(state.to_query(), "searchQuery=engineer&jobType=fulltime");
    }

    #[test]
    fn job_sites_written_in_catalog_order() {
        let mut state = FilterState::default();
        state.job_sites = BTreeSet::from([JobSite::Google, JobSite::Indeed]);
        assert_eq!(state.to_query(), "jobSites=indeed&jobSites=google");
    }

    #[test]
    fn malformed_fields_fall_back_individually() {
        let state = FilterState::from_query(
            "searchQuery=dev&jobType=wizard&hoursOld=5&currentPage=0&includeRemote=maybe&bogus=1",
        );
        assert_eq!(state.search_query, "dev");
        assert_eq!(state.job_type, JobType::All);
        assert_eq!(state.hours_old, HoursOld::ThreeDays);
        assert_eq!(state.current_page, 1);
        assert!(state.include_remote);

        assert_eq!(FilterState::from_query("currentPage=-3").current_page, 1);
        assert_eq!(FilterState::from_query("currentPage=abc").current_page, 1);
    }

    #[test]
    fn job_sites_accept_repeated_and_comma_separated_values() {
        let state = FilterState::from_query("jobSites=indeed,bayt&jobSites=monster&jobSites=naukri");
        assert_eq!(
            state.job_sites,
            BTreeSet::from([JobSite::Indeed, JobSite::Bayt, JobSite::Naukri])
        );
    }

    #[test]
    fn empty_job_sites_fall_back_to_defaults() {
        assert_eq!(FilterState::from_query("jobSites=").job_sites, default_job_sites());
        assert_eq!(
            FilterState::from_query("jobSites=monster").job_sites,
            default_job_sites()
        );
    }

    #[test]
    fn last_scalar_value_wins() {
        let state = FilterState::from_query("includeRemote=false&includeRemote=true");
        assert!(state.include_remote);
        let state = FilterState::from_query("includeRemote=false");
        assert!(!state.include_remote);
    }

    #[test]
    fn non_page_changes_reset_page() {
        let state = sample();
        let changed = state.apply(FilterChange::IncludeRemote(true));
        assert_eq!(changed.current_page, 1);
        assert!(changed.include_remote);
        assert_eq!(changed.search_query, state.search_query);

        let paged = state.apply(FilterChange::CurrentPage(3));
        assert_eq!(paged.current_page, 3);
        assert_eq!(FilterState { current_page: 7, ..paged }, state);
    }

    #[test]
    fn hours_old_parses_only_supported_windows() {
        assert_eq!("168".parse::<HoursOld>(), Ok(HoursOld::Week));
        assert!("100".parse::<HoursOld>().is_err());
        assert_eq!(serde_json::to_string(&HoursOld::Year).unwrap(), "8760");
    }
}
