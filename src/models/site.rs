use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Job boards the aggregation API can scrape.
///
/// Variant order is the catalog order; it drives the order of `site_name`
/// parameters and of `jobSites` keys in the URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum JobSite {
    #[serde(rename = "indeed")]
    Indeed,
    #[serde(rename = "linkedin")]
    LinkedIn,
    #[serde(rename = "zip_recruiter")]
    ZipRecruiter,
    #[serde(rename = "bayt")]
    Bayt,
    #[serde(rename = "google")]
    Google,
    #[serde(rename = "glassdoor")]
    Glassdoor,
    #[serde(rename = "naukri")]
    Naukri,
    #[serde(rename = "bdjobs")]
    Bdjobs,
}

impl JobSite {
    pub const ALL: [JobSite; 8] = [
        JobSite::Indeed,
        JobSite::LinkedIn,
        JobSite::ZipRecruiter,
        JobSite::Bayt,
        JobSite::Google,
        JobSite::Glassdoor,
        JobSite::Naukri,
        JobSite::Bdjobs,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            JobSite::Indeed => "indeed",
            JobSite::LinkedIn => "linkedin",
            JobSite::ZipRecruiter => "zip_recruiter",
            JobSite::Bayt => "bayt",
            JobSite::Google => "google",
            JobSite::Glassdoor => "glassdoor",
            JobSite::Naukri => "naukri",
            JobSite::Bdjobs => "bdjobs",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            JobSite::Indeed => "Indeed",
            JobSite::LinkedIn => "LinkedIn",
            JobSite::ZipRecruiter => "ZipRecruiter",
            JobSite::Bayt => "Bayt",
            JobSite::Google => "Google",
            JobSite::Glassdoor => "Glassdoor",
            JobSite::Naukri => "Naukri",
            JobSite::Bdjobs => "Bdjobs",
        }
    }
}

impl fmt::Display for JobSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown job site: {0}")]
pub struct UnknownSite(pub String);

impl FromStr for JobSite {
    type Err = UnknownSite;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        JobSite::ALL
            .into_iter()
            .find(|site| site.as_str() == lowered)
            .ok_or_else(|| UnknownSite(s.to_string()))
    }
}

/// Human-readable name for a raw site id as reported by the API.
/// Ids outside the catalog render with their first letter capitalized.
pub fn site_display_name(raw: &str) -> String {
    if let Ok(site) = raw.parse::<JobSite>() {
        return site.display_name().to_string();
    }
    let mut chars = raw.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_catalog_ids_case_insensitively() {
        assert_eq!("linkedin".parse::<JobSite>(), Ok(JobSite::LinkedIn));
        assert_eq!("LinkedIn".parse::<JobSite>(), Ok(JobSite::LinkedIn));
        assert_eq!("zip_recruiter".parse::<JobSite>(), Ok(JobSite::ZipRecruiter));
        assert!("monster".parse::<JobSite>().is_err());
    }

    #[test]
    fn display_names_fall_back_to_capitalized_id() {
        assert_eq!(site_display_name("zip_recruiter"), "ZipRecruiter");
        assert_eq!(site_display_name("INDEED"), "Indeed");
        assert_eq!(site_display_name("monster"), "Monster");
        assert_eq!(site_display_name(""), "");
    }

    #[test]
    fn serde_uses_wire_ids() {
        let json = serde_json::to_string(&JobSite::ZipRecruiter).unwrap();
        assert_eq!(json, "\"zip_recruiter\"");
    }
}
