use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};

use crate::models::site::site_display_name;

/// One posting as returned by the aggregation API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobResult {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub title: String,
    pub company: Option<String>,
    pub location: Option<String>,
    pub date_posted: Option<String>,
    pub min_amount: Option<f64>,
    pub max_amount: Option<f64>,
    pub site: String,
    pub description: Option<String>,
    pub job_url: Option<String>,
}

impl JobResult {
    pub fn site_name(&self) -> String {
        site_display_name(&self.site)
    }

    pub fn company_name(&self) -> &str {
        self.company.as_deref().filter(|c| !c.is_empty()).unwrap_or("Unknown company")
    }

    pub fn location_text(&self) -> &str {
        self.location.as_deref().filter(|l| !l.is_empty()).unwrap_or("Location not listed")
    }

    /// "$80,000 - $120,000" when both bounds are present and non-zero.
    pub fn salary_text(&self) -> String {
        match (self.min_amount, self.max_amount) {
            (Some(min), Some(max)) if min > 0.0 && max > 0.0 => {
                format!("${} - ${}", group_thousands(min), group_thousands(max))
            }
            _ => "Salary not specified".to_string(),
        }
    }

    /// US-style short date (`5/1/2024`), accepting plain dates and RFC 3339.
    pub fn posted_text(&self) -> String {
        let Some(raw) = self.date_posted.as_deref() else {
            return "Date not available".to_string();
        };
        let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()));
        match date {
            Some(d) => d.format("%-m/%-d/%Y").to_string(),
            None => "Date not available".to_string(),
        }
    }
}

fn group_thousands(amount: f64) -> String {
    let whole = amount.round() as u64;
    let digits = whole.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}

/// A normalized page of results.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct JobPage {
    pub jobs: Vec<JobResult>,
    pub total: u64,
}

/// The two shapes the API is known to answer with.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum JobsResponse {
    List(Vec<JobResult>),
    Envelope {
        jobs: Option<Vec<JobResult>>,
        total: Option<u64>,
        count: Option<u64>,
    },
}

impl From<JobsResponse> for JobPage {
    fn from(response: JobsResponse) -> Self {
        match response {
            JobsResponse::List(jobs) => JobPage {
                total: jobs.len() as u64,
                jobs,
            },
            JobsResponse::Envelope { jobs, total, count } => {
                let jobs = jobs.unwrap_or_default();
                // A zero total means "unknown" to the API, same as a missing one.
                let total = total
                    .filter(|t| *t > 0)
                    .or(count.filter(|c| *c > 0))
                    .unwrap_or(jobs.len() as u64);
                JobPage { jobs, total }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn job(id: &str) -> serde_json::Value {
        json!({ "id": id, "title": "Engineer", "company": "Acme", "location": "Atlanta, GA", "site": "indeed" })
    }

    fn parse(value: serde_json::Value) -> JobPage {
        serde_json::from_value::<JobsResponse>(value).unwrap().into()
    }

    #[test]
    fn bare_array_uses_length_as_total() {
        let page = parse(json!([job("a"), job("b")]));
        assert_eq!(page.total, 2);
        assert_eq!(page.jobs.len(), 2);
    }

    #[test]
    fn envelope_prefers_total_then_count() {
        assert_eq!(parse(json!({ "jobs": [job("a")], "total": 12 })).total, 12);
        assert_eq!(parse(json!({ "jobs": [job("a")], "count": 9 })).total, 9);
        assert_eq!(parse(json!({ "jobs": [job("a")], "total": 0, "count": 5 })).total, 5);
        assert_eq!(parse(json!({ "jobs": [job("a"), job("b")] })).total, 2);
    }

    #[test]
    fn envelope_without_jobs_is_empty() {
        let page = parse(json!({ "total": 0 }));
        assert!(page.jobs.is_empty());
        assert_eq!(page.total, 0);

        let page = parse(json!({ "jobs": null }));
        assert!(page.jobs.is_empty());
    }

    #[test]
    fn numeric_ids_are_accepted() {
        let page = parse(json!([{ "id": 42, "title": "Dev", "site": "google" }]));
        assert_eq!(page.jobs[0].id, "42");
        assert_eq!(page.jobs[0].company_name(), "Unknown company");
    }

    #[test]
    fn malformed_job_rejects_whole_response() {
        let result = serde_json::from_value::<JobsResponse>(json!([{ "id": "x" }]));
        assert!(result.is_err());
    }

    #[test]
    fn salary_needs_both_bounds() {
        let mut result: JobResult = serde_json::from_value(job("a")).unwrap();
        assert_eq!(result.salary_text(), "Salary not specified");
        result.min_amount = Some(80000.0);
        assert_eq!(result.salary_text(), "Salary not specified");
        result.max_amount = Some(1_250_000.4);
        assert_eq!(result.salary_text(), "$80,000 - $1,250,000");
    }

    #[test]
    fn posted_dates_render_us_style() {
        let mut result: JobResult = serde_json::from_value(job("a")).unwrap();
        assert_eq!(result.posted_text(), "Date not available");
        result.date_posted = Some("2024-05-01".to_string());
        assert_eq!(result.posted_text(), "5/1/2024");
        result.date_posted = Some("2024-11-23T10:00:00Z".to_string());
        assert_eq!(result.posted_text(), "11/23/2024");
        result.date_posted = Some("yesterday".to_string());
        assert_eq!(result.posted_text(), "Date not available");
    }
}
