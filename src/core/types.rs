use serde::{Deserialize, Serialize};

/// Query parameters as they arrive from the caller, before normalization.
///
/// Every field is a loosely typed string; `tools::jobs::query::normalize`
/// turns this into a `SearchSpec`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawJobQuery {
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub limit: Option<String>,
    /// Comma-separated skill keywords, e.g. `"go,rust"`.
    #[serde(default)]
    pub skills: Option<String>,
    /// Recency token: `day`, `week`, `month` or a number of days.
    #[serde(default)]
    pub date_range: Option<String>,
    /// Seniority token such as `"Mid-Senior Level"` or `entry_level`.
    #[serde(default)]
    pub experience: Option<String>,
}

pub const UNKNOWN_LOCATION: &str = "Unknown Location";

/// One job posting pulled from the rendered listings page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingRecord {
    pub id: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub link: String,
    #[serde(default)]
    pub date_posted: String,
}

/// Successful pipeline result.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSearchOutcome {
    pub count: usize,
    pub jobs: Vec<ListingRecord>,
    #[serde(default)]
    pub warnings: Vec<String>,
    pub search_url: String,
    pub scraped_at: String,
}

/// HTTP envelope for `GET /api/v1/jobs/getLinkedInJobs`.
#[derive(Debug, Serialize, Deserialize)]
pub struct JobsResponse {
    pub success: bool,
    pub status: u16,
    pub count: usize,
    pub jobs: Vec<ListingRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub status: u16,
    pub message: String,
}
