use regex::Regex;
use std::sync::OnceLock;

use crate::core::errors::ScrapeError;
use crate::types::RawJobQuery;

pub const DEFAULT_LIMIT: usize = 10;
pub const SECONDS_PER_DAY: u64 = 86_400;

/// Seniority filter understood by the listings site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExperienceLevel {
    Internship,
    EntryLevel,
    Associate,
    MidSeniorLevel,
    Director,
    Executive,
}

impl ExperienceLevel {
    /// Parse a user token such as `"Mid-Senior Level"` or `entry_level`.
    pub fn parse_token(token: &str) -> Option<Self> {
        match normalize_experience_token(token).as_str() {
            "internship" => Some(ExperienceLevel::Internship),
            "entry_level" => Some(ExperienceLevel::EntryLevel),
            "associate" => Some(ExperienceLevel::Associate),
            "mid_senior_level" => Some(ExperienceLevel::MidSeniorLevel),
            "director" => Some(ExperienceLevel::Director),
            "executive" => Some(ExperienceLevel::Executive),
            _ => None,
        }
    }

    /// Value of the site's `f_E` query parameter.
    pub fn code(self) -> &'static str {
        match self {
            ExperienceLevel::Internship => "1",
            ExperienceLevel::EntryLevel => "2",
            ExperienceLevel::Associate => "3",
            ExperienceLevel::MidSeniorLevel => "4",
            ExperienceLevel::Director => "5",
            ExperienceLevel::Executive => "6",
        }
    }
}

static SEPARATOR_RUN: OnceLock<Regex> = OnceLock::new();

fn normalize_experience_token(token: &str) -> String {
    let re = SEPARATOR_RUN.get_or_init(|| Regex::new(r"[-\s]+").expect("valid separator pattern"));
    re.replace_all(&token.trim().to_lowercase(), "_").into_owned()
}

/// Normalized, validated search request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSpec {
    pub job_title: String,
    pub location: Option<String>,
    pub limit: usize,
    /// Empty means no skill filtering.
    pub skills: Vec<String>,
    pub recency_window_secs: u64,
    pub experience: Option<ExperienceLevel>,
}

/// Non-fatal problems found while normalizing; the search still runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryWarning {
    UnsupportedExperience(String),
}

impl std::fmt::Display for QueryWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryWarning::UnsupportedExperience(token) => {
                write!(f, "unsupported experience level '{}' ignored", token)
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct NormalizedQuery {
    pub spec: SearchSpec,
    pub warnings: Vec<QueryWarning>,
}

fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

static LEADING_INT: OnceLock<Regex> = OnceLock::new();

/// Integer prefix of `token` (`"5abc"` and `"5.0"` both give 5), or `None`
/// when it does not start with digits.
fn leading_int(token: &str) -> Option<i64> {
    let re = LEADING_INT.get_or_init(|| Regex::new(r"^\s*([+-]?\d+)").expect("valid integer pattern"));
    re.captures(token)?.get(1)?.as_str().parse::<i64>().ok()
}

pub fn parse_limit(raw: Option<&str>) -> usize {
    raw.and_then(leading_int)
        .filter(|n| *n >= 1)
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(DEFAULT_LIMIT)
}

pub fn parse_skills(raw: Option<&str>) -> Vec<String> {
    let mut skills: Vec<String> = Vec::new();
    for token in raw.unwrap_or_default().split(',') {
        let token = token.trim();
        if !token.is_empty() && !skills.iter().any(|s| s == token) {
            skills.push(token.to_string());
        }
    }
    skills
}

/// Map a date-range token to a recency window in seconds.
pub fn parse_recency(raw: Option<&str>) -> u64 {
    let Some(token) = raw else {
        return SECONDS_PER_DAY;
    };
    match token.to_lowercase().as_str() {
        "day" | "1" => SECONDS_PER_DAY,
        "3" => 3 * SECONDS_PER_DAY,
        "week" | "7" => 7 * SECONDS_PER_DAY,
        "month" | "30" => 30 * SECONDS_PER_DAY,
        other => leading_int(other)
            .filter(|days| *days >= 1)
            .and_then(|days| u64::try_from(days).ok())
            .map(|days| days.saturating_mul(SECONDS_PER_DAY))
            .unwrap_or(SECONDS_PER_DAY),
    }
}

/// Validate and canonicalize raw query parameters.
pub fn normalize(raw: &RawJobQuery) -> Result<NormalizedQuery, ScrapeError> {
    let job_title = non_blank(raw.job_title.as_ref())
        .ok_or_else(|| ScrapeError::Validation("Job title is required".to_string()))?
        .to_string();

    let mut warnings = Vec::new();
    let experience = match non_blank(raw.experience.as_ref()) {
        Some(token) => {
            let level = ExperienceLevel::parse_token(token);
            if level.is_none() {
                warnings.push(QueryWarning::UnsupportedExperience(token.to_string()));
            }
            level
        }
        None => None,
    };

    let spec = SearchSpec {
        job_title,
        location: non_blank(raw.location.as_ref()).map(str::to_string),
        limit: parse_limit(raw.limit.as_deref()),
        skills: parse_skills(raw.skills.as_deref()),
        recency_window_secs: parse_recency(non_blank(raw.date_range.as_ref())),
        experience,
    };

    Ok(NormalizedQuery { spec, warnings })
}
