use thiserror::Error;

/// Coarse failure category exposed to callers.
///
/// Everything from browser launch through extraction collapses into
/// `ScrapeFailed`; only input validation is reported as `BadInput`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    BadInput,
    ScrapeFailed,
}

#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Missing or empty required query input. Raised before any browser is launched.
    #[error("invalid query: {0}")]
    Validation(String),

    #[error("browser launch failed: {0}")]
    Launch(String),

    /// Timeout or network failure while reaching the search page.
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    /// The rendered page could not be evaluated or no longer matches any known markup.
    #[error("extraction failed: {0}")]
    Extraction(String),
}

impl ScrapeError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ScrapeError::Validation(_) => FailureKind::BadInput,
            ScrapeError::Launch(_) | ScrapeError::Navigation { .. } | ScrapeError::Extraction(_) => {
                FailureKind::ScrapeFailed
            }
        }
    }

    pub fn navigation(url: &str, reason: impl std::fmt::Display) -> Self {
        ScrapeError::Navigation {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }
}
