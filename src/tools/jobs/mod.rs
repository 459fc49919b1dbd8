//! The scrape-extract-filter pipeline behind `GET /api/v1/jobs/getLinkedInJobs`.
//!
//! One call = one browser process: normalize → build URL → launch → navigate →
//! settle → scroll → snapshot → extract (capped at `limit`) → close → filter.
//! Invocations share nothing mutable; callers bound how many run at once.

pub mod filter;
pub mod query;
pub mod search_url;

use chrono::Utc;
use std::sync::Arc;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::PipelineSettings;
use crate::core::errors::ScrapeError;
use crate::scraping::browser_manager::{BrowserLauncher, BrowserSession, ChromeLauncher};
use crate::scraping::content_loader;
use crate::scraping::extract::extract_listings;
use crate::types::{JobSearchOutcome, ListingRecord, RawJobQuery};

pub use filter::filter_by_skills;
pub use query::{normalize, ExperienceLevel, NormalizedQuery, QueryWarning, SearchSpec};
pub use search_url::build_search_url;

#[derive(Clone)]
pub struct JobScout {
    settings: Arc<PipelineSettings>,
    launcher: Arc<dyn BrowserLauncher>,
}

impl std::fmt::Debug for JobScout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobScout")
            .field("search_base_url", &self.settings.search_base_url)
            .finish()
    }
}

impl JobScout {
    pub fn new(settings: PipelineSettings, launcher: Arc<dyn BrowserLauncher>) -> Self {
        Self {
            settings: Arc::new(settings),
            launcher,
        }
    }

    /// Pipeline backed by a real headless Chromium.
    pub fn with_chrome(settings: PipelineSettings) -> Self {
        let launcher = Arc::new(
            ChromeLauncher::new(settings.executable.clone())
                .with_request_timeout(settings.navigation_timeout),
        );
        Self::new(settings, launcher)
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Run one search end to end.
    ///
    /// Validation errors return before any browser is launched. The browser is
    /// closed before any other error is returned.
    pub async fn search(&self, raw: &RawJobQuery) -> Result<JobSearchOutcome, ScrapeError> {
        let span = info_span!("job_search", run_id = %Uuid::new_v4());
        self.run(raw).instrument(span).await
    }

    async fn run(&self, raw: &RawJobQuery) -> Result<JobSearchOutcome, ScrapeError> {
        let NormalizedQuery { spec, warnings } = normalize(raw)?;
        for warning in &warnings {
            warn!("{}", warning);
        }

        let search_url = build_search_url(&self.settings.search_base_url, &spec);
        let candidates = self.scrape(&search_url, spec.limit).await?;
        let candidate_count = candidates.len();

        let jobs = filter_by_skills(candidates, &spec.skills);
        info!(
            "{} of {} candidates kept (skills: {:?})",
            jobs.len(),
            candidate_count,
            spec.skills
        );

        Ok(JobSearchOutcome {
            count: jobs.len(),
            jobs,
            warnings: warnings.iter().map(ToString::to_string).collect(),
            search_url,
            scraped_at: Utc::now().to_rfc3339(),
        })
    }

    /// Launch a browser, collect up to `limit` listings from `url`, and always
    /// close the browser afterwards.
    pub async fn scrape(&self, url: &str, limit: usize) -> Result<Vec<ListingRecord>, ScrapeError> {
        let profile = self.settings.stealth.for_session();
        let mut session = self.launcher.launch(&profile).await?;

        let outcome = self.collect(session.as_mut(), url, limit).await;
        session.close().await;

        if let Err(e) = &outcome {
            warn!("scrape of {} failed: {}", url, e);
        }
        outcome
    }

    async fn collect(
        &self,
        session: &mut dyn BrowserSession,
        url: &str,
        limit: usize,
    ) -> Result<Vec<ListingRecord>, ScrapeError> {
        session
            .navigate(url, self.settings.navigation_timeout)
            .await?;
        tokio::time::sleep(self.settings.settle_delay).await;

        content_loader::load_all(
            session,
            &self.settings.selectors.container,
            &self.settings.scroll,
        )
        .await?;

        let html = session.content().await?;
        let records = extract_listings(&html, url, limit, &self.settings.selectors)?;
        info!("extracted {} candidate listings", records.len());
        Ok(records)
    }
}
