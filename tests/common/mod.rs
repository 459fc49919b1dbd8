#![allow(dead_code)]

use async_trait::async_trait;
use job_scout::config::PipelineSettings;
use job_scout::scraping::content_loader::ScrollSettings;
use job_scout::scraping::stealth::StealthProfile;
use job_scout::{BrowserLauncher, BrowserSession, JobScout, ScrapeError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Failure {
    None,
    Launch,
    Navigation,
    Content,
    /// `content()` never resolves.
    Stall,
}

/// Counters shared between a `ScriptedLauncher` and the test body.
#[derive(Default)]
pub struct Probes {
    pub launches: AtomicUsize,
    pub closes: AtomicUsize,
    pub drops: AtomicUsize,
    pub urls: Mutex<Vec<String>>,
    pub user_agents: Mutex<Vec<String>>,
}

impl Probes {
    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn drops(&self) -> usize {
        self.drops.load(Ordering::SeqCst)
    }

    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

/// Stands in for Chromium: serves canned HTML and records lifecycle calls.
pub struct ScriptedLauncher {
    pub html: String,
    pub failure: Failure,
    pub probes: Arc<Probes>,
}

impl ScriptedLauncher {
    pub fn new(html: impl Into<String>, failure: Failure) -> (Arc<Self>, Arc<Probes>) {
        let probes = Arc::new(Probes::default());
        let launcher = Arc::new(Self {
            html: html.into(),
            failure,
            probes: Arc::clone(&probes),
        });
        (launcher, probes)
    }
}

#[async_trait]
impl BrowserLauncher for ScriptedLauncher {
    async fn launch(
        &self,
        profile: &StealthProfile,
    ) -> Result<Box<dyn BrowserSession>, ScrapeError> {
        if self.failure == Failure::Launch {
            return Err(ScrapeError::Launch("no browser in test sandbox".into()));
        }
        self.probes.launches.fetch_add(1, Ordering::SeqCst);
        self.probes
            .user_agents
            .lock()
            .unwrap()
            .push(profile.user_agent.clone());
        Ok(Box::new(ScriptedSession {
            html: self.html.clone(),
            failure: self.failure,
            probes: Arc::clone(&self.probes),
        }))
    }
}

struct ScriptedSession {
    html: String,
    failure: Failure,
    probes: Arc<Probes>,
}

#[async_trait]
impl BrowserSession for ScriptedSession {
    async fn navigate(&mut self, url: &str, _timeout: Duration) -> Result<(), ScrapeError> {
        self.probes.urls.lock().unwrap().push(url.to_string());
        if self.failure == Failure::Navigation {
            return Err(ScrapeError::navigation(url, "timed out after 60s"));
        }
        Ok(())
    }

    async fn evaluate(&mut self, _expression: &str) -> Result<serde_json::Value, ScrapeError> {
        Ok(serde_json::json!({ "scrollHeight": 600 }))
    }

    async fn content(&mut self) -> Result<String, ScrapeError> {
        match self.failure {
            Failure::Content => return Err(ScrapeError::Extraction("target closed".into())),
            Failure::Stall => std::future::pending::<()>().await,
            _ => {}
        }
        Ok(self.html.clone())
    }

    async fn close(self: Box<Self>) {
        self.probes.closes.fetch_add(1, Ordering::SeqCst);
    }
}

impl Drop for ScriptedSession {
    fn drop(&mut self) {
        self.probes.drops.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn fast_settings() -> PipelineSettings {
    PipelineSettings {
        settle_delay: Duration::ZERO,
        scroll: ScrollSettings {
            step_px: 200,
            interval: Duration::ZERO,
            max_steps: 50,
            max_duration: Duration::from_secs(5),
        },
        ..PipelineSettings::default()
    }
}

pub fn scout_with(html: impl Into<String>, failure: Failure) -> (JobScout, Arc<Probes>) {
    let (launcher, probes) = ScriptedLauncher::new(html, failure);
    (JobScout::new(fast_settings(), launcher), probes)
}

pub fn listing(title: &str, company: &str, slug_id: u64) -> String {
    format!(
        r#"<li><div class="base-card">
            <a class="base-card__full-link" href="https://www.linkedin.com/jobs/view/job-at-co-{slug_id}?refId=r{slug_id}"></a>
            <h3 class="base-search-card__title">{title}</h3>
            <h4 class="base-search-card__subtitle">{company}</h4>
            <span class="job-search-card__location">Remote</span>
            <time datetime="2026-10-1{}">recent</time>
        </div></li>"#,
        slug_id % 10
    )
}

pub fn listings_page(items: &[String]) -> String {
    format!(
        r#"<!doctype html><html><body><main><ul class="jobs-search__results-list">{}</ul></main></body></html>"#,
        items.join("\n")
    )
}

/// Eight complete listings; titles 0, 2 and 6 mention Go or Rust.
pub fn eight_listings_page() -> String {
    let titles = [
        "Backend Engineer (Go)",
        "Backend Engineer",
        "Rust Backend Engineer",
        "Java Backend Engineer",
        "Python Backend Engineer",
        "Backend Engineer, Payments",
        "RUST Systems Engineer",
        "Node.js Backend Engineer",
    ];
    let items: Vec<String> = titles
        .iter()
        .enumerate()
        .map(|(i, t)| listing(t, "Initech", 3_700_000_000 + i as u64))
        .collect();
    listings_page(&items)
}
