//! Native browser management using `chromiumoxide`.
//!
//! This module owns:
//! * Resolving the browser executable (explicit override → well-known install
//!   paths → per-OS default).
//! * Building the headless `BrowserConfig` from a `StealthProfile`.
//! * `ChromeSession`: exactly one browser process and one page per search,
//!   released by `close()` or, failing that, by `Drop`.
//!
//! The pipeline only sees the `BrowserLauncher` / `BrowserSession` traits, so
//! tests can drive it with a scripted session instead of a real browser.

use async_trait::async_trait;
use chromiumoxide::browser::BrowserConfig;
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams, Headers, SetExtraHttpHeadersParams, SetUserAgentOverrideParams,
};
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::stealth::StealthProfile;
use crate::core::errors::ScrapeError;

/// One live page inside one browser process.
///
/// `close` consumes the session; callers must invoke it on every exit path.
#[async_trait]
pub trait BrowserSession: Send {
    /// Navigate and wait for network quiescence, bounded by `timeout`.
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), ScrapeError>;

    /// Evaluate a JavaScript expression in the page and return its JSON value.
    async fn evaluate(&mut self, expression: &str) -> Result<serde_json::Value, ScrapeError>;

    /// Snapshot of the rendered document.
    async fn content(&mut self) -> Result<String, ScrapeError>;

    /// Tear down the page and the browser process.
    async fn close(self: Box<Self>);
}

#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    /// Start a fresh browser process and a page configured from `profile`.
    async fn launch(&self, profile: &StealthProfile)
        -> Result<Box<dyn BrowserSession>, ScrapeError>;
}

// ── Browser executable discovery ─────────────────────────────────────────────

#[cfg(target_os = "windows")]
const PLATFORM_CANDIDATES: &[&str] = &[
    r"C:\Program Files\Google\Chrome\Application\chrome.exe",
    r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
    r"C:\Program Files (x86)\Microsoft\Edge\Application\msedge.exe",
];

#[cfg(target_os = "macos")]
const PLATFORM_CANDIDATES: &[&str] = &[
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
];

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
const PLATFORM_CANDIDATES: &[&str] = &[
    "/usr/bin/google-chrome-stable",
    "/usr/bin/google-chrome",
    "/usr/bin/chromium",
    "/usr/bin/chromium-browser",
    "/usr/local/bin/chromium",
];

/// Find the browser executable to launch.
///
/// Resolution order:
/// 1. `override_path` (config file, `CHROME_PATH` or `CHROME_EXECUTABLE`)
/// 2. First existing OS-specific well-known path.
/// 3. The OS's primary default path, even if missing; launch reports the error.
pub fn resolve_chrome_executable(override_path: Option<&str>) -> PathBuf {
    if let Some(p) = override_path.map(str::trim).filter(|p| !p.is_empty()) {
        return PathBuf::from(p);
    }

    PLATFORM_CANDIDATES
        .iter()
        .find(|c| Path::new(c).exists())
        .or_else(|| PLATFORM_CANDIDATES.first())
        .map(PathBuf::from)
        .unwrap_or_default()
}

// ── Headless browser config builder ──────────────────────────────────────────

/// Build a `BrowserConfig` for headless operation inside containers.
///
/// `request_timeout` bounds every CDP command, `Page.navigate` included, so it
/// must be at least the navigation timeout.
pub fn build_headless_config(
    exe: &Path,
    profile: &StealthProfile,
    request_timeout: Duration,
) -> Result<BrowserConfig, ScrapeError> {
    BrowserConfig::builder()
        .chrome_executable(exe)
        .request_timeout(request_timeout)
        .viewport(Viewport {
            width: profile.viewport_width,
            height: profile.viewport_height,
            device_scale_factor: Some(1.0),
            emulating_mobile: false,
            is_landscape: true,
            has_touch: false,
        })
        .window_size(profile.window_width, profile.window_height)
        .arg("--no-sandbox")
        .arg("--disable-setuid-sandbox")
        .arg("--disable-dev-shm-usage") // avoids /dev/shm OOM in containers
        .arg("--disable-gpu")
        .arg("--no-first-run")
        .arg("--no-default-browser-check")
        .arg("--mute-audio")
        // suppress the navigator.webdriver automation flag
        .arg("--disable-blink-features=AutomationControlled")
        .arg(format!("--user-agent={}", profile.user_agent))
        .build()
        .map_err(|e| ScrapeError::Launch(format!("invalid browser config: {}", e)))
}

// ── Chromium launcher ────────────────────────────────────────────────────────

/// chromiumoxide's own per-command default.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Launches one headless Chromium per search.
#[derive(Debug, Clone)]
pub struct ChromeLauncher {
    executable: Option<String>,
    request_timeout: Duration,
}

impl Default for ChromeLauncher {
    fn default() -> Self {
        Self::new(None)
    }
}

impl ChromeLauncher {
    pub fn new(executable: Option<String>) -> Self {
        Self {
            executable,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Raise the per-command CDP timeout, e.g. to cover a long navigation.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout.max(DEFAULT_REQUEST_TIMEOUT);
        self
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn executable(&self) -> PathBuf {
        resolve_chrome_executable(self.executable.as_deref())
    }
}

#[async_trait]
impl BrowserLauncher for ChromeLauncher {
    async fn launch(
        &self,
        profile: &StealthProfile,
    ) -> Result<Box<dyn BrowserSession>, ScrapeError> {
        let exe = self.executable();
        info!("launching headless browser ({})", exe.display());

        let config = build_headless_config(&exe, profile, self.request_timeout)?;
        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| ScrapeError::Launch(format!("{} ({})", e, exe.display())))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("CDP handler error: {}", e);
                }
            }
        });

        let mut session = ChromeSession {
            browser: Some(browser),
            page: None,
            handler_task: Some(handler_task),
        };

        match session.open_page(profile).await {
            Ok(page) => {
                session.page = Some(page);
                Ok(Box::new(session))
            }
            Err(e) => {
                session.shutdown().await;
                Err(e)
            }
        }
    }
}

pub struct ChromeSession {
    browser: Option<Browser>,
    page: Option<Page>,
    handler_task: Option<JoinHandle<()>>,
}

impl ChromeSession {
    async fn open_page(&self, profile: &StealthProfile) -> Result<Page, ScrapeError> {
        let browser = self
            .browser
            .as_ref()
            .ok_or_else(|| ScrapeError::Launch("browser already closed".into()))?;
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| ScrapeError::Launch(format!("failed to open page: {}", e)))?;

        let configure = |e: chromiumoxide::error::CdpError| {
            ScrapeError::Launch(format!("failed to configure page: {}", e))
        };

        page.execute(EnableParams::default()).await.map_err(configure)?;

        let user_agent = SetUserAgentOverrideParams::builder()
            .user_agent(profile.user_agent.clone())
            .accept_language(profile.accept_language.clone())
            .build()
            .map_err(ScrapeError::Launch)?;
        page.execute(user_agent).await.map_err(configure)?;

        page.execute(SetExtraHttpHeadersParams::new(Headers::new(
            profile.extra_headers(),
        )))
        .await
        .map_err(configure)?;

        page.execute(SetDeviceMetricsOverrideParams::new(
            i64::from(profile.viewport_width),
            i64::from(profile.viewport_height),
            1.0,
            false,
        ))
        .await
        .map_err(configure)?;

        if profile.harden_navigator {
            page.execute(AddScriptToEvaluateOnNewDocumentParams::new(
                profile.init_script(),
            ))
            .await
            .map_err(configure)?;
        }

        Ok(page)
    }

    fn page(&self) -> Result<&Page, ScrapeError> {
        self.page
            .as_ref()
            .ok_or_else(|| ScrapeError::Extraction("page is not open".into()))
    }

    async fn shutdown(&mut self) {
        drop(self.page.take());
        if let Some(mut browser) = self.browser.take() {
            if let Err(e) = browser.close().await {
                warn!("browser close error (non-fatal): {}", e);
            }
            if let Err(e) = browser.wait().await {
                warn!("browser wait error (non-fatal): {}", e);
            }
            info!("browser closed");
        }
        if let Some(task) = self.handler_task.take() {
            task.abort();
        }
    }
}

#[async_trait]
impl BrowserSession for ChromeSession {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), ScrapeError> {
        let page = self.page()?;
        info!("navigating to: {}", url);

        let navigation = async {
            page.goto(url)
                .await
                .map_err(|e| ScrapeError::navigation(url, e))?;
            wait_for_network_idle(page, Duration::from_millis(500)).await;
            Ok::<(), ScrapeError>(())
        };

        match tokio::time::timeout(timeout, navigation).await {
            Ok(result) => result,
            Err(_) => Err(ScrapeError::navigation(
                url,
                format!("timed out after {}s", timeout.as_secs()),
            )),
        }
    }

    async fn evaluate(&mut self, expression: &str) -> Result<serde_json::Value, ScrapeError> {
        self.page()?
            .evaluate(expression)
            .await
            .map_err(|e| ScrapeError::Extraction(format!("page evaluation failed: {}", e)))?
            .into_value::<serde_json::Value>()
            .map_err(|e| ScrapeError::Extraction(format!("unexpected evaluation result: {}", e)))
    }

    async fn content(&mut self) -> Result<String, ScrapeError> {
        self.page()?
            .content()
            .await
            .map_err(|e| ScrapeError::Extraction(format!("failed to read page content: {}", e)))
    }

    async fn close(mut self: Box<Self>) {
        self.shutdown().await;
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        // Drop cannot await; reap the process on the runtime if close() was skipped.
        let Some(mut browser) = self.browser.take() else {
            return;
        };
        let handler_task = self.handler_task.take();
        drop(self.page.take());

        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return;
        };
        warn!("browser session dropped without close(); reaping in background");
        handle.spawn(async move {
            let _ = browser.close().await;
            let _ = browser.wait().await;
            if let Some(task) = handler_task {
                task.abort();
            }
        });
    }
}

// ── Smart wait / networkidle ─────────────────────────────────────────────────

/// Wait until `document.readyState` is `complete` and no new resource entries
/// appear for `quiet` consecutive time.
///
/// Polls `performance.getEntriesByType("resource").length` every 250 ms; the
/// caller bounds the total wait with its own timeout.
async fn wait_for_network_idle(page: &Page, quiet: Duration) {
    let poll = Duration::from_millis(250);
    let start = Instant::now();
    let mut last_count: u64 = 0;
    let mut stable_since = Instant::now();

    loop {
        let count: u64 = page
            .evaluate("performance.getEntriesByType('resource').length")
            .await
            .ok()
            .and_then(|v| v.into_value::<serde_json::Value>().ok())
            .and_then(|j| j.as_u64())
            .unwrap_or(0);

        let ready_complete = page
            .evaluate("document.readyState")
            .await
            .ok()
            .and_then(|v| v.into_value::<String>().ok())
            .is_some_and(|s| s == "complete");

        if !ready_complete || count != last_count {
            last_count = count;
            stable_since = Instant::now();
        } else if stable_since.elapsed() >= quiet {
            debug!(
                "network idle after {}ms ({} resources)",
                start.elapsed().as_millis(),
                count
            );
            return;
        }

        tokio::time::sleep(poll).await;
    }
}
