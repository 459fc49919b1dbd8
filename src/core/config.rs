use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::scraping::content_loader::ScrollSettings;
use crate::scraping::extract::SelectorTable;
use crate::scraping::stealth::StealthProfile;

// ---------------------------------------------------------------------------
// ScoutConfig: file-based config loader (job-scout.json) with env-var fallback
// ---------------------------------------------------------------------------

pub const ENV_CONFIG_PATH: &str = "JOB_SCOUT_CONFIG";
pub const ENV_CHROME_PATH: &str = "CHROME_PATH";
pub const ENV_CHROME_EXECUTABLE: &str = "CHROME_EXECUTABLE";
pub const ENV_PORT: &str = "PORT";
pub const ENV_CORS_ORIGIN: &str = "CORS_ORIGIN";
pub const ENV_SEARCH_BASE_URL: &str = "JOB_SCOUT_SEARCH_BASE_URL";
pub const ENV_NAVIGATION_TIMEOUT_SECS: &str = "JOB_SCOUT_NAVIGATION_TIMEOUT_SECS";
pub const ENV_SETTLE_DELAY_MS: &str = "JOB_SCOUT_SETTLE_DELAY_MS";
pub const ENV_MAX_CONCURRENT_SESSIONS: &str = "JOB_SCOUT_MAX_CONCURRENT_SESSIONS";

pub const DEFAULT_SEARCH_BASE_URL: &str = "https://www.linkedin.com/jobs/search";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_BODY_LIMIT_BYTES: usize = 16 * 1024;
pub const DEFAULT_NAVIGATION_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 3000;
pub const DEFAULT_MAX_CONCURRENT_SESSIONS: usize = 4;

fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    env_string(key).and_then(|v| v.parse().ok())
}

/// `server` key: HTTP surface settings.
#[derive(serde::Deserialize, Default, Clone, Debug)]
#[serde(default)]
pub struct ServerSection {
    pub port: Option<u16>,
    /// Allowed CORS origin. Unset means permissive CORS.
    pub cors_origin: Option<String>,
    pub body_limit_bytes: Option<usize>,
    /// Upper bound on simultaneously running browser sessions.
    pub max_concurrent_sessions: Option<usize>,
}

impl ServerSection {
    /// Port: JSON field → `PORT` env var → 8000.
    pub fn resolve_port(&self) -> u16 {
        self.port
            .or_else(|| env_parse(ENV_PORT))
            .unwrap_or(DEFAULT_PORT)
    }

    /// CORS origin: JSON field → `CORS_ORIGIN` env var → `None`.
    pub fn resolve_cors_origin(&self) -> Option<String> {
        self.cors_origin
            .clone()
            .filter(|v| !v.trim().is_empty())
            .or_else(|| env_string(ENV_CORS_ORIGIN))
    }

    pub fn resolve_body_limit(&self) -> usize {
        self.body_limit_bytes.unwrap_or(DEFAULT_BODY_LIMIT_BYTES)
    }

    /// JSON field → `JOB_SCOUT_MAX_CONCURRENT_SESSIONS` → 4. Never below 1.
    pub fn resolve_max_concurrent_sessions(&self) -> usize {
        self.max_concurrent_sessions
            .or_else(|| env_parse(ENV_MAX_CONCURRENT_SESSIONS))
            .unwrap_or(DEFAULT_MAX_CONCURRENT_SESSIONS)
            .max(1)
    }
}

/// `browser` key: session and loading behaviour.
#[derive(serde::Deserialize, Default, Clone, Debug)]
#[serde(default)]
pub struct BrowserSection {
    /// Explicit browser executable; wins over `CHROME_PATH` and auto-discovery.
    pub executable: Option<String>,
    pub search_base_url: Option<String>,
    pub navigation_timeout_secs: Option<u64>,
    pub settle_delay_ms: Option<u64>,
    pub scroll_step_px: Option<u32>,
    pub scroll_interval_ms: Option<u64>,
    pub scroll_max_steps: Option<u32>,
    pub scroll_max_duration_secs: Option<u64>,
}

impl BrowserSection {
    /// Executable override: JSON field → `CHROME_PATH` → `CHROME_EXECUTABLE` → `None`.
    ///
    /// `None` leaves the choice to `browser_manager::resolve_chrome_executable`.
    pub fn resolve_executable(&self) -> Option<String> {
        self.executable
            .clone()
            .filter(|v| !v.trim().is_empty())
            .or_else(|| env_string(ENV_CHROME_PATH))
            .or_else(|| env_string(ENV_CHROME_EXECUTABLE))
    }

    pub fn resolve_search_base_url(&self) -> String {
        self.search_base_url
            .clone()
            .filter(|v| !v.trim().is_empty())
            .or_else(|| env_string(ENV_SEARCH_BASE_URL))
            .unwrap_or_else(|| DEFAULT_SEARCH_BASE_URL.to_string())
    }

    pub fn resolve_navigation_timeout(&self) -> Duration {
        Duration::from_secs(
            self.navigation_timeout_secs
                .or_else(|| env_parse(ENV_NAVIGATION_TIMEOUT_SECS))
                .unwrap_or(DEFAULT_NAVIGATION_TIMEOUT_SECS),
        )
    }

    pub fn resolve_settle_delay(&self) -> Duration {
        Duration::from_millis(
            self.settle_delay_ms
                .or_else(|| env_parse(ENV_SETTLE_DELAY_MS))
                .unwrap_or(DEFAULT_SETTLE_DELAY_MS),
        )
    }

    pub fn resolve_scroll(&self) -> ScrollSettings {
        let defaults = ScrollSettings::default();
        ScrollSettings {
            step_px: self.scroll_step_px.unwrap_or(defaults.step_px).max(1),
            interval: self
                .scroll_interval_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.interval),
            max_steps: self.scroll_max_steps.unwrap_or(defaults.max_steps),
            max_duration: self
                .scroll_max_duration_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.max_duration),
        }
    }
}

/// `stealth` key: per-session request shaping.
#[derive(serde::Deserialize, Default, Clone, Debug)]
#[serde(default)]
pub struct StealthSection {
    pub user_agent: Option<String>,
    /// Pick a random desktop UA per session instead of the fixed one.
    pub rotate_user_agent: Option<bool>,
    pub accept_language: Option<String>,
    pub referer: Option<String>,
    pub viewport_width: Option<u32>,
    pub viewport_height: Option<u32>,
}

impl StealthSection {
    pub fn resolve_profile(&self) -> StealthProfile {
        let mut profile = if self.rotate_user_agent.unwrap_or(false) {
            StealthProfile::rotating()
        } else {
            StealthProfile::default()
        };
        if let Some(ua) = self.user_agent.as_ref().filter(|v| !v.trim().is_empty()) {
            profile.user_agent = ua.clone();
            profile.rotate_user_agent = false;
        }
        if let Some(lang) = self.accept_language.as_ref().filter(|v| !v.trim().is_empty()) {
            profile.accept_language = lang.clone();
        }
        if let Some(referer) = self.referer.as_ref().filter(|v| !v.trim().is_empty()) {
            profile.referer = referer.clone();
        }
        if let Some(w) = self.viewport_width {
            profile.viewport_width = w;
        }
        if let Some(h) = self.viewport_height {
            profile.viewport_height = h;
        }
        profile
    }
}

/// Top-level config loaded from `job-scout.json`.
#[derive(serde::Deserialize, Default, Clone, Debug)]
#[serde(default)]
pub struct ScoutConfig {
    pub server: ServerSection,
    pub browser: BrowserSection,
    pub stealth: StealthSection,
    /// Replaces the built-in listing selector table when present.
    pub selectors: Option<SelectorTable>,
}

impl ScoutConfig {
    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            search_base_url: self.browser.resolve_search_base_url(),
            executable: self.browser.resolve_executable(),
            navigation_timeout: self.browser.resolve_navigation_timeout(),
            settle_delay: self.browser.resolve_settle_delay(),
            scroll: self.browser.resolve_scroll(),
            stealth: self.stealth.resolve_profile(),
            selectors: self.selectors.clone().unwrap_or_default(),
        }
    }
}

/// Fully resolved knobs for one `JobScout` pipeline.
#[derive(Clone, Debug)]
pub struct PipelineSettings {
    pub search_base_url: String,
    pub executable: Option<String>,
    pub navigation_timeout: Duration,
    pub settle_delay: Duration,
    pub scroll: ScrollSettings,
    pub stealth: StealthProfile,
    pub selectors: SelectorTable,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            search_base_url: DEFAULT_SEARCH_BASE_URL.to_string(),
            executable: None,
            navigation_timeout: Duration::from_secs(DEFAULT_NAVIGATION_TIMEOUT_SECS),
            settle_delay: Duration::from_millis(DEFAULT_SETTLE_DELAY_MS),
            scroll: ScrollSettings::default(),
            stealth: StealthProfile::default(),
            selectors: SelectorTable::default(),
        }
    }
}

/// Load `job-scout.json` from standard locations.
///
/// Search order (first found wins):
/// 1. `JOB_SCOUT_CONFIG` env var path
/// 2. `./job-scout.json`
/// 3. `../job-scout.json`
///
/// Missing file → `ScoutConfig::default()` (all env-var fallbacks apply).
/// Parse error → log a warning, return `ScoutConfig::default()`.
pub fn load_scout_config() -> ScoutConfig {
    let mut candidates = vec![
        PathBuf::from("job-scout.json"),
        PathBuf::from("../job-scout.json"),
    ];
    if let Some(env_path) = env_string(ENV_CONFIG_PATH) {
        candidates.insert(0, PathBuf::from(env_path));
    }

    for path in &candidates {
        let Ok(contents) = std::fs::read_to_string(path) else {
            continue;
        };
        return match parse_scout_config(&contents) {
            Ok(cfg) => {
                tracing::info!("job-scout.json loaded from {}", path.display());
                cfg
            }
            Err(e) => {
                tracing::warn!(
                    "job-scout.json parse error at {}: {}; using defaults",
                    path.display(),
                    e
                );
                ScoutConfig::default()
            }
        };
    }

    ScoutConfig::default()
}

pub fn parse_scout_config(contents: &str) -> Result<ScoutConfig, serde_json::Error> {
    serde_json::from_str(contents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let cfg = parse_scout_config("{}").unwrap();
        assert_eq!(cfg.server.resolve_body_limit(), DEFAULT_BODY_LIMIT_BYTES);
        assert!(cfg.selectors.is_none());

        let settings = PipelineSettings::default();
        assert_eq!(settings.navigation_timeout, Duration::from_secs(60));
        assert_eq!(settings.settle_delay, Duration::from_millis(3000));
        assert_eq!(settings.scroll.step_px, 200);
        assert_eq!(settings.search_base_url, DEFAULT_SEARCH_BASE_URL);
    }

    #[test]
    fn test_file_values_override_defaults() {
        let cfg = parse_scout_config(
            r#"{
                "server": { "port": 9100, "max_concurrent_sessions": 0 },
                "browser": {
                    "executable": "/opt/chrome/chrome",
                    "navigation_timeout_secs": 20,
                    "settle_delay_ms": 0,
                    "scroll_step_px": 400,
                    "scroll_max_steps": 12
                },
                "stealth": { "user_agent": "TestAgent/1.0", "viewport_width": 1280 }
            }"#,
        )
        .unwrap();

        assert_eq!(cfg.server.resolve_port(), 9100);
        assert_eq!(cfg.server.resolve_max_concurrent_sessions(), 1);

        let settings = cfg.pipeline_settings();
        assert_eq!(settings.executable.as_deref(), Some("/opt/chrome/chrome"));
        assert_eq!(settings.navigation_timeout, Duration::from_secs(20));
        assert_eq!(settings.settle_delay, Duration::ZERO);
        assert_eq!(settings.scroll.step_px, 400);
        assert_eq!(settings.scroll.max_steps, 12);
        assert_eq!(settings.stealth.user_agent, "TestAgent/1.0");
        assert_eq!(settings.stealth.viewport_width, 1280);
        assert_eq!(settings.stealth.viewport_height, 768);
    }

    #[test]
    fn test_selector_override_parses() {
        let cfg = parse_scout_config(
            r#"{
                "selectors": {
                    "container": ["ol.results"],
                    "title": [{ "text": "h2" }],
                    "company": [{ "text": ".org" }],
                    "location": [],
                    "link": [{ "attr": { "css": "a", "attr": "href" } }],
                    "date_posted": []
                }
            }"#,
        )
        .unwrap();
        let table = cfg.selectors.unwrap();
        assert_eq!(table.container, vec!["ol.results".to_string()]);
        assert_eq!(table.title.len(), 1);
    }

    #[test]
    fn test_malformed_config_is_an_error() {
        assert!(parse_scout_config("{ \"server\": 5 }").is_err());
    }
}
