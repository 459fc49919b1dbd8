//! Per-session anti-detection profile.
//!
//! A `StealthProfile` is plain data handed to each `BrowserLauncher::launch`
//! call. Nothing here is process-global, so concurrent sessions can run with
//! different settings without stepping on each other.

use rand::seq::IndexedRandom;
use serde_json::json;

/// Fixed UA used unless rotation is requested.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.0.0 Safari/537.36";

const DESKTOP_USER_AGENTS: &[&str] = &[
    // Chrome 132 – Windows
    DEFAULT_USER_AGENT,
    // Chrome 132 – macOS
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.0.0 Safari/537.36",
    // Chrome 131 – Linux
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    // Edge 132 – Windows
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.0.0 Safari/537.36 Edg/132.0.0.0",
];

/// Returns a randomly-chosen desktop User-Agent string (Chromium family only).
pub fn random_user_agent() -> &'static str {
    let mut rng = rand::rng();
    DESKTOP_USER_AGENTS
        .choose(&mut rng)
        .copied()
        .unwrap_or(DEFAULT_USER_AGENT)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StealthProfile {
    pub user_agent: String,
    pub accept_language: String,
    pub referer: String,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub window_width: u32,
    pub window_height: u32,
    /// Inject the navigator-hardening script before any document loads.
    pub harden_navigator: bool,
    /// Draw a fresh UA from the desktop pool for every session.
    pub rotate_user_agent: bool,
}

impl Default for StealthProfile {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_language: "en-US,en;q=0.9".to_string(),
            referer: "https://www.google.com".to_string(),
            viewport_width: 1366,
            viewport_height: 768,
            window_width: 1920,
            window_height: 1080,
            harden_navigator: true,
            rotate_user_agent: false,
        }
    }
}

impl StealthProfile {
    /// Default profile with a UA drawn from the desktop pool per session.
    pub fn rotating() -> Self {
        Self {
            user_agent: random_user_agent().to_string(),
            rotate_user_agent: true,
            ..Self::default()
        }
    }

    /// The profile one session should launch with.
    pub fn for_session(&self) -> StealthProfile {
        let mut profile = self.clone();
        if profile.rotate_user_agent {
            profile.user_agent = random_user_agent().to_string();
        }
        profile
    }

    /// Extra HTTP headers sent with every request of the session.
    pub fn extra_headers(&self) -> serde_json::Value {
        json!({
            "Accept-Language": self.accept_language,
            "Referer": self.referer,
        })
    }

    /// Navigator hardening injected via `Page.addScriptToEvaluateOnNewDocument`.
    pub fn init_script(&self) -> String {
        let languages: Vec<String> = self
            .accept_language
            .split(',')
            .filter_map(|part| part.split(';').next())
            .map(|lang| lang.trim().to_string())
            .filter(|lang| !lang.is_empty())
            .collect();
        let languages = serde_json::to_string(&languages).unwrap_or_else(|_| "[\"en-US\"]".into());

        format!(
            r#"
(() => {{
    try {{
        const proto = Navigator.prototype;
        try {{
            Object.defineProperty(proto, 'webdriver', {{ get: () => undefined, configurable: true }});
        }} catch (e) {{}}
        try {{ delete navigator.webdriver; }} catch (e) {{}}
        try {{
            Object.defineProperty(proto, 'languages', {{ get: () => {languages}, configurable: true }});
        }} catch (e) {{}}
        try {{
            Object.defineProperty(proto, 'plugins', {{ get: () => [1, 2, 3, 4, 5], configurable: true }});
        }} catch (e) {{}}
    }} catch (e) {{}}

    if (!window.chrome) {{ window.chrome = {{}}; }}
    if (!window.chrome.runtime) {{
        window.chrome.runtime = {{
            connect: function() {{ return {{ onDisconnect: {{ addListener: function() {{}} }} }}; }},
            sendMessage: function() {{}},
        }};
    }}

    const originalQuery = window.navigator.permissions && window.navigator.permissions.query;
    if (originalQuery) {{
        window.navigator.permissions.query = (parameters) => (
            parameters.name === 'notifications'
                ? Promise.resolve({{ state: Notification.permission }})
                : originalQuery(parameters)
        );
    }}

    delete window.__playwright;
    delete window.__puppeteer;
    delete window.__selenium;
    delete window.callPhantom;
    delete window._phantom;
}})();
"#
        )
    }
}
