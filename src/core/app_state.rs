use std::sync::Arc;
use tokio::sync::Semaphore;

use super::config::ScoutConfig;
use crate::tools::jobs::JobScout;

#[derive(Clone)]
pub struct AppState {
    /// File-based config loaded from `job-scout.json` (env-var fallback for all fields).
    pub config: Arc<ScoutConfig>,
    pub scout: JobScout,
    // Each search owns a whole browser process; this caps how many run at once.
    pub session_limit: Arc<Semaphore>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("scout", &self.scout)
            .field("available_sessions", &self.session_limit.available_permits())
            .finish()
    }
}

impl AppState {
    /// State backed by a real headless Chromium.
    pub fn new(config: ScoutConfig) -> Self {
        let scout = JobScout::with_chrome(config.pipeline_settings());
        Self::with_scout(config, scout)
    }

    pub fn with_scout(config: ScoutConfig, scout: JobScout) -> Self {
        let permits = config.server.resolve_max_concurrent_sessions();
        Self {
            config: Arc::new(config),
            scout,
            session_limit: Arc::new(Semaphore::new(permits)),
        }
    }
}
