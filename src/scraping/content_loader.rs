//! Infinite-scroll emulation for lazily rendered listing containers.

use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::browser_manager::BrowserSession;
use crate::core::errors::ScrapeError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScrollSettings {
    pub step_px: u32,
    pub interval: Duration,
    /// Hard ceiling on scroll steps for pages whose height never settles.
    pub max_steps: u32,
    /// Hard wall-clock ceiling for the whole loop.
    pub max_duration: Duration,
}

impl Default for ScrollSettings {
    fn default() -> Self {
        Self {
            step_px: 200,
            interval: Duration::from_millis(150),
            max_steps: 400,
            max_duration: Duration::from_secs(45),
        }
    }
}

/// How the scroll loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Travelled past the container's extent; growth stopped.
    Settled { steps: u32 },
    /// Gave up after `max_steps`.
    StepCeiling { steps: u32 },
    /// Gave up after `max_duration`.
    TimeCeiling { steps: u32 },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScrollProbe {
    scroll_height: f64,
}

/// One scroll increment on the first matching container (or the document
/// scrolling element), reporting the container's current scroll extent.
/// A `step_px` of 0 only measures.
fn scroll_step_script(container_selectors: &[String], step_px: u32) -> String {
    let selectors = serde_json::to_string(container_selectors).unwrap_or_else(|_| "[]".into());
    format!(
        r#"(() => {{
    const selectors = {selectors};
    let el = null;
    for (const sel of selectors) {{
        el = document.querySelector(sel);
        if (el) break;
    }}
    const target = el || document.scrollingElement || document.documentElement;
    target.scrollBy(0, {step_px});
    if (target !== document.scrollingElement) {{
        window.scrollBy(0, {step_px});
    }}
    return {{ scrollHeight: target.scrollHeight }};
}})()"#
    )
}

/// Scroll the listing container until its extent stops growing.
///
/// The extent is read before the first step and re-read after every step, so
/// an empty container takes no step and content appended during the loop
/// extends it. The loop also stops at `max_steps` or `max_duration`,
/// whichever comes first; both are logged and treated as non-fatal.
pub async fn load_all(
    session: &mut dyn BrowserSession,
    container_selectors: &[String],
    settings: &ScrollSettings,
) -> Result<LoadOutcome, ScrapeError> {
    let measure = scroll_step_script(container_selectors, 0);
    let step = scroll_step_script(container_selectors, settings.step_px);
    let start = Instant::now();
    let mut travelled: u64 = 0;
    let mut steps: u32 = 0;
    let mut extent = read_extent(session, &measure).await?;

    loop {
        if travelled >= extent {
            info!("content settled after {} scroll steps ({}px)", steps, extent);
            return Ok(LoadOutcome::Settled { steps });
        }
        if steps >= settings.max_steps {
            warn!(
                "scroll ceiling reached after {} steps; extracting what is loaded",
                steps
            );
            return Ok(LoadOutcome::StepCeiling { steps });
        }
        if start.elapsed() >= settings.max_duration {
            warn!(
                "scroll time ceiling reached after {}ms ({} steps); extracting what is loaded",
                start.elapsed().as_millis(),
                steps
            );
            return Ok(LoadOutcome::TimeCeiling { steps });
        }

        extent = read_extent(session, &step).await?;
        steps += 1;
        travelled += u64::from(settings.step_px);
        debug!("scroll step {}: travelled {}px of {}px", steps, travelled, extent);

        tokio::time::sleep(settings.interval).await;
    }
}

async fn read_extent(session: &mut dyn BrowserSession, script: &str) -> Result<u64, ScrapeError> {
    let value = session.evaluate(script).await?;
    let probe: ScrollProbe = serde_json::from_value(value)
        .map_err(|e| ScrapeError::Extraction(format!("bad scroll probe: {}", e)))?;
    Ok(probe.scroll_height.max(0.0) as u64)
}
