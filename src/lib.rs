pub mod core;
pub mod http;
pub mod scraping;
pub mod tools;

// --- Primary core exports ---
pub use core::config;
pub use core::errors::{FailureKind, ScrapeError};
pub use core::types;
pub use core::types::*;
pub use core::AppState;

pub use scraping::browser_manager::{BrowserLauncher, BrowserSession, ChromeLauncher};
pub use tools::jobs::JobScout;
