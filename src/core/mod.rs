pub mod app_state;
pub mod config;
pub mod errors;
pub mod types;

pub use app_state::AppState;
