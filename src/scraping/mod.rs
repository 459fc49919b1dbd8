pub mod browser_manager;
pub mod content_loader;
pub mod extract;
pub mod stealth;
