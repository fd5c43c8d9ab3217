pub mod api;
pub mod app;
pub mod config;
pub mod handler;
pub mod tui;
pub mod ui;

// Re-export main types for convenience
pub use api::{SearchApiClient, Source};
pub use app::{ApiEvent, App, ChatMessage, ChatRole, InputMode, PendingQuery};
pub use config::Config;
