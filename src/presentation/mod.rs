// Presentation layer - HTTP interface over the published feeds
pub mod app_state;
pub mod handlers;
