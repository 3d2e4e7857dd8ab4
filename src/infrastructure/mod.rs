// Infrastructure layer - External dependencies and adapters
pub mod capture;
pub mod config;
pub mod disk_store;
pub mod http_provider;
