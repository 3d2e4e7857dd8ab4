// Application layer - chart use cases and the ports they depend on
pub mod cache;
pub mod controller;
pub mod feed_service;
pub mod ingest_service;
pub mod provider;
pub mod session;
