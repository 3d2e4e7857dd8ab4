// build-telemetry - state management core for the build metrics dashboard
//
// The binary in main.rs serves the JSON feeds; the library half is the
// embeddable chart session used by dashboard frontends.
pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;
