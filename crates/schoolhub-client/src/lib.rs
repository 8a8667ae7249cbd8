//! schoolhub-client: HTTP implementation of the school API services.
//!
//! Implements the `ExerciseApi`, `ProgressApi`, `SchoolApi` and
//! `NotificationApi` traits of `schoolhub-core` over `reqwest`, plus
//! configuration loading and an in-memory backend for tests.

pub mod config;
pub mod exercises;
pub mod http;
pub mod mock;
pub mod notifications;
pub mod progress;
pub mod schools;

pub use config::{load_config, load_config_from, ClientConfig};
pub use http::SchoolClient;
pub use mock::MockBackend;
