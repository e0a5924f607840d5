#![deny(clippy::wildcard_imports)]
#![cfg_attr(test, allow(clippy::wildcard_imports))]

pub mod config;
pub mod domain;
pub mod error;
pub mod errors;
pub mod realtime;
pub mod services;
pub mod telemetry;


// Re-exports for public API
pub use config::EngineConfig;
pub use domain::{GameEvent, GameSession, SessionSnapshot, SessionState};
pub use error::EngineError;
pub use errors::StatusCode;
pub use realtime::EventHub;
pub use services::{CardCatalog, InMemoryCatalog, SessionHandle, SessionRegistry};

// Prelude for test convenience
pub mod prelude {
    pub use super::domain::*;
    pub use super::error::*;
    pub use super::errors::*;
    pub use super::services::*;
}

// Auto-initialize logging for unit tests
#[cfg(test)]
#[ctor::ctor]
fn init_test_logging() {
    test_bootstrap::logging::init();
}
