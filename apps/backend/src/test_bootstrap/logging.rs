#![cfg(test)]

//! One-time tracing setup for unit tests.
//!
//! Filter precedence: `TEST_LOG`, then `RUST_LOG`, then `warn`. Output goes
//! through the test writer so the harness captures it per test.
//!
//! ```bash
//! TEST_LOG=party_backend=debug cargo test -p party-backend session
//! ```

use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, EnvFilter};

static INITIALIZED: OnceCell<()> = OnceCell::new();

/// Idempotent; safe to call from every test and from the ctor hook.
pub fn init() {
    INITIALIZED.get_or_init(|| {
        let filter = std::env::var("TEST_LOG")
            .or_else(|_| std::env::var("RUST_LOG"))
            .map(EnvFilter::new)
            .unwrap_or_else(|_| EnvFilter::new("warn"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .without_time()
            .with_target(false)
            .try_init()
            .ok();
    });
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_twice_does_not_panic() {
        super::init();
        super::init();
        tracing::debug!(session_id = "test", "logging initialized");
    }
}
