pub mod builders;
pub mod fake_runner;

use std::sync::Once;

use karma_driver::logging::LOG_ENV_VAR;
use tracing_subscriber::{EnvFilter, fmt};

static INIT: Once = Once::new();

/// Route driver logs into the test harness' captured output.
///
/// The filter is read from `KARMA_DRIVER_LOG` (same variable as the binary,
/// but with full `EnvFilter` syntax such as `karma_driver::exec=debug`);
/// without it only warnings show. Captured logs appear for failing tests.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
            .unwrap_or_else(|_| EnvFilter::new("warn"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Fail the test if `f` takes longer than five seconds.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(std::time::Duration::from_secs(5), f)
        .await
        .expect("Test timed out after 5 seconds")
}
