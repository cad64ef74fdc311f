//! Test utilities for pagesmith
//!
//! Available to unit tests and, through the `test-utils` feature, to the
//! integration suite.
//!
//! - [`init_test_logging`] - one-time tracing setup that plays well with the test harness
//! - [`TestSite`] - a throwaway on-disk site with `src/` and `dist/` directories
//!
//! # Example
//!
//! ```rust,no_run
//! use pagesmith::test_utils::{TestSite, init_test_logging};
//!
//! # async fn example() -> anyhow::Result<()> {
//! init_test_logging(None);
//! let site = TestSite::new()?;
//! site.write("index.html", "<p>hello</p>").await?;
//! assert!(site.source("index.html").exists());
//! # Ok(())
//! # }
//! ```

pub mod site;

pub use site::TestSite;

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. With `Some(level)` that level is used;
/// with `None` logging is enabled only if `RUST_LOG` is set.
///
/// ```bash
/// RUST_LOG=pagesmith=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true)
            .try_init();
    });
}
