//! Logging initialization and configuration.
//!
//! Log records go to stderr so they never interleave with shell output.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when neither `RUST_LOG` nor an explicit level is given.
pub const DEFAULT_FILTER: &str = "clish_engine=info";

fn build_filter(level: Option<&str>) -> EnvFilter {
    match level {
        Some(level) if !level.is_empty() => {
            EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
        }
        _ => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
    }
}

fn subscriber(level: Option<&str>) -> impl SubscriberInitExt {
    tracing_subscriber::registry().with(build_filter(level)).with(
        tracing_subscriber::fmt::layer()
            .compact()
            .with_writer(std::io::stderr),
    )
}

/// Install the global subscriber.
///
/// `level` is an `EnvFilter` directive such as `debug` or
/// `clish_engine=trace`. When absent, `RUST_LOG` is consulted, then
/// [`DEFAULT_FILTER`].
///
/// # Panics
///
/// Panics if a global subscriber is already set.
pub fn init(level: Option<&str>) {
    subscriber(level).init();
}

/// Like [`init`], but reports an already-installed subscriber as an error.
pub fn try_init(level: Option<&str>) -> Result<(), tracing_subscriber::util::TryInitError> {
    subscriber(level).try_init()
}
