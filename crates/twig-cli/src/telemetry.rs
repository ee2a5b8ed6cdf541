//! Logging initialization.
//!
//! Controlled by two environment variables:
//! - `TWIG_LOG` → an `EnvFilter` directive (default `warn`)
//! - `TWIG_LOG_FORMAT=json` → JSON events instead of the human format
//!
//! Everything goes to stderr so command output on stdout stays clean.

use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;
use tracing_subscriber::EnvFilter;

const FILTER_VAR: &str = "TWIG_LOG";
const FORMAT_VAR: &str = "TWIG_LOG_FORMAT";

pub fn init() {
    let filter = EnvFilter::try_from_env(FILTER_VAR).unwrap_or_else(|_| EnvFilter::new("warn"));
    let json = std::env::var(FORMAT_VAR).is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_span_events(tracing_subscriber::fmt::format::FmtSpan::CLOSE),
            )
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false),
            )
            .init();
    }
}
