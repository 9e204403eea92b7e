//! Centralised tracing initialisation for the `areview` binary.
//!
//! Call [`init_tracing`] once at program start to configure the global
//! subscriber with an `EnvFilter` and optional JSON formatting.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Filter used when `RUST_LOG` is unset: `level` for the areview crates,
/// warnings only for dependencies such as reqwest and hyper.
pub fn default_directives(level: Level) -> String {
    format!("warn,areview={level}", level = level.as_str().to_lowercase())
}

/// Install the global subscriber.
///
/// `json` switches to newline-delimited JSON records; `level` applies to
/// the areview crates unless `RUST_LOG` overrides it. Later calls are
/// ignored.
pub fn init_tracing(json: bool, level: Level) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)));

    let (text, structured) = if json {
        (None, Some(fmt::layer().json().with_current_span(true)))
    } else {
        (Some(fmt::layer().with_target(false)), None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(text)
        .with(structured)
        .try_init()
        .ok();
}

/// Span grouping every log line of one pipeline run.
///
/// Attach it with `tracing::Instrument`; an entered guard must not be held
/// across an await.
pub fn run_span(run_id: &str) -> tracing::Span {
    tracing::info_span!("areview.run", run_id = %run_id)
}
