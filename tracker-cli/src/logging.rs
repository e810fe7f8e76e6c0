use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, prelude::*};

/// Install the global subscriber.
///
/// Filter comes from `RUST_LOG` (default `info`); `RUST_LOG_FORMAT=json`
/// switches to one JSON object per event.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json = std::env::var("RUST_LOG_FORMAT")
        .map(|val| val == "json")
        .unwrap_or(false);

    let layer: Box<dyn Layer<Registry> + Send + Sync> = if json {
        fmt::layer().with_ansi(false).with_target(true).json().boxed()
    } else {
        fmt::layer().with_target(false).boxed()
    };

    tracing_subscriber::registry().with(layer.with_filter(filter)).init();
}
