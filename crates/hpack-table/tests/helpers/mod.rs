use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Set up a global tracing subscriber.
///
/// Every test in a binary calls this, only the first call installs
/// anything. `RUST_LOG` overrides the default filter.
pub(crate) fn setup_tracing() {
    let filter_layer = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("hpack_table=trace"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_test_writer()
        .with_file(true)
        .with_line_number(true);

    let _ = tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .try_init();
}
