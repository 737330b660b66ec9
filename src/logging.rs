use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter directives, overridden by `RUST_LOG`
pub fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "library_sort=debug,warn"
    } else {
        "library_sort=warn"
    }
}

/// Install the stderr diagnostics subscriber. Status lines go to stdout
/// through [`crate::output::Output`] and are unaffected by the filter.
pub fn init_logger(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)));

    // A subscriber may already be installed when embedded in another program.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .try_init();
}
