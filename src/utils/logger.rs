use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn default_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("faa2etc=debug,info")
        } else {
            EnvFilter::new("faa2etc=info")
        }
    })
}

pub fn init_cli_logger(verbose: bool) {
    tracing_subscriber::registry()
        .with(default_filter(verbose))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}

/// Structured logs for runs driven by a scheduler that ships them elsewhere.
pub fn init_json_logger(verbose: bool) {
    tracing_subscriber::registry()
        .with(default_filter(verbose))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .json(),
        )
        .init();
}
