use tracing::Level;
use tracing_subscriber::filter::{filter_fn, EnvFilter};
use tracing_subscriber::fmt::layer;
use tracing_subscriber::prelude::*;

/// Console logging for the command-line tool. Progress lines go to stdout
/// without a level column; warnings and errors go to stderr with one.
/// `RUST_LOG` takes precedence over the level picked by `verbose`.
pub fn init(verbose: bool) {
    let base_level = if verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(base_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let progress = layer()
        .with_target(false)
        .without_time()
        .with_level(false)
        .with_filter(filter_fn(|metadata| is_progress(metadata.level())));
    let problems = layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .with_filter(filter_fn(|metadata| !is_progress(metadata.level())));

    // A second call (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(progress)
        .with(problems)
        .try_init();
}

/// Info and more verbose levels.
fn is_progress(level: &Level) -> bool {
    *level > Level::WARN
}
