use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Installs the fmt subscriber used by every binary.
///
/// `RUST_LOG` directives win; otherwise the level is `info`, or `debug`
/// with `verbose`.
pub fn init(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    // A second init (tests, repeated calls) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
