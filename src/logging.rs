/// Log file setup.
///
/// The terminal is in raw alternate-screen mode while playing, so log output
/// never goes to stdout/stderr. With no `log_file` configured no subscriber
/// is installed and every `tracing` macro is a no-op.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::filter::LevelFilter;

/// Install a file subscriber. Failure to open the file disables logging.
pub fn init(log_file: Option<&Path>) -> std::io::Result<()> {
    let Some(path) = log_file else { return Ok(()) };

    let file = OpenOptions::new().create(true).append(true).open(path)?;

    let level = match std::env::var("GRIDSNAKE_LOG").ok().as_deref() {
        Some("trace") => LevelFilter::TRACE,
        Some("debug") => LevelFilter::DEBUG,
        Some("warn") => LevelFilter::WARN,
        Some("error") => LevelFilter::ERROR,
        _ => LevelFilter::INFO,
    };

    // A second init (tests, re-entry) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .with_max_level(level)
        .try_init();

    Ok(())
}
