// LogWire - util/logging.rs
//
// Diagnostic logging for the crate itself (registry changes, protocol
// errors, factory selection). This is the host-side tracing output and is
// never routed through `LogManager`.
//
// Activation:
//   - Environment variable: RUST_LOG=debug (or trace)
//   - CLI flag: --debug (sets RUST_LOG=debug)
//   - Config file: [logging] level = "debug"
//
// Output: stderr, so stdout stays reserved for configuration replies.
// Optionally also appended to `[logging] file`.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

/// Initialise the diagnostic logging subsystem.
///
/// `debug_flag` is true when the user passed --debug on the CLI.
/// `config_level` is the level from config.toml (if present).
/// `log_file` is an extra file to append diagnostics to.
///
/// Priority: RUST_LOG env var > CLI --debug flag > config level > default "info".
/// Calling this twice is harmless; the second subscriber is ignored.
pub fn init(debug_flag: bool, config_level: Option<&str>, log_file: Option<&Path>) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if debug_flag {
        EnvFilter::new("debug")
    } else if let Some(level) = config_level {
        EnvFilter::new(level)
    } else {
        EnvFilter::new(super::constants::DEFAULT_LOG_LEVEL)
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .compact();

    let mut file_error = None;
    let file = log_file.and_then(|path| {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(f) => Some(f),
            Err(e) => {
                file_error = Some(format!("{}: {e}", path.display()));
                None
            }
        }
    });

    let installed = match file {
        Some(f) => builder
            .with_ansi(false)
            .with_writer(std::io::stderr.and(Mutex::new(f)))
            .try_init()
            .is_ok(),
        None => builder.with_writer(std::io::stderr).try_init().is_ok(),
    };

    if let Some(err) = file_error {
        tracing::warn!(error = %err, "Could not open diagnostic log file; using stderr only");
    }

    tracing::debug!(
        app = super::constants::APP_NAME,
        version = super::constants::APP_VERSION,
        installed,
        "Logging initialised"
    );
}
