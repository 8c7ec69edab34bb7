// LogWire - main.rs
//
// Command-line host for the log core. Handles:
// 1. CLI argument parsing
// 2. config.toml loading and diagnostic logging initialisation
// 3. Installation of configured handlers into the process-wide manager
// 4. A stdin loop: `{...}` lines are configuration requests (reply on
//    stdout), other lines are `LEVEL CATEGORY MESSAGE` emissions.

use clap::Parser;
use logwire::app::logger::Logger;
use logwire::app::manager::LogManager;
use logwire::app::remote::process_config_request;
use logwire::app::setup::apply_config;
use logwire::core::model::Level;
use logwire::core::protocol::DataFormat;
use logwire::platform::config::{load_config, PlatformPaths};
use logwire::util::{self, constants, error::LogWireError};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

/// Category placeholder for messages without a category.
const NO_CATEGORY: &str = "-";

#[derive(Parser, Debug)]
#[command(name = "logwire", version, about)]
struct Cli {
    /// Path to config.toml (defaults to the platform config directory).
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long = "debug")]
    debug: bool,

    /// Reply buffer size for configuration requests, in bytes.
    #[arg(short = 'r', long = "reply-capacity")]
    reply_capacity: Option<usize>,
}

fn main() {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PlatformPaths::resolve().config_file());
    let (mut config, config_warnings) = load_config(&config_path);

    // Initialise logging subsystem
    util::logging::init(
        cli.debug,
        config.log_level.as_deref(),
        config.log_file.as_deref().map(Path::new),
    );

    tracing::info!(
        version = constants::APP_VERSION,
        debug = cli.debug,
        config = %config_path.display(),
        "LogWire starting"
    );

    for warning in &config_warnings {
        tracing::warn!(warning = %warning, "Config warning");
    }

    if let Some(cap) = cli.reply_capacity {
        if (constants::MIN_REPLY_CAPACITY..=constants::MAX_REPLY_CAPACITY).contains(&cap) {
            config.reply_capacity = cap;
        } else {
            tracing::warn!(
                requested = cap,
                min = constants::MIN_REPLY_CAPACITY,
                max = constants::MAX_REPLY_CAPACITY,
                using = config.reply_capacity,
                "--reply-capacity out of range"
            );
        }
    }

    let manager = LogManager::instance();
    for warning in apply_config(manager, &config) {
        tracing::warn!(warning = %warning, "Handler setup warning");
    }

    if let Err(e) = run(manager, config.reply_capacity) {
        tracing::error!(error = %e, "LogWire stopped");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
    tracing::info!("End of input; exiting");
}

fn run(manager: &LogManager, reply_capacity: usize) -> Result<(), LogWireError> {
    let stdin_io = |operation: &'static str| {
        move |source: io::Error| LogWireError::Io {
            path: PathBuf::from("<stdin>"),
            operation,
            source,
        }
    };
    let stdout_io = |source: io::Error| LogWireError::Io {
        path: PathBuf::from("<stdout>"),
        operation: "write reply",
        source,
    };

    let mut reply = vec![0u8; reply_capacity];
    for line in io::stdin().lock().lines() {
        let line = line.map_err(stdin_io("read line"))?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.starts_with('{') {
            match process_config_request(manager, line.as_bytes(), &mut reply, DataFormat::Json) {
                Ok(outcome) => {
                    if !outcome.ok {
                        tracing::debug!("Config request not applied");
                    }
                    let mut out = io::stdout().lock();
                    out.write_all(&reply[..outcome.len]).map_err(stdout_io)?;
                    out.write_all(b"\n").map_err(stdout_io)?;
                    out.flush().map_err(stdout_io)?;
                }
                Err(e) => tracing::error!(error = %e, "Could not answer config request"),
            }
            continue;
        }

        match parse_emission(line) {
            Some((level, category, message)) => {
                let category = if category == NO_CATEGORY { "" } else { category };
                Logger::with_manager(category, manager).log(level, format_args!("{message}"));
            }
            None => tracing::warn!(line, "Expected 'LEVEL CATEGORY MESSAGE' or a JSON request"),
        }
    }
    Ok(())
}

/// Split `LEVEL CATEGORY MESSAGE`. The message may be empty.
fn parse_emission(line: &str) -> Option<(Level, &str, &str)> {
    let (level, rest) = line.split_once(char::is_whitespace)?;
    let level = level.parse::<Level>().ok()?;
    let rest = rest.trim_start();
    let (category, message) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
    if category.is_empty() {
        return None;
    }
    Some((level, category, message.trim_start()))
}
