// LogWire - platform/config.rs
//
// Platform-specific configuration directory resolution and config.toml
// loading with startup validation.
//
// Uses the `directories` crate for XDG (Linux), AppData (Windows),
// Library (macOS) compliance.

use crate::core::model::{CategoryOverride, Level};
use crate::core::protocol::{NamedHandlerConfig, TypeSpec};
use crate::util::constants;
use crate::util::error::ConfigError;
use directories::ProjectDirs;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Resolved platform paths for LogWire configuration and data.
#[derive(Debug, Clone)]
pub struct PlatformPaths {
    /// Configuration directory (e.g. ~/.config/logwire/ or %APPDATA%\LogWire\config\)
    pub config_dir: PathBuf,

    /// Data directory for file streams given relative paths.
    pub data_dir: PathBuf,
}

impl PlatformPaths {
    /// Resolve platform-appropriate paths.
    ///
    /// Falls back to current directory if platform dirs cannot be determined.
    pub fn resolve() -> Self {
        if let Some(proj_dirs) = ProjectDirs::from("", "", constants::APP_ID) {
            let config_dir = proj_dirs.config_dir().to_path_buf();
            let data_dir = proj_dirs.data_dir().to_path_buf();

            tracing::debug!(
                config = %config_dir.display(),
                data = %data_dir.display(),
                "Platform paths resolved"
            );

            Self {
                config_dir,
                data_dir,
            }
        } else {
            tracing::warn!("Could not determine platform directories, using current directory");
            let fallback = PathBuf::from(".");
            Self {
                config_dir: fallback.clone(),
                data_dir: fallback,
            }
        }
    }

    /// Default location of config.toml.
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(constants::CONFIG_FILE_NAME)
    }
}

// =============================================================================
// config.toml loading and validation
// =============================================================================

/// Raw deserialisable shape of config.toml.
///
/// Unknown keys are silently ignored for forward compatibility -- a newer
/// config file can be used with an older binary without crashing.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RawConfig {
    /// `[logging]` section.
    pub logging: LoggingSection,
    /// `[registry]` section.
    pub registry: RegistrySection,
    /// `[[handlers]]` array.
    pub handlers: Vec<HandlerSection>,
}

/// `[logging]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub level: Option<String>,
    /// Log file path (empty = stderr only).
    pub file: Option<String>,
}

/// `[registry]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RegistrySection {
    /// Cap on active handlers in the process-wide manager.
    pub max_active_handlers: Option<usize>,
    /// Reply buffer size for configuration requests, in bytes.
    pub reply_capacity: Option<usize>,
}

/// One `[[handlers]]` entry.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct HandlerSection {
    pub id: Option<String>,
    /// Handler type, e.g. "stream" or "json".
    #[serde(rename = "type")]
    pub handler_type: Option<String>,
    /// Stream type, e.g. "stdout", "stderr" or "file".
    pub stream: Option<String>,
    pub level: Option<String>,
    pub params: Option<Value>,
    pub stream_params: Option<Value>,
    pub filters: Vec<FilterSection>,
}

/// One `filters = [{ category, level }]` element.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct FilterSection {
    pub category: String,
    pub level: Option<String>,
}

/// Validated application configuration derived from `config.toml`.
///
/// All values are validated against named constants at load time.
/// Invalid values produce actionable warnings and fall back to defaults.
#[derive(Debug, Clone)]
pub struct AppConfig {
    // -- Logging --
    /// Logging level string (for init before tracing is available).
    pub log_level: Option<String>,
    /// Log file path.
    pub log_file: Option<String>,

    // -- Registry --
    /// Cap on active handlers.
    pub max_active_handlers: usize,
    /// Reply buffer size for configuration requests.
    pub reply_capacity: usize,

    // -- Handlers --
    /// Named handlers to install at startup, in file order.
    pub handlers: Vec<NamedHandlerConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: None,
            log_file: None,
            max_active_handlers: constants::DEFAULT_MAX_ACTIVE_HANDLERS,
            reply_capacity: constants::DEFAULT_REPLY_CAPACITY,
            handlers: Vec::new(),
        }
    }
}

/// Parse config.toml text without touching the filesystem.
pub fn parse_config(content: &str, path: &Path) -> Result<RawConfig, ConfigError> {
    toml::from_str(content).map_err(|e| ConfigError::TomlParse {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Load and validate `config.toml` at `config_path`.
///
/// Returns `AppConfig` with validated values and a list of non-fatal warnings.
/// If the file does not exist, returns defaults with no warnings (first-run).
/// If the file is unparseable, returns defaults with an error warning; the
/// application still starts but the user is informed.
pub fn load_config(config_path: &Path) -> (AppConfig, Vec<String>) {
    let mut warnings: Vec<String> = Vec::new();

    if !config_path.exists() {
        tracing::debug!(path = %config_path.display(), "No config.toml found; using defaults");
        return (AppConfig::default(), warnings);
    }

    let content = match std::fs::read_to_string(config_path) {
        Ok(c) => c,
        Err(e) => {
            let err = ConfigError::Io {
                path: config_path.to_path_buf(),
                source: e,
            };
            let msg = format!("{err}. Using defaults.");
            tracing::warn!("{}", msg);
            warnings.push(msg);
            return (AppConfig::default(), warnings);
        }
    };

    let raw = match parse_config(&content, config_path) {
        Ok(r) => r,
        Err(e) => {
            let msg = format!("{e}. Using defaults.");
            tracing::warn!("{}", msg);
            warnings.push(msg);
            return (AppConfig::default(), warnings);
        }
    };

    tracing::info!(path = %config_path.display(), "Loaded config.toml");

    let config = validate(raw, &mut warnings);

    if !warnings.is_empty() {
        tracing::warn!(
            count = warnings.len(),
            "Config validation produced warnings"
        );
    }

    (config, warnings)
}

/// Validate each field against named constants, accumulating all problems.
pub fn validate(raw: RawConfig, warnings: &mut Vec<String>) -> AppConfig {
    let mut config = AppConfig::default();

    // -- Logging: level --
    if let Some(ref level) = raw.logging.level {
        let valid = ["error", "warn", "info", "debug", "trace"];
        if valid.contains(&level.to_lowercase().as_str()) {
            config.log_level = Some(level.clone());
        } else {
            warnings.push(format!(
                "[logging] level = \"{level}\" is not recognised. \
                 Valid values: error, warn, info, debug, trace. Using default (info).",
            ));
        }
    }

    // -- Logging: file --
    if let Some(ref file) = raw.logging.file {
        if !file.is_empty() {
            config.log_file = Some(file.clone());
        }
    }

    // -- Registry: max_active_handlers --
    if let Some(max) = raw.registry.max_active_handlers {
        if (constants::MIN_MAX_ACTIVE_HANDLERS..=constants::ABSOLUTE_MAX_ACTIVE_HANDLERS)
            .contains(&max)
        {
            config.max_active_handlers = max;
        } else {
            warnings.push(format!(
                "[registry] max_active_handlers = {max} is out of range ({}-{}). Using default ({}).",
                constants::MIN_MAX_ACTIVE_HANDLERS,
                constants::ABSOLUTE_MAX_ACTIVE_HANDLERS,
                constants::DEFAULT_MAX_ACTIVE_HANDLERS,
            ));
        }
    }

    // -- Registry: reply_capacity --
    if let Some(cap) = raw.registry.reply_capacity {
        if (constants::MIN_REPLY_CAPACITY..=constants::MAX_REPLY_CAPACITY).contains(&cap) {
            config.reply_capacity = cap;
        } else {
            warnings.push(format!(
                "[registry] reply_capacity = {cap} is out of range ({}-{}). Using default ({}).",
                constants::MIN_REPLY_CAPACITY,
                constants::MAX_REPLY_CAPACITY,
                constants::DEFAULT_REPLY_CAPACITY,
            ));
        }
    }

    // -- Handlers --
    for (index, section) in raw.handlers.into_iter().enumerate() {
        if let Some(handler) = validate_handler(index, section, warnings) {
            if config.handlers.iter().any(|h| h.id == handler.id) {
                warnings.push(format!(
                    "[[handlers]] #{index}: id \"{}\" is already used by an earlier entry. Skipped.",
                    handler.id
                ));
            } else {
                config.handlers.push(handler);
            }
        }
    }

    config
}

fn parse_level(field: &str, value: Option<&str>, fallback: Level, warnings: &mut Vec<String>) -> Level {
    let Some(value) = value else {
        return fallback;
    };
    match value.parse::<Level>() {
        Ok(level) => level,
        Err(e) => {
            warnings.push(format!("{field}: {e}. Using default ({}).", fallback.as_str()));
            fallback
        }
    }
}

/// Turn one `[[handlers]]` entry into a named-handler request, or explain
/// why it was skipped.
fn validate_handler(
    index: usize,
    section: HandlerSection,
    warnings: &mut Vec<String>,
) -> Option<NamedHandlerConfig> {
    let id = match section.id {
        Some(id) if !id.trim().is_empty() => id,
        _ => {
            warnings.push(format!("[[handlers]] #{index}: missing 'id'. Skipped."));
            return None;
        }
    };
    let Some(handler_type) = section.handler_type.filter(|t| !t.is_empty()) else {
        warnings.push(format!("[[handlers]] \"{id}\": missing 'type'. Skipped."));
        return None;
    };

    let level = parse_level(
        &format!("[[handlers]] \"{id}\" level"),
        section.level.as_deref(),
        constants::DEFAULT_HANDLER_LEVEL,
        warnings,
    );

    let filters = section
        .filters
        .into_iter()
        .filter_map(|f| {
            let field = format!("[[handlers]] \"{id}\" filter \"{}\"", f.category);
            match f.level.as_deref().map(str::parse::<Level>) {
                Some(Ok(level)) => Some(CategoryOverride::new(f.category, level)),
                Some(Err(e)) => {
                    warnings.push(format!("{field}: {e}. Filter skipped."));
                    None
                }
                None => {
                    warnings.push(format!("{field}: missing 'level'. Filter skipped."));
                    None
                }
            }
        })
        .collect();

    Some(NamedHandlerConfig {
        id,
        handler: TypeSpec {
            type_name: handler_type,
            params: section.params.unwrap_or(Value::Null),
        },
        stream: section.stream.map(|type_name| TypeSpec {
            type_name,
            params: section.stream_params.unwrap_or(Value::Null),
        }),
        level,
        filters,
    })
}
