// LogWire - app/setup.rs
//
// Startup wiring: applies a validated `AppConfig` to a `LogManager`.
// Configured handlers go through the same `add_named_handler` path as remote
// requests, so they can later be listed or removed remotely.

use crate::app::manager::LogManager;
use crate::platform::config::AppConfig;

/// Apply registry limits and install every configured handler.
///
/// Returns one warning per handler that could not be installed; the others
/// are installed regardless.
pub fn apply_config(manager: &LogManager, config: &AppConfig) -> Vec<String> {
    manager.set_max_active_handlers(config.max_active_handlers);

    let mut warnings = Vec::new();
    for handler in &config.handlers {
        if let Err(e) = manager.add_named_handler(handler) {
            warnings.push(format!("Handler \"{}\" not installed: {e}", handler.id));
        }
    }

    tracing::info!(
        configured = config.handlers.len(),
        installed = config.handlers.len() - warnings.len(),
        max_active = config.max_active_handlers,
        "Configured handlers applied"
    );
    warnings
}
