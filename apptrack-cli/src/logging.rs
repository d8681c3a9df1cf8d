//! stderr logging for the CLI. stdout is reserved for command output so
//! `--json` stays machine-readable.

use std::sync::OnceLock;
use tracing_subscriber::{EnvFilter, fmt};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// `APPTRACK_LOG`, then `RUST_LOG`, then a default picked by `APPTRACK_ENV`.
/// `verbose` forces debug.
pub fn init_logging(verbose: bool) {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let filter = if verbose {
            EnvFilter::new("debug")
        } else {
            std::env::var("APPTRACK_LOG")
                .ok()
                .and_then(|spec| EnvFilter::try_new(spec).ok())
                .or_else(|| EnvFilter::try_from_default_env().ok())
                .unwrap_or_else(|| EnvFilter::new(default_level(&environment)))
        };

        let subscriber = fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .finish();
        if tracing::subscriber::set_global_default(subscriber).is_err() {
            tracing::debug!("global tracing subscriber already set");
        }
        tracing::debug!(environment = %environment, "logging initialized");
    });
}

fn get_environment() -> String {
    std::env::var("APPTRACK_ENV").unwrap_or_else(|_| "production".to_string())
}

fn default_level(environment: &str) -> &'static str {
    match environment {
        "development" | "test" => "debug",
        _ => "warn",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_levels() {
        assert_eq!(default_level("development"), "debug");
        assert_eq!(default_level("test"), "debug");
        assert_eq!(default_level("production"), "warn");
        assert_eq!(default_level("staging"), "warn");
    }
}
