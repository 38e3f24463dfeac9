//! Logging initialization and configuration
//!
//! Structured logging through `tracing`. Every module logs with structured
//! fields (`method`, `path`, `request_id`, `status`); this module installs the
//! subscriber that formats them:
//! - JSON output for production, pretty output for development
//! - `EnvFilter` level and per-target directives
//! - optional non-blocking writer so request tasks never wait on stdout

use anyhow::{Context, Result};
use std::env;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Log format: JSON for production, pretty-print for development
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "pretty" => LogFormat::Pretty,
            _ => LogFormat::Json,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log level: trace/debug/info/warn/error
    pub log_level: String,
    /// Log format: json/pretty
    pub format: LogFormat,
    /// Write through a background thread
    pub async_logging: bool,
    /// Extra filter directives (comma-separated), e.g. `routeloom::route=trace`
    pub target_filter: Option<String>,
    /// Include file:line location
    pub include_location: bool,
    /// Write to stderr instead of stdout
    pub stderr: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::default_prod()
    }
}

impl LogConfig {
    /// Parse configuration from `ROUTELOOM_LOG_*` environment variables
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            log_level: env::var("ROUTELOOM_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format: LogFormat::parse(
                &env::var("ROUTELOOM_LOG_FORMAT").unwrap_or_else(|_| "json".to_string()),
            ),
            async_logging: env::var("ROUTELOOM_LOG_ASYNC")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(true),
            target_filter: env::var("ROUTELOOM_LOG_TARGET_FILTER").ok(),
            include_location: env::var("ROUTELOOM_LOG_INCLUDE_LOCATION")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(false),
            stderr: false,
        }
    }

    /// Development defaults: debug level, pretty output, synchronous
    #[must_use]
    pub fn default_dev() -> Self {
        Self {
            log_level: "debug".to_string(),
            format: LogFormat::Pretty,
            async_logging: false,
            target_filter: None,
            include_location: true,
            stderr: false,
        }
    }

    /// Production defaults: info level, JSON output, non-blocking
    #[must_use]
    pub fn default_prod() -> Self {
        Self {
            log_level: "info".to_string(),
            format: LogFormat::Json,
            async_logging: true,
            target_filter: None,
            include_location: false,
            stderr: false,
        }
    }

    fn level(&self) -> Level {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }

    /// `RUST_LOG` if set, else the configured level, plus target directives.
    /// Invalid directives are skipped.
    fn env_filter(&self) -> (EnvFilter, Vec<String>) {
        let mut env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.level().as_str()));
        let mut rejected = Vec::new();
        if let Some(target_filter) = &self.target_filter {
            for filter in target_filter.split(',').map(str::trim).filter(|f| !f.is_empty()) {
                match filter.parse() {
                    Ok(directive) => env_filter = env_filter.add_directive(directive),
                    Err(_) => rejected.push(filter.to_string()),
                }
            }
        }
        (env_filter, rejected)
    }
}

/// Keeps the non-blocking writer flushing. Drop it on shutdown.
#[must_use = "dropping the guard stops log output"]
pub struct LoggingGuard {
    _worker: Option<WorkerGuard>,
}

/// Install the global subscriber described by `config`
///
/// # Example
///
/// ```no_run
/// use routeloom::otel::{init_logging_with_config, LogConfig};
///
/// let _guard = init_logging_with_config(&LogConfig::from_env())
///     .expect("Failed to initialize logging");
/// ```
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init_logging_with_config(config: &LogConfig) -> Result<LoggingGuard> {
    let (env_filter, rejected) = config.env_filter();

    let (writer, worker) = match (config.async_logging, config.stderr) {
        (true, stderr) => {
            let (non_blocking, guard) = if stderr {
                tracing_appender::non_blocking(std::io::stderr())
            } else {
                tracing_appender::non_blocking(std::io::stdout())
            };
            (BoxMakeWriter::new(non_blocking), Some(guard))
        }
        (false, true) => (BoxMakeWriter::new(std::io::stderr), None),
        (false, false) => (BoxMakeWriter::new(std::io::stdout), None),
    };

    let fmt_layer = match config.format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_target(true)
            .with_thread_ids(true)
            .with_span_list(true)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_writer(writer)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .pretty()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_writer(writer)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .context("Failed to initialize logging")?;

    for filter in rejected {
        tracing::warn!(directive = %filter, "Ignoring invalid log filter directive");
    }

    Ok(LoggingGuard { _worker: worker })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parse() {
        assert_eq!(LogFormat::parse("pretty"), LogFormat::Pretty);
        assert_eq!(LogFormat::parse("PRETTY"), LogFormat::Pretty);
        assert_eq!(LogFormat::parse("json"), LogFormat::Json);
        assert_eq!(LogFormat::parse("anything"), LogFormat::Json);
    }

    #[test]
    fn test_level_fallback() {
        let mut config = LogConfig::default_dev();
        assert_eq!(config.level(), Level::DEBUG);
        config.log_level = "loud".to_string();
        assert_eq!(config.level(), Level::INFO);
    }

    #[test]
    fn test_invalid_target_directives_reported() {
        let mut config = LogConfig::default_prod();
        config.target_filter = Some("routeloom=debug, ,routeloom::route=loudest".to_string());
        let (_filter, rejected) = config.env_filter();
        assert_eq!(rejected, vec!["routeloom::route=loudest".to_string()]);
    }

    #[test]
    fn test_defaults() {
        let prod = LogConfig::default();
        assert_eq!(prod.format, LogFormat::Json);
        assert!(prod.async_logging);
        let dev = LogConfig::default_dev();
        assert_eq!(dev.format, LogFormat::Pretty);
        assert!(dev.include_location);
    }
}
