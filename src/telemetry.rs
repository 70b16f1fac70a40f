/// Telemetry Module - Structured Logging with Tracing
///
/// - Structured logging with tracing
/// - JSON vs pretty format support
/// - Optional file logging with rotation
/// - RUST_LOG env var support
/// - Sampled progress counter and hex truncation helpers
///
/// Console logs always go to stderr: stdout carries the dump itself.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Telemetry configuration
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub log_level: String,
    /// Log format: "json" or "pretty"
    pub log_format: String,
    /// Optional log file path (None = stderr only)
    pub log_file: Option<String>,
    /// Rotation interval for `log_file`
    pub rotation: Rotation,
}

impl TelemetryConfig {
    /// Build from `RUST_LOG`, `UTXODUMP_LOG_FORMAT`, `UTXODUMP_LOG_FILE` and
    /// `UTXODUMP_LOG_ROTATION`, resolved through `var`.
    pub fn from_lookup<F>(var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            log_level: var("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            log_format: var("UTXODUMP_LOG_FORMAT").unwrap_or_else(|| "pretty".to_string()),
            log_file: var("UTXODUMP_LOG_FILE"),
            rotation: var("UTXODUMP_LOG_ROTATION")
                .map(|r| parse_rotation(&r))
                .unwrap_or(Rotation::NEVER),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }
}

/// "minutely", "hourly" or "daily" (any case); anything else never rotates.
pub fn parse_rotation(value: &str) -> Rotation {
    match value.trim().to_ascii_lowercase().as_str() {
        "minutely" => Rotation::MINUTELY,
        "hourly" => Rotation::HOURLY,
        "daily" => Rotation::DAILY,
        _ => Rotation::NEVER,
    }
}

/// Open the log file appender.
///
/// Without rotation the file is `path` itself; rotated files are named
/// `<stem>.<date>` next to it.
pub fn file_appender(path: &Path, rotation: Rotation) -> Result<RollingFileAppender, Box<dyn std::error::Error>> {
    let directory = path.parent()
        .ok_or("Invalid log file path: no parent directory")?;
    let prefix = if rotation == Rotation::NEVER {
        path.file_name()
    } else {
        path.file_stem()
    }
    .ok_or("Invalid log file path: no filename")?;

    let appender = RollingFileAppender::builder()
        .rotation(rotation)
        .filename_prefix(prefix.to_string_lossy())
        .build(directory)?;
    Ok(appender)
}

/// Initialize tracing subscriber
///
/// - Reads RUST_LOG env var (default: config level)
/// - Supports JSON vs pretty format
/// - Optional file logging with rotation
///
/// When logging to a file, the returned guard must be held until exit:
/// dropping it flushes the buffered lines.
pub fn init_tracing(config: TelemetryConfig) -> Result<Option<WorkerGuard>, Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    if let Some(log_file_path) = config.log_file {
        let appender = file_appender(Path::new(&log_file_path), config.rotation)?;
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);

        if config.log_format == "json" {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_current_span(true)
                        .with_span_list(true)
                        .with_writer(non_blocking)
                )
                .init();
        } else {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .with_ansi(false)
                        .with_target(false)
                        .with_writer(non_blocking)
                )
                .init();
        }

        return Ok(Some(guard));
    } else if config.log_format == "json" {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_writer(std::io::stderr)
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr)
            )
            .init();
    }

    Ok(None)
}

/// Truncate hex string for logging
///
/// Example: "0a1b2c3d4e5f67890a1b2c3d4e5f6789" → "0a1b2c3d4e5f6789..."
pub fn truncate_hex(hex: &str, len: usize) -> String {
    if hex.len() <= len {
        hex.to_string()
    } else {
        format!("{}...", &hex[..len])
    }
}

/// Returns true every `interval` calls (e.g., every 1,000,000)
pub fn should_log_progress(counter: &AtomicU64, interval: u64) -> bool {
    let count = counter.fetch_add(1, Ordering::Relaxed);
    interval != 0 && count % interval == 0
}

/// Sampled progress counter
///
/// Convenience wrapper that creates and manages counter internally
pub struct ProgressCounter {
    counter: AtomicU64,
    interval: u64,
}

impl ProgressCounter {
    /// An `interval` of 0 never logs.
    pub fn new(interval: u64) -> Self {
        Self {
            counter: AtomicU64::new(0),
            interval,
        }
    }

    pub fn should_log(&self) -> bool {
        should_log_progress(&self.counter, self.interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_truncate_hex() {
        assert_eq!(truncate_hex("abcd", 16), "abcd");
        assert_eq!(truncate_hex("0123456789abcdef0123456789abcdef", 16), "0123456789abcdef...");
        assert_eq!(truncate_hex("", 16), "");
    }

    #[test]
    fn test_should_log_progress() {
        let counter = AtomicU64::new(0);

        // First call (count=0): true (0 % 10 == 0)
        assert!(should_log_progress(&counter, 10));

        // Calls 1-9: false
        for _ in 1..10 {
            assert!(!should_log_progress(&counter, 10));
        }

        // Call 10 (count=10): true (10 % 10 == 0)
        assert!(should_log_progress(&counter, 10));
    }

    #[test]
    fn test_zero_interval_never_logs() {
        let counter = ProgressCounter::new(0);
        for _ in 0..5 {
            assert!(!counter.should_log());
        }
    }

    #[test]
    fn test_progress_counter() {
        let counter = ProgressCounter::new(5);

        assert!(counter.should_log());  // 0 % 5 == 0
        assert!(!counter.should_log()); // 1 % 5 != 0
        assert!(!counter.should_log()); // 2 % 5 != 0
        assert!(!counter.should_log()); // 3 % 5 != 0
        assert!(!counter.should_log()); // 4 % 5 != 0
        assert!(counter.should_log());  // 5 % 5 == 0
        assert!(!counter.should_log()); // 6 % 5 != 0
    }

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_config_defaults() {
        let config = TelemetryConfig::from_lookup(lookup(&[]));
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, "pretty");
        assert_eq!(config.log_file, None);
        assert_eq!(config.rotation, Rotation::NEVER);
    }

    #[test]
    fn test_config_reads_rotation() {
        let config = TelemetryConfig::from_lookup(lookup(&[
            ("UTXODUMP_LOG_FILE", "/var/log/utxodump.log"),
            ("UTXODUMP_LOG_ROTATION", "daily"),
            ("UTXODUMP_LOG_FORMAT", "json"),
        ]));
        assert_eq!(config.log_file.as_deref(), Some("/var/log/utxodump.log"));
        assert_eq!(config.rotation, Rotation::DAILY);
        assert_eq!(config.log_format, "json");
    }

    #[test]
    fn test_parse_rotation() {
        assert_eq!(parse_rotation("hourly"), Rotation::HOURLY);
        assert_eq!(parse_rotation(" Daily "), Rotation::DAILY);
        assert_eq!(parse_rotation("minutely"), Rotation::MINUTELY);
        assert_eq!(parse_rotation("never"), Rotation::NEVER);
        assert_eq!(parse_rotation("weekly"), Rotation::NEVER);
    }

    #[test]
    fn test_file_appender_without_rotation_uses_exact_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("utxodump.log");
        let _appender = file_appender(&path, Rotation::NEVER).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_file_appender_daily_uses_dated_name() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("utxodump.log");
        let _appender = file_appender(&path, Rotation::DAILY).unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 1);
        assert!(names[0].starts_with("utxodump."));
        assert_ne!(names[0], "utxodump.log");
    }

    // Installs the global subscriber: the only test in this crate that may.
    #[test]
    fn test_dropping_guard_flushes_log_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("utxodump.log");
        let config = TelemetryConfig {
            log_level: "info".to_string(),
            log_format: "json".to_string(),
            log_file: Some(path.to_string_lossy().into_owned()),
            rotation: Rotation::NEVER,
        };

        let guard = init_tracing(config).unwrap();
        assert!(guard.is_some());
        tracing::error!(marker = "last-line-before-exit", "Dump failed");
        drop(guard);

        let logged = std::fs::read_to_string(&path).unwrap();
        assert!(logged.contains("last-line-before-exit"));
    }
}
