//! Diagnostic logging backend
//!
//! The library logs through the `log` facade under `csbot::*` targets. This
//! module provides the stderr backend the binary installs. It is off unless
//! `CSBOT_DEBUG` is set; `CSBOT_LOG` picks the minimum level.

use log::{LevelFilter, Log, Metadata, Record};

/// Logging configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogConfig {
    /// Enable logging
    pub enabled: bool,
    /// Minimum level written when enabled
    pub level: LevelFilter,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            level: LevelFilter::Debug,
        }
    }
}

impl LogConfig {
    /// Read `CSBOT_DEBUG` and `CSBOT_LOG`
    pub fn from_env() -> Self {
        Self::from_vars(
            std::env::var("CSBOT_DEBUG").ok().as_deref(),
            std::env::var("CSBOT_LOG").ok().as_deref(),
        )
    }

    fn from_vars(debug: Option<&str>, level: Option<&str>) -> Self {
        let level = match level {
            Some(text) => text.trim().parse::<LevelFilter>().unwrap_or_else(|_| {
                eprintln!("Warning: unknown CSBOT_LOG level '{text}', using debug");
                LevelFilter::Debug
            }),
            None => LevelFilter::Debug,
        };
        Self {
            enabled: debug.is_some(),
            level,
        }
    }

    pub fn max_level(&self) -> LevelFilter {
        if self.enabled {
            self.level
        } else {
            LevelFilter::Off
        }
    }
}

struct StderrLogger {
    max_level: LevelFilter,
}

impl StderrLogger {
    fn format(record: &Record) -> String {
        format!(
            "[{}] {:16} {}",
            record.level(),
            record.target(),
            record.args()
        )
    }
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max_level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("{}", Self::format(record));
        }
    }

    fn flush(&self) {}
}

/// Install the stderr backend.
///
/// Returns `false` if a logger was already installed by someone else.
pub fn init(config: &LogConfig) -> bool {
    let max_level = config.max_level();
    let logger: &'static StderrLogger = Box::leak(Box::new(StderrLogger { max_level }));
    match log::set_logger(logger) {
        Ok(()) => {
            log::set_max_level(max_level);
            true
        }
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_without_debug_var() {
        let config = LogConfig::from_vars(None, Some("trace"));
        assert!(!config.enabled);
        assert_eq!(config.max_level(), LevelFilter::Off);
    }

    #[test]
    fn level_from_env_text() {
        let config = LogConfig::from_vars(Some("1"), Some("WARN"));
        assert!(config.enabled);
        assert_eq!(config.level, LevelFilter::Warn);
        assert_eq!(config.max_level(), LevelFilter::Warn);

        let config = LogConfig::from_vars(Some("1"), Some(" trace "));
        assert_eq!(config.max_level(), LevelFilter::Trace);

        let config = LogConfig::from_vars(Some(""), Some("loud"));
        assert_eq!(config.level, LevelFilter::Debug);
    }

    #[test]
    fn record_format_has_level_and_target() {
        let record = Record::builder()
            .args(format_args!("entering step 'welcome'"))
            .level(log::Level::Debug)
            .target("csbot::runtime")
            .build();
        let line = StderrLogger::format(&record);
        assert!(line.starts_with("[DEBUG] csbot::runtime"));
        assert!(line.ends_with("entering step 'welcome'"));
    }

    #[test]
    fn logger_respects_max_level() {
        let logger = StderrLogger {
            max_level: LevelFilter::Warn,
        };
        let warn = Metadata::builder().level(log::Level::Warn).build();
        let debug = Metadata::builder().level(log::Level::Debug).build();
        assert!(logger.enabled(&warn));
        assert!(!logger.enabled(&debug));
    }
}
