//! `tracing-subscriber` setup.
//!
//! Loader and store operations emit spans and events with structured
//! fields (relation, batch, id count). This module builds the subscriber
//! that renders them, either as compact text for development or as one
//! JSON object per line:
//!
//! ```json
//! {"timestamp":"2024-01-15T10:30:00.000Z","level":"DEBUG","target":"edgeload_domain::loader","fields":{"message":"batch required","batch":"post->user(author_id)[1,2]"}}
//! ```
//!
//! `RUST_LOG`, when set, overrides the configured level.

use tracing::{Level, Subscriber};
use tracing_subscriber::fmt::{self, format::FmtSpan, MakeWriter};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingSettings;

/// Output encoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Resolved logging options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub format: LogFormat,
    pub level: Level,
    /// Emit a close event with busy/idle timings for every span, which
    /// includes one per `belongs_to` / `has_many` traversal.
    pub span_timings: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self::from_settings(&LoggingSettings::default())
    }
}

impl LoggingConfig {
    pub fn from_settings(settings: &LoggingSettings) -> Self {
        Self {
            format: if settings.json {
                LogFormat::Json
            } else {
                LogFormat::Text
            },
            level: parse_log_level(&settings.level),
            span_timings: settings.span_timings,
        }
    }

    pub fn with_span_timings(mut self) -> Self {
        self.span_timings = true;
        self
    }
}

/// Parses a level name case-insensitively, falling back to INFO.
///
/// `ServerConfig::validate` rejects unknown names before this point.
pub fn parse_log_level(level: &str) -> Level {
    level.parse().unwrap_or(Level::INFO)
}

/// Builds a subscriber for `config` that writes through `writer`.
pub fn build_subscriber<W>(config: &LoggingConfig, writer: W) -> impl Subscriber + Send + Sync
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.to_string()));
    let span_events = if config.span_timings {
        FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let layer = match config.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_events(span_events)
            .with_writer(writer)
            .boxed(),
        LogFormat::Text => fmt::layer()
            .compact()
            .with_span_events(span_events)
            .with_writer(writer)
            .boxed(),
    };

    tracing_subscriber::registry().with(layer).with(filter)
}

/// Installs the global subscriber, writing to stdout.
///
/// Later calls are ignored once a global subscriber is set.
pub fn init_logging(config: &LoggingConfig) {
    let _ = tracing::subscriber::set_global_default(build_subscriber(config, std::io::stdout));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use tracing::{debug, info, info_span};

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Captured {
        fn lines(&self) -> Vec<String> {
            let bytes = self.0.lock().unwrap();
            String::from_utf8_lossy(&bytes)
                .lines()
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect()
        }
    }

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Captured {
        type Writer = Captured;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn json_at(level: Level) -> LoggingConfig {
        LoggingConfig {
            format: LogFormat::Json,
            level,
            span_timings: false,
        }
    }

    #[test]
    fn test_config_from_settings() {
        let settings = LoggingSettings {
            level: "DEBUG".to_string(),
            json: true,
            span_timings: true,
        };

        let config = LoggingConfig::from_settings(&settings);

        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.level, Level::DEBUG);
        assert!(config.span_timings);
        assert!(!LoggingConfig::default().span_timings);
        assert_eq!(LoggingConfig::default().format, LogFormat::Text);
        assert_eq!(LoggingConfig::default().level, Level::INFO);
    }

    #[test]
    fn test_parse_log_level_falls_back_to_info() {
        assert_eq!(parse_log_level("trace"), Level::TRACE);
        assert_eq!(parse_log_level("Warn"), Level::WARN);
        assert_eq!(parse_log_level("error"), Level::ERROR);
        assert_eq!(parse_log_level("loud"), Level::INFO);
    }

    #[test]
    fn test_json_lines_carry_structured_fields() {
        let captured = Captured::default();
        let subscriber = build_subscriber(&json_at(Level::TRACE), captured.clone());

        tracing::subscriber::with_default(subscriber, || {
            debug!(batch = "post->user(author_id)[1,2]", ids = 2, "batch required");
        });

        let lines = captured.lines();
        assert_eq!(lines.len(), 1);
        let json: serde_json::Value = serde_json::from_str(&lines[0])
            .unwrap_or_else(|e| panic!("log line should be JSON: {} ({})", lines[0], e));
        assert_eq!(json["level"], "DEBUG");
        assert_eq!(json["fields"]["ids"], 2);
        assert_eq!(json["fields"]["batch"], "post->user(author_id)[1,2]");
    }

    #[test]
    fn test_level_filters_lower_events() {
        let captured = Captured::default();
        let subscriber = build_subscriber(&json_at(Level::INFO), captured.clone());

        tracing::subscriber::with_default(subscriber, || {
            debug!("batch required");
            info!("request factory ready");
        });

        let lines = captured.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("request factory ready"));
    }

    #[test]
    fn test_span_timings_emit_close_events() {
        let captured = Captured::default();
        let config = json_at(Level::TRACE).with_span_timings();
        let subscriber = build_subscriber(&config, captured.clone());

        tracing::subscriber::with_default(subscriber, || {
            let span = info_span!("belongs_to", relation = "post->user(author_id)");
            let _entered = span.enter();
        });

        let lines = captured.lines();
        assert!(lines.iter().any(|l| l.contains("time.busy")));
    }

    #[test]
    fn test_text_format_is_not_json() {
        let captured = Captured::default();
        let config = LoggingConfig {
            format: LogFormat::Text,
            level: Level::INFO,
            span_timings: false,
        };
        let subscriber = build_subscriber(&config, captured.clone());

        tracing::subscriber::with_default(subscriber, || {
            info!(ids = 3, "batch required");
        });

        let lines = captured.lines();
        assert_eq!(lines.len(), 1);
        assert!(serde_json::from_str::<serde_json::Value>(&lines[0]).is_err());
        assert!(lines[0].contains("batch required"));
    }
}
