use std::time::{SystemTime, UNIX_EPOCH};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::paths::DataDir;

const DEFAULT_FILTER: &str = "info,reqwest=warn,hyper=warn,tungstenite=warn";
const LOG_FILE: &str = "console.log";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    /// Anything but `pretty` falls back to JSON lines.
    fn parse(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.trim().eq_ignore_ascii_case("pretty") => LogFormat::Pretty,
            _ => LogFormat::Json,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            LogFormat::Json => "json",
            LogFormat::Pretty => "pretty",
        }
    }
}

/// First valid directive wins: `MAESTRO_LOG_FILTER`, then `RUST_LOG`, then
/// the built-in default.
fn filter_directive(maestro: Option<String>, rust_log: Option<String>) -> String {
    [maestro, rust_log]
        .into_iter()
        .flatten()
        .find(|directive| EnvFilter::try_new(directive).is_ok())
        .unwrap_or_else(|| DEFAULT_FILTER.to_string())
}

/// Ties log lines from one process together.
fn process_run_id() -> String {
    let started_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    format!("pid-{}-{started_ms}", std::process::id())
}

pub struct LoggingHandle {
    pub run_id: String,
    _guard: WorkerGuard,
}

/// Log to `<data_dir>/logs/console.log` so output never interleaves with the
/// interactive console.
pub fn init_logging(data_dir: &DataDir) -> anyhow::Result<LoggingHandle> {
    let log_dir = data_dir.log_dir();
    std::fs::create_dir_all(&log_dir)?;

    let directive = filter_directive(
        std::env::var("MAESTRO_LOG_FILTER").ok(),
        std::env::var("RUST_LOG").ok(),
    );
    let format = LogFormat::parse(std::env::var("MAESTRO_LOG_FORMAT").ok().as_deref());
    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(&log_dir, LOG_FILE));

    let registry = tracing_subscriber::registry().with(EnvFilter::try_new(&directive)?);
    let layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_file(true)
        .with_line_number(true)
        .with_target(true);
    match format {
        LogFormat::Pretty => registry.with(layer.pretty()).try_init()?,
        LogFormat::Json => registry
            .with(layer.json().flatten_event(true).with_current_span(true))
            .try_init()?,
    }

    let run_id = process_run_id();
    tracing::info!(
        component = "logging",
        event = "logging.initialized",
        run_id = %run_id,
        log_path = %log_dir.join(LOG_FILE).display(),
        format = format.as_str(),
        filter = %directive,
    );

    Ok(LoggingHandle {
        run_id,
        _guard: guard,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_defaults_to_json() {
        assert_eq!(LogFormat::parse(None), LogFormat::Json);
        assert_eq!(LogFormat::parse(Some("json")), LogFormat::Json);
        assert_eq!(LogFormat::parse(Some("yaml")), LogFormat::Json);
        assert_eq!(LogFormat::parse(Some(" Pretty ")), LogFormat::Pretty);
    }

    #[test]
    fn filter_prefers_maestro_then_rust_log() {
        assert_eq!(
            filter_directive(Some("debug".into()), Some("warn".into())),
            "debug"
        );
        assert_eq!(filter_directive(None, Some("warn".into())), "warn");
        assert_eq!(filter_directive(None, None), DEFAULT_FILTER);
    }

    #[test]
    fn invalid_filter_falls_through() {
        assert_eq!(
            filter_directive(Some("maestro=verbose".into()), Some("warn".into())),
            "warn"
        );
        assert_eq!(filter_directive(Some("maestro=verbose".into()), None), DEFAULT_FILTER);
    }

    #[test]
    fn run_id_names_the_process() {
        let run_id = process_run_id();
        assert!(run_id.starts_with(&format!("pid-{}-", std::process::id())));
    }
}
