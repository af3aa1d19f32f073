use crate::settings::{LogFormat, LoggingConfig};
use std::str::FromStr;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Builds the filter directive string for a configured level.
///
/// A bare level ("debug") gets quieter defaults for the HTTP and RPC stacks;
/// a full directive string (containing ',' or '=') is used as-is.
pub fn filter_directives(level: &str) -> String {
    let normalized = level.trim();
    if normalized.contains(',') || normalized.contains('=') {
        normalized.to_string()
    } else {
        format!(
            "{},h2=info,hyper=info,hyper_util=info,reqwest=info,alloy_transport_http=info",
            normalized
        )
    }
}

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. When a log directory is
/// configured, a daily rolling file layer is added; the returned guard flushes it
/// and must be kept alive for the lifetime of the program.
pub fn init_logging(config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::from_str(&filter_directives(&config.level))
            .unwrap_or_else(|_| EnvFilter::new("info"))
    });

    let (file_layer, guard) = match &config.directory {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "bulwark.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let registry = tracing_subscriber::registry().with(filter).with(file_layer);
    match config.format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_target(false).with_current_span(false))
            .init(),
        LogFormat::Compact => registry.with(fmt::layer().with_target(true).compact()).init(),
    }

    tracing::info!(level = %config.level, format = ?config.format, "Logging initialized");
    guard
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_level_gets_quiet_dependencies() {
        let directives = filter_directives("debug");
        assert!(directives.starts_with("debug,"));
        assert!(directives.contains("reqwest=info"));
    }

    #[test]
    fn custom_directives_are_respected() {
        assert_eq!(filter_directives("warn,engine=debug"), "warn,engine=debug");
    }
}
