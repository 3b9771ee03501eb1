use clap::ValueEnum;
use tracing_subscriber::EnvFilter;

/// Per-crate directives (`canvasnet_hub=debug,canvasnet_reactor=trace`) that
/// replace `--log-level` when set.
pub const LOG_ENV: &str = "CANVASNET_LOG";

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Install the stderr subscriber. Stdout is reserved for command output.
pub fn init_logging(format: LogFormat, level: LogLevel) {
    let filter = build_filter(level, std::env::var(LOG_ENV).ok().as_deref());
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(false);

    match format {
        LogFormat::Text => {
            let _ = builder.try_init();
        }
        LogFormat::Json => {
            let _ = builder.json().try_init();
        }
    }
}

/// `--log-level` unless `CANVASNET_LOG` holds valid directives.
fn build_filter(level: LogLevel, directives: Option<&str>) -> EnvFilter {
    match directives.map(str::trim).filter(|d| !d.is_empty()) {
        Some(directives) => EnvFilter::try_new(directives).unwrap_or_else(|err| {
            eprintln!("warning: ignoring {LOG_ENV}={directives}: {err}");
            EnvFilter::new(level.as_directive())
        }),
        None => EnvFilter::new(level.as_directive()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_flag_is_the_default_filter() {
        let shown = |filter: EnvFilter| filter.to_string().to_ascii_lowercase();
        assert_eq!(shown(build_filter(LogLevel::Warn, None)), "warn");
        assert_eq!(shown(build_filter(LogLevel::Trace, Some("  "))), "trace");
    }

    #[test]
    fn env_directives_take_precedence() {
        let filter = build_filter(LogLevel::Error, Some("canvasnet_hub=debug"));
        assert_eq!(filter.to_string().to_ascii_lowercase(), "canvasnet_hub=debug");
    }
}
