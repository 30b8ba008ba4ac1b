use clap::ValueEnum;
use tracing_subscriber::EnvFilter;

/// Filter directives that replace `--log-level` when set, e.g.
/// `PULSELOG_LOG=pulselog_server=trace,warn`.
pub const LOG_FILTER_ENV: &str = "PULSELOG_LOG";

/// Crates whose diagnostics follow `--log-level`. Everything else is kept at
/// `warn`.
const OWN_TARGETS: [&str; 5] = [
    "pulselog",
    "pulselog_transport",
    "pulselog_frame",
    "pulselog_server",
    "pulselog_client",
];

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
    fn directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Diagnostics go to stderr so that stdout stays reserved for log lines and
/// command output.
pub fn init_logging(format: LogFormat, level: LogLevel) {
    let override_directives = std::env::var(LOG_FILTER_ENV).ok();
    let (filter, rejected) = build_filter(level, override_directives.as_deref());

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

    if let Some(err) = rejected {
        tracing::warn!(env = LOG_FILTER_ENV, error = %err, "ignoring invalid log filter");
    }
}

/// The filter for `level`, unless `directives` parse. A rejected override is
/// handed back so it can be reported once logging is up.
fn build_filter(
    level: LogLevel,
    directives: Option<&str>,
) -> (EnvFilter, Option<tracing_subscriber::filter::ParseError>) {
    let directives = directives.map(str::trim).filter(|d| !d.is_empty());
    let rejected = match directives.map(EnvFilter::try_new) {
        Some(Ok(filter)) => return (filter, None),
        Some(Err(err)) => Some(err),
        None => None,
    };
    (default_filter(level), rejected)
}

fn default_filter(level: LogLevel) -> EnvFilter {
    let level = level.directive();
    let mut directives = vec!["warn".to_owned()];
    directives.extend(OWN_TARGETS.iter().map(|target| format!("{target}={level}")));
    EnvFilter::new(directives.join(","))
}
