#![forbid(unsafe_code)]

//! Logging bootstrap.
//!
//! Library crates only emit `tracing` events and spans. The binary calls
//! [`init`] once to install a subscriber. The filter is the explicit
//! [`LogConfig::directive`] when given, else `NEBULA_LOG`, else
//! [`LogConfig::fallback`].

use std::fmt;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

/// Environment variable holding an `EnvFilter` directive.
pub const LOG_ENV: &str = "NEBULA_LOG";

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Plain,
    /// One JSON object per line (requires the `tracing-json` feature).
    Json,
}

/// Subscriber settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Explicit filter directive, e.g. `"debug"` or `"nebula_runtime=trace"`.
    /// Wins over `NEBULA_LOG`.
    pub directive: Option<String>,
    /// Used when neither `directive` nor `NEBULA_LOG` is set.
    pub fallback: String,
    pub format: LogFormat,
    /// Emit an event when spans close (includes their busy time).
    pub span_timing: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            directive: None,
            fallback: "info".into(),
            format: LogFormat::Plain,
            span_timing: false,
        }
    }
}

/// Errors raised by [`init`].
#[derive(Debug)]
pub enum LogInitError {
    /// The directive could not be parsed as an `EnvFilter`.
    Filter(tracing_subscriber::filter::ParseError),
    /// JSON output was requested but the `tracing-json` feature is off.
    JsonUnavailable,
    /// A global subscriber is already installed.
    AlreadyInitialized,
}

impl fmt::Display for LogInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Filter(err) => write!(f, "invalid log filter: {err}"),
            Self::JsonUnavailable => {
                f.write_str("JSON logging requires the `tracing-json` feature")
            }
            Self::AlreadyInitialized => f.write_str("a global subscriber is already installed"),
        }
    }
}

impl std::error::Error for LogInitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Filter(err) => Some(err),
            _ => None,
        }
    }
}

impl From<tracing_subscriber::filter::ParseError> for LogInitError {
    fn from(err: tracing_subscriber::filter::ParseError) -> Self {
        Self::Filter(err)
    }
}

/// Pick the filter directive: explicit, then environment, then fallback.
/// Blank values count as unset.
pub fn select_directive<'a>(
    explicit: Option<&'a str>,
    env: Option<&'a str>,
    fallback: &'a str,
) -> &'a str {
    let set = |d: &&str| !d.trim().is_empty();
    explicit.filter(set).or(env.filter(set)).unwrap_or(fallback)
}

/// Build the filter from `config` and `NEBULA_LOG`.
pub fn build_filter(config: &LogConfig) -> Result<EnvFilter, LogInitError> {
    let env = std::env::var(LOG_ENV).ok();
    let directive = select_directive(config.directive.as_deref(), env.as_deref(), &config.fallback);
    Ok(EnvFilter::try_new(directive)?)
}

/// Install the global subscriber. Logs go to stderr so stdout stays free
/// for frame output.
pub fn init(config: &LogConfig) -> Result<(), LogInitError> {
    let filter = build_filter(config)?;
    let span_events = if config.span_timing {
        FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(span_events)
        .with_writer(std::io::stderr);

    match config.format {
        LogFormat::Plain => builder
            .try_init()
            .map_err(|_| LogInitError::AlreadyInitialized),
        #[cfg(feature = "tracing-json")]
        LogFormat::Json => builder
            .json()
            .try_init()
            .map_err(|_| LogInitError::AlreadyInitialized),
        #[cfg(not(feature = "tracing-json"))]
        LogFormat::Json => Err(LogInitError::JsonUnavailable),
    }
}
