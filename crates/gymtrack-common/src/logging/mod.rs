//! Diagnostic logging for GymTrack binaries
//!
//! Logs go to stderr so command output on stdout stays pipeable. The filter is
//! taken from the first of these that is present:
//! 1. `-v`/`-q` on the command line
//! 2. `RUST_LOG`, when it parses
//! 3. the binary's default directives

use anyhow::Result;
use clap_verbosity_flag::{LogLevel, Verbosity};
use std::fmt;
use std::str::FromStr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// How log lines are rendered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Single-line human readable output
    #[default]
    Compact,
    /// One JSON object per event, for log collectors
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{other}', expected compact or json")),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Compact => f.write_str("compact"),
            LogFormat::Json => f.write_str("json"),
        }
    }
}

/// Pick the filter directives by precedence
fn build_filter(
    flag_level: Option<&str>,
    rust_log: Option<&str>,
    default_filter: &str,
) -> Result<EnvFilter> {
    if let Some(level) = flag_level {
        return Ok(EnvFilter::try_new(level)?);
    }
    if let Some(filter) = rust_log.and_then(|directives| EnvFilter::try_new(directives).ok()) {
        return Ok(filter);
    }
    Ok(EnvFilter::try_new(default_filter)?)
}

fn flag_level<L: LogLevel>(verbosity: &Verbosity<L>) -> Option<String> {
    verbosity
        .log_level()
        .map(|level| level.to_string().to_ascii_lowercase())
}

/// Install the global subscriber.
///
/// Fails if the filter does not parse or a subscriber is already installed.
///
/// ```no_run
/// use clap::Parser;
/// use clap_verbosity_flag::{Verbosity, WarnLevel};
/// use gymtrack_common::logging::{self, LogFormat};
///
/// #[derive(Parser)]
/// struct Args {
///     #[clap(flatten)]
///     verbosity: Verbosity<WarnLevel>,
/// }
///
/// let args = Args::parse();
/// logging::init_logging(&args.verbosity, "gymtrack_sdk=info", LogFormat::Compact).unwrap();
/// ```
pub fn init_logging<L: LogLevel>(
    verbosity: &Verbosity<L>,
    default_filter: &str,
    format: LogFormat,
) -> Result<()> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = build_filter(
        flag_level(verbosity).as_deref(),
        rust_log.as_deref(),
        default_filter,
    )?;

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Compact => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()?,
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()?,
    }

    Ok(())
}

/// Like [`init_logging`], but stays silent unless `-v` or `RUST_LOG` asks for
/// output. Returns whether a subscriber was installed.
pub fn init_cli_logging<L: LogLevel>(
    verbosity: &Verbosity<L>,
    default_filter: &str,
    format: LogFormat,
) -> Result<bool> {
    let requested =
        verbosity.log_level().is_some() || std::env::var_os(EnvFilter::DEFAULT_ENV).is_some();
    if requested {
        init_logging(verbosity, default_filter, format)?;
    }
    Ok(requested)
}
