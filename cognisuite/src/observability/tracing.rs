//! Tracing subscriber initialisation.

use std::fmt;
use std::str::FromStr;

use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::EnvFilter;

use cognisuite_core::CogniError;

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Single-line human-readable output
    #[default]
    Compact,
    /// Multi-line human-readable output
    Pretty,
    /// One JSON object per line
    Json,
}

impl FromStr for OutputFormat {
    type Err = CogniError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "compact" | "text" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(CogniError::ConfigurationError(format!(
                "Invalid log format: {other}. Valid options: compact, pretty, json"
            ))),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Compact => "compact",
            Self::Pretty => "pretty",
            Self::Json => "json",
        })
    }
}

#[derive(Debug, Clone)]
pub struct TracingConfig {
    pub level: tracing::Level,
    pub format: OutputFormat,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            level: tracing::Level::WARN,
            format: OutputFormat::Compact,
        }
    }
}

impl TracingConfig {
    pub fn new(level: tracing::Level, format: OutputFormat) -> Self {
        Self { level, format }
    }

    /// Parse a level name (`trace` .. `error`).
    pub fn with_level_str(mut self, level: &str) -> Result<Self, CogniError> {
        self.level = level.parse().map_err(|_| {
            CogniError::ConfigurationError(format!(
                "Invalid log level: {level}. Valid options: trace, debug, info, warn, error"
            ))
        })?;
        Ok(self)
    }

    /// Directive used when `RUST_LOG` is unset.
    pub fn default_directive(&self) -> String {
        let level = self.level.as_str().to_lowercase();
        format!("cognisuite={level},cognisuite_core={level}")
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.default_directive()))
    }
}

/// Install a global subscriber writing to stderr.
///
/// A subscriber installed earlier (e.g. by a test harness) is left in place.
pub fn init_tracing(config: &TracingConfig) -> Result<(), CogniError> {
    if tracing::dispatcher::has_been_set() {
        tracing::debug!(target: "cognisuite::tracing", "global subscriber already installed");
        return Ok(());
    }

    let builder = tracing_subscriber::fmt()
        .with_env_filter(config.env_filter())
        .with_writer(std::io::stderr)
        .with_target(true);

    let result = match config.format {
        OutputFormat::Compact => builder.compact().try_init(),
        OutputFormat::Pretty => builder.pretty().try_init(),
        OutputFormat::Json => builder.json().try_init(),
    };

    match result {
        Ok(()) => Ok(()),
        // Lost a race with another initialiser.
        Err(e) if e.is::<SetGlobalDefaultError>() => Ok(()),
        Err(e) => Err(CogniError::ConfigurationError(format!(
            "Failed to initialize tracing: {e}"
        ))),
    }
}
