//! Configuration management for stream valves.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::error::{Result, ValveError};
use crate::logging::Logger;

/// Process settings read once at startup from the environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Name attached to events emitted through a valve's logger
    #[serde(default = "default_logger_name")]
    pub logger_name: String,

    /// Significant digits used when reporting rates
    #[serde(default = "default_decimal_prec")]
    pub decimal_prec: u32,

    /// Output format of the process-wide subscriber
    #[serde(default)]
    pub log_format: LogFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            logger_name: default_logger_name(),
            decimal_prec: default_decimal_prec(),
            log_format: LogFormat::default(),
        }
    }
}

fn default_logger_name() -> String {
    "stream-valve".to_string()
}

fn default_decimal_prec() -> u32 {
    28
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Environment keys read into [`Settings`], after case folding.
const SETTINGS_KEYS: &[&str] = &["logger_name", "decimal_prec", "log_format"];

impl Settings {
    /// Load settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(
            std::env::vars_os()
                .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?))),
        )
    }

    /// Load settings from a set of environment-style key/value pairs.
    ///
    /// Keys are case-folded and `-` is treated as `_`, so `LOGGER-NAME`,
    /// `Logger_Name` and `logger_name` all set the same value. Variables
    /// other than the settings keys are ignored.
    pub fn from_vars<I>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: config::Map<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.to_lowercase().replace('-', "_"), v))
            .filter(|(k, _)| SETTINGS_KEYS.contains(&k.as_str()))
            .collect();

        // Values stay strings; serde converts `decimal_prec` to a number.
        let environment = config::Environment::default().source(Some(vars));
        config::Config::builder()
            .add_source(environment)
            .build()
            .and_then(|c| c.try_deserialize::<Settings>())
            .map_err(|e| ValveError::Config(format!("Failed to load settings: {}", e)))
    }
}

/// Configuration for a single valve.
///
/// Validation happens when a valve is constructed from it, see
/// [`ValveConfig::validate`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValveConfig {
    /// Bytes requested per read
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Target throughput in bytes per second (advisory)
    #[serde(default)]
    pub throughput: Option<f64>,

    /// Seconds to pause when throttled
    #[serde(default = "default_backoff_delay")]
    pub rate_limit_backoff_delay: Option<f64>,

    /// Log the observed rate for every chunk
    #[serde(default)]
    pub debug: bool,

    /// Where valve output goes; printed to the console when unset
    #[serde(skip)]
    pub logger: Option<Logger>,
}

impl Default for ValveConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            throughput: None,
            rate_limit_backoff_delay: default_backoff_delay(),
            debug: false,
            logger: None,
        }
    }
}

fn default_chunk_size() -> usize {
    1024
}

fn default_backoff_delay() -> Option<f64> {
    Some(0.01)
}

impl ValveConfig {
    /// Set the chunk size.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Set the target throughput in bytes per second.
    pub fn with_throughput(mut self, throughput: f64) -> Self {
        self.throughput = Some(throughput);
        self
    }

    /// Set or clear the backoff delay in seconds.
    pub fn with_backoff_delay(mut self, delay: Option<f64>) -> Self {
        self.rate_limit_backoff_delay = delay;
        self
    }

    /// Enable or disable rate logging.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Attach a logger.
    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Check every constraint, reporting the first violation.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(ValveError::InvalidConfiguration(
                "chunk_size must be positive".to_string(),
            ));
        }
        if let Some(throughput) = self.throughput {
            if !is_positive(throughput) {
                return Err(ValveError::InvalidConfiguration(
                    "throughput must be positive".to_string(),
                ));
            }
        }
        if let Some(delay) = self.rate_limit_backoff_delay {
            if !is_positive(delay) {
                return Err(ValveError::InvalidConfiguration(
                    "rate_limit_backoff_delay must be positive".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// The backoff delay as a duration.
    pub fn backoff_delay(&self) -> Option<Duration> {
        self.rate_limit_backoff_delay.map(Duration::from_secs_f64)
    }

    /// Load and validate a configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading valve configuration");

        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Load and validate a configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: ValveConfig = serde_yaml::from_str(yaml)
            .map_err(|e| ValveError::Config(format!("Failed to parse valve config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}
