//! Settings for the end-to-end suite.
//!
//! Configuration is layered: built-in defaults, then an optional TOML file,
//! then `FNDECK_`-prefixed environment variables. The one key without a
//! default is `fn_url`, the base URL of the console under test; loading fails
//! with [`ConfigError::MissingKey`] naming it when no layer provides one.
//!
//! Settings are passed to page objects and suites explicitly. Nothing in this
//! crate reads configuration ambiently after startup.

use std::path::Path;
use std::time::Duration;

use figment::providers::{Env, Format as _, Serialized, Toml};
use figment::Figment;
use fndeck_browser_test::WaitConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default config file name, resolved against the current directory.
pub const DEFAULT_CONFIG_FILE: &str = "fndeck.toml";

/// Errors raised while loading or validating settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required key was provided by no configuration layer.
    #[error("missing required config key: {key}")]
    MissingKey {
        /// The key that was looked up
        key: String,
    },

    /// A key was present but its value could not be used.
    #[error("invalid config value for {key}: {reason}")]
    InvalidValue {
        /// The offending key
        key: String,
        /// Why the value was rejected
        reason: String,
    },
}

/// The raw shape extracted from the figment layers, before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    fn_url: Option<String>,
    headless: bool,
    suite_timeout_secs: u64,
    wait_timeout_ms: u64,
    poll_interval_ms: u64,
}

impl Default for RawSettings {
    fn default() -> Self {
        Self {
            fn_url: None,
            headless: true,
            suite_timeout_secs: 50,
            wait_timeout_ms: 10_000,
            poll_interval_ms: 100,
        }
    }
}

/// Validated, read-only settings for a suite run.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base URL of the console under test, without a trailing slash
    /// requirement. `http://localhost:4000` is typical for local runs.
    pub fn_url: String,

    /// Whether the real browser runs headless.
    pub headless: bool,

    /// Overall budget for one suite run, in seconds.
    pub suite_timeout_secs: u64,

    /// Timeout for individual element waits, in milliseconds.
    pub wait_timeout_ms: u64,

    /// Poll interval for element waits, in milliseconds.
    pub poll_interval_ms: u64,
}

impl Settings {
    /// Creates settings for `fn_url` with defaults for everything else.
    pub fn new(fn_url: impl Into<String>) -> Self {
        let defaults = RawSettings::default();
        Self {
            fn_url: fn_url.into(),
            headless: defaults.headless,
            suite_timeout_secs: defaults.suite_timeout_secs,
            wait_timeout_ms: defaults.wait_timeout_ms,
            poll_interval_ms: defaults.poll_interval_ms,
        }
    }

    /// Loads settings from `fndeck.toml` and the environment.
    ///
    /// # Errors
    ///
    /// Returns `MissingKey` when no layer provides `fn_url`, or
    /// `InvalidValue` when a provided value fails to parse or validate.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Loads settings from a specific config file path and the environment.
    ///
    /// The file is optional; a missing file contributes nothing. Priority:
    /// environment variables over file values over defaults.
    ///
    /// # Errors
    ///
    /// Same as [`Settings::load`].
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let figment = Figment::new()
            .merge(Serialized::defaults(RawSettings::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("FNDECK_"));

        let raw: RawSettings = figment.extract().map_err(|e| ConfigError::InvalidValue {
            key: "configuration".to_string(),
            reason: e.to_string(),
        })?;

        Self::from_raw(raw)
    }

    fn from_raw(raw: RawSettings) -> Result<Self, ConfigError> {
        let fn_url = raw
            .fn_url
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .ok_or_else(|| ConfigError::MissingKey {
                key: "fn_url".to_string(),
            })?;

        if raw.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "poll_interval_ms".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(Self {
            fn_url,
            headless: raw.headless,
            suite_timeout_secs: raw.suite_timeout_secs,
            wait_timeout_ms: raw.wait_timeout_ms,
            poll_interval_ms: raw.poll_interval_ms,
        })
    }

    /// Returns a full URL by joining a path to the console base URL.
    pub fn url(&self, path: &str) -> String {
        let base = self.fn_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{base}/{path}")
    }

    /// Returns the details-page URL for an app.
    pub fn app_url(&self, app_name: &str) -> String {
        self.url(&format!("app/{app_name}"))
    }

    /// Wait settings for element polling, derived from the timeout keys.
    pub fn wait_config(&self) -> WaitConfig {
        WaitConfig::new(
            Duration::from_millis(self.wait_timeout_ms),
            Duration::from_millis(self.poll_interval_ms),
        )
    }

    /// The overall suite budget.
    pub fn suite_timeout(&self) -> Duration {
        Duration::from_secs(self.suite_timeout_secs)
    }
}
