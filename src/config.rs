// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bridge configuration.
//!
//! A [`Config`] is loaded from an optional JSON file, overridden from the
//! command line and then [resolved](Config::resolved): topic prefixes are
//! normalised and every field is validated before anything touches the
//! hardware or the broker.
//!
//! # File format
//!
//! ```json
//! {
//!     "url": "mqtt://192.168.1.50",
//!     "payload": "json",
//!     "status-topic": "pi/status/",
//!     "input": [17, 18],
//!     "output": 23,
//!     "alias": ["gpio/17:Light/Garden"],
//!     "w1-interval": 60
//! }
//! ```
//!
//! Keys may also be written in camelCase (`statusTopic`, `w1Interval`).
//! `input`, `output` and `alias` accept a single value or a list.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Deserializer};

use crate::alias::AliasTable;
use crate::error::ConfigError;
use crate::payload::PayloadMode;

/// Default broker URL.
pub const DEFAULT_URL: &str = "mqtt://127.0.0.1";

/// Default sysfs directory of the 1-Wire bus.
pub const DEFAULT_W1_PATH: &str = "/sys/bus/w1/devices/";

/// Default GPIO character device.
pub const DEFAULT_GPIO_CHIP: &str = "/dev/gpiochip0";

const DEFAULT_W1_SECS: u64 = 30;

/// Accepted log verbosity levels.
pub const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Log verbosity when none is configured.
pub const DEFAULT_LOG_LEVEL: &str = "error";

/// Fully resolved bridge configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    /// Broker URL, `mqtt://[user:password@]host[:port]`.
    pub url: String,
    /// Payload format.
    pub payload: PayloadMode,
    /// Publish status messages with the retain flag.
    pub retain: bool,
    /// Prefix of status topics.
    #[serde(alias = "statusTopic")]
    pub status_topic: String,
    /// Prefix of set (command) topics.
    #[serde(alias = "setTopic")]
    pub set_topic: String,
    /// Topic for the connected/last-will message; empty disables it.
    #[serde(alias = "testamentTopic")]
    pub testament_topic: String,
    /// Topic aliases as `canonical:friendly` pairs.
    #[serde(deserialize_with = "one_or_many")]
    pub alias: Vec<String>,
    /// GPIO lines used as inputs.
    #[serde(alias = "in", deserialize_with = "one_or_many")]
    pub input: Vec<u32>,
    /// GPIO lines used as outputs.
    #[serde(alias = "out", deserialize_with = "one_or_many")]
    pub output: Vec<u32>,
    /// Disable 1-Wire polling.
    #[serde(alias = "w1Disable")]
    pub w1_disable: bool,
    /// Seconds to wait before scanning the 1-Wire bus.
    #[serde(alias = "w1Wait")]
    pub w1_wait: u64,
    /// Seconds between two 1-Wire polls.
    #[serde(alias = "w1Interval")]
    pub w1_interval: u64,
    /// Directory listing the 1-Wire devices.
    #[serde(alias = "w1Path")]
    pub w1_path: PathBuf,
    /// GPIO character device.
    #[serde(alias = "gpioChip")]
    pub gpio_chip: PathBuf,
    /// Log verbosity, one of [`LOG_LEVELS`].
    pub verbosity: Option<String>,
    /// Log debug output regardless of `verbosity`.
    pub debug: bool,
    /// Append log output to this file instead of stderr.
    pub log: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        let host = hostname::get()
            .ok()
            .and_then(|name| name.into_string().ok())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "pi2mqtt".to_string());

        Self {
            url: DEFAULT_URL.to_string(),
            payload: PayloadMode::Plain,
            retain: true,
            status_topic: format!("{host}/status/"),
            set_topic: format!("{host}/set/"),
            testament_topic: format!("{host}/connected"),
            alias: Vec::new(),
            input: Vec::new(),
            output: Vec::new(),
            w1_disable: false,
            w1_wait: DEFAULT_W1_SECS,
            w1_interval: DEFAULT_W1_SECS,
            w1_path: PathBuf::from(DEFAULT_W1_PATH),
            gpio_chip: PathBuf::from(DEFAULT_GPIO_CHIP),
            verbosity: None,
            debug: false,
            log: None,
        }
    }
}

impl Config {
    /// Reads a configuration file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or is not a valid
    /// configuration document.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_json::from_str(&contents)?;
        tracing::info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Reads a configuration file, falling back to defaults when the file
    /// does not exist and `required` is false.
    ///
    /// # Errors
    ///
    /// Returns error if the file is required but missing, unreadable, or
    /// malformed.
    pub fn load(path: &Path, required: bool) -> Result<Self, ConfigError> {
        if !required && !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        Self::from_file(path)
    }

    /// Normalises topic prefixes and validates every field.
    ///
    /// # Errors
    ///
    /// Returns error if a field is out of range or the alias list is
    /// malformed.
    pub fn resolved(mut self) -> Result<Self, ConfigError> {
        ensure_trailing_slash(&mut self.status_topic);
        ensure_trailing_slash(&mut self.set_topic);

        if self.url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "url",
                message: "must not be empty".to_string(),
            });
        }
        if self.w1_interval < 1 {
            return Err(ConfigError::InvalidValue {
                field: "w1-interval",
                message: "must be a number greater than 0".to_string(),
            });
        }
        if let Some(level) = self
            .verbosity
            .as_deref()
            .filter(|level| !LOG_LEVELS.contains(level))
        {
            return Err(ConfigError::InvalidValue {
                field: "verbosity",
                message: format!("unknown level {level:?}"),
            });
        }
        if let Some(pin) = self.input.iter().find(|pin| self.output.contains(pin)) {
            return Err(ConfigError::InvalidValue {
                field: "input",
                message: format!("gpio {pin} is also configured as output"),
            });
        }
        self.alias_table()?;

        Ok(self)
    }

    /// Builds the alias table from the configured specifications.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidAlias`] on a malformed specification.
    pub fn alias_table(&self) -> Result<AliasTable, ConfigError> {
        AliasTable::from_specs(&self.alias)
    }

    /// Returns the testament topic, if enabled.
    #[must_use]
    pub fn testament_topic(&self) -> Option<&str> {
        Some(self.testament_topic.as_str()).filter(|topic| !topic.is_empty())
    }

    /// Returns the effective log level; `debug` wins over `verbosity`.
    #[must_use]
    pub fn log_level(&self) -> &str {
        if self.debug {
            "debug"
        } else {
            self.verbosity.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
        }
    }

    /// Returns the delay before the 1-Wire bus is scanned.
    #[must_use]
    pub fn w1_wait(&self) -> Duration {
        Duration::from_secs(self.w1_wait)
    }

    /// Returns the 1-Wire polling interval.
    #[must_use]
    pub fn w1_interval(&self) -> Duration {
        Duration::from_secs(self.w1_interval)
    }
}

fn ensure_trailing_slash(prefix: &mut String) {
    if !prefix.is_empty() && !prefix.ends_with('/') {
        prefix.push('/');
    }
}

fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany<T> {
        One(T),
        Many(Vec<T>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(value) => vec![value],
        OneOrMany::Many(values) => values,
    })
}
