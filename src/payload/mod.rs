// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wire payload encoding and decoding.
//!
//! Two payload formats are supported, selected by [`PayloadMode`]:
//!
//! - **Plain**: the bare scalar as text (`1`, `21.5`, `true`)
//! - **Structured**: a JSON object carrying the value in `val`
//!   (`{"val":true,"ack":true}`, `{"val":21.5}`)
//!
//! # Examples
//!
//! ```
//! use pi2mqtt::payload::{PayloadMode, encode_input_state, decode_command};
//!
//! // Inputs are active low: a raw low level publishes as "1"
//! assert_eq!(encode_input_state(false, PayloadMode::Plain).as_str(), "1");
//! assert_eq!(
//!     encode_input_state(false, PayloadMode::Structured).as_str(),
//!     r#"{"val":true,"ack":true}"#
//! );
//!
//! assert!(decode_command(br#"{"val":true}"#));
//! assert!(!decode_command(b"off"));
//! ```

mod command;

pub use command::{DecodedCommand, decode_command, decode_reading};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::ConfigError;

/// Payload format used on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PayloadMode {
    /// Bare stringified scalar.
    #[default]
    #[serde(rename = "plain")]
    Plain,
    /// JSON object with a `val` field.
    #[serde(rename = "json", alias = "structured")]
    Structured,
}

impl PayloadMode {
    /// Returns the configuration name of the mode.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::Structured => "json",
        }
    }
}

impl fmt::Display for PayloadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PayloadMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "plain" => Ok(Self::Plain),
            "json" | "structured" => Ok(Self::Structured),
            other => Err(ConfigError::InvalidValue {
                field: "payload",
                message: format!("must be \"plain\" or \"json\", got {other:?}"),
            }),
        }
    }
}

/// An encoded payload ready to be published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Bare scalar text.
    Plain(String),
    /// Serialized JSON object.
    Structured(String),
}

impl Payload {
    /// Returns the payload text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Plain(text) | Self::Structured(text) => text,
        }
    }

    /// Consumes the payload and returns its bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Self::Plain(text) | Self::Structured(text) => text.into_bytes(),
        }
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Encodes a raw GPIO input level.
///
/// Inputs are active low, so the published value is the inverted level.
/// Structured payloads carry `ack: true` to mark them as reported state.
#[must_use]
pub fn encode_input_state(raw: bool, mode: PayloadMode) -> Payload {
    let active = !raw;
    match mode {
        PayloadMode::Plain => Payload::Plain(if active { "1" } else { "0" }.to_string()),
        PayloadMode::Structured => {
            Payload::Structured(json!({ "val": active, "ack": true }).to_string())
        }
    }
}

/// Encodes a temperature reading in degrees Celsius.
#[must_use]
pub fn encode_sensor_reading(value: f64, mode: PayloadMode) -> Payload {
    match mode {
        PayloadMode::Plain => Payload::Plain(value.to_string()),
        PayloadMode::Structured => {
            Payload::Structured(json!({ "val": number_value(value) }).to_string())
        }
    }
}

/// Encodes the connection state published on the testament topic.
#[must_use]
pub fn encode_connection(connected: bool, mode: PayloadMode) -> Payload {
    match mode {
        PayloadMode::Plain => Payload::Plain(connected.to_string()),
        PayloadMode::Structured => Payload::Structured(json!({ "val": connected }).to_string()),
    }
}

/// Integral readings are emitted without a fraction (`21`, not `21.0`).
fn number_value(value: f64) -> Value {
    const MAX_EXACT: f64 = 9_007_199_254_740_992.0;

    if value.fract() == 0.0 && value.abs() < MAX_EXACT {
        // Exact: integral and within the f64 mantissa
        #[allow(clippy::cast_possible_truncation)]
        return Value::from(value as i64);
    }
    Value::from(value)
}
