// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the bridge.
//!
//! Every failure the bridge can hit falls in one of four classes:
//! configuration, broker communication, GPIO access and 1-Wire discovery.
//! Each class maps to its own process exit code via [`Error::exit_code`].

use std::path::PathBuf;

use thiserror::Error;

/// The main error type for this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// The configuration (file, command line or alias list) is invalid.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Communication with the MQTT broker failed.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// A GPIO line could not be opened or driven.
    #[error("gpio error: {0}")]
    Gpio(#[from] GpioError),

    /// The 1-Wire bus could not be enumerated.
    #[error("1-wire discovery error: {0}")]
    Discovery(#[from] DiscoveryError),
}

impl Error {
    /// Returns the process exit code for this error class.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 2,
            Self::Discovery(_) => 3,
            Self::Protocol(_) => 4,
            Self::Gpio(_) => 5,
        }
    }
}

/// Errors raised while loading or validating the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Io {
        /// Path of the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON for the expected shape.
    #[error("invalid config file: {0}")]
    Json(#[from] serde_json::Error),

    /// An alias specification is not of the form `left:right`.
    #[error("invalid alias {0:?}: expected exactly two non-empty segments separated by ':'")]
    InvalidAlias(String),

    /// A field holds a value outside its allowed domain.
    #[error("invalid {field}: {message}")]
    InvalidValue {
        /// The offending field.
        field: &'static str,
        /// Why the value was rejected.
        message: String,
    },
}

/// Errors related to the MQTT connection.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The MQTT client rejected a request.
    #[error("MQTT error: {0}")]
    Mqtt(#[from] rumqttc::ClientError),

    /// The broker URL could not be understood.
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

/// Errors related to GPIO lines.
#[derive(Debug, Error)]
pub enum GpioError {
    /// The GPIO chip could not be opened.
    #[error("cannot open gpio chip {}: {message}", path.display())]
    Chip {
        /// Path of the chip device.
        path: PathBuf,
        /// Description of the failure.
        message: String,
    },

    /// A line could not be requested from the chip.
    #[error("cannot open gpio {pin}: {message}")]
    Open {
        /// The line offset.
        pin: u32,
        /// Description of the failure.
        message: String,
    },

    /// Reading a line or its edge events failed.
    #[error("cannot read gpio {pin}: {message}")]
    Read {
        /// The line offset.
        pin: u32,
        /// Description of the failure.
        message: String,
    },

    /// Driving an output line failed.
    #[error("cannot write gpio {pin}: {message}")]
    Write {
        /// The line offset.
        pin: u32,
        /// Description of the failure.
        message: String,
    },
}

/// Errors raised by the 1-Wire startup scan.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The device directory could not be listed.
    #[error("cannot list {}: {source}", path.display())]
    Unreadable {
        /// The 1-Wire device directory.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The device directory exists but is empty.
    #[error("no devices found in {}", path.display())]
    Empty {
        /// The 1-Wire device directory.
        path: PathBuf,
    },
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
