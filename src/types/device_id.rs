// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Canonical device identifier type.

use std::fmt;

/// Canonical identifier of a bridged device.
///
/// The string form (`gpio/<pin>` or `w1/<sensor-id>`) is what the alias
/// table and the status topics operate on.
///
/// # Examples
///
/// ```
/// use pi2mqtt::types::DeviceId;
///
/// let id = DeviceId::gpio(17);
/// assert_eq!(id.to_string(), "gpio/17");
/// assert_eq!(DeviceId::parse("gpio/17"), Some(id));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DeviceId {
    /// A GPIO line, by offset on the chip.
    Gpio(u32),
    /// A 1-Wire sensor, by its sysfs directory name.
    W1(String),
}

impl DeviceId {
    /// Creates the identifier of a GPIO line.
    #[must_use]
    pub fn gpio(pin: u32) -> Self {
        Self::Gpio(pin)
    }

    /// Creates the identifier of a 1-Wire sensor.
    #[must_use]
    pub fn w1(sensor: impl Into<String>) -> Self {
        Self::W1(sensor.into())
    }

    /// Parses a canonical identifier.
    ///
    /// Only the exact forms `gpio/<digits>` and `w1/<name>` are accepted.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        if let Some(pin) = s.strip_prefix("gpio/") {
            if pin.is_empty() || !pin.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            return pin.parse().ok().map(Self::Gpio);
        }

        let sensor = s.strip_prefix("w1/")?;
        if sensor.is_empty() || sensor.contains('/') {
            return None;
        }
        Some(Self::W1(sensor.to_string()))
    }

    /// Returns the GPIO offset if this is a GPIO identifier.
    #[must_use]
    pub fn as_gpio(&self) -> Option<u32> {
        match self {
            Self::Gpio(pin) => Some(*pin),
            Self::W1(_) => None,
        }
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gpio(pin) => write!(f, "gpio/{pin}"),
            Self::W1(sensor) => write!(f, "w1/{sensor}"),
        }
    }
}
