// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! 1-Wire family codes of supported temperature sensors.

use std::fmt;

/// Family of a 1-Wire temperature sensor, taken from the prefix of its
/// sysfs directory name.
///
/// # Examples
///
/// ```
/// use pi2mqtt::types::SensorFamily;
///
/// assert_eq!(
///     SensorFamily::from_sensor_name("28-0000002981762"),
///     Some(SensorFamily::Ds18b20)
/// );
/// assert_eq!(SensorFamily::from_sensor_name("w1_bus_master1"), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SensorFamily {
    /// Family `28` (DS18B20).
    Ds18b20,
    /// Family `10` (DS18S20).
    Ds18s20,
}

impl SensorFamily {
    /// All supported families, in polling order.
    pub const ALL: [Self; 2] = [Self::Ds18b20, Self::Ds18s20];

    /// Returns the two-digit hexadecimal family code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Ds18b20 => "28",
            Self::Ds18s20 => "10",
        }
    }

    /// Classifies a sysfs directory name such as `28-0000002981762`.
    #[must_use]
    pub fn from_sensor_name(name: &str) -> Option<Self> {
        let (code, serial) = name.split_once('-')?;
        if serial.is_empty() {
            return None;
        }
        Self::ALL.into_iter().find(|family| family.code() == code)
    }
}

impl fmt::Display for SensorFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
