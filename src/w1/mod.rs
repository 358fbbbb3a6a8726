// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! 1-Wire temperature sensors.
//!
//! The kernel `w1` driver exposes each sensor as a directory under
//! `/sys/bus/w1/devices/` whose name starts with the family code
//! (`28-0000002981762`). Reading its `w1_slave` file triggers a conversion
//! and returns the scratchpad together with the CRC check and the
//! temperature in millidegrees:
//!
//! ```text
//! 72 01 4b 46 7f ff 0e 10 57 : crc=57 YES
//! 72 01 4b 46 7f ff 0e 10 57 t=23125
//! ```
//!
//! - [`SensorBus`]: access to the sensor directory
//! - [`SysfsBus`]: the sysfs implementation
//! - [`W1Poller`]: boot delay, discovery and periodic polling

mod poller;
mod sysfs;

pub use poller::{IMMEDIATE_POLL_THRESHOLD, MAX_CONCURRENT_READS, W1Poller};
pub use sysfs::SysfsBus;

use std::collections::BTreeMap;
use std::io;
use std::path::Path;

use crate::types::SensorFamily;

/// Read access to the 1-Wire device directory.
#[allow(async_fn_in_trait)]
pub trait SensorBus {
    /// Returns the directory being read, for diagnostics.
    fn path(&self) -> &Path;

    /// Lists the entries of the device directory.
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be read.
    async fn list(&self) -> io::Result<Vec<String>>;

    /// Reads the raw `w1_slave` record of a sensor.
    ///
    /// # Errors
    ///
    /// Returns error if the record cannot be read.
    async fn read(&self, sensor: &str) -> io::Result<String>;
}

/// The outcome of reading one sensor during a polling cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorSample {
    /// Sensor directory name.
    pub sensor: String,
    /// Temperature in degrees Celsius, `None` if the read failed.
    pub value: Option<f64>,
}

/// Temperature sensors found during discovery, grouped by family.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SensorSet {
    families: BTreeMap<SensorFamily, Vec<String>>,
}

impl SensorSet {
    /// Classifies directory entries, ignoring anything that is not a
    /// supported temperature sensor (such as `w1_bus_master1`).
    #[must_use]
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut families: BTreeMap<SensorFamily, Vec<String>> = BTreeMap::new();
        for entry in entries {
            let entry = entry.into();
            if let Some(family) = SensorFamily::from_sensor_name(&entry) {
                families.entry(family).or_default().push(entry);
            }
        }
        for sensors in families.values_mut() {
            sensors.sort();
            sensors.dedup();
        }
        Self { families }
    }

    /// Returns the sensors of one family.
    #[must_use]
    pub fn family(&self, family: SensorFamily) -> &[String] {
        self.families.get(&family).map(Vec::as_slice).unwrap_or_default()
    }

    /// Iterates over all sensors, family `28` first.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.families.values().flatten().map(String::as_str)
    }

    /// Returns the total number of sensors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.families.values().map(Vec::len).sum()
    }

    /// Returns `true` if no sensor was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Parses a `w1_slave` record into degrees Celsius.
///
/// Returns `None` unless the record reports a valid CRC (`YES`) followed by
/// a data line ending in `t=<millidegrees>`.
///
/// # Examples
///
/// ```
/// use pi2mqtt::w1::parse_w1_slave;
///
/// let raw = "72 01 4b 46 7f ff 0e 10 57 : crc=57 YES\n\
///            72 01 4b 46 7f ff 0e 10 57 t=23125\n";
/// assert_eq!(parse_w1_slave(raw), Some(23.125));
///
/// let bad_crc = "72 01 4b 46 7f ff 0e 10 57 : crc=57 NO\n\
///                72 01 4b 46 7f ff 0e 10 57 t=23125\n";
/// assert_eq!(parse_w1_slave(bad_crc), None);
/// ```
#[must_use]
pub fn parse_w1_slave(raw: &str) -> Option<f64> {
    let mut lines = raw.lines();
    lines.by_ref().find(|line| line.trim_end().ends_with("YES"))?;

    let data = lines.next()?;
    let (bytes, millis) = data.trim_end().rsplit_once("t=")?;
    let is_scratchpad = !bytes.trim().is_empty()
        && bytes
            .chars()
            .all(|c| c.is_ascii_hexdigit() || c.is_ascii_whitespace());
    if !is_scratchpad {
        return None;
    }

    let millis: i32 = millis.parse().ok()?;
    Some(f64::from(millis) / 1000.0)
}
