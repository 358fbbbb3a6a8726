// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! De-duplicating state store.

use std::collections::HashMap;

use crate::types::DeviceId;

/// A value reported by a device.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reading {
    /// Raw level of a GPIO input.
    Level(bool),
    /// Temperature in degrees Celsius.
    Temperature(f64),
}

/// Last published reading per device.
///
/// Entries are created on first sight and live for the lifetime of the
/// store. Two consecutive accepted readings for the same device are never
/// equal.
#[derive(Debug, Clone, Default)]
pub struct StateStore {
    values: HashMap<DeviceId, Reading>,
}

impl StateStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `value` for `id` if it differs from the stored reading.
    ///
    /// Returns `true` when the reading is new or changed and should be
    /// published, `false` when it repeats the stored value.
    pub fn should_publish(&mut self, id: &DeviceId, value: Reading) -> bool {
        match self.values.get_mut(id) {
            Some(current) if *current == value => false,
            Some(current) => {
                *current = value;
                true
            }
            None => {
                self.values.insert(id.clone(), value);
                true
            }
        }
    }

    /// Returns the last accepted reading for `id`.
    #[must_use]
    pub fn get(&self, id: &DeviceId) -> Option<Reading> {
        self.values.get(id).copied()
    }

    /// Returns the number of tracked devices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if no device has reported yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_reading_is_published() {
        let mut store = StateStore::new();
        assert!(store.should_publish(&DeviceId::gpio(17), Reading::Level(true)));
        assert_eq!(store.get(&DeviceId::gpio(17)), Some(Reading::Level(true)));
    }

    #[test]
    fn repeated_reading_is_suppressed() {
        let mut store = StateStore::new();
        let id = DeviceId::gpio(17);
        assert!(store.should_publish(&id, Reading::Level(false)));
        assert!(!store.should_publish(&id, Reading::Level(false)));
        assert!(store.should_publish(&id, Reading::Level(true)));
        assert!(store.should_publish(&id, Reading::Level(false)));
    }

    #[test]
    fn devices_are_tracked_independently() {
        let mut store = StateStore::new();
        assert!(store.should_publish(&DeviceId::gpio(17), Reading::Level(true)));
        assert!(store.should_publish(&DeviceId::gpio(18), Reading::Level(true)));
        assert!(store.should_publish(&DeviceId::w1("28-1"), Reading::Temperature(20.0)));
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn consecutive_accepted_values_differ() {
        let mut store = StateStore::new();
        let id = DeviceId::w1("28-000005e2fdc3");
        let samples = [20.0, 20.0, 20.5, 20.5, 20.5, 21.0, 20.5, 20.5, 19.875];

        let accepted: Vec<f64> = samples
            .iter()
            .copied()
            .filter(|&t| store.should_publish(&id, Reading::Temperature(t)))
            .collect();

        assert_eq!(accepted, vec![20.0, 20.5, 21.0, 20.5, 19.875]);
        assert!(accepted.windows(2).all(|w| w[0] != w[1]));
    }

    #[test]
    fn empty_store() {
        let store = StateStore::new();
        assert!(store.is_empty());
        assert_eq!(store.get(&DeviceId::gpio(1)), None);
    }
}
