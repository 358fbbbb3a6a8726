// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Identifier types shared across the bridge.
//!
//! # Types
//!
//! - [`DeviceId`] - Canonical `gpio/<pin>` or `w1/<sensor-id>` identifier
//! - [`SensorFamily`] - 1-Wire temperature sensor family code

mod device_id;
mod sensor_family;

pub use device_id::DeviceId;
pub use sensor_family::SensorFamily;
