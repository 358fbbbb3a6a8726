// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Last-known device state.
//!
//! The [`StateStore`] remembers the last published [`Reading`] of every
//! device and is the only gate deciding whether a new reading is worth
//! publishing.
//!
//! # Examples
//!
//! ```
//! use pi2mqtt::state::{Reading, StateStore};
//! use pi2mqtt::types::DeviceId;
//!
//! let mut state = StateStore::new();
//! let id = DeviceId::w1("28-0000002981762");
//!
//! assert!(state.should_publish(&id, Reading::Temperature(21.5)));
//! assert!(!state.should_publish(&id, Reading::Temperature(21.5)));
//! assert!(state.should_publish(&id, Reading::Temperature(21.562)));
//! ```

mod store;

pub use store::{Reading, StateStore};
