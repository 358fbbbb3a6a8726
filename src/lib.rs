// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `pi2mqtt` - A bridge between Raspberry Pi GPIO / 1-Wire sensors and MQTT.
//!
//! External systems read inputs and sensors and drive outputs through
//! broker topics instead of touching the hardware directly.
//!
//! # Topics
//!
//! - **Status**: `<status-topic><id>`, published on every change of a GPIO
//!   input or 1-Wire temperature sensor
//! - **Set**: `<set-topic>gpio/<pin>`, subscribed for every output line
//! - **Testament**: `<testament-topic>`, `true` while connected, `false`
//!   as last will
//!
//! `<id>` is `gpio/<pin>` or `w1/<sensor-id>`, optionally replaced by an
//! [alias](AliasTable).
//!
//! # Quick Start
//!
//! ```no_run
//! use pi2mqtt::bridge::{Bridge, OutputDispatcher, watch_inputs};
//! use pi2mqtt::gpio::CdevGpio;
//! use pi2mqtt::protocol::MqttConnection;
//! use pi2mqtt::{Config, event};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> pi2mqtt::Result<()> {
//!     let config = Config {
//!         input: vec![17],
//!         output: vec![23],
//!         ..Config::default()
//!     }
//!     .resolved()?;
//!     let aliases = config.alias_table()?;
//!
//!     let cancel = CancellationToken::new();
//!     let (tx, rx) = event::channel();
//!
//!     let mut gpio = CdevGpio::new(&config.gpio_chip, cancel.clone());
//!     watch_inputs(&mut gpio, &config.input, &tx)?;
//!     let outputs = OutputDispatcher::open(&mut gpio, &config.set_topic, &config.output)?;
//!
//!     let connection = MqttConnection::builder().url(&config.url).build(tx)?;
//!     let bridge = Bridge::new(&config, connection, aliases, outputs);
//!     bridge.subscribe_commands().await?;
//!     bridge.run(rx, cancel).await;
//!     Ok(())
//! }
//! ```

mod alias;
pub mod bridge;
pub mod config;
pub mod error;
pub mod event;
pub mod gpio;
pub mod payload;
pub mod protocol;
pub mod state;
pub mod types;
pub mod w1;

pub use alias::AliasTable;
pub use bridge::{Bridge, OutputDispatcher};
pub use config::Config;
pub use error::{ConfigError, DiscoveryError, Error, GpioError, ProtocolError, Result};
pub use payload::{Payload, PayloadMode};
pub use protocol::{MqttConnection, Publisher};
pub use types::{DeviceId, SensorFamily};
