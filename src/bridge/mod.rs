// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The bridge dispatch loop.
//!
//! [`Bridge`] owns the alias table, the state store and the output lines.
//! It consumes [`BridgeEvent`]s one at a time:
//!
//! - GPIO edges are encoded, de-duplicated and published as status
//! - 1-Wire samples are encoded, de-duplicated and published as status
//! - inbound messages on set topics drive output lines
//!
//! # Examples
//!
//! ```no_run
//! use pi2mqtt::bridge::{Bridge, OutputDispatcher};
//! use pi2mqtt::gpio::CdevGpio;
//! use pi2mqtt::protocol::MqttConnection;
//! use pi2mqtt::{Config, event};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> pi2mqtt::Result<()> {
//! let config = Config::default().resolved()?;
//! let cancel = CancellationToken::new();
//! let (tx, rx) = event::channel();
//!
//! let mut gpio = CdevGpio::new(&config.gpio_chip, cancel.clone());
//! let outputs = OutputDispatcher::open(&mut gpio, &config.set_topic, &config.output)?;
//! let connection = MqttConnection::builder().url(&config.url).build(tx)?;
//!
//! let bridge = Bridge::new(&config, connection, config.alias_table()?, outputs);
//! bridge.subscribe_commands().await?;
//! bridge.run(rx, cancel).await;
//! # Ok(())
//! # }
//! ```

mod input;
mod output;

pub use input::watch_inputs;
pub use output::OutputDispatcher;

use tokio_util::sync::CancellationToken;

use crate::alias::AliasTable;
use crate::config::Config;
use crate::error::ProtocolError;
use crate::event::{BridgeEvent, EventReceiver};
use crate::gpio::OutputLine;
use crate::payload::{Payload, PayloadMode, encode_sensor_reading};
use crate::protocol::Publisher;
use crate::state::{Reading, StateStore};
use crate::types::DeviceId;
use crate::w1::SensorSample;

/// Translates hardware events into broker messages and back.
#[derive(Debug)]
pub struct Bridge<P, O> {
    publisher: P,
    aliases: AliasTable,
    state: StateStore,
    mode: PayloadMode,
    retain: bool,
    status_prefix: String,
    outputs: OutputDispatcher<O>,
}

impl<P: Publisher, O: OutputLine> Bridge<P, O> {
    /// Creates a bridge for a resolved configuration.
    #[must_use]
    pub fn new(
        config: &Config,
        publisher: P,
        aliases: AliasTable,
        outputs: OutputDispatcher<O>,
    ) -> Self {
        Self {
            publisher,
            aliases,
            state: StateStore::new(),
            mode: config.payload,
            retain: config.retain,
            status_prefix: config.status_topic.clone(),
            outputs,
        }
    }

    /// Returns the publisher.
    #[must_use]
    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    /// Returns the last published readings.
    #[must_use]
    pub fn state(&self) -> &StateStore {
        &self.state
    }

    /// Subscribes to the set topic of every output line.
    ///
    /// # Errors
    ///
    /// Returns error if a subscription cannot be queued.
    pub async fn subscribe_commands(&self) -> Result<(), ProtocolError> {
        for topic in self.outputs.command_topics(&self.aliases) {
            tracing::debug!(topic = %topic, "Subscribing to set topic");
            self.publisher.subscribe(&topic).await?;
        }
        Ok(())
    }

    /// Processes events until `cancel` fires or every source is gone.
    pub async fn run(mut self, mut events: EventReceiver, cancel: CancellationToken) {
        loop {
            let event = tokio::select! {
                () = cancel.cancelled() => break,
                event = events.recv() => match event {
                    Some(event) => event,
                    None => break,
                },
            };
            self.handle(event).await;
        }
        tracing::debug!("Bridge stopped");
    }

    /// Processes a single event.
    pub async fn handle(&mut self, event: BridgeEvent) {
        match event {
            BridgeEvent::Edge { pin, level } => self.handle_edge(pin, level).await,
            BridgeEvent::SensorCycle(samples) => self.handle_sensor_cycle(samples).await,
            BridgeEvent::Message(message) => {
                self.outputs.dispatch(&message, &self.aliases);
            }
        }
    }

    async fn handle_sensor_cycle(&mut self, samples: Vec<SensorSample>) {
        for SensorSample { sensor, value } in samples {
            let Some(value) = value else {
                continue;
            };
            let id = DeviceId::w1(sensor);
            if self.state.should_publish(&id, Reading::Temperature(value)) {
                let payload = encode_sensor_reading(value, self.mode);
                self.publish_status(&id, payload).await;
            }
        }
    }

    /// Publishes on `<status-prefix><alias>`; failures are logged.
    async fn publish_status(&self, id: &DeviceId, payload: Payload) {
        let canonical = id.to_string();
        let topic = format!(
            "{}{}",
            self.status_prefix,
            self.aliases.resolve(&canonical)
        );
        if let Err(e) = self.publisher.publish(&topic, payload, self.retain).await {
            tracing::warn!(topic = %topic, error = %e, "Failed to publish status");
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory doubles for the bridge seams.

    use std::collections::BTreeMap;
    use std::sync::Arc;

    use parking_lot::Mutex;

    use crate::error::{GpioError, ProtocolError};
    use crate::event::EdgeSink;
    use crate::gpio::{Gpio, OutputLine};
    use crate::payload::Payload;
    use crate::protocol::Publisher;

    /// Records publications and subscriptions.
    #[derive(Debug, Clone, Default)]
    pub struct RecordingPublisher {
        pub published: Arc<Mutex<Vec<(String, String, bool)>>>,
        pub subscribed: Arc<Mutex<Vec<String>>>,
    }

    impl RecordingPublisher {
        pub fn published(&self) -> Vec<(String, String, bool)> {
            self.published.lock().clone()
        }

        pub fn subscribed(&self) -> Vec<String> {
            self.subscribed.lock().clone()
        }
    }

    impl Publisher for RecordingPublisher {
        async fn publish(
            &self,
            topic: &str,
            payload: Payload,
            retain: bool,
        ) -> Result<(), ProtocolError> {
            self.published
                .lock()
                .push((topic.to_string(), payload.to_string(), retain));
            Ok(())
        }

        async fn subscribe(&self, topic: &str) -> Result<(), ProtocolError> {
            self.subscribed.lock().push(topic.to_string());
            Ok(())
        }
    }

    /// Output line recording every write into a shared log.
    #[derive(Debug)]
    pub struct MemoryLine {
        pin: u32,
        writes: Arc<Mutex<Vec<(u32, bool)>>>,
        fail: bool,
    }

    impl OutputLine for MemoryLine {
        fn write(&mut self, high: bool) -> Result<(), GpioError> {
            if self.fail {
                return Err(GpioError::Write {
                    pin: self.pin,
                    message: "line busy".to_string(),
                });
            }
            self.writes.lock().push((self.pin, high));
            Ok(())
        }
    }

    /// GPIO chip double keeping input sinks and output writes.
    #[derive(Debug, Default)]
    pub struct MemoryGpio {
        pub sinks: BTreeMap<u32, EdgeSink>,
        pub writes: Arc<Mutex<Vec<(u32, bool)>>>,
        pub failing_outputs: Vec<u32>,
        pub missing: Vec<u32>,
    }

    impl MemoryGpio {
        pub fn writes(&self) -> Vec<(u32, bool)> {
            self.writes.lock().clone()
        }
    }

    impl Gpio for MemoryGpio {
        type Output = MemoryLine;

        fn watch_input(&mut self, pin: u32, sink: EdgeSink) -> Result<(), GpioError> {
            if self.missing.contains(&pin) {
                return Err(GpioError::Open {
                    pin,
                    message: "no such line".to_string(),
                });
            }
            self.sinks.insert(pin, sink);
            Ok(())
        }

        fn open_output(&mut self, pin: u32) -> Result<MemoryLine, GpioError> {
            if self.missing.contains(&pin) {
                return Err(GpioError::Open {
                    pin,
                    message: "no such line".to_string(),
                });
            }
            Ok(MemoryLine {
                pin,
                writes: Arc::clone(&self.writes),
                fail: self.failing_outputs.contains(&pin),
            })
        }
    }
}
