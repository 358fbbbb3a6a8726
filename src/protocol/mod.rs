// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Broker connectivity.
//!
//! The bridge publishes state and subscribes to command topics through the
//! [`Publisher`] trait. [`MqttConnection`] implements it on top of
//! `rumqttc` and forwards inbound publishes into the bridge event channel.

mod mqtt;

pub use mqtt::{BrokerAddress, MqttConnection, MqttConnectionBuilder, parse_mqtt_url};

use crate::error::ProtocolError;
use crate::payload::Payload;

/// Trait for broker clients the bridge can publish through.
#[allow(async_fn_in_trait)]
pub trait Publisher {
    /// Publishes a payload on a topic.
    ///
    /// Must not wait for the broker; the bridge calls it from its dispatch
    /// loop.
    ///
    /// # Arguments
    ///
    /// * `topic` - The full topic name
    /// * `payload` - The encoded payload
    /// * `retain` - Whether the broker should retain the message
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the message cannot be queued.
    async fn publish(&self, topic: &str, payload: Payload, retain: bool)
    -> Result<(), ProtocolError>;

    /// Subscribes to a topic.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the subscription cannot be queued.
    async fn subscribe(&self, topic: &str) -> Result<(), ProtocolError>;
}
