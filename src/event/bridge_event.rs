// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bridge event types.

use crate::error::GpioError;
use crate::w1::SensorSample;

/// A message received from the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Full topic the message was published on.
    pub topic: String,
    /// Raw payload bytes.
    pub payload: Vec<u8>,
}

impl InboundMessage {
    /// Creates a new inbound message.
    #[must_use]
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }
}

/// Input to the bridge dispatch loop.
#[derive(Debug)]
pub enum BridgeEvent {
    /// A GPIO input changed level, or its notification failed.
    Edge {
        /// The input line.
        pin: u32,
        /// The new raw level, or the read error.
        level: Result<bool, GpioError>,
    },

    /// One completed 1-Wire polling cycle.
    SensorCycle(Vec<SensorSample>),

    /// A message arrived on a subscribed topic.
    Message(InboundMessage),
}

impl From<InboundMessage> for BridgeEvent {
    fn from(message: InboundMessage) -> Self {
        Self::Message(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inbound_message_new() {
        let msg = InboundMessage::new("home/set/gpio/23", "1");
        assert_eq!(msg.topic, "home/set/gpio/23");
        assert_eq!(msg.payload, b"1".to_vec());
    }

    #[test]
    fn message_into_event() {
        let event: BridgeEvent = InboundMessage::new("t", "p").into();
        assert!(matches!(event, BridgeEvent::Message(m) if m.topic == "t"));
    }
}
