// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Set topics to GPIO outputs.

use std::collections::BTreeMap;

use crate::alias::AliasTable;
use crate::error::GpioError;
use crate::event::InboundMessage;
use crate::gpio::{Gpio, OutputLine};
use crate::payload::decode_command;
use crate::types::DeviceId;

/// The output lines driven from set topics.
#[derive(Debug)]
pub struct OutputDispatcher<O> {
    set_prefix: String,
    lines: BTreeMap<u32, O>,
}

impl<O: OutputLine> OutputDispatcher<O> {
    /// Requests every output line from `gpio`.
    ///
    /// # Errors
    ///
    /// Returns error on the first line that cannot be requested.
    pub fn open<G>(
        gpio: &mut G,
        set_prefix: impl Into<String>,
        pins: &[u32],
    ) -> Result<Self, GpioError>
    where
        G: Gpio<Output = O>,
    {
        let mut lines = BTreeMap::new();
        for &pin in pins {
            lines.insert(pin, gpio.open_output(pin)?);
            tracing::debug!(pin, "Output configured");
        }
        Ok(Self {
            set_prefix: set_prefix.into(),
            lines,
        })
    }

    /// Returns the configured output pins in ascending order.
    pub fn pins(&self) -> impl Iterator<Item = u32> + '_ {
        self.lines.keys().copied()
    }

    /// Returns the topics to subscribe to, one per output line.
    #[must_use]
    pub fn command_topics(&self, aliases: &AliasTable) -> Vec<String> {
        self.pins()
            .map(|pin| {
                let canonical = DeviceId::gpio(pin).to_string();
                format!("{}{}", self.set_prefix, aliases.resolve(&canonical))
            })
            .collect()
    }

    /// Maps a set topic back to a configured output pin.
    ///
    /// The set prefix is stripped and the remainder resolved through the
    /// alias table; it must then read `gpio/<pin>` for a configured pin.
    #[must_use]
    pub fn target_pin(&self, topic: &str, aliases: &AliasTable) -> Option<u32> {
        let name = topic.strip_prefix(self.set_prefix.as_str())?;
        let pin = DeviceId::parse(aliases.resolve(name))?.as_gpio()?;
        self.lines.contains_key(&pin).then_some(pin)
    }

    /// Drives the output addressed by `message`.
    ///
    /// Returns the pin and level written, or `None` if the message was
    /// ignored or the write failed.
    pub fn dispatch(
        &mut self,
        message: &InboundMessage,
        aliases: &AliasTable,
    ) -> Option<(u32, bool)> {
        let Some(pin) = self.target_pin(&message.topic, aliases) else {
            tracing::trace!(topic = %message.topic, "Ignoring message for unknown output");
            return None;
        };

        let high = decode_command(&message.payload);
        tracing::debug!(
            topic = %message.topic,
            payload = %String::from_utf8_lossy(&message.payload),
            pin,
            high,
            "Setting output"
        );

        let line = self.lines.get_mut(&pin)?;
        match line.write(high) {
            Ok(()) => Some((pin, high)),
            Err(e) => {
                tracing::warn!(pin, error = %e, "Failed to write output");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::testing::{MemoryGpio, MemoryLine};

    fn dispatcher(gpio: &mut MemoryGpio, prefix: &str) -> OutputDispatcher<MemoryLine> {
        OutputDispatcher::open(gpio, prefix, &[23, 24]).unwrap()
    }

    fn message(topic: &str, payload: &[u8]) -> InboundMessage {
        InboundMessage::new(topic, payload.to_vec())
    }

    #[test]
    fn target_pin_strips_prefix_and_alias() {
        let mut gpio = MemoryGpio::default();
        let outputs = dispatcher(&mut gpio, "home/set/");
        let aliases = AliasTable::from_specs(["gpio/24:Garden/Pump"]).unwrap();

        assert_eq!(outputs.target_pin("home/set/gpio/23", &aliases), Some(23));
        assert_eq!(outputs.target_pin("home/set/Garden/Pump", &aliases), Some(24));
        assert_eq!(outputs.target_pin("home/set/gpio/25", &aliases), None);
        assert_eq!(outputs.target_pin("other/gpio/23", &aliases), None);
        assert_eq!(outputs.target_pin("home/set/gpio/23/x", &aliases), None);
        assert_eq!(outputs.target_pin("home/set/gpio/x23", &aliases), None);
    }

    #[test]
    fn empty_prefix_matches_bare_topic() {
        let mut gpio = MemoryGpio::default();
        let outputs = dispatcher(&mut gpio, "");

        assert_eq!(outputs.target_pin("gpio/23", &AliasTable::new()), Some(23));
    }

    #[test]
    fn command_topics_are_aliased() {
        let mut gpio = MemoryGpio::default();
        let outputs = dispatcher(&mut gpio, "pi/set/");
        let aliases = AliasTable::from_specs(["gpio/23:Light/Garden"]).unwrap();

        assert_eq!(
            outputs.command_topics(&aliases),
            ["pi/set/Light/Garden", "pi/set/gpio/24"]
        );
    }

    #[test]
    fn dispatch_decodes_payloads() {
        let mut gpio = MemoryGpio::default();
        let mut outputs = dispatcher(&mut gpio, "home/set/");
        let aliases = AliasTable::new();

        let cases: [(&[u8], bool); 6] = [
            (br#"{"val":true}"#, true),
            (br#"{"val":0}"#, false),
            (b"true", true),
            (b"1", true),
            (b"0", false),
            (b"on", false),
        ];
        for (payload, expected) in cases {
            assert_eq!(
                outputs.dispatch(&message("home/set/gpio/23", payload), &aliases),
                Some((23, expected))
            );
        }
        assert_eq!(gpio.writes().len(), cases.len());
    }

    #[test]
    fn dispatch_ignores_unconfigured_pins() {
        let mut gpio = MemoryGpio::default();
        let mut outputs = dispatcher(&mut gpio, "home/set/");

        let written = outputs.dispatch(&message("home/set/gpio/4", b"1"), &AliasTable::new());

        assert_eq!(written, None);
        assert!(gpio.writes().is_empty());
    }

    #[test]
    fn dispatch_survives_write_failure() {
        let mut gpio = MemoryGpio {
            failing_outputs: vec![24],
            ..MemoryGpio::default()
        };
        let mut outputs = dispatcher(&mut gpio, "home/set/");
        let aliases = AliasTable::new();

        assert_eq!(outputs.dispatch(&message("home/set/gpio/24", b"1"), &aliases), None);
        assert_eq!(
            outputs.dispatch(&message("home/set/gpio/23", b"1"), &aliases),
            Some((23, true))
        );
        assert_eq!(gpio.writes(), [(23, true)]);
    }

    #[test]
    fn open_fails_on_missing_line() {
        let mut gpio = MemoryGpio {
            missing: vec![24],
            ..MemoryGpio::default()
        };

        let err = OutputDispatcher::open(&mut gpio, "", &[23, 24]).unwrap_err();
        assert!(matches!(err, GpioError::Open { pin: 24, .. }));
    }
}
