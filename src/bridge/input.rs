// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! GPIO inputs to status topics.

use crate::error::GpioError;
use crate::event::{EdgeSink, EventSender};
use crate::gpio::{Gpio, OutputLine};
use crate::payload::encode_input_state;
use crate::protocol::Publisher;
use crate::state::Reading;
use crate::types::DeviceId;

use super::Bridge;

/// Starts watching every input line, feeding edges into `events`.
///
/// # Errors
///
/// Returns error on the first line that cannot be requested.
pub fn watch_inputs<G: Gpio>(
    gpio: &mut G,
    pins: &[u32],
    events: &EventSender,
) -> Result<(), GpioError> {
    for &pin in pins {
        gpio.watch_input(pin, EdgeSink::new(pin, events.clone()))?;
        tracing::debug!(pin, "Input configured");
    }
    Ok(())
}

impl<P: Publisher, O: OutputLine> Bridge<P, O> {
    pub(super) async fn handle_edge(&mut self, pin: u32, level: Result<bool, GpioError>) {
        let raw = match level {
            Ok(raw) => raw,
            Err(e) => {
                tracing::debug!(pin, error = %e, "Dropping gpio notification");
                return;
            }
        };

        let id = DeviceId::gpio(pin);
        if self.state.should_publish(&id, Reading::Level(raw)) {
            let payload = encode_input_state(raw, self.mode);
            self.publish_status(&id, payload).await;
        }
    }
}
