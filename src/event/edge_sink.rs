// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-line handle for forwarding edge notifications.

use crate::error::GpioError;

use super::{BridgeEvent, EventSender};

/// Forwards the edge notifications of one input line to the bridge.
///
/// GPIO backends receive one sink per watched line and call
/// [`notify`](Self::notify) for every hardware notification, in order.
#[derive(Debug, Clone)]
pub struct EdgeSink {
    pin: u32,
    tx: EventSender,
}

impl EdgeSink {
    /// Creates a sink for `pin` feeding the given event channel.
    #[must_use]
    pub fn new(pin: u32, tx: EventSender) -> Self {
        Self { pin, tx }
    }

    /// Returns the line this sink reports for.
    #[must_use]
    pub fn pin(&self) -> u32 {
        self.pin
    }

    /// Reports a new raw level or a read failure.
    ///
    /// Returns `false` once the bridge has stopped listening.
    pub async fn notify(&self, level: Result<bool, GpioError>) -> bool {
        self.tx
            .send(BridgeEvent::Edge {
                pin: self.pin,
                level,
            })
            .await
            .is_ok()
    }

    /// Returns `true` if the bridge has stopped listening.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event;

    #[tokio::test]
    async fn notify_delivers_in_order() {
        let (tx, mut rx) = event::channel();
        let sink = EdgeSink::new(4, tx);

        assert!(sink.notify(Ok(true)).await);
        assert!(sink.notify(Ok(false)).await);

        for expected in [true, false] {
            match rx.recv().await {
                Some(BridgeEvent::Edge { pin, level }) => {
                    assert_eq!(pin, 4);
                    assert_eq!(level.unwrap(), expected);
                }
                other => panic!("unexpected event {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn notify_after_close_returns_false() {
        let (tx, rx) = event::channel();
        let sink = EdgeSink::new(4, tx);
        drop(rx);

        assert!(sink.is_closed());
        assert!(!sink.notify(Ok(true)).await);
    }
}
