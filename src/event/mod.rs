// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Events feeding the bridge dispatch loop.
//!
//! GPIO edge notifications, 1-Wire poll results and inbound MQTT messages
//! are independent sources. Each of them is turned into a [`BridgeEvent`]
//! and sent over one bounded channel, so the dispatch loop handles them
//! sequentially while each source keeps its own ordering.
//!
//! # Examples
//!
//! ```
//! use pi2mqtt::event::{self, BridgeEvent, EdgeSink};
//!
//! # async fn example() {
//! let (tx, mut rx) = event::channel();
//! let sink = EdgeSink::new(17, tx);
//!
//! sink.notify(Ok(false)).await;
//!
//! if let Some(BridgeEvent::Edge { pin, level }) = rx.recv().await {
//!     assert_eq!(pin, 17);
//!     assert!(matches!(level, Ok(false)));
//! }
//! # }
//! ```

mod bridge_event;
mod edge_sink;

pub use bridge_event::{BridgeEvent, InboundMessage};
pub use edge_sink::EdgeSink;

use tokio::sync::mpsc;

/// Default capacity of the event channel.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Sending half of the event channel.
pub type EventSender = mpsc::Sender<BridgeEvent>;

/// Receiving half of the event channel.
pub type EventReceiver = mpsc::Receiver<BridgeEvent>;

/// Creates the event channel with the default capacity.
#[must_use]
pub fn channel() -> (EventSender, EventReceiver) {
    mpsc::channel(DEFAULT_CHANNEL_CAPACITY)
}
