// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Periodic 1-Wire polling.
//!
//! The poller goes through three phases:
//!
//! ```text
//! BootDelay ──(w1_wait elapsed)──▶ Discovery ──(sensors listed)──▶ Polling ⟲
//!                                      │
//!                                      └──(unreadable / empty)──▶ fatal error
//! ```
//!
//! Every polling cycle is sent to the bridge as one
//! [`BridgeEvent::SensorCycle`]; de-duplication and publishing happen there.

use std::time::Duration;

use futures::StreamExt;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::error::DiscoveryError;
use crate::event::{BridgeEvent, EventSender};

use super::{SensorBus, SensorSample, SensorSet, parse_w1_slave};

/// Intervals longer than this trigger one poll right after discovery.
pub const IMMEDIATE_POLL_THRESHOLD: Duration = Duration::from_secs(5);

/// Maximum number of `w1_slave` files read at the same time.
pub const MAX_CONCURRENT_READS: usize = 4;

/// Discovers 1-Wire sensors and polls them at a fixed interval.
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
///
/// use pi2mqtt::event;
/// use pi2mqtt::w1::{SysfsBus, W1Poller};
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), pi2mqtt::error::DiscoveryError> {
/// let (tx, _rx) = event::channel();
/// let poller = W1Poller::new(SysfsBus::default(), tx, CancellationToken::new())
///     .wait(Duration::from_secs(30))
///     .interval(Duration::from_secs(60));
///
/// poller.run().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct W1Poller<B> {
    bus: B,
    wait: Duration,
    interval: Duration,
    events: EventSender,
    cancel: CancellationToken,
}

impl<B: SensorBus> W1Poller<B> {
    /// Creates a poller with a 30 second boot delay and interval.
    #[must_use]
    pub fn new(bus: B, events: EventSender, cancel: CancellationToken) -> Self {
        Self {
            bus,
            wait: Duration::from_secs(30),
            interval: Duration::from_secs(30),
            events,
            cancel,
        }
    }

    /// Sets the delay before the bus is scanned.
    #[must_use]
    pub fn wait(mut self, wait: Duration) -> Self {
        self.wait = wait;
        self
    }

    /// Sets the polling interval.
    #[must_use]
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Runs the poller until cancelled or the bridge stops listening.
    ///
    /// # Errors
    ///
    /// Returns error if discovery fails; the bridge has nothing to poll
    /// in that case.
    pub async fn run(self) -> Result<(), DiscoveryError> {
        tracing::info!(
            wait_secs = self.wait.as_secs(),
            path = %self.bus.path().display(),
            "Waiting before reading 1-Wire devices"
        );
        tokio::select! {
            () = self.cancel.cancelled() => return Ok(()),
            () = tokio::time::sleep(self.wait) => {}
        }

        let sensors = self.discover().await?;
        tracing::info!(
            count = sensors.len(),
            interval_secs = self.interval.as_secs(),
            "Found 1-Wire temperature sensors"
        );

        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        if self.interval > IMMEDIATE_POLL_THRESHOLD && !self.poll_cycle(&sensors).await {
            return Ok(());
        }

        loop {
            tokio::select! {
                () = self.cancel.cancelled() => break,
                _ = ticker.tick() => {
                    if !self.poll_cycle(&sensors).await {
                        break;
                    }
                }
            }
        }

        tracing::debug!("1-Wire poller stopped");
        Ok(())
    }

    /// Lists the bus once and classifies the temperature sensors.
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be read or is empty.
    pub async fn discover(&self) -> Result<SensorSet, DiscoveryError> {
        let entries = self
            .bus
            .list()
            .await
            .map_err(|source| DiscoveryError::Unreadable {
                path: self.bus.path().to_path_buf(),
                source,
            })?;

        if entries.is_empty() {
            return Err(DiscoveryError::Empty {
                path: self.bus.path().to_path_buf(),
            });
        }

        let sensors = SensorSet::from_entries(entries);
        if sensors.is_empty() {
            tracing::warn!(
                path = %self.bus.path().display(),
                "No supported temperature sensor on the 1-Wire bus"
            );
        }
        Ok(sensors)
    }

    /// Reads every sensor once, keeping the discovery order.
    pub async fn poll(&self, sensors: &SensorSet) -> Vec<SensorSample> {
        futures::stream::iter(sensors.iter())
            .map(|sensor| self.read_sensor(sensor))
            .buffered(MAX_CONCURRENT_READS)
            .collect()
            .await
    }

    async fn read_sensor(&self, sensor: &str) -> SensorSample {
        let value = match self.bus.read(sensor).await {
            Ok(raw) => {
                let value = parse_w1_slave(&raw);
                if value.is_none() {
                    tracing::warn!(sensor = %sensor, raw = %raw.trim_end(), "Unparseable 1-Wire record");
                }
                value
            }
            Err(e) => {
                tracing::warn!(sensor = %sensor, error = %e, "Error reading 1-Wire sensor");
                None
            }
        };

        SensorSample {
            sensor: sensor.to_string(),
            value,
        }
    }

    /// Polls once and hands the cycle to the bridge.
    ///
    /// Returns `false` when the poller should stop.
    async fn poll_cycle(&self, sensors: &SensorSet) -> bool {
        if sensors.is_empty() {
            return !self.events.is_closed();
        }

        let samples = tokio::select! {
            () = self.cancel.cancelled() => return false,
            samples = self.poll(sensors) => samples,
        };
        self.events
            .send(BridgeEvent::SensorCycle(samples))
            .await
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io;
    use std::path::{Path, PathBuf};

    use super::*;
    use crate::event::{self, EventReceiver};

    fn record(millis: i32) -> String {
        format!("72 01 4b 46 7f ff 0e 10 57 : crc=57 YES\n72 01 4b 46 7f ff 0e 10 57 t={millis}\n")
    }

    #[derive(Debug, Default)]
    struct MemoryBus {
        path: PathBuf,
        entries: Option<Vec<String>>,
        records: HashMap<String, String>,
    }

    impl MemoryBus {
        fn with_sensors(sensors: &[(&str, String)]) -> Self {
            let mut entries = vec!["w1_bus_master1".to_string()];
            let mut records = HashMap::new();
            for (name, raw) in sensors {
                entries.push((*name).to_string());
                records.insert((*name).to_string(), raw.clone());
            }
            Self {
                path: PathBuf::from("/sys/bus/w1/devices/"),
                entries: Some(entries),
                records,
            }
        }
    }

    impl SensorBus for MemoryBus {
        fn path(&self) -> &Path {
            &self.path
        }

        async fn list(&self) -> io::Result<Vec<String>> {
            self.entries
                .clone()
                .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))
        }

        async fn read(&self, sensor: &str) -> io::Result<String> {
            self.records
                .get(sensor)
                .cloned()
                .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))
        }
    }

    fn poller(bus: MemoryBus) -> (W1Poller<MemoryBus>, EventReceiver, CancellationToken) {
        let (tx, rx) = event::channel();
        let cancel = CancellationToken::new();
        (W1Poller::new(bus, tx, cancel.clone()), rx, cancel)
    }

    async fn next_cycle(rx: &mut EventReceiver) -> Vec<SensorSample> {
        match rx.recv().await {
            Some(BridgeEvent::SensorCycle(samples)) => samples,
            other => panic!("expected a sensor cycle, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn discover_missing_directory_is_fatal() {
        let (poller, _rx, _cancel) = poller(MemoryBus::default());
        let err = poller.discover().await.unwrap_err();
        assert!(matches!(err, DiscoveryError::Unreadable { .. }));
    }

    #[tokio::test]
    async fn discover_empty_directory_is_fatal() {
        let bus = MemoryBus {
            entries: Some(Vec::new()),
            ..MemoryBus::default()
        };
        let (poller, _rx, _cancel) = poller(bus);
        let err = poller.discover().await.unwrap_err();
        assert!(matches!(err, DiscoveryError::Empty { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn run_fails_before_polling_when_directory_is_empty() {
        let bus = MemoryBus {
            entries: Some(Vec::new()),
            ..MemoryBus::default()
        };
        let (poller, mut rx, _cancel) = poller(bus);
        let poller = poller.wait(Duration::from_secs(1));

        assert!(poller.run().await.is_err());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn poll_tolerates_unreadable_sensors() {
        let bus = MemoryBus::with_sensors(&[
            ("28-000005e2fdc3", record(21_500)),
            ("28-0000002981762", "garbage".to_string()),
            ("10-000802b5d7a2", record(-1_250)),
        ]);
        let (poller, _rx, _cancel) = poller(bus);
        let sensors = poller.discover().await.unwrap();
        let mut sensors_with_missing = sensors.iter().map(str::to_string).collect::<Vec<_>>();
        sensors_with_missing.push("28-ffffffffffff".to_string());
        let sensors_with_missing = SensorSet::from_entries(sensors_with_missing);

        let samples = poller.poll(&sensors_with_missing).await;

        assert_eq!(
            samples,
            vec![
                SensorSample {
                    sensor: "28-0000002981762".to_string(),
                    value: None
                },
                SensorSample {
                    sensor: "28-000005e2fdc3".to_string(),
                    value: Some(21.5)
                },
                SensorSample {
                    sensor: "28-ffffffffffff".to_string(),
                    value: None
                },
                SensorSample {
                    sensor: "10-000802b5d7a2".to_string(),
                    value: Some(-1.25)
                },
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn long_interval_polls_immediately_after_discovery() {
        let bus = MemoryBus::with_sensors(&[("28-000005e2fdc3", record(20_000))]);
        let (poller, mut rx, cancel) = poller(bus);
        let poller = poller
            .wait(Duration::from_secs(30))
            .interval(Duration::from_secs(60));

        let start = Instant::now();
        let (result, ()) = tokio::join!(poller.run(), async {
            let samples = next_cycle(&mut rx).await;
            assert_eq!(samples[0].value, Some(20.0));
            assert_eq!(start.elapsed().as_secs(), 30);

            next_cycle(&mut rx).await;
            assert_eq!(start.elapsed().as_secs(), 90);

            cancel.cancel();
        });
        assert!(result.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn short_interval_waits_for_first_tick() {
        let bus = MemoryBus::with_sensors(&[("28-000005e2fdc3", record(20_000))]);
        let (poller, mut rx, cancel) = poller(bus);
        let poller = poller
            .wait(Duration::from_secs(30))
            .interval(Duration::from_secs(5));

        let start = Instant::now();
        let (result, ()) = tokio::join!(poller.run(), async {
            next_cycle(&mut rx).await;
            assert_eq!(start.elapsed().as_secs(), 35);

            next_cycle(&mut rx).await;
            assert_eq!(start.elapsed().as_secs(), 40);

            cancel.cancel();
        });
        assert!(result.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_during_boot_delay_stops_without_discovery() {
        let (poller, mut rx, cancel) = poller(MemoryBus::default());
        cancel.cancel();

        assert!(poller.run().await.is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn stops_when_bridge_goes_away() {
        let bus = MemoryBus::with_sensors(&[("28-000005e2fdc3", record(20_000))]);
        let (poller, rx, _cancel) = poller(bus);
        drop(rx);

        let result = poller
            .wait(Duration::from_secs(1))
            .interval(Duration::from_secs(10))
            .run()
            .await;
        assert!(result.is_ok());
    }
}
