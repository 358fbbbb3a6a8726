// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! GPIO access through the Linux character device (`/dev/gpiochipN`).

use std::path::{Path, PathBuf};

use futures::StreamExt;
use gpio_cdev::{
    AsyncLineEventHandle, Chip, EventRequestFlags, EventType, LineHandle, LineRequestFlags,
};
use tokio_util::sync::CancellationToken;

use crate::error::GpioError;
use crate::event::EdgeSink;

use super::{CONSUMER, Gpio, OutputLine};

/// GPIO chip accessed through the kernel character device.
///
/// The chip is opened on first use, so a bridge without configured lines
/// never touches the device. Input watchers run as tasks until `cancel`
/// fires; lines are released when their handles drop.
#[derive(Debug)]
pub struct CdevGpio {
    path: PathBuf,
    chip: Option<Chip>,
    cancel: CancellationToken,
}

impl CdevGpio {
    /// Creates an accessor for the chip at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, cancel: CancellationToken) -> Self {
        Self {
            path: path.into(),
            chip: None,
            cancel,
        }
    }

    /// Returns the chip device path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn chip(&mut self) -> Result<&mut Chip, GpioError> {
        let chip = match self.chip.take() {
            Some(chip) => chip,
            None => {
                let chip = Chip::new(&self.path).map_err(|e| GpioError::Chip {
                    path: self.path.clone(),
                    message: e.to_string(),
                })?;
                tracing::debug!(
                    path = %self.path.display(),
                    lines = chip.num_lines(),
                    "Opened gpio chip"
                );
                chip
            }
        };
        Ok(self.chip.insert(chip))
    }
}

impl Gpio for CdevGpio {
    type Output = CdevOutput;

    fn watch_input(&mut self, pin: u32, sink: EdgeSink) -> Result<(), GpioError> {
        let open_error = |e: gpio_cdev::Error| GpioError::Open {
            pin,
            message: e.to_string(),
        };

        let line = self.chip()?.get_line(pin).map_err(open_error)?;
        let handle = line
            .events(
                LineRequestFlags::INPUT,
                EventRequestFlags::BOTH_EDGES,
                CONSUMER,
            )
            .map_err(open_error)?;
        let mut events = AsyncLineEventHandle::new(handle).map_err(open_error)?;

        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            tracing::debug!(pin, "Watching gpio input");
            loop {
                let level = tokio::select! {
                    () = cancel.cancelled() => break,
                    next = events.next() => match next {
                        Some(Ok(event)) => Ok(event.event_type() == EventType::RisingEdge),
                        Some(Err(e)) => Err(GpioError::Read {
                            pin,
                            message: e.to_string(),
                        }),
                        None => break,
                    },
                };
                if !sink.notify(level).await {
                    break;
                }
            }
            tracing::debug!(pin, "Stopped watching gpio input");
        });

        Ok(())
    }

    fn open_output(&mut self, pin: u32) -> Result<CdevOutput, GpioError> {
        let open_error = |e: gpio_cdev::Error| GpioError::Open {
            pin,
            message: e.to_string(),
        };

        let handle = self
            .chip()?
            .get_line(pin)
            .map_err(open_error)?
            .request(LineRequestFlags::OUTPUT, 0, CONSUMER)
            .map_err(open_error)?;

        tracing::debug!(pin, "Opened gpio output");
        Ok(CdevOutput { pin, handle })
    }
}

/// An output line requested from the character device.
#[derive(Debug)]
pub struct CdevOutput {
    pin: u32,
    handle: LineHandle,
}

impl OutputLine for CdevOutput {
    fn write(&mut self, high: bool) -> Result<(), GpioError> {
        self.handle
            .set_value(u8::from(high))
            .map_err(|e| GpioError::Write {
                pin: self.pin,
                message: e.to_string(),
            })
    }
}
