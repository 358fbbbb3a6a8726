// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! GPIO line access.
//!
//! The bridge only needs two capabilities from the hardware: being told
//! about level changes on input lines and driving output lines. Both are
//! expressed by the [`Gpio`] trait so the bridge can be exercised without
//! hardware.
//!
//! - [`CdevGpio`]: Linux GPIO character device (feature `cdev`)

#[cfg(feature = "cdev")]
mod cdev;

#[cfg(feature = "cdev")]
pub use cdev::{CdevGpio, CdevOutput};

use crate::error::GpioError;
use crate::event::EdgeSink;

/// Label under which lines are requested from the kernel.
pub const CONSUMER: &str = "pi2mqtt";

/// An output line held open for writing.
pub trait OutputLine {
    /// Drives the line high (`true`) or low (`false`).
    ///
    /// # Errors
    ///
    /// Returns error if the hardware rejects the write.
    fn write(&mut self, high: bool) -> Result<(), GpioError>;
}

/// Access to the GPIO lines of a chip.
pub trait Gpio {
    /// Handle type of an opened output line.
    type Output: OutputLine;

    /// Starts watching both edges of an input line.
    ///
    /// Every level change (or notification failure) is reported through
    /// `sink`, in hardware order, until the sink is closed.
    ///
    /// # Errors
    ///
    /// Returns error if the line cannot be requested as an input.
    fn watch_input(&mut self, pin: u32, sink: EdgeSink) -> Result<(), GpioError>;

    /// Requests a line as an output, initially low.
    ///
    /// # Errors
    ///
    /// Returns error if the line cannot be requested as an output.
    fn open_output(&mut self, pin: u32) -> Result<Self::Output, GpioError>;
}
