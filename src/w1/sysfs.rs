// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Sysfs access to the 1-Wire bus.

use std::io;
use std::path::{Path, PathBuf};

use super::SensorBus;

/// Name of the record file inside each sensor directory.
const SLAVE_FILE: &str = "w1_slave";

/// Reads 1-Wire sensors through the kernel's sysfs interface.
///
/// # Examples
///
/// ```
/// use pi2mqtt::w1::SysfsBus;
///
/// let bus = SysfsBus::default();
/// assert_eq!(bus.root().to_str(), Some("/sys/bus/w1/devices/"));
/// ```
#[derive(Debug, Clone)]
pub struct SysfsBus {
    root: PathBuf,
}

impl SysfsBus {
    /// Creates a bus rooted at the given device directory.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the device directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn slave_path(&self, sensor: &str) -> PathBuf {
        self.root.join(sensor).join(SLAVE_FILE)
    }
}

impl Default for SysfsBus {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_W1_PATH)
    }
}

impl SensorBus for SysfsBus {
    fn path(&self) -> &Path {
        &self.root
    }

    async fn list(&self) -> io::Result<Vec<String>> {
        let mut dir = tokio::fs::read_dir(&self.root).await?;
        let mut names = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        Ok(names)
    }

    async fn read(&self, sensor: &str) -> io::Result<String> {
        tokio::fs::read_to_string(self.slave_path(sensor)).await
    }
}
