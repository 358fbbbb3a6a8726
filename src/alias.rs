// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Topic aliasing between canonical device identifiers and user topics.
//!
//! An alias such as `gpio/17:Light/Garden` replaces the canonical segment
//! `gpio/17` with `Light/Garden` in status and set topics. The table is
//! symmetric: resolving either side yields the other one.
//!
//! # Examples
//!
//! ```
//! use pi2mqtt::AliasTable;
//!
//! let aliases = AliasTable::from_specs(["gpio/17:Light/Garden"]).unwrap();
//!
//! assert_eq!(aliases.resolve("gpio/17"), "Light/Garden");
//! assert_eq!(aliases.resolve("Light/Garden"), "gpio/17");
//! assert_eq!(aliases.resolve("gpio/18"), "gpio/18");
//! ```

use std::collections::HashMap;

use crate::error::ConfigError;

/// Symmetric mapping between canonical identifiers and friendly names.
///
/// Built once at startup and read-only afterwards. When two specifications
/// claim the same name, the later one wins.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    entries: HashMap<String, String>,
}

impl AliasTable {
    /// Creates an empty table that resolves every name to itself.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from `left:right` specifications.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidAlias`] if a specification does not
    /// consist of exactly two non-empty segments separated by `:`.
    pub fn from_specs<I, S>(specs: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut table = Self::new();
        for spec in specs {
            let spec = spec.as_ref();
            let (left, right) = parse_spec(spec)?;
            table.insert(left, right);
        }
        Ok(table)
    }

    fn insert(&mut self, left: &str, right: &str) {
        tracing::debug!(canonical = %left, alias = %right, "Registering topic alias");
        self.entries.insert(left.to_string(), right.to_string());
        self.entries.insert(right.to_string(), left.to_string());
    }

    /// Returns the alias of `id`, or `id` itself when none is registered.
    #[must_use]
    pub fn resolve<'a>(&'a self, id: &'a str) -> &'a str {
        self.entries.get(id).map_or(id, String::as_str)
    }

    /// Returns the number of resolvable names (both sides counted).
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no alias is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn parse_spec(spec: &str) -> Result<(&str, &str), ConfigError> {
    let mut parts = spec.split(':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(left), Some(right), None) if !left.is_empty() && !right.is_empty() => {
            Ok((left, right))
        }
        _ => Err(ConfigError::InvalidAlias(spec.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_is_symmetric() {
        let table = AliasTable::from_specs([
            "gpio/17:Light/Garden",
            "w1/28-0000002981762:Temperature/Garden",
        ])
        .unwrap();

        for (a, b) in [
            ("gpio/17", "Light/Garden"),
            ("w1/28-0000002981762", "Temperature/Garden"),
        ] {
            assert_eq!(table.resolve(a), b);
            assert_eq!(table.resolve(b), a);
        }
    }

    #[test]
    fn unregistered_names_resolve_to_themselves() {
        let table = AliasTable::from_specs(["gpio/17:Light/Garden"]).unwrap();
        assert_eq!(table.resolve("gpio/18"), "gpio/18");
        assert_eq!(table.resolve(""), "");
        assert_eq!(AliasTable::new().resolve("gpio/17"), "gpio/17");
    }

    #[test]
    fn empty_spec_list() {
        let table = AliasTable::from_specs(Vec::<String>::new()).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.len(), 0);
    }

    #[test]
    fn malformed_specs_are_rejected() {
        for spec in ["gpio/17", "a:b:c", ":Light", "gpio/17:", ""] {
            let err = AliasTable::from_specs([spec]).unwrap_err();
            assert!(
                matches!(err, ConfigError::InvalidAlias(ref s) if s == spec),
                "spec {spec:?} should be rejected"
            );
        }
    }

    #[test]
    fn conflicting_entries_do_not_panic() {
        let table = AliasTable::from_specs(["gpio/17:Light", "gpio/18:Light"]).unwrap();
        assert_eq!(table.resolve("Light"), "gpio/18");
        assert_eq!(table.resolve("gpio/18"), "Light");
        assert_eq!(table.resolve("gpio/17"), "Light");
    }

    #[test]
    fn self_alias_is_harmless() {
        let table = AliasTable::from_specs(["gpio/4:gpio/4"]).unwrap();
        assert_eq!(table.resolve("gpio/4"), "gpio/4");
        assert_eq!(table.len(), 1);
    }
}
