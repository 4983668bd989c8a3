// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) DUSK NETWORK. All rights reserved.

use serde::{Deserialize, Serialize};

use crate::Error;

/// Default name of the exported linear memory.
pub const DEFAULT_MEMORY_EXPORT: &str = "memory";

/// Default name of the exported allocator reserve function.
pub const DEFAULT_RESERVE_EXPORT: &str = "alloc_mem";

/// Default name of the exported allocator release function.
pub const DEFAULT_RELEASE_EXPORT: &str = "free_mem";

/// Default name of the exported conversion entry point.
pub const DEFAULT_CONVERT_EXPORT: &str = "convert_dwarf";

/// Names of the exports the bridge resolves when loading a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportNames {
    /// Linear memory shared with the bridge.
    pub memory: String,
    /// `reserve(size: u32) -> u32`
    pub reserve: String,
    /// `release(offset: u32)`
    pub release: String,
    /// Conversion entry point, in either [`ConvertAbi`] shape.
    ///
    /// [`ConvertAbi`]: crate::ConvertAbi
    pub convert: String,
}

impl Default for ExportNames {
    fn default() -> Self {
        Self {
            memory: DEFAULT_MEMORY_EXPORT.into(),
            reserve: DEFAULT_RESERVE_EXPORT.into(),
            release: DEFAULT_RELEASE_EXPORT.into(),
            convert: DEFAULT_CONVERT_EXPORT.into(),
        }
    }
}

/// Bridge configuration.
///
/// Every field has a default, so an empty TOML document is a valid
/// configuration:
///
/// ```toml
/// x_scopes = true
///
/// [exports]
/// convert = "convert_dwarf"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Export names resolved at load time.
    pub exports: ExportNames,
    /// Ask the converter for extended scope information.
    ///
    /// Only forwarded to converters exporting the flagged signature.
    pub x_scopes: bool,
}

impl BridgeConfig {
    /// Parses a configuration from a TOML document.
    ///
    /// # Errors
    ///
    /// - `Error::Config`: the document is not valid TOML, has unexpected
    ///   types, or names an empty export
    pub fn from_toml(toml: &str) -> Result<Self, Error> {
        let config: Self = toml::from_str(toml)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that every export name is set.
    ///
    /// # Errors
    ///
    /// - `Error::Config`: an export name is empty
    pub fn validate(&self) -> Result<(), Error> {
        let exports = &self.exports;
        for (field, name) in [
            ("memory", &exports.memory),
            ("reserve", &exports.reserve),
            ("release", &exports.release),
            ("convert", &exports.convert),
        ] {
            if name.trim().is_empty() {
                return Err(Error::Config(format!(
                    "export name '{field}' must not be empty"
                )));
            }
        }
        Ok(())
    }
}
