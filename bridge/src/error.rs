// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) DUSK NETWORK. All rights reserved.

//! Error-type for dwarf-bridge.

use std::str::Utf8Error;

use thiserror::Error;

/// The dwarf-bridge error type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The module's allocator could not satisfy a reserve.
    #[error("allocation failure: {0}")]
    AllocationFailure(String),
    /// The result descriptor points outside linear memory or is otherwise
    /// inconsistent.
    #[error("corrupt result: {0}")]
    CorruptResult(String),
    /// The output bytes are not valid UTF-8.
    #[error("output is not valid UTF-8: {0}")]
    DecodeError(#[from] Utf8Error),
    /// The module trapped while running guest code.
    ///
    /// Regions reserved before the trap are leaked inside the module.
    #[error("module trapped: {0}")]
    ModuleTrap(String),
    /// The converter returned a failure status for the given input.
    #[error("converter rejected the input")]
    ConversionRejected,
    /// The module trapped during an earlier call and can no longer be used.
    #[error("module is poisoned by an earlier trap")]
    Poisoned,
    /// Compilation or instantiation of the module failed.
    #[error("wasm runtime: {0}")]
    WasmRuntime(String),
    /// A required export is missing or has the wrong signature.
    #[error("wasm export: {0}")]
    WasmExport(String),
    /// Invalid bridge configuration.
    #[error("config: {0}")]
    Config(String),
}

impl Error {
    /// Returns `true` if the error leaves the module in an unknown state.
    #[must_use]
    pub fn is_trap(&self) -> bool {
        matches!(self, Self::ModuleTrap(_))
    }
}

impl From<toml::de::Error> for Error {
    fn from(value: toml::de::Error) -> Self {
        Self::Config(value.to_string())
    }
}
