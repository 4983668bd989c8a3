// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) DUSK NETWORK. All rights reserved.

//! # DWARF Bridge
//!
//! Host-side bridge for converters compiled to WebAssembly.
//!
//! A converter module exports a linear memory, an allocator pair and a
//! conversion entry point. [`MemoryBridge::convert`] copies the caller's
//! bytes into the module, runs the entry point, reads the 12-byte result
//! descriptor it writes back, copies the output out and decodes it as UTF-8.
//!
//! Every region the bridge reserves inside the module is released on every
//! exit path, successful or not. The only exception is a trap inside the
//! module: the bridge cannot run cleanup inside a module that has aborted,
//! so the regions reserved so far are leaked and the bridge refuses further
//! calls.
//!
//! ## Usage
//!
//! ```no_run
//! use dwarf_bridge::{BridgeConfig, Error, MemoryBridge};
//!
//! # fn main() -> Result<(), Error> {
//! let converter = std::fs::read("dwarf_to_json.wasm")
//!     .map_err(|e| Error::WasmRuntime(e.to_string()))?;
//! let config = BridgeConfig::from_toml("x_scopes = true")?;
//! let bridge = MemoryBridge::from_wasm(&converter, &config)?;
//!
//! let input = std::fs::read("app.wasm")
//!     .map_err(|e| Error::WasmRuntime(e.to_string()))?;
//! let json = bridge.convert(&input)?;
//! println!("{json}");
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![allow(clippy::module_name_repetitions)]

mod bridge;
mod config;
mod decode;
mod descriptor;
mod error;
mod module;
mod scope;
mod wasm;

#[cfg(test)]
mod testing;

pub use bridge::MemoryBridge;
pub use config::{
    BridgeConfig, ExportNames, DEFAULT_CONVERT_EXPORT, DEFAULT_MEMORY_EXPORT,
    DEFAULT_RELEASE_EXPORT, DEFAULT_RESERVE_EXPORT,
};
pub use error::Error;
pub use module::{ConvertAbi, ConvertCall, ConvertStatus, LinearModule};
pub use wasm::WasmModule;
