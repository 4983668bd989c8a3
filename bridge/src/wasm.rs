// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) DUSK NETWORK. All rights reserved.

//! [`LinearModule`] backed by a Wasmtime instance.

use std::fmt::Debug;

use dusk_wasmtime::{
    Config, Engine, Instance, Memory, Module, Store, Trap, TypedFunc,
};

use crate::config::ExportNames;
use crate::module::{ConvertAbi, ConvertCall, ConvertStatus, LinearModule};
use crate::Error;

/// `(input, input_len, out_offset_ptr, out_len_ptr) -> ()`
type PlainConvertFn = TypedFunc<(u32, u32, u32, u32), ()>;

/// `(input, input_len, out_offset_ptr, out_len_ptr, x_scopes) -> i32`
type FlaggedConvertFn = TypedFunc<(u32, u32, u32, u32, i32), i32>;

enum ConvertFn {
    Plain(PlainConvertFn),
    Flagged(FlaggedConvertFn),
}

fn config() -> Config {
    let mut config = Config::new();
    config.macos_use_mach_ports(false);
    config
}

/// Describes a failed guest call, keeping the trap code when there is one.
fn describe(e: &dusk_wasmtime::Error) -> String {
    match e.downcast_ref::<Trap>() {
        Some(trap) => format!("wasm trap: {trap}"),
        None => format!("{e:#}"),
    }
}

/// A compiled and instantiated converter module.
///
/// All exports are resolved and type-checked once, when the module is
/// loaded.
pub struct WasmModule {
    /// Wasmtime store containing execution state
    store: Store<()>,
    /// Exported linear memory
    memory: Memory,
    /// reserve(size: u32) -> u32
    reserve_fn: TypedFunc<u32, u32>,
    /// release(offset: u32) -> ()
    release_fn: TypedFunc<u32, ()>,
    convert_fn: ConvertFn,
    /// Kept alive for the lifetime of the module
    _instance: Instance,
}

#[allow(clippy::missing_fields_in_debug)]
impl Debug for WasmModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WasmModule")
            .field("abi", &self.abi())
            .field("memory_len", &self.memory().len())
            .finish()
    }
}

impl WasmModule {
    /// Compiles and instantiates a converter module.
    ///
    /// The module must not import anything.
    ///
    /// # Errors
    ///
    /// - `Error::WasmRuntime`: invalid wasm bytes, compilation or
    ///   instantiation failure
    /// - `Error::WasmExport`: missing required exports or wrong signatures
    pub fn new(
        wasm_bytes: &[u8],
        exports: &ExportNames,
    ) -> Result<Self, Error> {
        let engine = Engine::new(&config()).map_err(|e| {
            Error::WasmRuntime(format!("Failed to create engine: {e}"))
        })?;

        let module = Module::from_binary(&engine, wasm_bytes).map_err(|e| {
            Error::WasmRuntime(format!("Failed to compile WASM: {e}"))
        })?;

        let mut store = Store::new(&engine, ());

        let instance =
            Instance::new(&mut store, &module, &[]).map_err(|e| {
                Error::WasmRuntime(format!("Failed to instantiate WASM: {e}"))
            })?;

        let memory = instance
            .get_memory(&mut store, &exports.memory)
            .ok_or_else(|| {
                Error::WasmExport(format!(
                    "Missing '{}' memory export",
                    exports.memory
                ))
            })?;

        let reserve_fn = instance
            .get_typed_func::<u32, u32>(&mut store, &exports.reserve)
            .map_err(|e| {
                Error::WasmExport(format!(
                    "Invalid '{}' export: {e}",
                    exports.reserve
                ))
            })?;

        let release_fn = instance
            .get_typed_func::<u32, ()>(&mut store, &exports.release)
            .map_err(|e| {
                Error::WasmExport(format!(
                    "Invalid '{}' export: {e}",
                    exports.release
                ))
            })?;

        let convert_fn = match instance
            .get_typed_func::<(u32, u32, u32, u32), ()>(
                &mut store,
                &exports.convert,
            ) {
            Ok(f) => ConvertFn::Plain(f),
            Err(_) => instance
                .get_typed_func::<(u32, u32, u32, u32, i32), i32>(
                    &mut store,
                    &exports.convert,
                )
                .map(ConvertFn::Flagged)
                .map_err(|e| {
                    Error::WasmExport(format!(
                        "Invalid '{}' export: {e}",
                        exports.convert
                    ))
                })?,
        };

        let module = Self {
            store,
            memory,
            reserve_fn,
            release_fn,
            convert_fn,
            _instance: instance,
        };
        tracing::debug!(
            abi = ?module.abi(),
            memory_len = module.memory().len(),
            "loaded converter module"
        );
        Ok(module)
    }

    /// Signature of the loaded conversion entry point.
    #[must_use]
    pub fn abi(&self) -> ConvertAbi {
        match self.convert_fn {
            ConvertFn::Plain(_) => ConvertAbi::Plain,
            ConvertFn::Flagged(_) => ConvertAbi::Flagged,
        }
    }
}

impl LinearModule for WasmModule {
    fn memory(&self) -> &[u8] {
        self.memory.data(&self.store)
    }

    fn memory_mut(&mut self) -> &mut [u8] {
        self.memory.data_mut(&mut self.store)
    }

    fn reserve(&mut self, size: u32) -> Result<u32, Error> {
        self.reserve_fn.call(&mut self.store, size).map_err(|e| {
            Error::AllocationFailure(format!(
                "reserve({size}) failed: {}",
                describe(&e)
            ))
        })
    }

    fn release(&mut self, offset: u32) -> Result<(), Error> {
        self.release_fn.call(&mut self.store, offset).map_err(|e| {
            Error::ModuleTrap(format!(
                "release({offset}) failed: {}",
                describe(&e)
            ))
        })
    }

    fn invoke(&mut self, call: ConvertCall) -> Result<ConvertStatus, Error> {
        let args = (
            call.input_offset,
            call.input_len,
            call.result_offset,
            call.result_len_offset,
        );
        let trapped = |e: dusk_wasmtime::Error| {
            Error::ModuleTrap(format!("convert failed: {}", describe(&e)))
        };

        match &self.convert_fn {
            ConvertFn::Plain(f) => {
                if call.x_scopes {
                    tracing::debug!(
                        "x_scopes requested but converter takes no flag"
                    );
                }
                f.call(&mut self.store, args).map_err(trapped)?;
                Ok(ConvertStatus::Completed)
            }
            ConvertFn::Flagged(f) => {
                let (a, b, c, d) = args;
                let flag = i32::from(call.x_scopes);
                match f.call(&mut self.store, (a, b, c, d, flag)) {
                    Ok(0) => Ok(ConvertStatus::Rejected),
                    Ok(_) => Ok(ConvertStatus::Completed),
                    Err(e) => Err(trapped(e)),
                }
            }
        }
    }
}
