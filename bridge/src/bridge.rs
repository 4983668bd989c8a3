// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) DUSK NETWORK. All rights reserved.

use std::fmt::Debug;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::BridgeConfig;
use crate::decode::Utf8Decoder;
use crate::descriptor::ResultDescriptor;
use crate::module::{ConvertCall, ConvertStatus, LinearModule};
use crate::scope::Scope;
use crate::wasm::WasmModule;
use crate::Error;

/// State guarded by the bridge lock
struct BridgeInner<M> {
    module: M,
    x_scopes: bool,
    /// Set once the module has trapped
    poisoned: bool,
}

/// Runs conversions inside a module, one call at a time.
///
/// Every call to [`convert`](Self::convert) takes the bridge lock for the
/// whole allocate, copy, invoke, read and release sequence, so calls from
/// different threads or clones are queued and never interleave inside the
/// module's memory.
pub struct MemoryBridge<M = WasmModule> {
    inner: Arc<Mutex<BridgeInner<M>>>,
}

impl<M> Clone for MemoryBridge<M> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[allow(clippy::missing_fields_in_debug)]
impl<M> Debug for MemoryBridge<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBridge")
            .field("poisoned", &self.is_poisoned())
            .finish()
    }
}

impl MemoryBridge<WasmModule> {
    /// Loads a converter module and wraps it in a bridge.
    ///
    /// # Errors
    ///
    /// - `Error::Config`: invalid configuration
    /// - `Error::WasmRuntime`: invalid wasm bytes or compilation failure
    /// - `Error::WasmExport`: missing required exports or wrong signatures
    ///
    /// # Example
    ///
    /// ```no_run
    /// use dwarf_bridge::{BridgeConfig, Error, MemoryBridge};
    ///
    /// # fn main() -> Result<(), Error> {
    /// let wasm_bytes = std::fs::read("dwarf_to_json.wasm")
    ///     .map_err(|e| Error::WasmRuntime(e.to_string()))?;
    /// let config = BridgeConfig::default();
    /// let bridge = MemoryBridge::from_wasm(&wasm_bytes, &config)?;
    ///
    /// let input = std::fs::read("app.wasm")
    ///     .map_err(|e| Error::WasmRuntime(e.to_string()))?;
    /// let json = bridge.convert(&input)?;
    /// println!("{json}");
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_wasm(
        wasm_bytes: &[u8],
        config: &BridgeConfig,
    ) -> Result<Self, Error> {
        config.validate()?;
        let module = WasmModule::new(wasm_bytes, &config.exports)?;
        Ok(Self::new(module).with_x_scopes(config.x_scopes))
    }
}

impl<M: LinearModule> MemoryBridge<M> {
    /// Wraps an already loaded module.
    pub fn new(module: M) -> Self {
        Self {
            inner: Arc::new(Mutex::new(BridgeInner {
                module,
                x_scopes: false,
                poisoned: false,
            })),
        }
    }

    /// Requests extended scope information from flagged converters.
    #[must_use]
    pub fn with_x_scopes(self, x_scopes: bool) -> Self {
        self.inner.lock().x_scopes = x_scopes;
        self
    }

    /// Converts `input` inside the module and returns the decoded text.
    ///
    /// Every region the bridge reserves is released before this returns,
    /// on success and on failure, with one exception: if the module traps,
    /// the regions reserved so far are leaked and the bridge is poisoned.
    ///
    /// # Errors
    ///
    /// - `Error::AllocationFailure`: the module allocator could not reserve
    ///   a region
    /// - `Error::ModuleTrap`: the module trapped; later calls fail with
    ///   `Error::Poisoned`
    /// - `Error::ConversionRejected`: the converter reported a failure
    /// - `Error::CorruptResult`: the result descriptor is out of bounds
    /// - `Error::DecodeError`: the output is not valid UTF-8
    pub fn convert(&self, input: &[u8]) -> Result<String, Error> {
        let bytes = {
            let mut guard = self.inner.lock();
            let inner = &mut *guard;
            if inner.poisoned {
                return Err(Error::Poisoned);
            }

            tracing::debug!(input_len = input.len(), "converting");
            let result = run(&mut inner.module, input, inner.x_scopes);
            if let Err(e) = &result {
                if e.is_trap() {
                    tracing::error!("poisoning bridge: {e}");
                    inner.poisoned = true;
                }
            }
            result?
        };

        tracing::debug!(output_len = bytes.len(), "converted");
        Utf8Decoder::shared().decode(bytes)
    }
}

impl<M> MemoryBridge<M> {
    /// Returns `true` once the module has trapped.
    pub fn is_poisoned(&self) -> bool {
        self.inner.lock().poisoned
    }

    /// Runs `f` against the module while holding the bridge lock.
    pub fn with_module<R>(&self, f: impl FnOnce(&M) -> R) -> R {
        f(&self.inner.lock().module)
    }
}

/// One allocate, copy, invoke, read and release sequence.
///
/// Returns the output bytes, copied out of the module. All regions are back
/// with the module allocator once this returns, unless the module trapped.
/// A trap while releasing after an earlier failure replaces that failure.
fn run<M: LinearModule + ?Sized>(
    module: &mut M,
    input: &[u8],
    x_scopes: bool,
) -> Result<Vec<u8>, Error> {
    let input_len = u32::try_from(input.len()).map_err(|_| {
        Error::AllocationFailure(format!(
            "input of {} bytes exceeds the 32-bit address space",
            input.len()
        ))
    })?;

    let mut scope = Scope::new(module);
    let result = exchange(&mut scope, input, input_len, x_scopes);
    let closed = scope.close();

    match (result, closed) {
        (Err(e), _) if e.is_trap() => Err(e),
        (Err(e), Err(trap)) => {
            tracing::warn!("cleanup after failed conversion trapped: {e}");
            Err(trap)
        }
        (result, closed) => closed.and(result),
    }
}

fn exchange<M: LinearModule + ?Sized>(
    scope: &mut Scope<'_, M>,
    input: &[u8],
    input_len: u32,
    x_scopes: bool,
) -> Result<Vec<u8>, Error> {
    let input_region = scope.reserve(input_len)?;
    scope.write(&input_region, input)?;

    let descriptor_region = scope.reserve(ResultDescriptor::SIZE)?;
    scope.write(&descriptor_region, &[0; ResultDescriptor::SIZE as usize])?;

    let call = ConvertCall {
        input_offset: input_region.offset(),
        input_len,
        result_offset: descriptor_region.offset(),
        result_len_offset: descriptor_region.offset()
            + ResultDescriptor::LEN_FIELD,
        x_scopes,
    };
    tracing::trace!(?call, "invoking converter");
    let status = scope.invoke(call)?;

    scope.release(input_region)?;

    let descriptor =
        ResultDescriptor::decode(&scope.read(&descriptor_region)?)?;
    scope.release(descriptor_region)?;
    tracing::trace!(?descriptor, ?status, "read result descriptor");

    if status == ConvertStatus::Rejected {
        if !descriptor.is_empty() {
            tracing::warn!(?descriptor, "rejected conversion left output");
        }
        return Err(Error::ConversionRejected);
    }
    if descriptor.is_empty() {
        return Ok(Vec::new());
    }

    descriptor.output_range(scope.memory_len())?;
    let output_region =
        scope.adopt(descriptor.output_offset, descriptor.output_len);
    let bytes = scope.read(&output_region)?;
    scope.release(output_region)?;

    Ok(bytes)
}
