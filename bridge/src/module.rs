// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) DUSK NETWORK. All rights reserved.

//! The bridge's view of a foreign, linear-memory-addressed module.

use crate::Error;

/// Signature of the conversion entry point exported by a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvertAbi {
    /// `(input, input_len, out_offset_ptr, out_len_ptr) -> ()`
    Plain,
    /// `(input, input_len, out_offset_ptr, out_len_ptr, x_scopes) -> i32`
    ///
    /// A zero return value means the converter rejected the input.
    Flagged,
}

/// Arguments of a single conversion entry point call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvertCall {
    /// Start of the input region.
    pub input_offset: u32,
    /// Length of the input region, possibly zero.
    pub input_len: u32,
    /// Where the entry point writes the output offset.
    pub result_offset: u32,
    /// Where the entry point writes the output length, four bytes after
    /// `result_offset`.
    pub result_len_offset: u32,
    /// Forwarded only to [`ConvertAbi::Flagged`] entry points.
    pub x_scopes: bool,
}

/// Outcome reported by the conversion entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvertStatus {
    /// The result descriptor describes the output.
    Completed,
    /// The converter refused the input.
    Rejected,
}

/// A module exposing linear memory, an allocator and a conversion entry
/// point.
///
/// Memory views are borrowed from the module on every access, so a view
/// obtained before a call that may grow memory can never be used after it.
pub trait LinearModule {
    /// Current view of linear memory.
    fn memory(&self) -> &[u8];

    /// Current mutable view of linear memory.
    fn memory_mut(&mut self) -> &mut [u8];

    /// Reserves `size` bytes and returns their offset.
    ///
    /// An offset of zero is the allocator's failure sentinel and is passed
    /// through unchanged.
    ///
    /// A trap inside the allocator is treated as an out-of-memory abort that
    /// leaves the module usable: regions reserved earlier in the same call
    /// are still released, and the bridge is not poisoned.
    ///
    /// # Errors
    ///
    /// - `Error::AllocationFailure`: the allocator trapped
    fn reserve(&mut self, size: u32) -> Result<u32, Error>;

    /// Releases a region previously returned by [`reserve`](Self::reserve)
    /// or handed out by the conversion entry point.
    ///
    /// # Errors
    ///
    /// - `Error::ModuleTrap`: the allocator trapped
    fn release(&mut self, offset: u32) -> Result<(), Error>;

    /// Runs the conversion entry point to completion.
    ///
    /// # Errors
    ///
    /// - `Error::ModuleTrap`: the entry point trapped
    fn invoke(&mut self, call: ConvertCall) -> Result<ConvertStatus, Error>;
}

impl<M: LinearModule + ?Sized> LinearModule for Box<M> {
    fn memory(&self) -> &[u8] {
        (**self).memory()
    }

    fn memory_mut(&mut self) -> &mut [u8] {
        (**self).memory_mut()
    }

    fn reserve(&mut self, size: u32) -> Result<u32, Error> {
        (**self).reserve(size)
    }

    fn release(&mut self, offset: u32) -> Result<(), Error> {
        (**self).release(offset)
    }

    fn invoke(&mut self, call: ConvertCall) -> Result<ConvertStatus, Error> {
        (**self).invoke(call)
    }
}
