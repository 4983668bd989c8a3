// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) DUSK NETWORK. All rights reserved.

//! Scoped ownership of regions inside a module's linear memory.

use std::ops::Range;

use smallvec::SmallVec;

use crate::module::{ConvertCall, ConvertStatus, LinearModule};
use crate::Error;

/// A region of linear memory owned by a [`Scope`].
///
/// Handles are neither `Copy` nor `Clone`; releasing one consumes it, so a
/// region cannot be touched or released again once it has been given back.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct Allocation {
    offset: u32,
    size: u32,
}

impl Allocation {
    pub fn offset(&self) -> u32 {
        self.offset
    }

    fn range(&self) -> Range<usize> {
        let start = self.offset as usize;
        start..start + self.size as usize
    }
}

/// Tracks every region taken from a module during one conversion.
///
/// [`close`](Self::close) releases the regions still live in reverse order
/// and reports a trap raised while doing so. Dropping an unclosed scope does
/// the same cleanup but can only log failures. Once the module has trapped
/// the scope is disarmed and never calls back into the module.
pub(crate) struct Scope<'m, M: LinearModule + ?Sized> {
    module: &'m mut M,
    live: SmallVec<[u32; 3]>,
    armed: bool,
}

impl<'m, M: LinearModule + ?Sized> Scope<'m, M> {
    pub fn new(module: &'m mut M) -> Self {
        Self {
            module,
            live: SmallVec::new(),
            armed: true,
        }
    }

    /// Reserves `size` bytes from the module allocator.
    pub fn reserve(&mut self, size: u32) -> Result<Allocation, Error> {
        let offset = self.module.reserve(size)?;
        if offset == 0 {
            return Err(Error::AllocationFailure(format!(
                "allocator returned null for {size} bytes"
            )));
        }
        self.live.push(offset);

        let alloc = Allocation { offset, size };
        let memory_len = self.memory_len();
        if alloc.range().end > memory_len {
            return Err(Error::AllocationFailure(format!(
                "allocator returned {offset}+{size} outside memory of \
                 {memory_len} bytes"
            )));
        }

        tracing::trace!(offset, size, "reserved region");
        Ok(alloc)
    }

    /// Takes ownership of a region the module allocated on its own.
    ///
    /// The caller must have validated the region against memory bounds.
    pub fn adopt(&mut self, offset: u32, size: u32) -> Allocation {
        self.live.push(offset);
        tracing::trace!(offset, size, "adopted region");
        Allocation { offset, size }
    }

    pub fn write(
        &mut self,
        alloc: &Allocation,
        bytes: &[u8],
    ) -> Result<(), Error> {
        let range = alloc.range();
        let memory = self.module.memory_mut();
        let memory_len = memory.len();
        memory
            .get_mut(range.clone())
            .ok_or_else(|| {
                Error::AllocationFailure(format!(
                    "region {range:?} outside memory of {memory_len} bytes"
                ))
            })?
            .copy_from_slice(bytes);
        Ok(())
    }

    pub fn read(&self, alloc: &Allocation) -> Result<Vec<u8>, Error> {
        let range = alloc.range();
        let memory = self.module.memory();
        memory.get(range.clone()).map(<[u8]>::to_vec).ok_or_else(|| {
            Error::CorruptResult(format!(
                "region {range:?} outside memory of {} bytes",
                memory.len()
            ))
        })
    }

    /// Gives a region back to the module allocator.
    pub fn release(&mut self, alloc: Allocation) -> Result<(), Error> {
        if let Some(at) = self.live.iter().position(|o| *o == alloc.offset) {
            self.live.remove(at);
        }
        tracing::trace!(offset = alloc.offset, "releasing region");
        self.module.release(alloc.offset).inspect_err(|e| {
            if e.is_trap() {
                self.armed = false;
            }
        })
    }

    pub fn invoke(
        &mut self,
        call: ConvertCall,
    ) -> Result<ConvertStatus, Error> {
        self.module.invoke(call).inspect_err(|e| {
            if e.is_trap() {
                self.armed = false;
            }
        })
    }

    /// Releases every region still live, newest first.
    ///
    /// A disarmed scope makes no calls and leaks its regions.
    ///
    /// # Errors
    ///
    /// - `Error::ModuleTrap`: a release trapped; the scope is disarmed and
    ///   the remaining regions leak
    pub fn close(mut self) -> Result<(), Error> {
        if !self.armed {
            return Ok(());
        }
        while let Some(offset) = self.live.pop() {
            tracing::trace!(offset, "releasing region");
            if let Err(e) = self.module.release(offset) {
                if e.is_trap() {
                    self.armed = false;
                }
                return Err(e);
            }
        }
        Ok(())
    }

    pub fn memory_len(&self) -> usize {
        self.module.memory().len()
    }

    #[cfg(test)]
    pub fn live(&self) -> usize {
        self.live.len()
    }
}

impl<M: LinearModule + ?Sized> Drop for Scope<'_, M> {
    fn drop(&mut self) {
        if !self.armed {
            if !self.live.is_empty() {
                tracing::warn!(
                    regions = ?self.live,
                    "module trapped, leaking regions"
                );
            }
            return;
        }

        while let Some(offset) = self.live.pop() {
            if let Err(e) = self.module.release(offset) {
                tracing::warn!(offset, "cleanup release failed: {e}");
                if e.is_trap() {
                    tracing::warn!(
                        regions = ?self.live,
                        "module trapped, leaking regions"
                    );
                    return;
                }
            }
        }
    }
}
