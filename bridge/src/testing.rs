// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) DUSK NETWORK. All rights reserved.

//! In-process module used by the unit tests.

use std::collections::BTreeSet;

use crate::module::{ConvertCall, ConvertStatus, LinearModule};
use crate::Error;

const PAGE: usize = 64 * 1024;

/// Misbehaviour injected into a [`FakeModule`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    /// The n-th reserve (1-based) returns the null sentinel.
    NullReserve(usize),
    /// The n-th reserve traps inside the allocator.
    TrapReserve(usize),
    /// The n-th reserve returns an offset past the end of memory.
    OutOfBoundsReserve(usize),
    /// The entry point traps.
    TrapInvoke,
    /// Every release traps.
    TrapRelease,
    /// The entry point declares one byte more than memory holds.
    CorruptLength,
    /// The entry point produces these bytes instead of echoing its input.
    Output(Vec<u8>),
    /// The entry point rejects its input without writing a descriptor.
    Reject,
    /// Every reserve grows memory by a page.
    GrowOnReserve,
}

/// A module whose converter echoes its input back as output.
///
/// Releasing a region that is not live panics, so double releases and
/// releases of foreign offsets fail the test that caused them.
pub struct FakeModule {
    memory: Vec<u8>,
    next: usize,
    live: BTreeSet<u32>,
    reserves: usize,
    releases: usize,
    released: Vec<u32>,
    calls: Vec<ConvertCall>,
    faults: Vec<Fault>,
}

impl FakeModule {
    pub fn echo() -> Self {
        Self {
            memory: vec![0; PAGE],
            next: 1024,
            live: BTreeSet::new(),
            reserves: 0,
            releases: 0,
            released: Vec::new(),
            calls: Vec::new(),
            faults: Vec::new(),
        }
    }

    pub fn with_fault(mut self, fault: Fault) -> Self {
        self.faults.push(fault);
        self
    }

    pub fn reserves(&self) -> usize {
        self.reserves
    }

    pub fn releases(&self) -> usize {
        self.releases
    }

    pub fn live_regions(&self) -> usize {
        self.live.len()
    }

    pub fn released_offsets(&self) -> &[u32] {
        &self.released
    }

    pub fn calls(&self) -> &[ConvertCall] {
        &self.calls
    }

    fn has(&self, fault: &Fault) -> bool {
        self.faults.contains(fault)
    }

    fn output_for(&self, input: &[u8]) -> Vec<u8> {
        self.faults
            .iter()
            .find_map(|f| match f {
                Fault::Output(bytes) => Some(bytes.clone()),
                _ => None,
            })
            .unwrap_or_else(|| input.to_vec())
    }

    fn put_u32(&mut self, at: u32, value: u32) {
        let at = at as usize;
        self.memory[at..at + 4].copy_from_slice(&value.to_le_bytes());
    }
}

impl LinearModule for FakeModule {
    fn memory(&self) -> &[u8] {
        &self.memory
    }

    fn memory_mut(&mut self) -> &mut [u8] {
        &mut self.memory
    }

    fn reserve(&mut self, size: u32) -> Result<u32, Error> {
        self.reserves += 1;
        let nth = self.reserves;

        if self.has(&Fault::NullReserve(nth)) {
            self.reserves -= 1;
            return Ok(0);
        }
        if self.has(&Fault::TrapReserve(nth)) {
            self.reserves -= 1;
            return Err(Error::AllocationFailure(
                "wasm trap: unreachable".into(),
            ));
        }
        if self.has(&Fault::OutOfBoundsReserve(nth)) {
            let offset = u32::try_from(self.memory.len()).unwrap_or(u32::MAX);
            self.live.insert(offset);
            return Ok(offset);
        }

        // growing reallocates the buffer, so a stale view would dangle
        let grow = self.has(&Fault::GrowOnReserve);
        let end = self.next + (size as usize).max(1);
        if grow || end > self.memory.len() {
            let len = (self.memory.len() + PAGE)
                .max(end.next_multiple_of(PAGE));
            let mut grown = vec![0; len];
            grown[..self.memory.len()].copy_from_slice(&self.memory);
            self.memory = grown;
        }

        let offset = u32::try_from(self.next).expect("fake memory fits u32");
        self.next = (end + 7) & !7;
        self.live.insert(offset);
        Ok(offset)
    }

    fn release(&mut self, offset: u32) -> Result<(), Error> {
        if self.has(&Fault::TrapRelease) {
            return Err(Error::ModuleTrap("wasm trap: unreachable".into()));
        }
        assert!(
            self.live.remove(&offset),
            "release of unknown region {offset}"
        );
        self.releases += 1;
        self.released.push(offset);
        Ok(())
    }

    fn invoke(&mut self, call: ConvertCall) -> Result<ConvertStatus, Error> {
        self.calls.push(call);

        if self.has(&Fault::TrapInvoke) {
            return Err(Error::ModuleTrap("wasm trap: unreachable".into()));
        }
        if self.has(&Fault::Reject) {
            return Ok(ConvertStatus::Rejected);
        }

        let start = call.input_offset as usize;
        let end = start + call.input_len as usize;
        let input = self.memory[start..end].to_vec();
        let output = self.output_for(&input);
        let len = u32::try_from(output.len()).expect("fake output fits u32");

        let out = self.reserve(len)?;
        let at = out as usize;
        self.memory[at..at + output.len()].copy_from_slice(&output);

        let declared = if self.has(&Fault::CorruptLength) {
            u32::try_from(self.memory.len()).unwrap_or(u32::MAX) + 1 - out
        } else {
            len
        };
        self.put_u32(call.result_offset, out);
        self.put_u32(call.result_len_offset, declared);
        Ok(ConvertStatus::Completed)
    }
}
