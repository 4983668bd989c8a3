// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) DUSK NETWORK. All rights reserved.

use std::ops::Range;

use crate::Error;

/// Result descriptor written by the conversion entry point.
///
/// Layout (12 bytes, little-endian):
///
/// | bytes  | field           |
/// |--------|-----------------|
/// | 0..4   | `output_offset` |
/// | 4..8   | `output_len`    |
/// | 8..12  | reserved        |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ResultDescriptor {
    pub output_offset: u32,
    pub output_len: u32,
}

impl ResultDescriptor {
    /// Size of the region reserved for the descriptor.
    pub const SIZE: u32 = 12;

    /// Byte offset of the `output_len` field inside the descriptor.
    pub const LEN_FIELD: u32 = 4;

    /// Decodes a descriptor from its in-memory bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, Error> {
        let field = |at: usize| -> Result<u32, Error> {
            bytes
                .get(at..at + 4)
                .and_then(|b| b.try_into().ok())
                .map(u32::from_le_bytes)
                .ok_or_else(|| {
                    Error::CorruptResult(format!(
                        "descriptor truncated: {} bytes",
                        bytes.len()
                    ))
                })
        };
        Ok(Self {
            output_offset: field(0)?,
            output_len: field(Self::LEN_FIELD as usize)?,
        })
    }

    /// `true` if the converter produced no module-side output region.
    pub fn is_empty(&self) -> bool {
        self.output_offset == 0 && self.output_len == 0
    }

    /// Validates the output region against a memory of `memory_len` bytes.
    pub fn output_range(
        &self,
        memory_len: usize,
    ) -> Result<Range<usize>, Error> {
        if self.output_offset == 0 && self.output_len != 0 {
            return Err(Error::CorruptResult(format!(
                "null output offset with length {}",
                self.output_len
            )));
        }

        let start = self.output_offset as usize;
        let end =
            start.checked_add(self.output_len as usize).ok_or_else(|| {
                Error::CorruptResult(format!(
                    "output region overflows: offset={}, len={}",
                    self.output_offset, self.output_len
                ))
            })?;

        if end > memory_len {
            return Err(Error::CorruptResult(format!(
                "output region {start}..{end} exceeds memory of \
                 {memory_len} bytes"
            )));
        }

        Ok(start..end)
    }
}
