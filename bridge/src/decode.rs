// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) DUSK NETWORK. All rights reserved.

use once_cell::sync::Lazy;

use crate::Error;

/// Process-wide decoder, built on first use.
static DECODER: Lazy<Utf8Decoder> = Lazy::new(|| Utf8Decoder);

/// Strict UTF-8 decoder for converter output.
///
/// Invalid sequences are an error rather than being replaced, and a leading
/// byte-order mark is kept, so the decoded text always re-encodes to exactly
/// the bytes the module produced.
///
/// Every conversion goes through the one shared instance, so decoding
/// policy lives in a single place however many bridges exist.
#[derive(Debug)]
pub(crate) struct Utf8Decoder;

impl Utf8Decoder {
    /// Returns the shared decoder.
    pub fn shared() -> &'static Self {
        &DECODER
    }

    pub fn decode(&self, bytes: Vec<u8>) -> Result<String, Error> {
        String::from_utf8(bytes)
            .map_err(|e| Error::DecodeError(e.utf8_error()))
    }
}
