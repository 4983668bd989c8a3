// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) DUSK NETWORK. All rights reserved.

//! Converter modules written in WAT.
//!
//! Every module shares a bump allocator that keeps its bookkeeping in low
//! memory, so tests can observe it through the bridge:
//!
//! | address | value                                   |
//! |---------|-----------------------------------------|
//! | 16      | successful reserves                     |
//! | 20      | releases                                |
//! | 24      | `input_len` seen by the echo converter  |
//! | 28      | `result_len_offset - result_offset`     |

#![allow(dead_code)]

use dwarf_bridge::{BridgeConfig, LinearModule, MemoryBridge};

pub const RESERVES: usize = 16;
pub const RELEASES: usize = 20;
pub const SEEN_INPUT_LEN: usize = 24;
pub const SEEN_LEN_FIELD_GAP: usize = 28;

/// Echoes its input.
pub const ECHO: &str = r#"
  (func (export "convert_dwarf") (param i32 i32 i32 i32)
    local.get 0
    local.get 1
    local.get 2
    local.get 3
    call $echo)
"#;

/// Grows memory by four pages before echoing.
pub const GROW_THEN_ECHO: &str = r#"
  (func (export "convert_dwarf") (param i32 i32 i32 i32)
    i32.const 4
    memory.grow
    drop
    local.get 0
    local.get 1
    local.get 2
    local.get 3
    call $echo)
"#;

/// Outputs a lone continuation byte.
pub const INVALID_UTF8: &str = r#"
  (func (export "convert_dwarf") (param i32 i32 i32 i32)
    i32.const 64
    i32.const 1
    local.get 2
    local.get 3
    call $emit)
"#;

/// Declares an output far past the end of memory.
pub const CORRUPT: &str = r#"
  (func (export "convert_dwarf") (param i32 i32 i32 i32)
    local.get 2
    i32.const 1024
    i32.store
    local.get 3
    i32.const 0x7fffffff
    i32.store)
"#;

/// Traps unconditionally.
pub const TRAP: &str = r#"
  (func (export "convert_dwarf") (param i32 i32 i32 i32)
    unreachable)
"#;

/// Flagged signature: rejects empty input, otherwise reports the flag.
pub const FLAGGED: &str = r#"
  (func (export "convert_dwarf")
    (param $in i32) (param $len i32) (param $out i32) (param $out_len i32)
    (param $x i32) (result i32)
    local.get $len
    i32.eqz
    if
      local.get $out_len
      i32.const 0
      i32.store
      i32.const 0
      return
    end
    local.get $x
    if
      i32.const 112
      i32.const 17
      local.get $out
      local.get $out_len
      call $emit
    else
      i32.const 80
      i32.const 18
      local.get $out
      local.get $out_len
      call $emit
    end
    i32.const 1)
"#;

/// Entry point with a signature the bridge does not know.
pub const WRONG_SIGNATURE: &str = r#"
  (func (export "convert_dwarf") (param i32))
"#;

/// Builds a converter module around `convert`.
///
/// `max_pages` caps memory growth, `reserve`/`release` name the allocator
/// exports.
pub fn module_with(
    convert: &str,
    max_pages: Option<u32>,
    reserve: &str,
    release: &str,
) -> Vec<u8> {
    let max = max_pages.map(|p| p.to_string()).unwrap_or_default();
    let wat = format!(
        r#"
(module
  (memory (export "memory") 1 {max})
  (global $next (mut i32) (i32.const 1024))

  (data (i32.const 64) "\80")
  (data (i32.const 80) "{{\"x_scopes\":false}}")
  (data (i32.const 112) "{{\"x_scopes\":true}}")

  (func $alloc (export "{reserve}") (param $size i32) (result i32)
    (local $ptr i32)
    (local $end i32)
    global.get $next
    local.set $ptr
    ;; end = align8(ptr + max(size, 1))
    local.get $ptr
    local.get $size
    local.get $size
    i32.eqz
    i32.add
    i32.add
    i32.const 7
    i32.add
    i32.const -8
    i32.and
    local.set $end
    block $fits
      local.get $end
      memory.size
      i32.const 16
      i32.shl
      i32.le_u
      br_if $fits
      local.get $end
      memory.size
      i32.const 16
      i32.shl
      i32.sub
      i32.const 65535
      i32.add
      i32.const 16
      i32.shr_u
      memory.grow
      i32.const -1
      i32.ne
      br_if $fits
      i32.const 0
      return
    end
    local.get $end
    global.set $next
    i32.const 16
    i32.const 16
    i32.load
    i32.const 1
    i32.add
    i32.store
    local.get $ptr)

  (func (export "{release}") (param $ptr i32)
    local.get $ptr
    i32.eqz
    if
      unreachable
    end
    i32.const 20
    i32.const 20
    i32.load
    i32.const 1
    i32.add
    i32.store)

  (func $emit
    (param $src i32) (param $n i32) (param $out i32) (param $out_len i32)
    (local $dst i32)
    local.get $n
    call $alloc
    local.set $dst
    local.get $dst
    local.get $src
    local.get $n
    memory.copy
    local.get $out
    local.get $dst
    i32.store
    local.get $out_len
    local.get $n
    i32.store)

  (func $echo
    (param $in i32) (param $len i32) (param $out i32) (param $out_len i32)
    i32.const 24
    local.get $len
    i32.store
    i32.const 28
    local.get $out_len
    local.get $out
    i32.sub
    i32.store
    local.get $in
    local.get $len
    local.get $out
    local.get $out_len
    call $emit)

  {convert}
)
"#
    );
    wat::parse_str(&wat).expect("test module should be valid WAT")
}

/// Builds a converter module with the default export names.
pub fn module(convert: &str) -> Vec<u8> {
    module_with(convert, None, "alloc_mem", "free_mem")
}

pub fn bridge(convert: &str) -> MemoryBridge {
    MemoryBridge::from_wasm(&module(convert), &BridgeConfig::default())
        .expect("test module should load")
}

/// Reads a little-endian word from the module's memory.
pub fn word(bridge: &MemoryBridge, at: usize) -> u32 {
    bridge.with_module(|m| {
        let bytes = &m.memory()[at..at + 4];
        u32::from_le_bytes(bytes.try_into().expect("four bytes"))
    })
}

/// (reserves, releases) as counted by the module allocator.
pub fn allocations(bridge: &MemoryBridge) -> (u32, u32) {
    (word(bridge, RESERVES), word(bridge, RELEASES))
}
