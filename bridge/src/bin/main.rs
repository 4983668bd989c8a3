// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) DUSK NETWORK. All rights reserved.

mod args;
mod config;
mod log;

use std::fs;
use std::io::{self, Write};

use anyhow::Context;
use clap::Parser;
use dwarf_bridge::MemoryBridge;
use tracing::info;

use crate::args::Args;
use crate::config::Config;
use crate::log::Log;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = Config::try_from(&args)?;

    let log = Log::new(config.log_level()?, config.log_filter());
    let log = match config.log_type()? {
        Some(format) => log.with_format(format.into()),
        None => log,
    };
    log.register()?;

    let wasm = fs::read(&args.module).with_context(|| {
        format!("reading module {}", args.module.display())
    })?;
    let bridge = MemoryBridge::from_wasm(&wasm, &config.bridge)
        .with_context(|| format!("loading {}", args.module.display()))?;

    let input = fs::read(&args.input)
        .with_context(|| format!("reading input {}", args.input.display()))?;
    let text = bridge
        .convert(&input)
        .with_context(|| format!("converting {}", args.input.display()))?;

    match &args.output {
        Some(path) => {
            fs::write(path, &text)
                .with_context(|| format!("writing {}", path.display()))?;
            info!(
                output = %path.display(),
                bytes = text.len(),
                "conversion written"
            );
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(text.as_bytes())?;
            stdout.flush()?;
        }
    }

    Ok(())
}
