// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) DUSK NETWORK. All rights reserved.

use std::path::PathBuf;

use clap::builder::PossibleValuesParser;
use clap::Parser;

use crate::config::LOG_TYPES;

#[derive(Parser, Debug)]
#[command(
    author = "Dusk Network B.V. All Rights Reserved.",
    version,
    about = "Runs a wasm-compiled DWARF converter over an input file"
)]
pub struct Args {
    /// Sets the configuration file path
    #[clap(long, short, env = "DWARF_BRIDGE_CONFIG_TOML", value_parser)]
    pub config: Option<PathBuf>,

    /// Output log level
    #[clap(long)]
    pub log_level: Option<tracing::Level>,

    // Change the log format accordingly
    #[clap(long, value_parser = PossibleValuesParser::new(LOG_TYPES))]
    pub log_type: Option<String>,

    /// Add log filter(s)
    #[clap(long)]
    pub log_filter: Option<String>,

    /// Converter module exporting memory, allocator and entry point
    #[clap(long, short, value_parser)]
    pub module: PathBuf,

    /// Request extended scope information from the converter
    #[clap(long)]
    pub x_scopes: bool,

    /// Write the converted text here instead of stdout
    #[clap(long, short, value_parser)]
    pub output: Option<PathBuf>,

    /// Input file handed to the converter
    #[clap(value_parser)]
    pub input: PathBuf,
}
