// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) DUSK NETWORK. All rights reserved.

use std::str::FromStr;

use anyhow::Context;
use dwarf_bridge::BridgeConfig;
use serde::{Deserialize, Serialize};

use crate::args::Args;

/// Default log_level.
const DEFAULT_LOG_LEVEL: &str = "info";

/// Accepted log_type values.
pub(crate) const LOG_TYPES: [&str; 3] = ["coloured", "plain", "json"];

#[derive(Serialize, Deserialize, Clone, Default, Debug)]
pub(crate) struct Config {
    log_level: Option<String>,
    log_type: Option<String>,
    log_filter: Option<String>,

    #[serde(default)]
    pub(crate) bridge: BridgeConfig,
}

impl TryFrom<&Args> for Config {
    type Error = anyhow::Error;

    fn try_from(args: &Args) -> Result<Self, Self::Error> {
        let mut config = match &args.config {
            Some(path) => {
                let toml = std::fs::read_to_string(path).with_context(|| {
                    format!("reading config {}", path.display())
                })?;
                Self::from_toml(&toml)
                    .with_context(|| format!("parsing {}", path.display()))?
            }
            None => Config::default(),
        };

        // Overwrite config log-level
        if let Some(log_level) = args.log_level {
            config.log_level = Some(log_level.to_string());
        }

        // Overwrite config log-type
        if let Some(log_type) = &args.log_type {
            config.log_type = Some(log_type.into());
        }

        // Overwrite config log-filter
        if let Some(log_filter) = &args.log_filter {
            config.log_filter = Some(log_filter.into());
        }

        if args.x_scopes {
            config.bridge.x_scopes = true;
        }

        Ok(config)
    }
}

impl Config {
    pub(crate) fn from_toml(toml: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(toml)?;
        config.bridge.validate()?;
        Ok(config)
    }

    pub(crate) fn log_type(&self) -> anyhow::Result<Option<&str>> {
        match self.log_type.as_deref() {
            Some(t) if !LOG_TYPES.contains(&t) => Err(anyhow::anyhow!(
                "Invalid log-type specified '{t}' - expected one of {}",
                LOG_TYPES.join(", ")
            )),
            log_type => Ok(log_type),
        }
    }

    pub(crate) fn log_level(&self) -> anyhow::Result<tracing::Level> {
        let log_level = self.log_level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL);
        tracing::Level::from_str(log_level).map_err(|e| {
            anyhow::anyhow!("Invalid log-level specified '{log_level}' - {e}")
        })
    }

    pub(crate) fn log_filter(&self) -> String {
        self.log_filter.clone().unwrap_or_default()
    }
}
