// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) DUSK NETWORK. All rights reserved.

use std::io::{self, Stderr};

use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::fmt::format::{DefaultFields, Format};
use tracing_subscriber::fmt::SubscriberBuilder;
use tracing_subscriber::EnvFilter;

type StderrWriter = fn() -> Stderr;

/// Global `tracing` subscriber setup.
///
/// Events always go to stderr, stdout carries the converted text.
pub struct Log {
    level: tracing::Level,
    filter: String,
    format: Option<String>,
}

impl Log {
    pub fn new(level: tracing::Level, filter: String) -> Self {
        Self {
            level,
            filter,
            format: None,
        }
    }

    pub fn with_format(mut self, format: String) -> Self {
        self.format = Some(format);
        self
    }

    fn subscriber(
        &self,
    ) -> SubscriberBuilder<DefaultFields, Format, EnvFilter, StderrWriter> {
        tracing_subscriber::fmt::Subscriber::builder()
            .with_env_filter(
                EnvFilter::new(self.filter.as_str())
                    .add_directive(self.level.into()),
            )
            .with_writer(io::stderr as StderrWriter)
    }

    pub fn register(self) -> Result<(), SetGlobalDefaultError> {
        match self.format.clone() {
            Some(format) => self.register_format(&format),
            None => self.register_simple(),
        }
    }

    fn register_simple(self) -> Result<(), SetGlobalDefaultError> {
        let subscriber = self
            .subscriber()
            .with_level(false)
            .without_time()
            .with_target(false)
            .finish();
        tracing::subscriber::set_global_default(subscriber)
    }

    fn register_format(
        self,
        log_format: &str,
    ) -> Result<(), SetGlobalDefaultError> {
        let subscriber = self.subscriber();
        match log_format {
            "json" => {
                let subscriber = subscriber
                    .json()
                    .with_current_span(false)
                    .flatten_event(true)
                    .finish();
                tracing::subscriber::set_global_default(subscriber)
            }
            "plain" => {
                let subscriber = subscriber.with_ansi(false).finish();
                tracing::subscriber::set_global_default(subscriber)
            }
            _ => {
                let subscriber = subscriber.finish();
                tracing::subscriber::set_global_default(subscriber)
            }
        }
    }
}
