// Copyright 2024 Paul Adamson
// Licensed under the Apache License, Version 2.0

//! Client connection configuration.

use iso_protocol::keys::DEFAULT_PREFIX;

/// Connection settings for [`Client::connect`].
///
/// Environment/credential loading is deliberately left to the caller; this
/// is just the resolved endpoint plus the key-space prefix.
///
/// [`Client::connect`]: crate::Client::connect
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Broker URL, e.g. `redis://localhost:6379` or `rediss://...` for TLS.
    pub url: String,
    /// Key-space prefix shared with the workers.
    pub prefix: String,
}

impl Config {
    /// Creates a config for the given broker URL with the default prefix.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            prefix: DEFAULT_PREFIX.to_string(),
        }
    }

    /// Overrides the key-space prefix. Must match what the workers use.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }
}
