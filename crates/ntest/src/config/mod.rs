// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Wrapper configuration.
//!
//! A [`Config`] is built once (from the environment, a TOML file, or by hand)
//! and passed to the wrappers that need it. Wrappers never read the
//! environment themselves.

pub mod defaults;

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Deserializer};

use crate::error::{Error, Result};

/// Whether [`buffered_logger`](crate::buffered_logger) buffers at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Buffering {
    #[default]
    Enabled,
    /// Wrapping returns the original handle untouched.
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub buffering: Buffering,

    /// Lead time before the deadline at which the watchdog flushes.
    #[serde(
        default = "Config::default_watchdog_margin",
        rename = "watchdog_margin_ms",
        deserialize_with = "deserialize_millis"
    )]
    pub watchdog_margin: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self { buffering: Buffering::default(), watchdog_margin: Self::default_watchdog_margin() }
    }
}

impl Config {
    pub(crate) fn default_watchdog_margin() -> Duration {
        defaults::WATCHDOG_MARGIN
    }

    /// Config with buffering switched off.
    pub fn unbuffered() -> Self {
        Self { buffering: Buffering::Disabled, ..Self::default() }
    }

    pub fn buffering_enabled(&self) -> bool {
        self.buffering == Buffering::Enabled
    }

    /// Read `NTEST_BUFFERING` from the process environment.
    ///
    /// Unrecognized values are reported through `tracing` and leave buffering
    /// enabled.
    pub fn from_env() -> Self {
        let value = std::env::var(defaults::BUFFERING_ENV).ok();
        Self::from_env_value(value.as_deref()).unwrap_or_else(|err| {
            tracing::warn!("{err}; buffering stays enabled");
            Self::default()
        })
    }

    /// Build a config from the value of `NTEST_BUFFERING` (`None` if unset).
    pub fn from_env_value(value: Option<&str>) -> Result<Self> {
        let buffering = match value.map(str::trim) {
            None | Some("") => Buffering::Enabled,
            Some(v) if v.eq_ignore_ascii_case("true") || v == "1" => Buffering::Enabled,
            Some(v) if v.eq_ignore_ascii_case("false") || v == "0" => Buffering::Disabled,
            Some(v) => {
                return Err(Error::EnvValue { name: defaults::BUFFERING_ENV, value: v.to_string() });
            }
        };
        Ok(Self { buffering, ..Self::default() })
    }

    /// Parse a TOML config document.
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load a TOML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|source| Error::Io { path: path.to_path_buf(), source })?;
        Self::parse(&content)
    }
}

fn deserialize_millis<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Duration, D::Error> {
    u64::deserialize(deserializer).map(Duration::from_millis)
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
