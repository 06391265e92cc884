// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types.
//!
//! Nothing here is ever returned into a test body: decorators turn
//! unsupported compositions into a logged diagnostic plus a failed test.
//! Errors are returned only from configuration loading.

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A capability was requested from a handle that does not provide it.
    #[error("{capability} is not supported by the wrapped handle type {type_name}")]
    Unsupported { capability: &'static str, type_name: &'static str },

    #[error("invalid config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("invalid {name} value {value:?}: expected true or false")]
    EnvValue { name: &'static str, value: String },

    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
