// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized default values for configuration.

use std::time::Duration;

/// Environment variable that switches buffering off when set to `false`.
pub const BUFFERING_ENV: &str = "NTEST_BUFFERING";

/// Environment variable naming a TOML config file for the `ntest` binary.
pub const CONFIG_ENV: &str = "NTEST_CONFIG";

/// Environment variable holding the `tracing` filter for the `ntest` binary.
pub const LOG_ENV: &str = "NTEST_LOG";

/// How long before the test deadline the watchdog flushes buffered output (5s).
pub const WATCHDOG_MARGIN: Duration = Duration::from_secs(5);

/// Buffered output block delimiters.
pub mod block {
    pub const FOOTER: &str = "=== End Buffered Log Output ===";

    pub fn header(reason: &str) -> String {
        format!("=== Buffered Log Output ({reason}) ===")
    }
}
