// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Composable wrappers around a test handle.
//!
//! A test body receives a [`Handle`] and may wrap it in decorators that change
//! how its output behaves:
//!
//! - [`replace_logger`] / [`extra_detail_logger`] rewrite every message
//! - [`buffered_logger`] holds output back until the test fails or is skipped
//!
//! Whatever the stack of decorators looks like, log lines are attributed to the
//! file and line of the user's own call, not to decorator plumbing. See
//! [`callsite`] for how that attribution is resolved.
//!
//! ```ignore
//! use ntest::{Config, TestHandleExt, buffered_logger, extra_detail_logger, t_logf};
//!
//! #[test]
//! fn talks_only_on_failure() {
//!     ntest::run_test("talks_only_on_failure", |t| {
//!         let t = extra_detail_logger(buffered_logger(t, &Config::from_env()), "db");
//!         t_logf!(t, "connecting to {}", "localhost");
//!     });
//! }
//! ```

pub mod buffer;
pub mod callsite;
pub mod cancel;
pub mod config;
pub mod demo;
pub mod error;
pub mod handle;
pub mod logger;
pub mod matrix;
pub mod native;
pub mod subtest;

#[cfg(test)]
pub mod test_utils;

pub use buffer::{BufferedLogEntry, BufferedLogger, buffered_logger};
pub use callsite::{CallSite, HelperId, HelperRegistry};
pub use cancel::{CancelToken, auto_cancel};
pub use config::{Buffering, Config};
pub use error::{Error, Result};
pub use handle::{Cleanup, Handle, HelperScope, TestHandle, TestHandleExt};
pub use logger::{ReplaceLogger, extra_detail_logger, replace_logger};
pub use matrix::{Matrix, run_matrix, run_parallel_matrix};
pub use native::{MemorySink, NativeHandle, Outcome, Sink, StderrSink, StdoutSink, run_test};
pub use subtest::{ReWrap, SubtestRunner};

/// Log the space-separated `Display` form of each value on a test handle.
///
/// Attributed to the line of the macro invocation.
#[macro_export]
macro_rules! t_log {
    ($t:expr, $($value:expr),+ $(,)?) => {{
        use $crate::TestHandleExt as _;
        $t.log(&[$(&$value as &dyn ::std::fmt::Display),+])
    }};
}

/// Log a `format!`-style message on a test handle.
///
/// Attributed to the line of the macro invocation.
#[macro_export]
macro_rules! t_logf {
    ($t:expr, $($arg:tt)+) => {{
        use $crate::TestHandleExt as _;
        $t.logf(::std::format_args!($($arg)+))
    }};
}
