// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Replace-logger decorator.
//!
//! Every message logged on a [`ReplaceLogger`] is handed to a transform
//! instead of the wrapped handle. The transform usually forwards to the
//! wrapped handle after rewriting the message, which is how
//! [`extra_detail_logger`] adds its prefix and timestamp.
//!
//! The transform is handed a [`HelperScope`] over the wrapped handle. Lines it
//! logs there are attributed to the caller of the outer `log`; lines it logs
//! on some other handle it captured keep the transform's own line.

use std::panic::Location;
use std::sync::Arc;
use std::time::Instant;

use crate::callsite::HelperId;
use crate::handle::{Cleanup, Handle, HelperScope, TestHandle, TestHandleExt};
use crate::subtest::ReWrap;

/// Message transform. Receives a helper scope over the wrapped handle and the
/// formatted message.
pub type Transform = Arc<dyn Fn(&dyn TestHandle, &str) + Send + Sync>;

/// Decorator that routes log output through a [`Transform`].
pub struct ReplaceLogger {
    inner: Handle,
    transform: Transform,
    helper: HelperId,
}

/// Wrap `t` so its log output goes through `transform`.
///
/// The transform runs as a helper: lines it logs on the handle it is given
/// are attributed to the caller of the outer `log`, not to the transform.
/// Nested closures keep that attribution as long as they log on that handle.
///
/// ```ignore
/// let t = replace_logger(t, |inner, s| t_logf!(inner, "PREFIX {s}"));
/// ```
pub fn replace_logger(
    t: Handle,
    transform: impl Fn(&dyn TestHandle, &str) + Send + Sync + 'static,
) -> Handle {
    Arc::new(ReplaceLogger::new(t, Arc::new(transform)))
}

/// Wrap `t` so every line reads `"<prefix> <HH:MM:SS> <message>"`.
pub fn extra_detail_logger(t: Handle, prefix: &str) -> Handle {
    let prefix = prefix.to_string();
    replace_logger(t, move |inner, message| {
        let now = chrono::Local::now().format("%H:%M:%S");
        inner.logf(format_args!("{prefix} {now} {message}"));
    })
}

impl ReplaceLogger {
    pub fn new(inner: Handle, transform: Transform) -> Self {
        Self { inner, transform, helper: HelperId::next() }
    }

    /// Identity under which the transform is marked as a helper.
    pub fn helper_id(&self) -> HelperId {
        self.helper
    }
}

impl TestHandle for ReplaceLogger {
    fn log_at(&self, site: &'static Location<'static>, message: String) {
        self.inner.mark_helper(self.helper);
        let scope = HelperScope::new(&*self.inner, self.helper, site);
        (self.transform)(&scope, &message);
    }

    fn name(&self) -> String {
        self.inner.name()
    }

    fn failed(&self) -> bool {
        self.inner.failed()
    }

    fn skipped(&self) -> bool {
        self.inner.skipped()
    }

    fn fail(&self) {
        self.inner.fail();
    }

    fn fail_now(&self) {
        self.inner.fail_now();
    }

    fn skip_now(&self) {
        self.inner.skip_now();
    }

    fn cleanup(&self, f: Cleanup) {
        self.inner.cleanup(f);
    }

    fn mark_helper(&self, helper: HelperId) {
        self.inner.mark_helper(helper);
    }

    fn deadline(&self) -> Option<Instant> {
        self.inner.deadline()
    }

    fn as_rewrap(&self) -> Option<&dyn ReWrap> {
        Some(self)
    }
}

impl ReWrap for ReplaceLogger {
    fn rewrap(&self, inner: Handle) -> Handle {
        Arc::new(Self { inner, transform: Arc::clone(&self.transform), helper: self.helper })
    }

    fn inner(&self) -> Handle {
        Arc::clone(&self.inner)
    }
}

#[cfg(test)]
#[path = "logger_tests.rs"]
mod tests;
