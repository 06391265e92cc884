// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The capability trait every wrapper operates on and conforms to.
//!
//! [`TestHandle`] is deliberately small and object safe: decorators hold the
//! next-inner handle as a [`Handle`] and forward whatever they do not change.
//! User code talks to handles through [`TestHandleExt`], whose methods are
//! `#[track_caller]` so the physical call site is captured before any dynamic
//! dispatch happens.

use std::fmt;
use std::panic::Location;
use std::sync::Arc;
use std::time::Instant;

use crate::callsite::{self, HelperId};
use crate::subtest::{ReWrap, SubtestRunner};

/// Shared, dynamically dispatched test handle.
pub type Handle = Arc<dyn TestHandle>;

/// Function registered to run when the test finishes.
pub type Cleanup = Box<dyn FnOnce() + Send + 'static>;

/// Minimal interaction surface of one running test.
pub trait TestHandle: Send + Sync {
    /// Emit (or otherwise consume) `message`, logged from `site`.
    ///
    /// `site` is the physical location of the log call. Implementations that
    /// report locations resolve it through [`callsite::resolve`] so helper
    /// frames are skipped.
    fn log_at(&self, site: &'static Location<'static>, message: String);

    /// Full name of the test, subtests joined with `/`.
    fn name(&self) -> String;

    fn failed(&self) -> bool;

    fn skipped(&self) -> bool;

    /// Mark the test failed and keep running.
    fn fail(&self);

    /// Mark the test failed and stop the test body when the handle can.
    fn fail_now(&self);

    /// Mark the test skipped and stop the test body when the handle can.
    fn skip_now(&self);

    /// Register `f` to run when the test finishes. Cleanups run last-in first-out.
    fn cleanup(&self, f: Cleanup);

    /// Record `helper` as plumbing for call-site attribution.
    ///
    /// Wrappers forward the mark inward so every layer that resolves call
    /// sites learns about it.
    fn mark_helper(&self, helper: HelperId);

    /// Point in time at which the test will be killed, if known.
    fn deadline(&self) -> Option<Instant> {
        None
    }

    /// Rewrap capability, if this handle is a re-homeable decorator.
    fn as_rewrap(&self) -> Option<&dyn ReWrap> {
        None
    }

    /// Native subtest spawning, if this handle can start subtests itself.
    fn as_runner(&self) -> Option<&dyn SubtestRunner> {
        None
    }

    /// Concrete type, for diagnostics about unsupported compositions.
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Caller-facing helpers available on every [`TestHandle`].
pub trait TestHandleExt {
    /// Log the `Display` form of each value, separated by single spaces.
    #[track_caller]
    fn log(&self, values: &[&dyn fmt::Display]);

    /// Log a formatted message.
    #[track_caller]
    fn logf(&self, args: fmt::Arguments<'_>);

    /// Log the values and mark the test failed.
    #[track_caller]
    fn error(&self, values: &[&dyn fmt::Display]);

    /// Log a formatted message and mark the test failed.
    #[track_caller]
    fn errorf(&self, args: fmt::Arguments<'_>);

    /// Log the values and stop the test as failed.
    #[track_caller]
    fn fatal(&self, values: &[&dyn fmt::Display]);

    /// Log a formatted message and stop the test as failed.
    #[track_caller]
    fn fatalf(&self, args: fmt::Arguments<'_>);

    /// Log the values and stop the test as skipped.
    #[track_caller]
    fn skip(&self, values: &[&dyn fmt::Display]);

    /// Log a formatted message and stop the test as skipped.
    #[track_caller]
    fn skipf(&self, args: fmt::Arguments<'_>);

    /// Run `f` as a helper.
    ///
    /// Lines logged through the scope handed to `f` are attributed to the
    /// caller of `helper`. Lines logged any other way, including by functions
    /// `f` calls with the original handle, keep their own call site.
    #[track_caller]
    fn helper<R>(&self, f: impl FnOnce(&HelperScope<'_, Self>) -> R) -> R;
}

impl<T: TestHandle + ?Sized> TestHandleExt for T {
    #[track_caller]
    fn log(&self, values: &[&dyn fmt::Display]) {
        self.log_at(Location::caller(), join_values(values));
    }

    #[track_caller]
    fn logf(&self, args: fmt::Arguments<'_>) {
        self.log_at(Location::caller(), args.to_string());
    }

    #[track_caller]
    fn error(&self, values: &[&dyn fmt::Display]) {
        self.log_at(Location::caller(), join_values(values));
        self.fail();
    }

    #[track_caller]
    fn errorf(&self, args: fmt::Arguments<'_>) {
        self.log_at(Location::caller(), args.to_string());
        self.fail();
    }

    #[track_caller]
    fn fatal(&self, values: &[&dyn fmt::Display]) {
        self.log_at(Location::caller(), join_values(values));
        self.fail_now();
    }

    #[track_caller]
    fn fatalf(&self, args: fmt::Arguments<'_>) {
        self.log_at(Location::caller(), args.to_string());
        self.fail_now();
    }

    #[track_caller]
    fn skip(&self, values: &[&dyn fmt::Display]) {
        self.log_at(Location::caller(), join_values(values));
        self.skip_now();
    }

    #[track_caller]
    fn skipf(&self, args: fmt::Arguments<'_>) {
        self.log_at(Location::caller(), args.to_string());
        self.skip_now();
    }

    #[track_caller]
    fn helper<R>(&self, f: impl FnOnce(&HelperScope<'_, Self>) -> R) -> R {
        let entry = Location::caller();
        let id = HelperId::of(entry);
        self.mark_helper(id);
        f(&HelperScope::new(self, id, entry))
    }
}

/// Borrowed view of a handle used by helper code.
///
/// Each line logged through the scope opens a logical frame owning that log
/// call, so handles that know `helper` report `entry` instead. See
/// [`callsite`] for the walk.
pub struct HelperScope<'a, T: ?Sized> {
    inner: &'a T,
    helper: HelperId,
    entry: &'static Location<'static>,
}

impl<'a, T: TestHandle + ?Sized> HelperScope<'a, T> {
    pub fn new(inner: &'a T, helper: HelperId, entry: &'static Location<'static>) -> Self {
        Self { inner, helper, entry }
    }

    pub fn helper_id(&self) -> HelperId {
        self.helper
    }

    /// Where the helper was called from.
    pub fn entry(&self) -> &'static Location<'static> {
        self.entry
    }
}

impl<T: TestHandle + ?Sized> TestHandle for HelperScope<'_, T> {
    fn log_at(&self, site: &'static Location<'static>, message: String) {
        let _frame = callsite::enter(self.helper, site, self.entry);
        self.inner.log_at(site, message);
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

    fn type_name(&self) -> &'static str {
        self.inner.type_name()
    }
}

/// Space-join values the way `Log` formats its operands.
pub(crate) fn join_values(values: &[&dyn fmt::Display]) -> String {
    let mut message = String::new();
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            message.push(' ');
        }
        message.push_str(&value.to_string());
    }
    message
}

#[cfg(test)]
#[path = "handle_tests.rs"]
mod tests;
