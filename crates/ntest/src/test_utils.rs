//! Shared unit test utilities.
//!
//! Provides a capturing mock handle for unit tests in the ntest crate.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::panic::Location;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use parking_lot::Mutex;

use crate::callsite::{CallSite, HelperId};
use crate::handle::{Cleanup, Handle, TestHandle};
use crate::native::{MemorySink, NativeHandle};

/// Handle that captures output as `file:line message` strings.
///
/// Locations are recorded exactly as received, without helper tracking, and
/// nothing stops the caller on `fail_now`/`skip_now`. Cleanups only run when
/// [`MockHandle::trigger_cleanup`] is called.
pub struct MockHandle {
    name: String,
    failed: AtomicBool,
    skipped: AtomicBool,
    cleanups: Mutex<Vec<Cleanup>>,
    captured: Mutex<Vec<String>>,
    marks: Mutex<Vec<HelperId>>,
    deadline: Option<Instant>,
}

impl MockHandle {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self::build(name, None))
    }

    pub fn with_deadline(name: &str, deadline: Instant) -> Arc<Self> {
        Arc::new(Self::build(name, Some(deadline)))
    }

    fn build(name: &str, deadline: Option<Instant>) -> Self {
        Self {
            name: name.to_string(),
            failed: AtomicBool::new(false),
            skipped: AtomicBool::new(false),
            cleanups: Mutex::new(Vec::new()),
            captured: Mutex::new(Vec::new()),
            marks: Mutex::new(Vec::new()),
            deadline,
        }
    }

    /// This mock as a chain handle.
    pub fn handle(self: &Arc<Self>) -> Handle {
        Arc::clone(self) as Handle
    }

    /// Every captured log call, in order.
    pub fn captured(&self) -> Vec<String> {
        self.captured.lock().clone()
    }

    /// Captured output split into individual lines.
    pub fn lines(&self) -> Vec<String> {
        self.captured.lock().iter().flat_map(|c| c.lines().map(str::to_string).collect::<Vec<_>>()).collect()
    }

    pub fn marks(&self) -> Vec<HelperId> {
        self.marks.lock().clone()
    }

    pub fn set_failed(&self) {
        self.failed.store(true, Ordering::SeqCst);
    }

    pub fn set_skipped(&self) {
        self.skipped.store(true, Ordering::SeqCst);
    }

    /// Run registered cleanups, newest first.
    pub fn trigger_cleanup(&self) {
        loop {
            let Some(cleanup) = self.cleanups.lock().pop() else {
                break;
            };
            cleanup();
        }
    }
}

impl TestHandle for MockHandle {
    fn log_at(&self, site: &'static Location<'static>, message: String) {
        let site = CallSite::from(site);
        self.captured.lock().push(format!("{site} {message}"));
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn failed(&self) -> bool {
        self.failed.load(Ordering::SeqCst)
    }

    fn skipped(&self) -> bool {
        self.skipped.load(Ordering::SeqCst)
    }

    fn fail(&self) {
        self.set_failed();
    }

    fn fail_now(&self) {
        self.set_failed();
    }

    fn skip_now(&self) {
        self.set_skipped();
    }

    fn cleanup(&self, f: Cleanup) {
        self.cleanups.lock().push(f);
    }

    fn mark_helper(&self, helper: HelperId) {
        self.marks.lock().push(helper);
    }

    fn deadline(&self) -> Option<Instant> {
        self.deadline
    }
}

/// Native handle writing to a fresh in-memory sink.
pub fn native(name: &str) -> (Arc<NativeHandle>, MemorySink) {
    let sink = MemorySink::new();
    (Arc::new(NativeHandle::new(name, Arc::new(sink.clone()))), sink)
}

/// Whether two handles are the same object.
pub fn same_handle(a: &Handle, b: &Handle) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}
