// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Native test handle: the host side of the [`TestHandle`] contract.
//!
//! Rust's test harness has no per-test object, so this module provides one.
//! A [`NativeHandle`] tracks failure and skip state, runs cleanups in LIFO
//! order when the test finishes, resolves call sites for its own output and
//! spawns subtests.
//!
//! `fail_now` and `skip_now` stop the body by unwinding with a private marker
//! payload, which the runner recognizes and swallows. Any other panic in the
//! body or a cleanup fails the test.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe, Location};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use parking_lot::Mutex;

use crate::callsite::{self, CallSite, HelperId, HelperRegistry};
use crate::handle::{Cleanup, Handle, TestHandle};
use crate::subtest::SubtestRunner;

/// One line (possibly multi-line message) of test output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub test: String,
    pub site: CallSite,
    pub message: String,
}

impl LogRecord {
    /// Indented `file:line: message` form, continuation lines indented further.
    pub fn render(&self) -> String {
        let mut out = format!("    {}: ", self.site);
        for (i, line) in self.message.trim_end_matches('\n').lines().enumerate() {
            if i > 0 {
                out.push_str("\n        ");
            }
            out.push_str(line);
        }
        out
    }
}

/// Final state of a finished test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub name: String,
    pub failed: bool,
    pub skipped: bool,
}

impl Outcome {
    pub fn passed(&self) -> bool {
        !self.failed
    }

    /// `PASS`, `FAIL` or `SKIP`.
    pub fn status(&self) -> &'static str {
        if self.failed {
            "FAIL"
        } else if self.skipped {
            "SKIP"
        } else {
            "PASS"
        }
    }
}

/// Destination for test output.
pub trait Sink: Send + Sync {
    fn write(&self, record: &LogRecord);

    /// Called once per finished test or subtest.
    fn finished(&self, _outcome: &Outcome) {}
}

/// Writes to stderr, where libtest captures it per test.
pub struct StderrSink;

impl Sink for StderrSink {
    fn write(&self, record: &LogRecord) {
        eprintln!("{}", record.render());
    }

    fn finished(&self, outcome: &Outcome) {
        eprintln!("--- {}: {}", outcome.status(), outcome.name);
    }
}

/// Writes to stdout.
pub struct StdoutSink;

impl Sink for StdoutSink {
    fn write(&self, record: &LogRecord) {
        println!("{}", record.render());
    }

    fn finished(&self, outcome: &Outcome) {
        println!("--- {}: {}", outcome.status(), outcome.name);
    }
}

/// Keeps records in memory for inspection.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<LogRecord>>>,
    outcomes: Arc<Mutex<Vec<Outcome>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().clone()
    }

    /// Every message line, split on newlines, in emission order.
    pub fn lines(&self) -> Vec<String> {
        self.records
            .lock()
            .iter()
            .flat_map(|r| r.message.lines().map(str::to_string).collect::<Vec<_>>())
            .collect()
    }

    pub fn outcomes(&self) -> Vec<Outcome> {
        self.outcomes.lock().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl Sink for MemorySink {
    fn write(&self, record: &LogRecord) {
        self.records.lock().push(record.clone());
    }

    fn finished(&self, outcome: &Outcome) {
        self.outcomes.lock().push(outcome.clone());
    }
}

/// Unwind payload used by `fail_now` and `skip_now`.
struct Stop;

pub struct NativeHandle {
    name: String,
    failed: AtomicBool,
    skipped: AtomicBool,
    cleanups: Mutex<Vec<Cleanup>>,
    helpers: HelperRegistry,
    deadline: Option<Instant>,
    sink: Arc<dyn Sink>,
}

impl NativeHandle {
    pub fn new(name: impl Into<String>, sink: Arc<dyn Sink>) -> Self {
        Self {
            name: name.into(),
            failed: AtomicBool::new(false),
            skipped: AtomicBool::new(false),
            cleanups: Mutex::new(Vec::new()),
            helpers: HelperRegistry::new(),
            deadline: None,
            sink,
        }
    }

    /// Set the point in time at which the test is considered timed out.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Run `body` on this handle, then finish the test.
    pub fn run(self: Arc<Self>, body: impl FnOnce(Handle)) -> Outcome {
        let handle: Handle = self.clone();
        self.execute(move || body(handle));
        self.finish()
    }

    /// Run pending cleanups, report the outcome to the sink and return it.
    pub fn finish(&self) -> Outcome {
        self.run_cleanups();
        let outcome = self.outcome();
        self.sink.finished(&outcome);
        outcome
    }

    pub fn outcome(&self) -> Outcome {
        Outcome { name: self.name.clone(), failed: self.failed(), skipped: self.skipped() }
    }

    /// Run registered cleanups, newest first, including any registered while
    /// cleaning up.
    pub fn run_cleanups(&self) {
        loop {
            let Some(cleanup) = self.cleanups.lock().pop() else {
                break;
            };
            self.execute(cleanup);
        }
    }

    fn execute(&self, f: impl FnOnce()) {
        match panic::catch_unwind(AssertUnwindSafe(f)) {
            Ok(()) => {}
            Err(payload) if payload.is::<Stop>() => {}
            Err(payload) => {
                self.failed.store(true, Ordering::SeqCst);
                self.emit(CallSite::unknown(), format!("panic: {}", panic_message(&*payload)));
            }
        }
    }

    fn emit(&self, site: CallSite, message: String) {
        self.sink.write(&LogRecord { test: self.name.clone(), site, message });
    }

    fn stop() -> ! {
        panic::resume_unwind(Box::new(Stop))
    }
}

impl TestHandle for NativeHandle {
    fn log_at(&self, site: &'static Location<'static>, message: String) {
        self.emit(callsite::resolve(site, &self.helpers), message);
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
        self.failed.store(true, Ordering::SeqCst);
    }

    fn fail_now(&self) {
        self.fail();
        Self::stop();
    }

    fn skip_now(&self) {
        self.skipped.store(true, Ordering::SeqCst);
        Self::stop();
    }

    fn cleanup(&self, f: Cleanup) {
        self.cleanups.lock().push(f);
    }

    fn mark_helper(&self, helper: HelperId) {
        if self.helpers.mark(helper) {
            tracing::trace!(test = %self.name, ?helper, "marked helper");
        }
    }

    fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    fn as_runner(&self) -> Option<&dyn SubtestRunner> {
        Some(self)
    }
}

impl SubtestRunner for NativeHandle {
    fn run_subtest(&self, name: &str, body: &mut dyn FnMut(Handle)) -> bool {
        let mut child = NativeHandle::new(format!("{}/{}", self.name, name), Arc::clone(&self.sink));
        child.deadline = self.deadline;
        let outcome = Arc::new(child).run(|handle| body(handle));
        if outcome.failed {
            self.fail();
        }
        outcome.passed()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Run `body` as test `name` with output on stderr.
///
/// Panics if the test failed, so the surrounding `#[test]` fails with it.
#[allow(clippy::panic)] // libtest only observes failure through a panic
pub fn run_test(name: &str, body: impl FnOnce(Handle)) -> Outcome {
    let outcome = Arc::new(NativeHandle::new(name, Arc::new(StderrSink))).run(body);
    if outcome.failed {
        panic!("test {name} failed");
    }
    outcome
}

#[cfg(test)]
#[path = "native_tests.rs"]
mod tests;
