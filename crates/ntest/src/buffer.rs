// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Buffer-until-failure decorator.
//!
//! A [`BufferedLogger`] keeps every log line to itself while the test runs.
//! When the test finishes (its cleanup runs) the lines are written to the
//! wrapped handle as one block if the test failed or was skipped, and thrown
//! away if it passed. Each buffered line keeps the call site resolved at the
//! moment it was logged.
//!
//! If the wrapped handle knows its deadline, a watchdog thread flushes the
//! buffer shortly before it so output survives a timeout kill. Exactly one
//! flush happens per instance; lines logged after it are written through
//! immediately as `[<file:line>] <message>`, passed inward with the physical
//! site of the call. The tag keeps the user's line even on a handle that does
//! not resolve helpers; a handle that does shows the same site in front of it.

use std::panic::Location;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam_channel::{RecvTimeoutError, Sender};
use parking_lot::Mutex;

use crate::callsite::{self, CallSite, HelperId, HelperRegistry};
use crate::config::Config;
use crate::config::defaults::block;
use crate::handle::{Cleanup, Handle, TestHandle};
use crate::subtest::ReWrap;

/// One buffered log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferedLogEntry {
    pub message: String,
    pub site: CallSite,
}

/// What is asking for the flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    /// The test's cleanup ran; emit only for failed or skipped tests.
    Cleanup,
    /// The deadline is close; emit unconditionally.
    Deadline,
}

#[derive(Debug, Default)]
struct State {
    entries: Vec<BufferedLogEntry>,
    flushed: bool,
}

/// State shared between the decorator, its cleanup and its watchdog.
struct Shared {
    inner: Handle,
    helpers: HelperRegistry,
    state: Mutex<State>,
}

impl Shared {
    fn flush(&self, trigger: Trigger) {
        let mut state = self.state.lock();
        if state.flushed {
            return;
        }
        state.flushed = true;
        let entries = std::mem::take(&mut state.entries);

        let reason = match trigger {
            Trigger::Deadline => "test deadline approaching",
            Trigger::Cleanup if self.inner.failed() => "test failed",
            Trigger::Cleanup if self.inner.skipped() => "test skipped",
            Trigger::Cleanup => {
                tracing::debug!(
                    test = %self.inner.name(),
                    dropped = entries.len(),
                    "dropping buffered log entries (test passed)"
                );
                return;
            }
        };
        if entries.is_empty() {
            return;
        }

        // Emitted under the lock so write-through lines cannot overtake the block.
        self.inner.log_at(Location::caller(), render_block(reason, &entries));
    }
}

/// Format buffered entries as one delimited block, one `file:line message`
/// per entry.
pub fn render_block(reason: &str, entries: &[BufferedLogEntry]) -> String {
    let size: usize = entries.iter().map(|e| e.site.file.len() + e.message.len() + 9).sum();
    let mut out = String::with_capacity(size + 80);
    out.push_str(&block::header(reason));
    out.push('\n');
    for entry in entries {
        out.push_str(&format!("{} {}\n", entry.site, entry.message));
    }
    out.push_str(block::FOOTER);
    out
}

/// Background thread that flushes shortly before the test deadline.
struct Watchdog {
    cancel: Sender<()>,
    thread: JoinHandle<()>,
}

impl Watchdog {
    fn arm(shared: Arc<Shared>, fire_at: Instant) -> Option<Self> {
        let (cancel, cancelled) = crossbeam_channel::bounded::<()>(1);
        let name = shared.inner.name();
        let spawned = thread::Builder::new().name(format!("ntest-watchdog {name}")).spawn(move || {
            let wait = fire_at.saturating_duration_since(Instant::now());
            if let Err(RecvTimeoutError::Timeout) = cancelled.recv_timeout(wait) {
                tracing::debug!(test = %shared.inner.name(), "deadline approaching, flushing buffered logs");
                shared.flush(Trigger::Deadline);
            }
        });
        match spawned {
            Ok(thread) => Some(Self { cancel, thread }),
            Err(err) => {
                tracing::warn!(test = %name, "failed to start buffered log watchdog: {err}");
                None
            }
        }
    }

    /// Stop the watchdog (if it has not fired) and wait for its thread.
    fn disarm(self) {
        drop(self.cancel);
        if self.thread.join().is_err() {
            tracing::warn!("buffered log watchdog panicked");
        }
    }
}

/// Decorator that holds log output until the test fails or is skipped.
pub struct BufferedLogger {
    shared: Arc<Shared>,
    config: Config,
}

/// Wrap `t` in a [`BufferedLogger`].
///
/// With buffering disabled in `config`, `t` itself is returned.
pub fn buffered_logger(t: Handle, config: &Config) -> Handle {
    if !config.buffering_enabled() {
        return t;
    }
    BufferedLogger::wrap(t, config)
}

impl BufferedLogger {
    /// Wrap `t` unconditionally, arming the watchdog when `t` has a deadline.
    pub fn wrap(t: Handle, config: &Config) -> Arc<Self> {
        let shared = Arc::new(Shared {
            inner: Arc::clone(&t),
            helpers: HelperRegistry::new(),
            state: Mutex::new(State::default()),
        });

        let watchdog = t.deadline().and_then(|deadline| {
            let fire_at = deadline.checked_sub(config.watchdog_margin).unwrap_or_else(Instant::now);
            Watchdog::arm(Arc::clone(&shared), fire_at)
        });

        let flush_on_cleanup = Arc::clone(&shared);
        t.cleanup(Box::new(move || {
            if let Some(watchdog) = watchdog {
                watchdog.disarm();
            }
            flush_on_cleanup.flush(Trigger::Cleanup);
        }));

        tracing::trace!(test = %t.name(), "created buffered logger");
        Arc::new(Self { shared, config: config.clone() })
    }

    /// Number of lines waiting for the flush.
    pub fn pending(&self) -> usize {
        self.shared.state.lock().entries.len()
    }

    pub fn is_flushed(&self) -> bool {
        self.shared.state.lock().flushed
    }

    pub fn helpers(&self) -> &HelperRegistry {
        &self.shared.helpers
    }
}

impl TestHandle for BufferedLogger {
    fn log_at(&self, site: &'static Location<'static>, message: String) {
        let call_site = callsite::resolve(site, &self.shared.helpers);
        let mut state = self.shared.state.lock();
        if state.flushed {
            self.shared.inner.log_at(site, format!("[{call_site}] {message}"));
        } else {
            state.entries.push(BufferedLogEntry { message, site: call_site });
        }
    }

    fn name(&self) -> String {
        self.shared.inner.name()
    }

    fn failed(&self) -> bool {
        self.shared.inner.failed()
    }

    fn skipped(&self) -> bool {
        self.shared.inner.skipped()
    }

    fn fail(&self) {
        self.shared.inner.fail();
    }

    fn fail_now(&self) {
        self.shared.inner.fail_now();
    }

    fn skip_now(&self) {
        self.shared.inner.skip_now();
    }

    fn cleanup(&self, f: Cleanup) {
        self.shared.inner.cleanup(f);
    }

    fn mark_helper(&self, helper: HelperId) {
        if self.shared.helpers.mark(helper) {
            tracing::trace!(test = %self.shared.inner.name(), ?helper, "marked helper");
        }
        self.shared.inner.mark_helper(helper);
    }

    fn deadline(&self) -> Option<Instant> {
        self.shared.inner.deadline()
    }

    fn as_rewrap(&self) -> Option<&dyn ReWrap> {
        Some(self)
    }
}

impl ReWrap for BufferedLogger {
    fn rewrap(&self, inner: Handle) -> Handle {
        BufferedLogger::wrap(inner, &self.config)
    }

    fn inner(&self) -> Handle {
        Arc::clone(&self.shared.inner)
    }
}

#[cfg(test)]
#[path = "buffer_tests.rs"]
mod tests;
