// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Cancellation tied to the lifetime of a test.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;

use crate::handle::TestHandle;

/// Token that becomes cancelled when the test finishes, or earlier through
/// [`CancelToken::cancel`].
#[derive(Clone)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
    // Dropping the sender wakes every waiter.
    trigger: Arc<Mutex<Option<Sender<()>>>>,
    done: Receiver<()>,
}

impl CancelToken {
    pub fn new() -> Self {
        let (trigger, done) = crossbeam_channel::bounded(0);
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            trigger: Arc::new(Mutex::new(Some(trigger))),
            done,
        }
    }

    /// Cancel the token. Calling it again has no effect.
    pub fn cancel(&self) {
        let trigger = self.trigger.lock().take();
        if trigger.is_some() {
            self.cancelled.store(true, Ordering::SeqCst);
        }
        drop(trigger);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Block until the token is cancelled or `timeout` passes. Returns whether
    /// it was cancelled.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        if self.is_cancelled() {
            return true;
        }
        let _ = self.done.recv_timeout(timeout);
        self.is_cancelled()
    }

    /// Channel that disconnects on cancellation, for use in `select!`.
    pub fn done(&self) -> &Receiver<()> {
        &self.done
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Token cancelled automatically by a cleanup on `t`.
pub fn auto_cancel(t: &dyn TestHandle) -> CancelToken {
    let token = CancelToken::new();
    let on_cleanup = token.clone();
    t.cleanup(Box::new(move || on_cleanup.cancel()));
    token
}

#[cfg(test)]
#[path = "cancel_tests.rs"]
mod tests;
