// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Call-site resolution across decorator chains.
//!
//! Physical locations come from `#[track_caller]`: every log entry point on a
//! handle captures where it was called from. That alone is exact as long as
//! the call comes straight from user code. When a decorator runs a transform
//! closure that logs on the next-inner handle, the physical location is the
//! closure body, which is plumbing.
//!
//! Decorators therefore describe their plumbing as logical frames. Helper
//! code logs through a scope handle, and each line logged through it opens a
//! frame `{helper, owned, entry}` on a thread-local stack while the line
//! travels inward: `helper` identifies the helper, `owned` is the physical
//! location of that log call and `entry` is where the helper itself was
//! called from. Resolution starts at the physical location and walks
//! outward: while the innermost remaining frame owns the current location and
//! its helper is registered, the walk steps out to the frame's entry site.
//! The first location not owned by a registered helper is the call site, so
//! a plain function called from inside a helper keeps its own line.
//!
//! Registration is per resolving handle (see [`HelperRegistry`]), so a handle
//! that never heard of a transform reports the transform's own line.

use std::cell::RefCell;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::panic::Location;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashSet;

/// Deepest chain of logical frames the resolver will walk.
pub const MAX_FRAMES: usize = 32;

/// Source file (base name only) and 1-based line of a log call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallSite {
    pub file: String,
    pub line: u32,
}

impl CallSite {
    /// Sentinel used when the stack could not be walked.
    pub fn unknown() -> Self {
        Self { file: "unknown".to_string(), line: 0 }
    }

    pub fn is_unknown(&self) -> bool {
        self.line == 0 && self.file == "unknown"
    }
}

impl From<&Location<'_>> for CallSite {
    fn from(location: &Location<'_>) -> Self {
        let file = Path::new(location.file())
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| location.file().to_string());
        Self { file, line: location.line() }
    }
}

impl fmt::Display for CallSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// Identity of a helper: a decorator transform or a user helper scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HelperId(u64);

static NEXT_HELPER: AtomicU64 = AtomicU64::new(1);

impl HelperId {
    /// Allocate a fresh identity.
    pub fn next() -> Self {
        // Location-derived ids have the top bit set, so the two never collide.
        Self(NEXT_HELPER.fetch_add(1, Ordering::Relaxed) & !(1 << 63))
    }

    /// Identity derived from a source location, stable across calls.
    pub fn of(location: &Location<'_>) -> Self {
        let mut hasher = DefaultHasher::new();
        location.file().hash(&mut hasher);
        location.line().hash(&mut hasher);
        location.column().hash(&mut hasher);
        Self(hasher.finish() | (1 << 63))
    }
}

/// Set of helper identities marked on one handle.
///
/// Marks are never removed for the lifetime of the registry.
#[derive(Debug, Default)]
pub struct HelperRegistry {
    helpers: DashSet<HelperId>,
}

impl HelperRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `helper`. Returns `true` the first time it is seen.
    pub fn mark(&self, helper: HelperId) -> bool {
        if self.helpers.contains(&helper) {
            return false;
        }
        self.helpers.insert(helper)
    }

    pub fn is_helper(&self, helper: HelperId) -> bool {
        self.helpers.contains(&helper)
    }

    pub fn len(&self) -> usize {
        self.helpers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.helpers.is_empty()
    }
}

/// One open logical frame: `helper` logged from `owned`, and was itself
/// entered from `entry`.
#[derive(Debug, Clone, Copy)]
struct Frame {
    helper: HelperId,
    owned: &'static Location<'static>,
    entry: &'static Location<'static>,
}

thread_local! {
    static FRAMES: RefCell<Vec<Frame>> = const { RefCell::new(Vec::new()) };
}

/// Guard for an open frame; closes it on drop, including during unwinding.
#[must_use = "the frame closes as soon as the guard is dropped"]
pub struct FrameGuard {
    depth: usize,
}

impl Drop for FrameGuard {
    fn drop(&mut self) {
        let _ = FRAMES.try_with(|frames| frames.borrow_mut().truncate(self.depth));
    }
}

/// Open a frame on the current thread: `helper`, entered from `entry`, is
/// logging from `owned`.
pub fn enter(
    helper: HelperId,
    owned: &'static Location<'static>,
    entry: &'static Location<'static>,
) -> FrameGuard {
    let depth = FRAMES
        .try_with(|frames| {
            let mut frames = frames.borrow_mut();
            frames.push(Frame { helper, owned, entry });
            frames.len() - 1
        })
        .unwrap_or(usize::MAX);
    FrameGuard { depth }
}

/// Number of frames currently open on this thread.
pub fn depth() -> usize {
    FRAMES.try_with(|frames| frames.borrow().len()).unwrap_or(0)
}

/// Resolve the call site for a log issued at `physical`.
///
/// Frames that own the location reached so far and whose helper is
/// registered in `helpers` are skipped. Returns
/// [`CallSite::unknown`] if the frame stack is unavailable or deeper than
/// [`MAX_FRAMES`] without reaching a non-helper location.
pub fn resolve(physical: &'static Location<'static>, helpers: &HelperRegistry) -> CallSite {
    FRAMES
        .try_with(|frames| {
            let frames = frames.borrow();
            let mut site = physical;
            for (walked, frame) in frames.iter().rev().enumerate() {
                if walked >= MAX_FRAMES {
                    tracing::trace!("call-site walk exceeded {} frames", MAX_FRAMES);
                    return CallSite::unknown();
                }
                if *frame.owned != *site || !helpers.is_helper(frame.helper) {
                    return CallSite::from(site);
                }
                site = frame.entry;
            }
            CallSite::from(site)
        })
        .unwrap_or_else(|_| CallSite::unknown())
}

#[cfg(test)]
#[path = "callsite_tests.rs"]
mod tests;
