// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Subtests through decorator chains.
//!
//! Only the innermost handle of a chain can actually spawn a subtest. [`run`]
//! unwraps the chain down to it, spawns the subtest, and rebuilds the same
//! decorations around the fresh handle before calling the body, so
//! buffering and prefixes set up by the parent carry into every subtest.

use crate::error::Error;
use crate::handle::{Handle, TestHandle, TestHandleExt};

/// A decorator that can be rebuilt around a different inner handle.
pub trait ReWrap {
    /// Equivalent decorator (same transform and configuration) around `inner`.
    fn rewrap(&self, inner: Handle) -> Handle;

    /// The immediately wrapped handle.
    fn inner(&self) -> Handle;
}

/// A handle that spawns subtests natively.
pub trait SubtestRunner {
    /// Run `body` as subtest `name` with a fresh handle. Returns whether the
    /// subtest passed (a skipped subtest counts as passed).
    fn run_subtest(&self, name: &str, body: &mut dyn FnMut(Handle)) -> bool;
}

/// Run `body` as subtest `name` of `t`, keeping `t`'s decorations.
///
/// Layers that cannot rewrap end the walk: whatever sits there must spawn the
/// subtest, and decorations between it and the caller are rebuilt. A layer that
/// only forwards [`TestHandle::as_runner`] is therefore missing from the
/// subtest's chain. If it cannot spawn subtests, one diagnostic is logged, `t`
/// fails, and `false` is returned.
pub fn run(t: &Handle, name: &str, body: impl FnOnce(Handle)) -> bool {
    let mut layers: Vec<Handle> = Vec::new();
    let mut current = t.clone();
    while current.as_runner().is_none() {
        let Some(inner) = current.as_rewrap().map(ReWrap::inner) else {
            break;
        };
        layers.push(std::mem::replace(&mut current, inner));
    }

    let Some(runner) = current.as_runner() else {
        let err = Error::Unsupported { capability: "Run", type_name: current.type_name() };
        tracing::warn!(test = %t.name(), "{err}");
        t.logf(format_args!("{err}"));
        t.fail();
        return false;
    };

    tracing::debug!(
        parent = %t.name(),
        subtest = name,
        layers = layers.len(),
        "spawning subtest through {}",
        current.type_name()
    );

    let mut body = Some(body);
    runner.run_subtest(name, &mut |fresh| {
        let wrapped = rewrap_layers(&layers, fresh);
        if let Some(body) = body.take() {
            body(wrapped);
        }
    })
}

/// Re-apply `layers` (outermost first) around `fresh`, innermost first.
pub fn rewrap_layers(layers: &[Handle], fresh: Handle) -> Handle {
    layers.iter().rev().fold(fresh, |inner, layer| match layer.as_rewrap() {
        Some(rewrap) => rewrap.rewrap(inner),
        None => inner,
    })
}

/// Walk a chain outward-to-inward through rewrap-capable layers, returning
/// the type name of each handle visited.
pub fn chain_types(t: &Handle) -> Vec<&'static str> {
    let mut types = vec![t.type_name()];
    let mut current = t.clone();
    while let Some(inner) = current.as_rewrap().map(ReWrap::inner) {
        types.push(inner.type_name());
        current = inner;
    }
    types
}

#[cfg(test)]
#[path = "subtest_tests.rs"]
mod tests;
