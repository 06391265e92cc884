// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Matrix (parameterized) subtests.
//!
//! A [`Matrix`] names a set of variants. Running it forks one subtest per
//! variant before the body sees anything, so variants share nothing but the
//! parent's decorations, which [`subtest::run`] rebuilds around each fresh
//! handle. Nested matrices are just a matrix run inside a variant's body.

use std::thread;

use crate::handle::Handle;
use crate::subtest;

/// Ordered, named test variants.
#[derive(Debug, Clone)]
pub struct Matrix<V> {
    variants: Vec<(String, V)>,
}

impl<V> Default for Matrix<V> {
    fn default() -> Self {
        Self { variants: Vec::new() }
    }
}

impl<V> Matrix<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add variant `name`. Variants run in insertion order.
    pub fn with(mut self, name: impl Into<String>, value: V) -> Self {
        self.variants.push((name.into(), value));
        self
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.variants.iter().map(|(name, _)| name.as_str())
    }
}

impl<V, N: Into<String>> FromIterator<(N, V)> for Matrix<V> {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        Self { variants: iter.into_iter().map(|(name, value)| (name.into(), value)).collect() }
    }
}

/// Run `body` once per variant, each as a subtest named after the variant.
///
/// Returns `true` if every variant passed.
pub fn run_matrix<V>(t: &Handle, matrix: Matrix<V>, body: impl Fn(Handle, V)) -> bool {
    let mut passed = true;
    for (name, value) in matrix.variants {
        passed &= subtest::run(t, &name, |t| body(t, value));
    }
    passed
}

/// Like [`run_matrix`], with every variant on its own thread.
///
/// Returns once all variants have finished.
pub fn run_parallel_matrix<V: Send>(
    t: &Handle,
    matrix: Matrix<V>,
    body: impl Fn(Handle, V) + Sync,
) -> bool {
    let body = &body;
    thread::scope(|scope| {
        let workers: Vec<_> = matrix
            .variants
            .into_iter()
            .map(|(name, value)| scope.spawn(move || subtest::run(t, &name, |t| body(t, value))))
            .collect();
        workers.into_iter().fold(true, |passed, worker| worker.join().unwrap_or(false) && passed)
    })
}

#[cfg(test)]
#[path = "matrix_tests.rs"]
mod tests;
