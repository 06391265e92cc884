// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Unit tests for subtests through decorator chains.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::sync::Arc;

use parking_lot::Mutex;

use super::*;
use crate::buffer::buffered_logger;
use crate::config::Config;
use crate::logger::{extra_detail_logger, replace_logger};
use crate::test_utils::{MockHandle, native};
use crate::{t_log, t_logf};

#[test]
fn native_subtest_gets_fresh_named_handle() {
    let (host, sink) = native("root");
    let names = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&names);
    let outcome = host.run(|t| {
        assert!(run(&t, "inner", |t| seen.lock().push(t.name())));
    });
    assert!(outcome.passed());
    assert_eq!(*names.lock(), vec!["root/inner"]);

    let finished: Vec<_> = sink.outcomes().into_iter().map(|o| o.name).collect();
    assert_eq!(finished, vec!["root/inner", "root"]);
}

#[test]
fn failing_subtest_fails_parent() {
    let (host, _sink) = native("root");
    let outcome = host.run(|t| {
        assert!(!run(&t, "broken", |t| t.fail()));
        assert!(t.failed());
    });
    assert!(outcome.failed);
}

#[test]
fn skipped_subtest_counts_as_passed() {
    let (host, _sink) = native("root");
    let outcome = host.run(|t| {
        assert!(run(&t, "skipped", |t| t.skipf(format_args!("not here"))));
    });
    assert!(outcome.passed());
    assert!(!outcome.skipped);
}

#[test]
fn subtest_keeps_prefix_and_buffering() {
    let (host, sink) = native("root");
    let types = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&types);
    let line = line!() + 5;
    host.run(|t| {
        let t = replace_logger(buffered_logger(t, &Config::default()), |inner, s| t_logf!(inner, "PREFIX {s}"));
        run(&t, "inner", |t| {
            seen.lock().extend(chain_types(&t));
            t_log!(t, "inside");
            t.fail();
        });
    });

    let types = types.lock();
    assert_eq!(types.len(), 3);
    assert!(types[0].ends_with("ReplaceLogger"));
    assert!(types[1].ends_with("BufferedLogger"));
    assert!(types[2].ends_with("NativeHandle"));

    let records = sink.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].test, "root/inner");
    let lines: Vec<_> = records[0].message.lines().collect();
    assert_eq!(lines[0], "=== Buffered Log Output (test failed) ===");
    assert_eq!(lines[1], format!("subtest_tests.rs:{line} PREFIX inside"));
}

#[test]
fn passing_buffered_subtest_stays_quiet() {
    let (host, sink) = native("root");
    host.run(|t| {
        let t = extra_detail_logger(buffered_logger(t, &Config::default()), "p");
        assert!(run(&t, "quiet", |t| t_log!(t, "hidden")));
    });
    assert!(sink.is_empty());
}

#[test]
fn parent_buffer_is_not_shared_with_subtest() {
    let (host, sink) = native("root");
    host.run(|t| {
        let t = buffered_logger(t, &Config::default());
        t_log!(t, "parent line");
        run(&t, "child", |t| {
            t_log!(t, "child line");
            t.fail();
        });
    });

    let records = sink.records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].test, "root/child");
    assert!(records[0].message.contains("child line"));
    assert!(!records[0].message.contains("parent line"));
    assert_eq!(records[1].test, "root");
    assert!(records[1].message.contains("parent line"));
}

#[test]
fn unsupported_inner_handle_fails_with_diagnostic() {
    let mock = MockHandle::new("mocked");
    let t = extra_detail_logger(mock.handle(), "p");
    let ran = Arc::new(Mutex::new(false));
    let flag = Arc::clone(&ran);

    assert!(!run(&t, "never", move |_| *flag.lock() = true));
    assert!(!*ran.lock());
    assert!(mock.failed());
    let captured = mock.captured();
    assert_eq!(captured.len(), 1);
    assert!(captured[0].contains("Run is not supported by the wrapped handle type"));
    assert!(captured[0].contains("MockHandle"));
}

#[test]
fn rewrap_layers_rebuilds_outermost_last() {
    let mock = MockHandle::new("base");
    let t = replace_logger(buffered_logger(mock.handle(), &Config::default()), |inner, s| t_logf!(inner, "{s}"));
    let layers = vec![Arc::clone(&t), t.as_rewrap().unwrap().inner()];

    let fresh = MockHandle::new("fresh");
    let rebuilt = rewrap_layers(&layers, fresh.handle());
    let types = chain_types(&rebuilt);
    assert_eq!(types.len(), 3);
    assert!(types[0].ends_with("ReplaceLogger"));
    assert!(types[1].ends_with("BufferedLogger"));
    assert!(types[2].ends_with("MockHandle"));
    assert_eq!(rebuilt.name(), "fresh");
}

#[test]
fn chain_types_of_plain_handle() {
    let mock = MockHandle::new("plain");
    let types = chain_types(&mock.handle());
    assert_eq!(types.len(), 1);
}

/// Tagging wrapper that forwards subtest spawning but cannot rewrap.
struct Tagged(Handle);

impl TestHandle for Tagged {
    fn log_at(&self, site: &'static std::panic::Location<'static>, message: String) {
        self.0.log_at(site, format!("TAG {message}"));
    }

    fn name(&self) -> String {
        self.0.name()
    }

    fn failed(&self) -> bool {
        self.0.failed()
    }

    fn skipped(&self) -> bool {
        self.0.skipped()
    }

    fn fail(&self) {
        self.0.fail();
    }

    fn fail_now(&self) {
        self.0.fail_now();
    }

    fn skip_now(&self) {
        self.0.skip_now();
    }

    fn cleanup(&self, f: crate::handle::Cleanup) {
        self.0.cleanup(f);
    }

    fn mark_helper(&self, helper: crate::callsite::HelperId) {
        self.0.mark_helper(helper);
    }

    fn as_runner(&self) -> Option<&dyn SubtestRunner> {
        self.0.as_runner()
    }
}

#[test]
fn layer_without_rewrap_is_dropped_from_subtest() {
    let (host, sink) = native("root");
    host.run(|t| {
        let tagged: Handle = Arc::new(Tagged(t));
        t_log!(tagged, "parent");
        let t = replace_logger(tagged, |inner, s| t_logf!(inner, "PREFIX {s}"));
        assert!(run(&t, "child", |t| t_log!(t, "child")));
    });

    let messages: Vec<_> = sink.records().into_iter().map(|r| (r.test, r.message)).collect();
    assert_eq!(
        messages,
        vec![
            ("root".to_string(), "TAG parent".to_string()),
            ("root/child".to_string(), "PREFIX child".to_string()),
        ]
    );
}
