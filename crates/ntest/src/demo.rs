// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Built-in scenarios run by `ntest demo`.
//!
//! Each scenario composes wrappers on a native handle, logs a few lines and
//! records where each line should be attributed, so the output of the binary
//! can be checked against real source lines.

use std::panic::Location;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::buffer::buffered_logger;
use crate::callsite::{CallSite, HelperId};
use crate::config::Config;
use crate::handle::{Cleanup, Handle, TestHandle, TestHandleExt};
use crate::logger::{extra_detail_logger, replace_logger};
use crate::native::{NativeHandle, Outcome, Sink};
use crate::{subtest, t_log, t_logf};

/// Options shared by all scenarios.
#[derive(Debug, Clone, Default)]
pub struct DemoOptions {
    pub config: Config,
    /// Mark the test failed after logging.
    pub fail: bool,
    /// Skip the test after logging.
    pub skip: bool,
}

/// A line the scenario logged and where it must be attributed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expected {
    pub site: CallSite,
    pub message: String,
}

type Body = fn(&Handle, &DemoOptions, &mut Vec<Expected>);

pub struct Scenario {
    pub name: &'static str,
    pub description: &'static str,
    /// Deadline given to the native handle, relative to the start.
    pub deadline: Option<Duration>,
    body: Body,
}

pub const SCENARIOS: &[Scenario] = &[
    Scenario {
        name: "replace",
        description: "replace-logger adding a PREFIX on a plain handle",
        deadline: None,
        body: replace,
    },
    Scenario {
        name: "prefix",
        description: "prefix and timestamp on a plain handle",
        deadline: None,
        body: prefix,
    },
    Scenario {
        name: "buffered",
        description: "buffered output, shown only when the test fails or skips",
        deadline: None,
        body: buffered,
    },
    Scenario {
        name: "prefix-buffered",
        description: "prefix and timestamp over buffered output",
        deadline: None,
        body: prefix_buffered,
    },
    Scenario {
        name: "subtest",
        description: "prefix over buffered output carried into a subtest",
        deadline: None,
        body: in_subtest,
    },
    Scenario {
        name: "watchdog",
        description: "buffered output flushed ahead of a near deadline",
        deadline: Some(Duration::from_millis(200)),
        body: watchdog,
    },
    Scenario {
        name: "unsupported",
        description: "subtest through a wrapper that cannot rewrap",
        deadline: None,
        body: unsupported,
    },
];

pub fn find(name: &str) -> Option<&'static Scenario> {
    SCENARIOS.iter().find(|s| s.name == name)
}

impl Scenario {
    /// Run the scenario as test `demo/<name>`, writing output to `sink`.
    pub fn run(&self, options: &DemoOptions, sink: Arc<dyn Sink>) -> (Outcome, Vec<Expected>) {
        let mut native = NativeHandle::new(format!("demo/{}", self.name), sink);
        if let Some(deadline) = self.deadline {
            native = native.with_deadline(Instant::now() + deadline);
        }
        let mut expected = Vec::new();
        let outcome = Arc::new(native).run(|t| {
            (self.body)(&t, options, &mut expected);
            if options.fail {
                t.fail();
            }
            if options.skip {
                t.skipf(format_args!("skipping on request"));
            }
        });
        (outcome, expected)
    }
}

/// Record that `message` was logged on `line` of this file.
fn expect(expected: &mut Vec<Expected>, line: u32, message: impl Into<String>) {
    let file = Path::new(file!()).file_name().map(|f| f.to_string_lossy().into_owned());
    expected.push(Expected {
        site: CallSite { file: file.unwrap_or_default(), line },
        message: message.into(),
    });
}

fn replace(t: &Handle, _: &DemoOptions, expected: &mut Vec<Expected>) {
    let t = replace_logger(t.clone(), |inner, s| t_logf!(inner, "PREFIX {s}"));
    let line = line!() + 1;
    t_log!(t, "test message from user code");
    expect(expected, line, "PREFIX test message from user code");
}

fn prefix(t: &Handle, _: &DemoOptions, expected: &mut Vec<Expected>) {
    let t = extra_detail_logger(t.clone(), "demo");
    let line = line!() + 1;
    t_logf!(t, "formatted {}", 42);
    expect(expected, line, "formatted 42");
}

fn buffered(t: &Handle, options: &DemoOptions, expected: &mut Vec<Expected>) {
    let t = buffered_logger(t.clone(), &options.config);
    let line = line!() + 1;
    t_log!(t, "first");
    expect(expected, line, "first");
    let line = line!() + 1;
    t_log!(t, "second");
    expect(expected, line, "second");
}

fn prefix_buffered(t: &Handle, options: &DemoOptions, expected: &mut Vec<Expected>) {
    let t = extra_detail_logger(buffered_logger(t.clone(), &options.config), "demo");
    let line = line!() + 1;
    t_log!(t, "through both layers");
    expect(expected, line, "through both layers");
}

fn in_subtest(t: &Handle, options: &DemoOptions, expected: &mut Vec<Expected>) {
    let t = extra_detail_logger(buffered_logger(t.clone(), &options.config), "demo");
    let fail = options.fail;
    subtest::run(&t, "inner", |t| {
        let line = line!() + 1;
        t_log!(t, "inside the subtest");
        expect(expected, line, "inside the subtest");
        if fail {
            t.fail();
        }
    });
}

fn watchdog(t: &Handle, options: &DemoOptions, expected: &mut Vec<Expected>) {
    let config = Config { watchdog_margin: Duration::from_millis(100), ..options.config.clone() };
    let t = buffered_logger(t.clone(), &config);
    let line = line!() + 1;
    t_log!(t, "logged before the deadline");
    expect(expected, line, "logged before the deadline");
    thread::sleep(Duration::from_millis(300));
    let line = line!() + 1;
    t_log!(t, "logged after the watchdog flush");
    expect(expected, line, "logged after the watchdog flush");
}

fn unsupported(t: &Handle, _: &DemoOptions, _: &mut Vec<Expected>) {
    let opaque: Handle = Arc::new(Opaque(t.clone()));
    subtest::run(&opaque, "never", |_| {});
}

/// Forwarding wrapper with neither rewrap nor subtest support.
struct Opaque(Handle);

impl TestHandle for Opaque {
    fn log_at(&self, site: &'static Location<'static>, message: String) {
        self.0.log_at(site, message);
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

    fn cleanup(&self, f: Cleanup) {
        self.0.cleanup(f);
    }

    fn mark_helper(&self, helper: HelperId) {
        self.0.mark_helper(helper);
    }
}

#[cfg(test)]
#[path = "demo_tests.rs"]
mod tests;
