//! Test helpers for behavioral specifications.
//!
//! Provides helpers for running the ntest binary and reading its output.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

pub use assert_cmd::prelude::*;
pub use predicates;
pub use predicates::prelude::PredicateBooleanExt;
use std::process::{Command, Output};

/// Returns a Command configured to run the ntest binary, isolated from the
/// caller's ntest environment.
pub fn ntest_cmd() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("ntest"));
    cmd.env_remove("NTEST_BUFFERING").env_remove("NTEST_CONFIG").env_remove("NTEST_LOG");
    cmd
}

/// Run `ntest demo <scenario> [args]` and capture its output.
pub fn demo(scenario: &str, args: &[&str]) -> Output {
    ntest_cmd().arg("demo").arg(scenario).args(args).output().expect("command should run")
}

/// A line the scenario logged, as announced by an `expect` line.
#[derive(Debug)]
pub struct Expect {
    /// `file:line` the line must be attributed to.
    pub site: String,
    pub message: String,
}

/// Parse the `expect <site> <message>` lines printed after a scenario.
pub fn expectations(stdout: &str) -> Vec<Expect> {
    stdout
        .lines()
        .filter_map(|line| line.strip_prefix("expect "))
        .map(|rest| {
            let (site, message) = rest.split_once(' ').expect("expect line should have a message");
            Expect { site: site.to_string(), message: message.to_string() }
        })
        .collect()
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}
