// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! CLI argument parsing with clap derive.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use ntest::config::defaults::CONFIG_ENV;

/// Composable test-handle wrappers, exercised through built-in scenarios
#[derive(Parser)]
#[command(name = "ntest")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Use specific config file
    #[arg(short = 'C', long = "config", global = true, env = CONFIG_ENV)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// List the built-in scenarios
    List,
    /// Run a built-in scenario and print its output
    Demo(DemoArgs),
}

#[derive(clap::Args)]
pub struct DemoArgs {
    /// Scenario to run (see `ntest list`)
    #[arg(value_name = "SCENARIO")]
    pub scenario: String,

    /// Mark the test failed after it logs
    #[arg(long)]
    pub fail: bool,

    /// Skip the test after it logs
    #[arg(long, conflicts_with = "fail")]
    pub skip: bool,

    /// Disable buffering (same as NTEST_BUFFERING=false)
    #[arg(long)]
    pub no_buffering: bool,
}
