// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

mod cli;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use ntest::config::defaults::LOG_ENV;
use ntest::demo::{self, DemoOptions};
use ntest::{Buffering, Config, StdoutSink};

use crate::cli::{Cli, Command, DemoArgs};

fn main() -> anyhow::Result<ExitCode> {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    match &cli.command {
        Command::List => {
            for scenario in demo::SCENARIOS {
                println!("{:<16} {}", scenario.name, scenario.description);
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Demo(args) => run_demo(&cli, args),
    }
}

/// Run one scenario, then print where each of its lines must be attributed.
fn run_demo(cli: &Cli, args: &DemoArgs) -> anyhow::Result<ExitCode> {
    let Some(scenario) = demo::find(&args.scenario) else {
        anyhow::bail!("unknown scenario {:?}; run `ntest list` to see them", args.scenario);
    };

    let mut config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => Config::from_env(),
    };
    if args.no_buffering {
        config.buffering = Buffering::Disabled;
    }
    tracing::debug!(?config, scenario = scenario.name, "running demo");

    let options = DemoOptions { config, fail: args.fail, skip: args.skip };
    let (outcome, expected) = scenario.run(&options, Arc::new(StdoutSink));

    for line in &expected {
        println!("expect {} {}", line.site, line.message);
    }

    Ok(if outcome.failed { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}
