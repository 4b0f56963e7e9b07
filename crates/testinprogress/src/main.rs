// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! testinprogress: replay test plans to a progress observer and verify recorded
//! message streams
//!
//! Logs go to stderr so that `replay --stdout` output stays a clean message stream.

use anyhow::Context;
use clap::{CommandFactory, Parser};
use tracing::info;

use testinprogress::config::{Command, Config};
use testinprogress::replay::ReplayPlan;
use testinprogress::{listener, verify};

fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(config.log_level().into()),
        )
        .with_writer(std::io::stderr)
        .init();

    config.validate()?;

    match &config.command {
        Some(Command::Replay {
            plan,
            stdout,
            parallel,
        }) => {
            let plan = ReplayPlan::load(plan)?;
            let listener = listener(&config, *stdout)?;
            let summary = plan.replay(&listener, *parallel);
            info!(
                runs = summary.runs,
                passed = summary.passed,
                failed = summary.failed,
                skipped = summary.skipped,
                "replay finished"
            );
        }
        Some(Command::Verify { stream }) => {
            let summaries = verify::verify(stream)
                .with_context(|| format!("{} is not a valid test progress stream", stream.display()))?;
            info!(runs = summaries.len(), "stream verified");
        }
        None => {
            Config::command().print_help()?;
        }
    }
    Ok(())
}
