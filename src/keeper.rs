/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */
use clap::{Parser, Subcommand};
use rust_hoops::jobs::{Keeper, Tier};
use std::process::ExitCode;
use std::time::Instant;

/// Keeps league data fresh and grades picks.
#[derive(Parser, Debug)]
#[command(name = "hoopkeeper", version, about)]
struct Cli {
    /// Season to aggregate, e.g. 2024 for 2024-25. Defaults to the current one.
    #[arg(long, global = true)]
    season: Option<i32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run every tier on its schedule until killed
    Run,
    /// Run a single tier now and exit
    Once {
        #[arg(value_enum)]
        tier: Tier,
    },
}

fn main() -> ExitCode {
    rust_hoops::init_tracing();
    let cli = Cli::parse();
    let figment = rocket::Config::figment();

    let mut keeper = match Keeper::from_figment(&figment, cli.season) {
        Ok(keeper) => keeper,
        Err(e) => {
            tracing::error!(error = %e, "could not start keeper");
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Command::Run => match keeper.run_forever() {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                tracing::error!(error = %e, "scheduler stopped");
                ExitCode::FAILURE
            }
        },
        Command::Once { tier } => {
            let started = Instant::now();
            let report = keeper.run_once(tier);
            tracing::info!(
                tier = %tier,
                elapsed = ?started.elapsed(),
                failed = ?report.failed,
                "done"
            );
            if report.is_clean() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
    }
}
