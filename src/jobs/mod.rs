/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Scheduled refresh and grading, run by the `hoopkeeper` binary.
//!
//! Work is split into three tiers. Each tier is a fixed list of idempotent tasks run in order;
//! a failing task is logged and the tier moves on.

pub mod schedule;
pub mod tasks;

use crate::db;
use crate::error::Result;
use crate::model::sys::HoopsSettings;
use crate::provider::{HttpProvider, StatsProvider};
use rocket::figment::Figment;
use std::fmt;
use tasks::{Context, TierReport};
use tracing::{info, warn};

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    /// Games and box scores, every few minutes while games are on
    Frequent,
    /// Pick grading
    Hourly,
    /// Season aggregates, standings and rosters
    Daily,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Frequent, Tier::Hourly, Tier::Daily];

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Frequent => "frequent",
            Tier::Hourly => "hourly",
            Tier::Daily => "daily",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct Keeper {
    conn: diesel::PgConnection,
    provider: Box<dyn StatsProvider>,
    settings: HoopsSettings,
    season: Option<i32>,
}

impl Keeper {
    /// Reads `hoops` settings and the database url from the same figment the server uses.
    pub fn from_figment(figment: &Figment, season: Option<i32>) -> Result<Keeper> {
        let settings: HoopsSettings = figment.extract_inner("hoops").unwrap_or_else(|e| {
            warn!(error = %e, "no usable [hoops] settings, using defaults");
            HoopsSettings::default()
        });
        settings.schedule.daily_time()?;
        let provider = HttpProvider::new(&settings.provider)?;
        let conn = db::establish_connection(figment)?;
        Ok(Keeper {
            conn,
            provider: Box::new(provider),
            settings,
            season,
        })
    }

    pub fn run_once(&mut self, tier: Tier) -> TierReport {
        let season = self.season.unwrap_or_else(|| self.settings.current_season());
        let mut ctx = Context::new(
            &mut self.conn,
            self.provider.as_ref(),
            season,
            self.settings.today(),
        );
        info!(tier = %tier, season, today = %ctx.today, "running tier");
        tasks::run_tier(tier, &tasks::tasks_for(tier), &mut ctx)
    }

    /// Sleeps until the earliest due tier, runs it, and reschedules it. Only returns on a
    /// schedule that cannot be computed.
    pub fn run_forever(&mut self) -> Result<()> {
        let now = self.settings.now();
        let mut upcoming = Vec::with_capacity(Tier::ALL.len());
        for tier in Tier::ALL {
            upcoming.push((schedule::next_fire(tier, now, &self.settings.schedule)?, tier));
        }
        loop {
            upcoming.sort_by_key(|(when, _)| *when);
            let Some(&(when, tier)) = upcoming.first() else {
                return Ok(());
            };
            let wait = (when - self.settings.now()).to_std().unwrap_or_default();
            info!(tier = %tier, at = %when, wait_secs = wait.as_secs(), "waiting for next tier");
            std::thread::sleep(wait);

            self.run_once(tier);
            let after = when.max(self.settings.now());
            upcoming[0] = (schedule::next_fire(tier, after, &self.settings.schedule)?, tier);
        }
    }
}
