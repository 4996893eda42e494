/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */
use crate::error::Result;
use crate::jobs::Tier;
use crate::model::game::{
    team_lines, Game, GameStatus, NewGame, NewPlayerBoxScore, PlayerBoxScore, TeamBoxScore,
};
use crate::model::pick::grader::{self, GradeReport};
use crate::model::player::{NewPlayer, Player};
use crate::model::stats::model::{rebuild_player_seasons, rebuild_standings, rebuild_team_seasons};
use crate::model::team::{NewTeam, Team};
use crate::provider::{ApiTeam, StatsProvider};
use chrono::NaiveDate;
use diesel::PgConnection;
use std::collections::{BTreeMap, HashMap};
use std::time::Instant;
use tracing::{error, info, warn};

/// Rows per insert; keeps wide upserts under Postgres' bind parameter limit.
const CHUNK: usize = 1000;

/// One step of a tier. `run` returns the number of rows it wrote or settled.
pub struct Task<C> {
    pub name: &'static str,
    pub run: fn(&mut C) -> Result<usize>,
}

#[derive(Debug, PartialEq, Eq)]
pub struct TierReport {
    pub tier: Tier,
    pub succeeded: Vec<&'static str>,
    pub failed: Vec<&'static str>,
}

impl TierReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Runs every task in order. A failing task is logged and the rest still run.
pub fn run_tier<C>(tier: Tier, tasks: &[Task<C>], ctx: &mut C) -> TierReport {
    let started = Instant::now();
    let mut report = TierReport {
        tier,
        succeeded: Vec::new(),
        failed: Vec::new(),
    };
    for task in tasks {
        let task_started = Instant::now();
        match (task.run)(ctx) {
            Ok(rows) => {
                info!(
                    tier = %tier,
                    task = task.name,
                    rows,
                    elapsed_ms = task_started.elapsed().as_millis() as u64,
                    "task finished"
                );
                report.succeeded.push(task.name);
            }
            Err(e) => {
                error!(tier = %tier, task = task.name, error = %e, "task failed");
                report.failed.push(task.name);
            }
        }
    }
    info!(
        tier = %tier,
        succeeded = report.succeeded.len(),
        failed = report.failed.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "tier finished"
    );
    report
}

/// What the refresh tasks work against.
pub struct Context<'a> {
    pub conn: &'a mut PgConnection,
    pub provider: &'a dyn StatsProvider,
    pub season: i32,
    /// League-local date the tier runs on
    pub today: NaiveDate,
    /// Box score lines fetched earlier in this pass
    live: Option<Vec<PlayerBoxScore>>,
}

impl<'a> Context<'a> {
    pub fn new(
        conn: &'a mut PgConnection,
        provider: &'a dyn StatsProvider,
        season: i32,
        today: NaiveDate,
    ) -> Context<'a> {
        Context {
            conn,
            provider,
            season,
            today,
            live: None,
        }
    }

    fn window(&self) -> Vec<NaiveDate> {
        match self.today.pred_opt() {
            Some(yesterday) => vec![yesterday, self.today],
            None => vec![self.today],
        }
    }
}

pub fn tasks_for<'a>(tier: Tier) -> Vec<Task<Context<'a>>> {
    match tier {
        Tier::Frequent => vec![
            Task {
                name: "games",
                run: refresh_games,
            },
            Task {
                name: "team_box_scores",
                run: refresh_team_box_scores,
            },
            Task {
                name: "player_box_scores",
                run: refresh_player_box_scores,
            },
            Task {
                name: "games",
                run: refresh_games,
            },
        ],
        Tier::Hourly => vec![
            Task {
                name: "grade_player_picks",
                run: grade_player_picks,
            },
            Task {
                name: "grade_team_picks",
                run: grade_team_picks,
            },
        ],
        Tier::Daily => vec![
            Task {
                name: "team_seasons",
                run: |ctx| rebuild_team_seasons(ctx.season, ctx.conn),
            },
            Task {
                name: "player_seasons",
                run: |ctx| rebuild_player_seasons(ctx.season, ctx.conn),
            },
            Task {
                name: "standings",
                run: |ctx| rebuild_standings(ctx.season, ctx.conn),
            },
            Task {
                name: "rosters",
                run: refresh_rosters,
            },
        ],
    }
}

fn refresh_games(ctx: &mut Context) -> Result<usize> {
    let teams = Team::external_map(ctx.conn)?;
    let rows: Vec<NewGame> = ctx
        .provider
        .games(&ctx.window())?
        .iter()
        .filter_map(|game| {
            let reported = game.report(&teams);
            if reported.is_none() {
                warn!(external_id = game.id, "skipping game with an unknown team or date");
            }
            reported
        })
        .map(NewGame::from)
        .collect();
    Game::upsert(&rows, ctx.conn)
}

/// Provider lines for the window's games that have tipped off, resolved to local ids.
/// Players first seen in a box score are added to the roster on the way.
fn fetch_live_lines(ctx: &mut Context) -> Result<Vec<PlayerBoxScore>> {
    let games: HashMap<i32, i32> = Game::on_dates(&ctx.window(), ctx.conn)?
        .into_iter()
        .filter(|game| game.status != GameStatus::Scheduled)
        .map(|game| (game.external_id, game.id))
        .collect();
    if games.is_empty() {
        return Ok(Vec::new());
    }
    let external_ids: Vec<i32> = games.keys().copied().collect();
    let lines = ctx.provider.player_stats(&external_ids)?;

    let teams = Team::external_map(ctx.conn)?;
    let mut players = Player::external_map(ctx.conn)?;
    let newcomers: BTreeMap<i32, NewPlayer> = lines
        .iter()
        .filter_map(|line| Some((line.player.as_ref()?, line.team.as_ref()?)))
        .filter(|(player, _)| !players.contains_key(&player.id))
        .map(|(player, team)| {
            let mut newcomer = player.to_new(&teams);
            newcomer.team_id = teams.get(&team.id).copied();
            (player.id, newcomer)
        })
        .collect();
    if !newcomers.is_empty() {
        let newcomers: Vec<NewPlayer> = newcomers.into_values().collect();
        Player::upsert(&newcomers, ctx.conn)?;
        players = Player::external_map(ctx.conn)?;
    }

    let mut rows = Vec::with_capacity(lines.len());
    for line in lines.iter().filter(|line| !line.is_dnp()) {
        let resolved = line.refs().and_then(|(player, team, game)| {
            Some((players.get(&player)?, teams.get(&team)?, games.get(&game)?))
        });
        match resolved {
            Some((&player_id, &team_id, &game_id)) => rows.push(PlayerBoxScore {
                player_id,
                team_id,
                game_id,
                line: line.line(),
            }),
            None => warn!(
                stat_id = ?line.id,
                "skipping stat line with a missing or unknown player, team or game"
            ),
        }
    }
    Ok(rows)
}

/// Hands back lines an earlier task left in `slot`, or fetches them.
fn reuse_or_fetch<C, T>(
    ctx: &mut C,
    slot: fn(&mut C) -> &mut Option<T>,
    fetch: fn(&mut C) -> Result<T>,
) -> Result<T> {
    let kept = slot(ctx).take();
    match kept {
        Some(kept) => Ok(kept),
        None => fetch(ctx),
    }
}

fn live_slot<'c>(ctx: &'c mut Context) -> &'c mut Option<Vec<PlayerBoxScore>> {
    &mut ctx.live
}

/// Leaves the fetched lines for the player task that follows.
fn refresh_team_box_scores(ctx: &mut Context) -> Result<usize> {
    let lines = reuse_or_fetch(ctx, live_slot, fetch_live_lines)?;
    let rows = team_lines(&lines);
    ctx.live = Some(lines);
    TeamBoxScore::upsert(&rows, ctx.conn)
}

fn refresh_player_box_scores(ctx: &mut Context) -> Result<usize> {
    let rows: Vec<NewPlayerBoxScore> = reuse_or_fetch(ctx, live_slot, fetch_live_lines)?
        .iter()
        .map(|b| NewPlayerBoxScore::new(b.player_id, b.team_id, b.game_id, &b.line))
        .collect();
    let mut written = 0;
    for chunk in rows.chunks(CHUNK) {
        written += PlayerBoxScore::upsert(chunk, ctx.conn)?;
    }
    Ok(written)
}

fn settled(kind: &str, report: GradeReport) -> usize {
    info!(
        kind,
        won = report.won,
        lost = report.lost,
        skipped = report.skipped,
        failed = report.failed,
        "graded picks"
    );
    report.won + report.lost
}

fn grade_player_picks(ctx: &mut Context) -> Result<usize> {
    grader::grade_player_picks(&mut *ctx.conn).map(|report| settled("player", report))
}

fn grade_team_picks(ctx: &mut Context) -> Result<usize> {
    grader::grade_team_picks(&mut *ctx.conn).map(|report| settled("team", report))
}

/// Teams first so players can be attached to them; re-listing a player moves them on a trade.
fn refresh_rosters(ctx: &mut Context) -> Result<usize> {
    let teams: Vec<NewTeam> = ctx
        .provider
        .teams()?
        .iter()
        .filter(|team| team.is_active())
        .map(ApiTeam::to_new)
        .collect();
    let mut written = Team::upsert(&teams, ctx.conn)?;

    let team_ids = Team::external_map(ctx.conn)?;
    let players: Vec<NewPlayer> = ctx
        .provider
        .players()?
        .iter()
        .map(|player| player.to_new(&team_ids))
        .collect();
    for chunk in players.chunks(CHUNK) {
        written += Player::upsert(chunk, ctx.conn)?;
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counter {
        ran: Vec<&'static str>,
    }

    fn ok_a(c: &mut Counter) -> Result<usize> {
        c.ran.push("a");
        Ok(1)
    }

    fn boom(c: &mut Counter) -> Result<usize> {
        c.ran.push("boom");
        crate::Error::validation("provider unavailable")
    }

    fn ok_c(c: &mut Counter) -> Result<usize> {
        c.ran.push("c");
        Ok(3)
    }

    #[test]
    fn test_failure_does_not_stop_later_tasks() {
        let tasks = [
            Task { name: "a", run: ok_a },
            Task { name: "boom", run: boom },
            Task { name: "c", run: ok_c },
        ];
        let mut counter = Counter::default();
        let report = run_tier(Tier::Frequent, &tasks, &mut counter);
        assert_eq!(counter.ran, vec!["a", "boom", "c"]);
        assert_eq!(report.succeeded, vec!["a", "c"]);
        assert_eq!(report.failed, vec!["boom"]);
        assert!(!report.is_clean());
    }

    #[test]
    fn test_clean_report() {
        let tasks = [Task { name: "a", run: ok_a }];
        let report = run_tier(Tier::Hourly, &tasks, &mut Counter::default());
        assert!(report.is_clean());
        assert_eq!(report.tier, Tier::Hourly);
    }

    #[derive(Default)]
    struct Lines {
        kept: Option<Vec<i32>>,
        fetches: usize,
    }

    fn kept(l: &mut Lines) -> &mut Option<Vec<i32>> {
        &mut l.kept
    }

    fn fetch(l: &mut Lines) -> Result<Vec<i32>> {
        l.fetches += 1;
        Ok(vec![7, 8])
    }

    #[test]
    fn test_lines_fetched_once_per_pass() {
        let mut lines = Lines::default();
        let first = reuse_or_fetch(&mut lines, kept, fetch).unwrap();
        lines.kept = Some(first);
        let second = reuse_or_fetch(&mut lines, kept, fetch).unwrap();
        assert_eq!(second, vec![7, 8]);
        assert_eq!(lines.fetches, 1);
        assert!(lines.kept.is_none());

        reuse_or_fetch(&mut lines, kept, fetch).unwrap();
        assert_eq!(lines.fetches, 2);
    }

    #[test]
    fn test_tier_task_order() {
        let names = |tier| {
            tasks_for(tier)
                .iter()
                .map(|task| task.name)
                .collect::<Vec<_>>()
        };
        assert_eq!(
            names(Tier::Frequent),
            vec!["games", "team_box_scores", "player_box_scores", "games"]
        );
        assert_eq!(
            names(Tier::Hourly),
            vec!["grade_player_picks", "grade_team_picks"]
        );
        assert_eq!(
            names(Tier::Daily),
            vec!["team_seasons", "player_seasons", "standings", "rosters"]
        );
    }
}
