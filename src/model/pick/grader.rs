/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Settles open picks once their games are final.
//!
//! A pick is graded at most once: settlement only touches rows whose result is still null, and
//! the user's tally moves in the same transaction. Picks without the data to decide them (no box
//! score yet, no winner recorded) are left open for the next run.

use crate::error::Result;
use crate::model::game::{GameStatus, PlayerBoxScore};
use crate::model::pick::model::{Direction, Pick, PickKind, PickStat, PlayerPickRow, TeamPickRow};
use crate::model::stats::aggregate::StatLine;
use crate::schema::{games, player_picks, team_picks, users};
use diesel::prelude::*;

/// Where the grader reads picks and results from, and writes settlements to.
pub trait GradingStore {
    /// Open player picks whose game is finished
    fn open_player_picks(&mut self) -> Result<Vec<Pick>>;
    /// Open team picks whose game is finished
    fn open_team_picks(&mut self) -> Result<Vec<Pick>>;
    fn player_line(&mut self, player_id: i32, game_id: i32) -> Result<Option<StatLine>>;
    fn game_winner(&mut self, game_id: i32) -> Result<Option<i32>>;
    /// Records the result and moves the owner's tally. Returns `false` when the pick had
    /// already been settled, in which case nothing changes.
    fn settle(&mut self, pick: &Pick, won: bool) -> Result<bool>;
}

#[derive(Serialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GradeReport {
    pub won: usize,
    pub lost: usize,
    /// Left open for lack of data, or settled by someone else first
    pub skipped: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Won,
    Lost,
    Skip,
}

/// A push (value equal to the threshold) loses in both directions.
pub fn judge_player(
    stat: PickStat,
    direction: Direction,
    threshold: f64,
    line: Option<&StatLine>,
) -> Verdict {
    let Some(line) = line else {
        return Verdict::Skip;
    };
    let value = stat.value(line);
    let won = match direction {
        Direction::Over => value > threshold,
        Direction::Under => value < threshold,
    };
    if won {
        Verdict::Won
    } else {
        Verdict::Lost
    }
}

pub fn judge_team(team_id: i32, winner: Option<i32>) -> Verdict {
    match winner {
        None => Verdict::Skip,
        Some(winner) if winner == team_id => Verdict::Won,
        Some(_) => Verdict::Lost,
    }
}

fn grade_one<S: GradingStore + ?Sized>(store: &mut S, pick: &Pick) -> Result<Verdict> {
    let verdict = match &pick.kind {
        PickKind::Player {
            player_id,
            stat,
            direction,
            threshold,
        } => {
            let line = store.player_line(*player_id, pick.game_id)?;
            judge_player(*stat, *direction, *threshold, line.as_ref())
        }
        PickKind::Team { team_id } => judge_team(*team_id, store.game_winner(pick.game_id)?),
    };
    if verdict == Verdict::Skip {
        return Ok(Verdict::Skip);
    }
    if store.settle(pick, verdict == Verdict::Won)? {
        Ok(verdict)
    } else {
        Ok(Verdict::Skip)
    }
}

fn grade_all<S: GradingStore + ?Sized>(store: &mut S, picks: Vec<Pick>) -> GradeReport {
    let mut report = GradeReport::default();
    for pick in picks {
        match grade_one(store, &pick) {
            Ok(Verdict::Won) => report.won += 1,
            Ok(Verdict::Lost) => report.lost += 1,
            Ok(Verdict::Skip) => {
                tracing::debug!(pick = pick.id, game = pick.game_id, "pick left open");
                report.skipped += 1;
            }
            Err(e) => {
                tracing::warn!(pick = pick.id, error = %e, "failed to grade pick");
                report.failed += 1;
            }
        }
    }
    report
}

pub fn grade_player_picks<S: GradingStore + ?Sized>(store: &mut S) -> Result<GradeReport> {
    let picks = store.open_player_picks()?;
    let report = grade_all(store, picks);
    tracing::info!(
        won = report.won,
        lost = report.lost,
        skipped = report.skipped,
        failed = report.failed,
        "graded player picks"
    );
    Ok(report)
}

pub fn grade_team_picks<S: GradingStore + ?Sized>(store: &mut S) -> Result<GradeReport> {
    let picks = store.open_team_picks()?;
    let report = grade_all(store, picks);
    tracing::info!(
        won = report.won,
        lost = report.lost,
        skipped = report.skipped,
        failed = report.failed,
        "graded team picks"
    );
    Ok(report)
}

impl GradingStore for PgConnection {
    fn open_player_picks(&mut self) -> Result<Vec<Pick>> {
        Ok(player_picks::table
            .inner_join(games::table)
            .filter(player_picks::result.is_null())
            .filter(games::status.eq(GameStatus::Finished))
            .select(PlayerPickRow::as_select())
            .order_by(player_picks::id.asc())
            .load(self)?
            .into_iter()
            .map(Pick::from)
            .collect())
    }

    fn open_team_picks(&mut self) -> Result<Vec<Pick>> {
        Ok(team_picks::table
            .inner_join(games::table)
            .filter(team_picks::result.is_null())
            .filter(games::status.eq(GameStatus::Finished))
            .select(TeamPickRow::as_select())
            .order_by(team_picks::id.asc())
            .load(self)?
            .into_iter()
            .map(Pick::from)
            .collect())
    }

    fn player_line(&mut self, player_id: i32, game_id: i32) -> Result<Option<StatLine>> {
        PlayerBoxScore::line_for(player_id, game_id, self)
    }

    fn game_winner(&mut self, game_id: i32) -> Result<Option<i32>> {
        Ok(games::table
            .find(game_id)
            .select(games::winner_id)
            .first::<Option<i32>>(self)?)
    }

    fn settle(&mut self, pick: &Pick, won: bool) -> Result<bool> {
        self.transaction::<_, crate::Error, _>(|conn| {
            let updated = match pick.kind {
                PickKind::Player { .. } => diesel::update(
                    player_picks::table
                        .find(pick.id)
                        .filter(player_picks::result.is_null()),
                )
                .set(player_picks::result.eq(Some(won)))
                .execute(conn)?,
                PickKind::Team { .. } => diesel::update(
                    team_picks::table
                        .find(pick.id)
                        .filter(team_picks::result.is_null()),
                )
                .set(team_picks::result.eq(Some(won)))
                .execute(conn)?,
            };
            if updated != 1 {
                return Ok(false);
            }
            let user = users::table.find(pick.user_id);
            if won {
                diesel::update(user)
                    .set((
                        users::wins.eq(users::wins + 1),
                        users::points.eq(users::points + pick.reward),
                    ))
                    .execute(conn)?;
            } else {
                diesel::update(user)
                    .set(users::losses.eq(users::losses + 1))
                    .execute(conn)?;
            }
            Ok(true)
        })
    }
}
