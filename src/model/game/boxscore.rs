/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */
use crate::error::{MapRre, Result};
use crate::model::game::GameStatus;
use crate::model::stats::aggregate::StatLine;
use crate::schema::{games, player_box_scores, team_box_scores};
use chrono::NaiveDate;
use diesel::prelude::*;
use schemars::JsonSchema;
use std::collections::{BTreeMap, HashMap};

/// # Player Box Score
/// One player's line for one game.
#[derive(Queryable, Serialize, Deserialize, JsonSchema, Debug, Clone, PartialEq)]
pub struct PlayerBoxScore {
    pub player_id: i32,
    /// The team the player suited up for in this game
    pub team_id: i32,
    pub game_id: i32,
    #[serde(flatten)]
    pub line: StatLine,
}

/// # Team Box Score
/// One team's line for one game.
#[derive(Queryable, Serialize, Deserialize, JsonSchema, Debug, Clone, PartialEq)]
pub struct TeamBoxScore {
    pub team_id: i32,
    pub game_id: i32,
    #[serde(flatten)]
    pub line: StatLine,
}

/// # Game Log Entry
/// A player's line together with when and against whom it happened.
#[derive(Queryable, Serialize, Deserialize, JsonSchema, Debug, Clone, PartialEq)]
pub struct GameLogEntry {
    pub game_id: i32,
    pub game_date: NaiveDate,
    pub home_team_id: i32,
    pub away_team_id: i32,
    pub team_id: i32,
    #[serde(flatten)]
    pub line: StatLine,
}

#[derive(Insertable, AsChangeset, Debug, Clone, PartialEq)]
#[diesel(table_name = player_box_scores)]
pub struct NewPlayerBoxScore {
    pub player_id: i32,
    pub team_id: i32,
    pub game_id: i32,
    pub minutes: f64,
    pub points: i32,
    pub fgm: i32,
    pub fga: i32,
    pub ftm: i32,
    pub fta: i32,
    pub tpm: i32,
    pub tpa: i32,
    pub off_reb: i32,
    pub def_reb: i32,
    pub assists: i32,
    pub fouls: i32,
    pub steals: i32,
    pub turnovers: i32,
    pub blocks: i32,
    pub plus_minus: i32,
}

#[derive(Insertable, AsChangeset, Debug, Clone, PartialEq)]
#[diesel(table_name = team_box_scores)]
pub struct NewTeamBoxScore {
    pub team_id: i32,
    pub game_id: i32,
    pub minutes: f64,
    pub points: i32,
    pub fgm: i32,
    pub fga: i32,
    pub ftm: i32,
    pub fta: i32,
    pub tpm: i32,
    pub tpa: i32,
    pub off_reb: i32,
    pub def_reb: i32,
    pub assists: i32,
    pub fouls: i32,
    pub steals: i32,
    pub turnovers: i32,
    pub blocks: i32,
    pub plus_minus: i32,
}

impl NewPlayerBoxScore {
    pub fn new(player_id: i32, team_id: i32, game_id: i32, line: &StatLine) -> NewPlayerBoxScore {
        NewPlayerBoxScore {
            player_id,
            team_id,
            game_id,
            minutes: line.minutes,
            points: line.points,
            fgm: line.fgm,
            fga: line.fga,
            ftm: line.ftm,
            fta: line.fta,
            tpm: line.tpm,
            tpa: line.tpa,
            off_reb: line.off_reb,
            def_reb: line.def_reb,
            assists: line.assists,
            fouls: line.fouls,
            steals: line.steals,
            turnovers: line.turnovers,
            blocks: line.blocks,
            plus_minus: line.plus_minus,
        }
    }
}

impl NewTeamBoxScore {
    pub fn new(team_id: i32, game_id: i32, line: &StatLine) -> NewTeamBoxScore {
        NewTeamBoxScore {
            team_id,
            game_id,
            minutes: line.minutes,
            points: line.points,
            fgm: line.fgm,
            fga: line.fga,
            ftm: line.ftm,
            fta: line.fta,
            tpm: line.tpm,
            tpa: line.tpa,
            off_reb: line.off_reb,
            def_reb: line.def_reb,
            assists: line.assists,
            fouls: line.fouls,
            steals: line.steals,
            turnovers: line.turnovers,
            blocks: line.blocks,
            plus_minus: line.plus_minus,
        }
    }
}

/// Narrows a box score query to a game, a date, a team or a season.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LineFilter {
    pub game: Option<i32>,
    pub date: Option<NaiveDate>,
    pub team: Option<i32>,
    pub season: Option<i32>,
    /// Drop lines from games still in play
    pub finished_only: bool,
}

impl PlayerBoxScore {
    pub fn by_game(game_id: i32, conn: &mut PgConnection) -> Result<Vec<PlayerBoxScore>> {
        player_box_scores::table
            .filter(player_box_scores::game_id.eq(game_id))
            .select((
                player_box_scores::player_id,
                player_box_scores::team_id,
                player_box_scores::game_id,
                line_columns!(player_box_scores),
            ))
            .order_by((player_box_scores::team_id, player_box_scores::points.desc()))
            .load(conn)
            .map_rre()
    }

    pub fn line_for(
        player_id: i32,
        game_id: i32,
        conn: &mut PgConnection,
    ) -> Result<Option<StatLine>> {
        player_box_scores::table
            .filter(player_box_scores::player_id.eq(player_id))
            .filter(player_box_scores::game_id.eq(game_id))
            .select(line_columns!(player_box_scores))
            .first(conn)
            .optional()
            .map_rre()
    }

    pub fn matching(filter: LineFilter, conn: &mut PgConnection) -> Result<Vec<PlayerBoxScore>> {
        let mut query = player_box_scores::table
            .inner_join(games::table)
            .select((
                player_box_scores::player_id,
                player_box_scores::team_id,
                player_box_scores::game_id,
                line_columns!(player_box_scores),
            ))
            .into_boxed();
        if let Some(game) = filter.game {
            query = query.filter(player_box_scores::game_id.eq(game));
        }
        if let Some(date) = filter.date {
            query = query.filter(games::game_date.eq(date));
        }
        if let Some(team) = filter.team {
            query = query.filter(player_box_scores::team_id.eq(team));
        }
        if let Some(season) = filter.season {
            query = query.filter(games::season.eq(season));
        }
        if filter.finished_only {
            query = query.filter(games::status.eq(GameStatus::Finished));
        }
        query.load(conn).map_rre()
    }

    pub fn game_log(
        player_id: i32,
        season: i32,
        conn: &mut PgConnection,
    ) -> Result<Vec<GameLogEntry>> {
        player_box_scores::table
            .inner_join(games::table)
            .filter(player_box_scores::player_id.eq(player_id))
            .filter(games::season.eq(season))
            .select((
                games::id,
                games::game_date,
                games::home_team_id,
                games::away_team_id,
                player_box_scores::team_id,
                line_columns!(player_box_scores),
            ))
            .order_by(games::game_date.desc())
            .load(conn)
            .map_rre()
    }

    /// Re-upserting an unchanged line rewrites the same values.
    pub fn upsert(rows: &[NewPlayerBoxScore], conn: &mut PgConnection) -> Result<usize> {
        conn.transaction::<_, crate::Error, _>(|conn| {
            let mut written = 0;
            for row in rows {
                written += diesel::insert_into(player_box_scores::table)
                    .values(row)
                    .on_conflict((player_box_scores::player_id, player_box_scores::game_id))
                    .do_update()
                    .set(row)
                    .execute(conn)?;
            }
            Ok(written)
        })
    }
}

impl TeamBoxScore {
    pub fn by_game(game_id: i32, conn: &mut PgConnection) -> Result<Vec<TeamBoxScore>> {
        team_box_scores::table
            .filter(team_box_scores::game_id.eq(game_id))
            .select((
                team_box_scores::team_id,
                team_box_scores::game_id,
                line_columns!(team_box_scores),
            ))
            .load(conn)
            .map_rre()
    }

    pub fn matching(filter: LineFilter, conn: &mut PgConnection) -> Result<Vec<TeamBoxScore>> {
        let mut query = team_box_scores::table
            .inner_join(games::table)
            .select((
                team_box_scores::team_id,
                team_box_scores::game_id,
                line_columns!(team_box_scores),
            ))
            .into_boxed();
        if let Some(game) = filter.game {
            query = query.filter(team_box_scores::game_id.eq(game));
        }
        if let Some(date) = filter.date {
            query = query.filter(games::game_date.eq(date));
        }
        if let Some(team) = filter.team {
            query = query.filter(team_box_scores::team_id.eq(team));
        }
        if let Some(season) = filter.season {
            query = query.filter(games::season.eq(season));
        }
        if filter.finished_only {
            query = query.filter(games::status.eq(GameStatus::Finished));
        }
        query.load(conn).map_rre()
    }

    pub fn upsert(rows: &[NewTeamBoxScore], conn: &mut PgConnection) -> Result<usize> {
        conn.transaction::<_, crate::Error, _>(|conn| {
            let mut written = 0;
            for row in rows {
                written += diesel::insert_into(team_box_scores::table)
                    .values(row)
                    .on_conflict((team_box_scores::team_id, team_box_scores::game_id))
                    .do_update()
                    .set(row)
                    .execute(conn)?;
            }
            Ok(written)
        })
    }
}

/// Sums player lines into one line per (team, game).
/// A team's plus-minus is its scoring margin: its points less everyone else's in that game.
pub fn team_lines(players: &[PlayerBoxScore]) -> Vec<NewTeamBoxScore> {
    let mut sums: BTreeMap<(i32, i32), StatLine> = BTreeMap::new();
    let mut game_points: HashMap<i32, i32> = HashMap::new();
    for row in players {
        *sums.entry((row.team_id, row.game_id)).or_default() += &row.line;
        *game_points.entry(row.game_id).or_default() += row.line.points;
    }
    sums.into_iter()
        .map(|((team_id, game_id), mut line)| {
            let opponents = game_points.get(&game_id).copied().unwrap_or(0) - line.points;
            line.plus_minus = line.points - opponents;
            NewTeamBoxScore::new(team_id, game_id, &line)
        })
        .collect()
}
