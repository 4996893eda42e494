/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */
use crate::error::{MapRre, Result};
use crate::model::game::boxscore::{PlayerBoxScore, TeamBoxScore};
use crate::model::team::Team;
use crate::schema::games;
use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use diesel_derive_enum::DbEnum;
use schemars::JsonSchema;

/// # Game Status
#[derive(DbEnum, Serialize, Deserialize, JsonSchema, Debug, Clone, Copy, PartialEq, Eq)]
#[ExistingTypePath = "crate::schema::sql_types::GameStatus"]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    Scheduled,
    InPlay,
    Finished,
}

/// # Game
///
/// _**Note:** `home_score` and `away_score` are null until tip-off, and `winner_id` is null until
/// the game is `finished`._
#[derive(Queryable, Selectable, Serialize, Deserialize, JsonSchema, Debug, Clone, PartialEq)]
#[diesel(table_name = games)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Game {
    pub id: i32,
    pub external_id: i32,
    pub season: i32,
    pub game_date: NaiveDate,
    /// Scheduled tip-off, UTC
    pub start_time: Option<NaiveDateTime>,
    pub home_team_id: i32,
    pub away_team_id: i32,
    pub status: GameStatus,
    pub period: i32,
    pub clock: Option<String>,
    pub home_score: Option<i32>,
    pub away_score: Option<i32>,
    pub winner_id: Option<i32>,
}

#[derive(Insertable, AsChangeset, Debug, Clone, PartialEq)]
#[diesel(table_name = games)]
#[diesel(treat_none_as_null = true)]
pub struct NewGame {
    pub external_id: i32,
    pub season: i32,
    pub game_date: NaiveDate,
    pub start_time: Option<NaiveDateTime>,
    pub home_team_id: i32,
    pub away_team_id: i32,
    pub status: GameStatus,
    pub period: i32,
    pub clock: Option<String>,
    pub home_score: Option<i32>,
    pub away_score: Option<i32>,
    pub winner_id: Option<i32>,
}

/// A game as the provider describes it, with team ids already mapped to local ones.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportedGame {
    pub external_id: i32,
    pub season: i32,
    pub game_date: NaiveDate,
    pub start_time: Option<NaiveDateTime>,
    pub home_team_id: i32,
    pub away_team_id: i32,
    /// Free text such as `Final`, `3rd Qtr` or a tip-off time
    pub status_text: String,
    pub period: i32,
    pub clock: Option<String>,
    pub home_score: i32,
    pub away_score: i32,
}

impl From<ReportedGame> for NewGame {
    fn from(reported: ReportedGame) -> NewGame {
        let status = if reported
            .status_text
            .trim()
            .to_ascii_lowercase()
            .starts_with("final")
        {
            GameStatus::Finished
        } else if reported.period > 0 {
            GameStatus::InPlay
        } else {
            GameStatus::Scheduled
        };
        let (home_score, away_score) = match status {
            GameStatus::Scheduled => (None, None),
            _ => (Some(reported.home_score), Some(reported.away_score)),
        };
        let winner_id = match status {
            GameStatus::Finished if reported.home_score > reported.away_score => {
                Some(reported.home_team_id)
            }
            GameStatus::Finished if reported.away_score > reported.home_score => {
                Some(reported.away_team_id)
            }
            _ => None,
        };
        NewGame {
            external_id: reported.external_id,
            season: reported.season,
            game_date: reported.game_date,
            start_time: reported.start_time,
            home_team_id: reported.home_team_id,
            away_team_id: reported.away_team_id,
            status,
            period: reported.period,
            clock: reported.clock.filter(|clock| !clock.trim().is_empty()),
            home_score,
            away_score,
            winner_id,
        }
    }
}

impl Game {
    pub fn by_id(game_id: i32, conn: &mut PgConnection) -> Result<Game> {
        games::table
            .find(game_id)
            .select(Game::as_select())
            .first(conn)
            .map_rre()
    }

    pub fn on_dates(dates: &[NaiveDate], conn: &mut PgConnection) -> Result<Vec<Game>> {
        games::table
            .filter(games::game_date.eq_any(dates))
            .select(Game::as_select())
            .order_by((games::game_date.asc(), games::start_time.asc(), games::id.asc()))
            .load(conn)
            .map_rre()
    }

    pub fn finished_in_season(season: i32, conn: &mut PgConnection) -> Result<Vec<Game>> {
        games::table
            .filter(games::season.eq(season))
            .filter(games::status.eq(GameStatus::Finished))
            .select(Game::as_select())
            .order_by(games::game_date.asc())
            .load(conn)
            .map_rre()
    }

    pub fn involves(&self, team_id: i32) -> bool {
        self.home_team_id == team_id || self.away_team_id == team_id
    }

    pub fn upsert(rows: &[NewGame], conn: &mut PgConnection) -> Result<usize> {
        conn.transaction::<_, crate::Error, _>(|conn| {
            let mut written = 0;
            for row in rows {
                written += diesel::insert_into(games::table)
                    .values(row)
                    .on_conflict(games::external_id)
                    .do_update()
                    .set(row)
                    .execute(conn)?;
            }
            Ok(written)
        })
    }
}

/// # Game Detail
/// A game with both teams and every box score recorded for it.
#[derive(Serialize, Deserialize, JsonSchema, Debug)]
pub struct GameDetail {
    #[serde(flatten)]
    pub game: Game,
    pub home_team: Team,
    pub away_team: Team,
    pub team_box_scores: Vec<TeamBoxScore>,
    pub player_box_scores: Vec<PlayerBoxScore>,
}

impl GameDetail {
    pub fn by_id(game_id: i32, conn: &mut PgConnection) -> Result<GameDetail> {
        let game = Game::by_id(game_id, conn)?;
        Ok(GameDetail {
            home_team: Team::by_id(game.home_team_id, conn)?,
            away_team: Team::by_id(game.away_team_id, conn)?,
            team_box_scores: TeamBoxScore::by_game(game.id, conn)?,
            player_box_scores: PlayerBoxScore::by_game(game.id, conn)?,
            game,
        })
    }
}
