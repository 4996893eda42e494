/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */
use crate::db::DbConn;
use crate::error::Result;
use crate::model::game::{GameLogEntry, PlayerBoxScore};
use crate::model::player::Player;
use crate::model::sys::SysInfo;
use rocket::serde::json::Json;
use rocket::State;

/// # List of players
/// Every known player, or only the current roster of `team` when given.
#[openapi(tag = "Player", ignore = "conn")]
#[get("/players?<team>")]
pub(crate) async fn get_players(team: Option<i32>, conn: DbConn) -> Result<Json<Vec<Player>>> {
    conn.run(move |c| Player::all(team, c)).await.map(Json)
}

/// # Retrieve a player
#[openapi(tag = "Player", ignore = "conn")]
#[get("/player/<player_id>")]
pub(crate) async fn get_player(player_id: i32, conn: DbConn) -> Result<Json<Player>> {
    conn.run(move |c| Player::by_id(player_id, c))
        .await
        .map(Json)
}

/// # Player game log
/// Every box score line of a player in `season` (defaults to the current season), newest first.
#[openapi(tag = "Player", ignore = "conn")]
#[get("/player/<player_id>/games?<season>")]
pub(crate) async fn get_player_games(
    player_id: i32,
    season: Option<i32>,
    config: &State<SysInfo>,
    conn: DbConn,
) -> Result<Json<Vec<GameLogEntry>>> {
    let season = season.unwrap_or_else(|| config.settings.current_season());
    conn.run(move |c| {
        // Resolve the player first so an unknown id is a 404, not an empty log.
        Player::by_id(player_id, c)?;
        PlayerBoxScore::game_log(player_id, season, c)
    })
    .await
    .map(Json)
}
