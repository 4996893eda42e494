/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */
use crate::db::DbConn;
use crate::error::Result;
use crate::model::player::Player;
use crate::model::team::Team;
use rocket::serde::json::Json;

/// # List of all teams
#[openapi(tag = "Team", ignore = "conn")]
#[get("/teams")]
pub(crate) async fn get_teams(conn: DbConn) -> Result<Json<Vec<Team>>> {
    conn.run(move |c| Team::all(c)).await.map(Json)
}

/// # Retrieve a team
#[openapi(tag = "Team", ignore = "conn")]
#[get("/team/<team_id>")]
pub(crate) async fn get_team(team_id: i32, conn: DbConn) -> Result<Json<Team>> {
    conn.run(move |c| Team::by_id(team_id, c)).await.map(Json)
}

/// # Team roster
#[openapi(tag = "Team", ignore = "conn")]
#[get("/team/<team_id>/players")]
pub(crate) async fn get_team_players(team_id: i32, conn: DbConn) -> Result<Json<Vec<Player>>> {
    conn.run(move |c| Player::by_team(team_id, c))
        .await
        .map(Json)
}
