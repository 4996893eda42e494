/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */
use crate::db::DbConn;
use crate::error::Result;
use crate::model::game::{Game, GameDetail};
use crate::model::stats::board::{parse_or, DateScope};
use crate::model::sys::SysInfo;
use rocket::serde::json::Json;
use rocket::State;

/// # Games on a date
/// Lists every game on `date` (`today`, `yesterday` or `YYYY-MM-DD`; defaults to today,
/// league-local).
#[openapi(tag = "Game", ignore = "conn")]
#[get("/games?<date>")]
pub(crate) async fn get_games(
    date: Option<String>,
    config: &State<SysInfo>,
    conn: DbConn,
) -> Result<Json<Vec<Game>>> {
    let today = config.settings.today();
    let Some(day) = parse_or(date.as_deref(), DateScope::Today)?.resolve(today) else {
        return crate::Error::validation("`season` is not a single date; pass a day instead");
    };
    conn.run(move |c| Game::on_dates(&[day], c))
        .await
        .map(Json)
}

/// # Game detail
/// A game, its teams, and all of its box scores.
#[openapi(tag = "Game", ignore = "conn")]
#[get("/game/<game_id>")]
pub(crate) async fn get_game(game_id: i32, conn: DbConn) -> Result<Json<GameDetail>> {
    conn.run(move |c| GameDetail::by_id(game_id, c))
        .await
        .map(Json)
}
