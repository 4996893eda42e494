/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */
use crate::db::DbConn;
use crate::error::Result;
use crate::model::auth::AuthUser;
use crate::model::pick::{CreatePlayerPick, CreateTeamPick, Pick};
use crate::model::sys::SysInfo;
use rocket::response::status::Created;
use rocket::serde::json::Json;
use rocket::State;

#[post("/picks/player", format = "json", data = "<pick>")]
pub(crate) async fn post_player_pick(
    user: AuthUser,
    pick: Json<CreatePlayerPick>,
    config: &State<SysInfo>,
    conn: DbConn,
) -> Result<Created<Json<Pick>>> {
    let default_reward = config.settings.default_reward;
    let pick = pick.into_inner();
    let created = conn
        .run(move |c| Pick::create_player(user.id, pick, default_reward, c))
        .await?;
    tracing::info!(user = user.id, pick = created.id, "player pick created");
    Ok(Created::new(format!("/auth/picks/player/{}", created.id)).body(Json(created)))
}

#[post("/picks/team", format = "json", data = "<pick>")]
pub(crate) async fn post_team_pick(
    user: AuthUser,
    pick: Json<CreateTeamPick>,
    config: &State<SysInfo>,
    conn: DbConn,
) -> Result<Created<Json<Pick>>> {
    let default_reward = config.settings.default_reward;
    let pick = pick.into_inner();
    let created = conn
        .run(move |c| Pick::create_team(user.id, pick, default_reward, c))
        .await?;
    tracing::info!(user = user.id, pick = created.id, "team pick created");
    Ok(Created::new(format!("/auth/picks/team/{}", created.id)).body(Json(created)))
}

#[delete("/picks/player/<pick_id>")]
pub(crate) async fn delete_player_pick(
    user: AuthUser,
    pick_id: i32,
    conn: DbConn,
) -> Result<Json<Pick>> {
    conn.run(move |c| Pick::delete_player(user.id, pick_id, c))
        .await
        .map(Json)
}

#[delete("/picks/team/<pick_id>")]
pub(crate) async fn delete_team_pick(
    user: AuthUser,
    pick_id: i32,
    conn: DbConn,
) -> Result<Json<Pick>> {
    conn.run(move |c| Pick::delete_team(user.id, pick_id, c))
        .await
        .map(Json)
}

/// Every pick the caller has made, newest first.
#[get("/me/picks")]
pub(crate) async fn my_picks(user: AuthUser, conn: DbConn) -> Result<Json<Vec<Pick>>> {
    conn.run(move |c| Pick::by_user(user.id, c))
        .await
        .map(Json)
}
