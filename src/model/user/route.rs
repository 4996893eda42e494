/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */
use crate::db::DbConn;
use crate::error::Result;
use crate::model::pick::Pick;
use crate::model::stats::board::{parse_or, Ranked, SortDirection, UserSortKey};
use crate::model::user::User;
use rocket::serde::json::Json;

/// # Retrieve a user
#[openapi(tag = "User", ignore = "conn")]
#[get("/user/<user_id>")]
pub(crate) async fn get_user(user_id: i32, conn: DbConn) -> Result<Json<User>> {
    conn.run(move |c| User::by_id(user_id, c)).await.map(Json)
}

/// # A user's picks
/// Open and graded, newest first.
#[openapi(tag = "User", ignore = "conn")]
#[get("/user/<user_id>/picks")]
pub(crate) async fn get_user_picks(user_id: i32, conn: DbConn) -> Result<Json<Vec<Pick>>> {
    conn.run(move |c| {
        User::by_id(user_id, c)?;
        Pick::by_user(user_id, c)
    })
    .await
    .map(Json)
}

/// # User leaderboard
/// `sort` is one of `wins`, `losses`, `points` (default `points`); `order` is `asc` or `desc`
/// (default `desc`).
#[openapi(tag = "User", ignore = "conn")]
#[get("/users/leaderboard?<sort>&<order>&<limit>")]
pub(crate) async fn get_leaderboard(
    sort: Option<String>,
    order: Option<String>,
    limit: Option<usize>,
    conn: DbConn,
) -> Result<Json<Vec<Ranked<User>>>> {
    let key = parse_or(sort.as_deref(), UserSortKey::Points)?;
    let direction = parse_or(order.as_deref(), SortDirection::Desc)?;
    conn.run(move |c| User::leaderboard(key, direction, limit, c))
        .await
        .map(Json)
}
