/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */
use crate::error::{MapRre, Result};
use crate::model::stats::board::{rank, Ranked, SortDirection, UserSortKey};
use crate::schema::users;
use chrono::NaiveDateTime;
use diesel::prelude::*;
use schemars::JsonSchema;

/// # User
/// A picker and their record. `wins`, `losses` and `points` only move when picks are graded.
#[derive(Queryable, Selectable, Serialize, Deserialize, JsonSchema, Debug, Clone, PartialEq)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct User {
    pub id: i32,
    pub username: String,
    pub wins: i32,
    pub losses: i32,
    pub points: i32,
    pub created: NaiveDateTime,
}

impl User {
    pub fn by_id(user_id: i32, conn: &mut PgConnection) -> Result<User> {
        users::table
            .find(user_id)
            .select(User::as_select())
            .first(conn)
            .map_rre()
    }

    pub fn sort_value(&self, key: UserSortKey) -> f64 {
        f64::from(match key {
            UserSortKey::Wins => self.wins,
            UserSortKey::Losses => self.losses,
            UserSortKey::Points => self.points,
        })
    }

    pub fn leaderboard(
        key: UserSortKey,
        direction: SortDirection,
        limit: Option<usize>,
        conn: &mut PgConnection,
    ) -> Result<Vec<Ranked<User>>> {
        let all = users::table
            .select(User::as_select())
            .order_by(users::id.asc())
            .load(conn)?;
        Ok(rank(all, direction, limit, |user| user.sort_value(key)))
    }
}
