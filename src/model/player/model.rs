/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */
use crate::error::{MapRre, Result};
use crate::model::team::Team;
use crate::schema::players;
use diesel::prelude::*;
use diesel::upsert::excluded;
use schemars::JsonSchema;
use std::collections::HashMap;

/// # Player
#[derive(Queryable, Selectable, Serialize, Deserialize, JsonSchema, Debug, Clone, PartialEq)]
#[diesel(table_name = players)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Player {
    pub id: i32,
    /// The stats provider's id for this player
    pub external_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub position: String,
    /// Current team; follows trades on the next roster refresh
    pub team_id: Option<i32>,
}

#[derive(Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = players)]
pub struct NewPlayer {
    pub external_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub position: String,
    pub team_id: Option<i32>,
}

impl Player {
    pub fn all(team: Option<i32>, conn: &mut PgConnection) -> Result<Vec<Player>> {
        let mut query = players::table
            .select(Player::as_select())
            .order_by((players::last_name.asc(), players::first_name.asc()))
            .into_boxed();
        if let Some(team) = team {
            query = query.filter(players::team_id.eq(team));
        }
        query.load(conn).map_rre()
    }

    pub fn by_id(player_id: i32, conn: &mut PgConnection) -> Result<Player> {
        players::table
            .find(player_id)
            .select(Player::as_select())
            .first(conn)
            .map_rre()
    }

    /// A team's current roster; an unknown team is a 404 rather than an empty list.
    pub fn by_team(team_id: i32, conn: &mut PgConnection) -> Result<Vec<Player>> {
        if !Team::exists(team_id, conn)? {
            return crate::Error::not_found();
        }
        Player::all(Some(team_id), conn)
    }

    pub fn by_ids(player_ids: &[i32], conn: &mut PgConnection) -> Result<Vec<Player>> {
        players::table
            .filter(players::id.eq_any(player_ids))
            .select(Player::as_select())
            .load(conn)
            .map_rre()
    }

    pub fn on_teams(team_ids: &[i32], conn: &mut PgConnection) -> Result<Vec<Player>> {
        players::table
            .filter(players::team_id.eq_any(team_ids))
            .select(Player::as_select())
            .load(conn)
            .map_rre()
    }

    pub fn external_map(conn: &mut PgConnection) -> Result<HashMap<i32, i32>> {
        Ok(players::table
            .select((players::external_id, players::id))
            .load::<(i32, i32)>(conn)?
            .into_iter()
            .collect())
    }

    /// Inserts new players and moves known ones to whatever team the provider now lists.
    pub fn upsert(rows: &[NewPlayer], conn: &mut PgConnection) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }
        diesel::insert_into(players::table)
            .values(rows)
            .on_conflict(players::external_id)
            .do_update()
            .set((
                players::first_name.eq(excluded(players::first_name)),
                players::last_name.eq(excluded(players::last_name)),
                players::position.eq(excluded(players::position)),
                players::team_id.eq(excluded(players::team_id)),
            ))
            .execute(conn)
            .map_rre()
    }
}
