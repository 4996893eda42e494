/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */
use crate::error::{MapRre, Result};
use crate::schema::teams;
use diesel::prelude::*;
use diesel::upsert::excluded;
use schemars::JsonSchema;
use std::collections::HashMap;

/// # Team
#[derive(Queryable, Selectable, Serialize, Deserialize, JsonSchema, Debug, Clone, PartialEq)]
#[diesel(table_name = teams)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Team {
    pub id: i32,
    /// The stats provider's id for this team
    pub external_id: i32,
    /// e.g. `BOS`
    pub abbreviation: String,
    pub city: String,
    pub name: String,
    pub full_name: String,
    /// `East` or `West`
    pub conference: String,
    pub division: String,
}

#[derive(Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = teams)]
pub struct NewTeam {
    pub external_id: i32,
    pub abbreviation: String,
    pub city: String,
    pub name: String,
    pub full_name: String,
    pub conference: String,
    pub division: String,
}

impl Team {
    pub fn all(conn: &mut PgConnection) -> Result<Vec<Team>> {
        teams::table
            .select(Team::as_select())
            .order_by(teams::full_name.asc())
            .load(conn)
            .map_rre()
    }

    pub fn by_id(team_id: i32, conn: &mut PgConnection) -> Result<Team> {
        teams::table
            .find(team_id)
            .select(Team::as_select())
            .first(conn)
            .map_rre()
    }

    pub fn by_ids(team_ids: &[i32], conn: &mut PgConnection) -> Result<Vec<Team>> {
        teams::table
            .filter(teams::id.eq_any(team_ids))
            .select(Team::as_select())
            .order_by(teams::full_name.asc())
            .load(conn)
            .map_rre()
    }

    pub fn exists(team_id: i32, conn: &mut PgConnection) -> Result<bool> {
        diesel::select(diesel::dsl::exists(teams::table.find(team_id)))
            .get_result(conn)
            .map_rre()
    }

    /// Provider id to local id, for every known team.
    pub fn external_map(conn: &mut PgConnection) -> Result<HashMap<i32, i32>> {
        Ok(teams::table
            .select((teams::external_id, teams::id))
            .load::<(i32, i32)>(conn)?
            .into_iter()
            .collect())
    }

    /// Inserts new teams and refreshes the descriptive fields of known ones.
    pub fn upsert(rows: &[NewTeam], conn: &mut PgConnection) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }
        diesel::insert_into(teams::table)
            .values(rows)
            .on_conflict(teams::external_id)
            .do_update()
            .set((
                teams::abbreviation.eq(excluded(teams::abbreviation)),
                teams::city.eq(excluded(teams::city)),
                teams::name.eq(excluded(teams::name)),
                teams::full_name.eq(excluded(teams::full_name)),
                teams::conference.eq(excluded(teams::conference)),
                teams::division.eq(excluded(teams::division)),
            ))
            .execute(conn)
            .map_rre()
    }
}
