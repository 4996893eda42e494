/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use diesel::{Connection, PgConnection};
use rocket::figment::Figment;
use rocket_sync_db_pools::database;

#[database("postgres_global")]
pub struct DbConn(PgConnection);

/// Opens a plain connection for the keeper, using the same figment the server reads.
pub fn establish_connection(figment: &Figment) -> crate::Result<PgConnection> {
    let database_url: String = figment
        .extract_inner("databases.postgres_global.url")
        .map_err(|_| crate::Error::InternalServerError {})?;
    Ok(PgConnection::establish(&database_url)?)
}
