/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */
#![allow(clippy::too_many_arguments)]
extern crate diesel;
#[macro_use]
extern crate rocket;
#[macro_use]
extern crate serde_derive;
#[macro_use]
extern crate rocket_okapi;
#[cfg(test)]
mod test;

#[macro_use]
mod schema;
mod catchers;
pub mod db;
mod error;
pub mod jobs;
mod model;
pub mod provider;
pub use error::{Error, Result};

/// Installs the `fmt` subscriber, filtered by `RUST_LOG` (default `info`). Safe to call twice.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,rust_hoops=debug"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

pub mod rocket_launcher {
    use crate::catchers;
    use crate::db::DbConn;
    use crate::model::{game, pick, player, stats, sys, team, user};
    use rocket::{Build, Rocket};
    use rocket_okapi::swagger_ui::{make_swagger_ui, SwaggerUIConfig};

    pub fn launcher() -> Rocket<Build> {
        app(rocket::build()).attach(DbConn::fairing())
    }

    /// Every route, catcher and setting, without the database pool.
    pub(crate) fn app(rocket: Rocket<Build>) -> Rocket<Build> {
        // The paths on the /api endpoint. Defined up here for cleanliness
        let api_paths = openapi_get_routes![
            sys::route::sysinfo,
            team::route::get_teams,
            team::route::get_team,
            team::route::get_team_players,
            player::route::get_players,
            player::route::get_player,
            player::route::get_player_games,
            game::route::get_games,
            game::route::get_game,
            stats::route::get_team_stats,
            stats::route::get_player_stats,
            stats::route::get_standings,
            user::route::get_user,
            user::route::get_user_picks,
            user::route::get_leaderboard,
        ];

        // The paths on the /auth endpoint. Defined up here for cleanliness
        let auth_paths = routes![
            pick::route::post_player_pick,
            pick::route::post_team_pick,
            pick::route::delete_player_pick,
            pick::route::delete_team_pick,
            pick::route::my_picks,
        ];

        base(rocket)
            .mount("/api", api_paths)
            .mount("/auth", auth_paths)
    }

    /// Catchers, the docs page and `SysInfo`; no routes that need the database.
    pub(crate) fn base(rocket: Rocket<Build>) -> Rocket<Build> {
        crate::init_tracing();
        let mut global_info_private = sys::SysInfo::default();

        let mut saturn_v = rocket
            .register(
                "/",
                catchers![
                    catchers::bad_request,
                    catchers::not_authorized,
                    catchers::not_found,
                    catchers::unprocessable,
                    catchers::internal_error
                ],
            )
            .mount(
                "/docs/",
                make_swagger_ui(&SwaggerUIConfig {
                    url: "../api/openapi.json".to_owned(),
                    ..Default::default()
                }),
            );

        match saturn_v.figment().extract_inner("hoops") {
            Ok(settings) => global_info_private.settings = settings,
            Err(e) => {
                tracing::warn!(error = %e, "no usable [hoops] settings, using defaults");
            }
        }
        tracing::info!(
            name = %global_info_private.settings.name,
            season = global_info_private.settings.current_season(),
            "hoops settings loaded"
        );
        saturn_v = saturn_v.manage(global_info_private);

        saturn_v
    }
}
