/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */
use crate::db::DbConn;
use crate::error::Result;
use crate::model::stats::aggregate::View;
use crate::model::stats::board::{parse_or, DateScope, Ranked, SortDirection, StatKey, TeamSortKey};
use crate::model::stats::model::{BoardQuery, PlayerStatRow, StandingRow, TeamStatRow};
use crate::model::sys::SysInfo;
use rocket::serde::json::Json;
use rocket::State;

fn board_query(
    view: Option<&str>,
    order: Option<&str>,
    date: Option<&str>,
    game: Option<i32>,
    team: Option<i32>,
    limit: Option<usize>,
    config: &SysInfo,
) -> Result<BoardQuery> {
    let scope = date.map(str::parse::<DateScope>).transpose()?;
    Ok(BoardQuery {
        view: parse_or(view, View::Totals)?,
        direction: parse_or(order, SortDirection::Desc)?,
        day: scope.and_then(|scope| scope.resolve(config.settings.today())),
        game,
        team,
        limit,
        season: config.settings.current_season(),
    })
}

/// # Team stat board
/// Teams ranked by `sort` (any stat name, or `wins`, `losses`, `win_pct`; default `points`).
///
/// `view` is `totals`, `per_game` or `per_36`; `date` is `today`, `yesterday`, `season` or
/// `YYYY-MM-DD`. A date with no box scores yet lists the teams scheduled that day with their
/// season-to-date figures.
#[openapi(tag = "Stats", ignore = "conn")]
#[get("/teams/stats?<sort>&<order>&<view>&<date>&<game>&<limit>")]
pub(crate) async fn get_team_stats(
    sort: Option<String>,
    order: Option<String>,
    view: Option<String>,
    date: Option<String>,
    game: Option<i32>,
    limit: Option<usize>,
    config: &State<SysInfo>,
    conn: DbConn,
) -> Result<Json<Vec<Ranked<TeamStatRow>>>> {
    let key = parse_or(sort.as_deref(), TeamSortKey::Stat(StatKey::Points))?;
    let query = board_query(
        view.as_deref(),
        order.as_deref(),
        date.as_deref(),
        game,
        None,
        limit,
        config,
    )?;
    conn.run(move |c| TeamStatRow::board(query, key, c))
        .await
        .map(Json)
}

/// # Player stat board
/// Players ranked by `sort` (any stat name; default `points`), optionally narrowed to a `team`,
/// a single `game`, or a `date`.
#[openapi(tag = "Stats", ignore = "conn")]
#[get("/players/stats?<sort>&<order>&<view>&<team>&<game>&<date>&<limit>")]
pub(crate) async fn get_player_stats(
    sort: Option<String>,
    order: Option<String>,
    view: Option<String>,
    team: Option<i32>,
    game: Option<i32>,
    date: Option<String>,
    limit: Option<usize>,
    config: &State<SysInfo>,
    conn: DbConn,
) -> Result<Json<Vec<Ranked<PlayerStatRow>>>> {
    let key = parse_or(sort.as_deref(), StatKey::Points)?;
    let query = board_query(
        view.as_deref(),
        order.as_deref(),
        date.as_deref(),
        game,
        team,
        limit,
        config,
    )?;
    conn.run(move |c| PlayerStatRow::board(query, key, c))
        .await
        .map(Json)
}

/// # League standings
/// Records for `season` (default current), sorted by `wins`, `losses` or `win_pct`
/// (default `win_pct`).
#[openapi(tag = "Stats", ignore = "conn")]
#[get("/teams/standings?<season>&<sort>&<order>&<limit>")]
pub(crate) async fn get_standings(
    season: Option<i32>,
    sort: Option<String>,
    order: Option<String>,
    limit: Option<usize>,
    config: &State<SysInfo>,
    conn: DbConn,
) -> Result<Json<Vec<Ranked<StandingRow>>>> {
    let season = season.unwrap_or_else(|| config.settings.current_season());
    let key = parse_or(sort.as_deref(), TeamSortKey::WinPct)?;
    let direction = parse_or(order.as_deref(), SortDirection::Desc)?;
    conn.run(move |c| StandingRow::board(season, key, direction, limit, c))
        .await
        .map(Json)
}
