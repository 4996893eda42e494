/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */
use crate::model::game::ReportedGame;
use crate::model::player::NewPlayer;
use crate::model::stats::aggregate::StatLine;
use crate::model::team::NewTeam;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::HashMap;

/// One page of a cursor-paginated listing.
#[derive(Deserialize, Debug)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(default)]
    pub meta: Meta,
}

#[derive(Deserialize, Debug, Default)]
pub struct Meta {
    #[serde(default)]
    pub next_cursor: Option<i64>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(default)]
pub struct ApiTeam {
    #[serde(deserialize_with = "lenient_int")]
    pub id: i32,
    #[serde(deserialize_with = "lenient_string")]
    pub abbreviation: String,
    #[serde(deserialize_with = "lenient_string")]
    pub city: String,
    #[serde(deserialize_with = "lenient_string")]
    pub conference: String,
    #[serde(deserialize_with = "lenient_string")]
    pub division: String,
    #[serde(deserialize_with = "lenient_string")]
    pub full_name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub name: String,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(default)]
pub struct ApiPlayer {
    #[serde(deserialize_with = "lenient_int")]
    pub id: i32,
    #[serde(deserialize_with = "lenient_string")]
    pub first_name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub last_name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub position: String,
    pub team: Option<ApiTeam>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(default)]
pub struct ApiGame {
    #[serde(deserialize_with = "lenient_int")]
    pub id: i32,
    #[serde(deserialize_with = "lenient_string")]
    pub date: String,
    #[serde(deserialize_with = "lenient_int")]
    pub season: i32,
    #[serde(deserialize_with = "lenient_string")]
    pub status: String,
    #[serde(deserialize_with = "lenient_int")]
    pub period: i32,
    pub time: Option<String>,
    pub datetime: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub home_team: ApiTeam,
    #[serde(deserialize_with = "null_as_default")]
    pub visitor_team: ApiTeam,
    #[serde(deserialize_with = "lenient_int")]
    pub home_team_score: i32,
    #[serde(deserialize_with = "lenient_int")]
    pub visitor_team_score: i32,
}

/// Only the id of a nested game is needed to attach a stat line.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(default)]
pub struct ApiGameRef {
    #[serde(deserialize_with = "lenient_int")]
    pub id: i32,
}

/// A player's line in one game.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(default)]
pub struct ApiStatLine {
    pub id: Option<i64>,
    #[serde(deserialize_with = "lenient_string")]
    pub min: String,
    #[serde(deserialize_with = "lenient_int")]
    pub pts: i32,
    #[serde(deserialize_with = "lenient_int")]
    pub fgm: i32,
    #[serde(deserialize_with = "lenient_int")]
    pub fga: i32,
    #[serde(deserialize_with = "lenient_int")]
    pub ftm: i32,
    #[serde(deserialize_with = "lenient_int")]
    pub fta: i32,
    #[serde(deserialize_with = "lenient_int")]
    pub fg3m: i32,
    #[serde(deserialize_with = "lenient_int")]
    pub fg3a: i32,
    #[serde(deserialize_with = "lenient_int")]
    pub oreb: i32,
    #[serde(deserialize_with = "lenient_int")]
    pub dreb: i32,
    #[serde(deserialize_with = "lenient_int")]
    pub ast: i32,
    #[serde(deserialize_with = "lenient_int")]
    pub pf: i32,
    #[serde(deserialize_with = "lenient_int")]
    pub stl: i32,
    #[serde(deserialize_with = "lenient_int")]
    pub turnover: i32,
    #[serde(deserialize_with = "lenient_int")]
    pub blk: i32,
    #[serde(deserialize_with = "lenient_int")]
    pub plus_minus: i32,
    pub player: Option<ApiPlayer>,
    pub team: Option<ApiTeam>,
    pub game: Option<ApiGameRef>,
}

/// Accepts numbers, numeric strings and null; anything unreadable is zero.
fn lenient_int<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_f64().map_or(0, |v| v.round() as i32),
        Some(Value::String(s)) => s.trim().parse::<f64>().map_or(0, |v| v.round() as i32),
        _ => 0,
    })
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    })
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Minutes as reported by the provider: `"34:12"`, `"34"`, `""`.
pub fn parse_minutes(raw: &str) -> f64 {
    let raw = raw.trim();
    match raw.split_once(':') {
        Some((mins, secs)) => {
            let mins = mins.trim().parse::<f64>().unwrap_or(0.0);
            let secs = secs.trim().parse::<f64>().unwrap_or(0.0);
            mins + secs / 60.0
        }
        None => raw.parse::<f64>().unwrap_or(0.0),
    }
}

/// Provider dates come either bare or as a full timestamp; only the day matters.
fn parse_day(raw: &str) -> Option<NaiveDate> {
    raw.get(..10)
        .and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok())
}

fn parse_start(raw: Option<&str>) -> Option<NaiveDateTime> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.naive_utc())
}

impl ApiTeam {
    /// Historical franchises come back with a blank conference.
    pub fn is_active(&self) -> bool {
        !self.conference.trim().is_empty()
    }

    pub fn to_new(&self) -> NewTeam {
        NewTeam {
            external_id: self.id,
            abbreviation: self.abbreviation.clone(),
            city: self.city.clone(),
            name: self.name.clone(),
            full_name: self.full_name.clone(),
            conference: self.conference.trim().to_string(),
            division: self.division.trim().to_string(),
        }
    }
}

impl ApiPlayer {
    /// `teams` maps provider team ids to local ids; unknown teams leave the player unattached.
    pub fn to_new(&self, teams: &HashMap<i32, i32>) -> NewPlayer {
        NewPlayer {
            external_id: self.id,
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            position: self.position.clone(),
            team_id: self
                .team
                .as_ref()
                .and_then(|team| teams.get(&team.id).copied()),
        }
    }
}

impl ApiGame {
    /// `None` when either team is unknown locally or the date is unreadable.
    pub fn report(&self, teams: &HashMap<i32, i32>) -> Option<ReportedGame> {
        Some(ReportedGame {
            external_id: self.id,
            season: self.season,
            game_date: parse_day(&self.date)?,
            start_time: parse_start(self.datetime.as_deref()),
            home_team_id: *teams.get(&self.home_team.id)?,
            away_team_id: *teams.get(&self.visitor_team.id)?,
            status_text: self.status.clone(),
            period: self.period,
            clock: self.time.clone(),
            home_score: self.home_team_score,
            away_score: self.visitor_team_score,
        })
    }
}

impl ApiStatLine {
    pub fn line(&self) -> StatLine {
        StatLine {
            minutes: parse_minutes(&self.min),
            points: self.pts,
            fgm: self.fgm,
            fga: self.fga,
            ftm: self.ftm,
            fta: self.fta,
            tpm: self.fg3m,
            tpa: self.fg3a,
            off_reb: self.oreb,
            def_reb: self.dreb,
            assists: self.ast,
            fouls: self.pf,
            steals: self.stl,
            turnovers: self.turnover,
            blocks: self.blk,
            plus_minus: self.plus_minus,
        }
    }

    /// Provider ids of the player, team and game, when all three came through.
    pub fn refs(&self) -> Option<(i32, i32, i32)> {
        Some((
            self.player.as_ref()?.id,
            self.team.as_ref()?.id,
            self.game.as_ref()?.id,
        ))
    }

    /// A player who logged no minutes and no counting stats did not play.
    pub fn is_dnp(&self) -> bool {
        self.line() == StatLine::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minutes_formats() {
        assert!((parse_minutes("34:12") - 34.2).abs() < 1e-9);
        assert_eq!(parse_minutes("34"), 34.0);
        assert_eq!(parse_minutes(""), 0.0);
        assert_eq!(parse_minutes("garbage"), 0.0);
        assert_eq!(parse_minutes("00:30"), 0.5);
    }

    #[test]
    fn stat_line_with_nulls_and_missing_fields() {
        let raw = r#"{
            "id": 7,
            "min": null,
            "pts": 20,
            "fgm": "8",
            "oreb": null,
            "dreb": 5,
            "plus_minus": -3.0,
            "player": {"id": 115, "first_name": "Steph", "last_name": "Curry", "position": "G"},
            "team": {"id": 10},
            "game": {"id": 900}
        }"#;
        let line: ApiStatLine = serde_json::from_str(raw).unwrap();
        let stat = line.line();
        assert_eq!(stat.points, 20);
        assert_eq!(stat.fgm, 8);
        assert_eq!(stat.fga, 0);
        assert_eq!(stat.off_reb, 0);
        assert_eq!(stat.total_reb(), 5);
        assert_eq!(stat.plus_minus, -3);
        assert_eq!(stat.minutes, 0.0);
        assert_eq!(line.refs(), Some((115, 10, 900)));
        assert!(!line.is_dnp());
    }

    #[test]
    fn empty_line_is_dnp() {
        let line: ApiStatLine =
            serde_json::from_str(r#"{"min": "", "player": {"id": 1}}"#).unwrap();
        assert!(line.is_dnp());
    }

    #[test]
    fn null_nested_objects_spoil_only_their_row() {
        let raw = r#"{
            "data": [
                {"id": 1, "pts": 12, "player": null, "team": {"id": 10}, "game": {"id": 900}},
                {"id": 2, "pts": 8, "player": {"id": 115, "first_name": null}, "team": {"id": null}, "game": {"id": 900}},
                {"id": 3, "pts": 30, "player": {"id": 116}, "team": {"id": 10}, "game": {"id": 900}}
            ],
            "meta": {"next_cursor": null}
        }"#;
        let page: Page<ApiStatLine> = serde_json::from_str(raw).unwrap();
        assert_eq!(page.data.len(), 3);
        assert_eq!(page.data[0].refs(), None);
        assert_eq!(page.data[1].refs(), Some((115, 0, 900)));
        assert_eq!(page.data[2].refs(), Some((116, 10, 900)));
    }

    #[test]
    fn game_with_null_team_is_not_reported() {
        let raw = r#"{"id": 56, "date": "2024-11-02", "home_team": null, "visitor_team": {"id": 2}}"#;
        let game: ApiGame = serde_json::from_str(raw).unwrap();
        assert_eq!(game.home_team.id, 0);
        assert!(game.report(&HashMap::from([(1, 11), (2, 12)])).is_none());
    }

    #[test]
    fn page_without_meta() {
        let page: Page<ApiTeam> = serde_json::from_str(r#"{"data": [{"id": 1}]}"#).unwrap();
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.meta.next_cursor, None);
    }

    #[test]
    fn game_report_maps_teams_and_dates() {
        let raw = r#"{
            "id": 55,
            "date": "2024-11-02",
            "season": 2024,
            "status": "Final",
            "period": 4,
            "time": "Final",
            "datetime": "2024-11-02T23:30:00.000Z",
            "home_team": {"id": 1},
            "visitor_team": {"id": 2},
            "home_team_score": 110,
            "visitor_team_score": 99
        }"#;
        let game: ApiGame = serde_json::from_str(raw).unwrap();
        let teams = HashMap::from([(1, 11), (2, 12)]);
        let report = game.report(&teams).unwrap();
        assert_eq!(report.home_team_id, 11);
        assert_eq!(report.away_team_id, 12);
        assert_eq!(
            report.game_date,
            NaiveDate::from_ymd_opt(2024, 11, 2).unwrap()
        );
        assert!(report.start_time.is_some());
        assert_eq!(report.home_score, 110);

        let partial = HashMap::from([(1, 11)]);
        assert!(game.report(&partial).is_none());
    }

    #[test]
    fn historical_teams_are_inactive() {
        let team = ApiTeam {
            id: 40,
            conference: " ".to_string(),
            ..Default::default()
        };
        assert!(!team.is_active());
    }
}
