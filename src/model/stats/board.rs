/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Sorting, scoping and ranking for the leaderboard-style read routes.

use crate::model::stats::aggregate::StatSheet;
use chrono::{Duration, NaiveDate};
use schemars::JsonSchema;
use std::cmp::Ordering;
use std::str::FromStr;

/// # Stat Key
/// The stats a board can be sorted by.
#[derive(Serialize, Deserialize, JsonSchema, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StatKey {
    Points,
    Fgm,
    Fga,
    Fgp,
    Ftm,
    Fta,
    Ftp,
    Tpm,
    Tpa,
    Tpp,
    OffReb,
    DefReb,
    TotalReb,
    Assists,
    Fouls,
    Steals,
    Turnovers,
    Blocks,
    PlusMinus,
}

impl StatKey {
    pub const ALL: [StatKey; 19] = [
        StatKey::Points,
        StatKey::Fgm,
        StatKey::Fga,
        StatKey::Fgp,
        StatKey::Ftm,
        StatKey::Fta,
        StatKey::Ftp,
        StatKey::Tpm,
        StatKey::Tpa,
        StatKey::Tpp,
        StatKey::OffReb,
        StatKey::DefReb,
        StatKey::TotalReb,
        StatKey::Assists,
        StatKey::Fouls,
        StatKey::Steals,
        StatKey::Turnovers,
        StatKey::Blocks,
        StatKey::PlusMinus,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StatKey::Points => "points",
            StatKey::Fgm => "fgm",
            StatKey::Fga => "fga",
            StatKey::Fgp => "fgp",
            StatKey::Ftm => "ftm",
            StatKey::Fta => "fta",
            StatKey::Ftp => "ftp",
            StatKey::Tpm => "tpm",
            StatKey::Tpa => "tpa",
            StatKey::Tpp => "tpp",
            StatKey::OffReb => "off_reb",
            StatKey::DefReb => "def_reb",
            StatKey::TotalReb => "total_reb",
            StatKey::Assists => "assists",
            StatKey::Fouls => "fouls",
            StatKey::Steals => "steals",
            StatKey::Turnovers => "turnovers",
            StatKey::Blocks => "blocks",
            StatKey::PlusMinus => "plus_minus",
        }
    }
}

impl FromStr for StatKey {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<StatKey> {
        let wanted = s.to_ascii_lowercase();
        StatKey::ALL
            .iter()
            .copied()
            .find(|key| key.as_str() == wanted)
            .map_or_else(
                || {
                    crate::Error::validation(format!(
                        "unknown sort key `{s}`; expected one of {}",
                        StatKey::ALL.map(|k| k.as_str()).join(", ")
                    ))
                },
                Ok,
            )
    }
}

impl StatSheet {
    pub fn stat(&self, key: StatKey) -> f64 {
        match key {
            StatKey::Points => self.points,
            StatKey::Fgm => self.fgm,
            StatKey::Fga => self.fga,
            StatKey::Fgp => self.fgp,
            StatKey::Ftm => self.ftm,
            StatKey::Fta => self.fta,
            StatKey::Ftp => self.ftp,
            StatKey::Tpm => self.tpm,
            StatKey::Tpa => self.tpa,
            StatKey::Tpp => self.tpp,
            StatKey::OffReb => self.off_reb,
            StatKey::DefReb => self.def_reb,
            StatKey::TotalReb => self.total_reb,
            StatKey::Assists => self.assists,
            StatKey::Fouls => self.fouls,
            StatKey::Steals => self.steals,
            StatKey::Turnovers => self.turnovers,
            StatKey::Blocks => self.blocks,
            StatKey::PlusMinus => self.plus_minus,
        }
    }
}

/// Team boards also sort by record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TeamSortKey {
    Stat(StatKey),
    Wins,
    Losses,
    WinPct,
}

impl FromStr for TeamSortKey {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<TeamSortKey> {
        match s.to_ascii_lowercase().as_str() {
            "wins" => Ok(TeamSortKey::Wins),
            "losses" => Ok(TeamSortKey::Losses),
            "win_pct" => Ok(TeamSortKey::WinPct),
            _ => s.parse().map(TeamSortKey::Stat).or_else(|_| {
                crate::Error::validation(format!(
                    "unknown sort key `{s}`; expected wins, losses, win_pct or a stat name"
                ))
            }),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UserSortKey {
    Wins,
    Losses,
    Points,
}

impl FromStr for UserSortKey {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<UserSortKey> {
        match s.to_ascii_lowercase().as_str() {
            "wins" => Ok(UserSortKey::Wins),
            "losses" => Ok(UserSortKey::Losses),
            "points" => Ok(UserSortKey::Points),
            _ => crate::Error::validation(format!(
                "unknown sort key `{s}`; expected one of wins, losses, points"
            )),
        }
    }
}

#[derive(Serialize, Deserialize, JsonSchema, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl FromStr for SortDirection {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<SortDirection> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            _ => crate::Error::validation(format!(
                "unknown sort direction `{s}`; expected asc or desc"
            )),
        }
    }
}

/// # Date Scope
/// `today`, `yesterday`, `season`, or an exact `YYYY-MM-DD` date.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DateScope {
    Today,
    Yesterday,
    Season,
    On(NaiveDate),
}

impl DateScope {
    /// The day this scope covers, given the league-local date; `None` is season-to-date.
    pub fn resolve(&self, today: NaiveDate) -> Option<NaiveDate> {
        match self {
            DateScope::Today => Some(today),
            DateScope::Yesterday => Some(today - Duration::days(1)),
            DateScope::Season => None,
            DateScope::On(date) => Some(*date),
        }
    }
}

impl FromStr for DateScope {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<DateScope> {
        match s.to_ascii_lowercase().as_str() {
            "today" => Ok(DateScope::Today),
            "yesterday" => Ok(DateScope::Yesterday),
            "season" => Ok(DateScope::Season),
            other => NaiveDate::parse_from_str(other, "%Y-%m-%d")
                .map(DateScope::On)
                .or_else(|_| {
                    crate::Error::validation(format!(
                        "unknown date `{s}`; expected today, yesterday, season or YYYY-MM-DD"
                    ))
                }),
        }
    }
}

/// Parses an optional query parameter; absent means `default`, present-but-invalid is an error.
pub fn parse_or<T>(param: Option<&str>, default: T) -> crate::Result<T>
where
    T: FromStr<Err = crate::Error>,
{
    match param {
        Some(raw) => raw.parse(),
        None => Ok(default),
    }
}

/// # Ranked Row
/// A row with its position on the board. Tied rows share a rank.
#[derive(Serialize, Deserialize, JsonSchema, Clone, Debug, PartialEq)]
pub struct Ranked<T> {
    pub rank: usize,
    #[serde(flatten)]
    pub item: T,
}

/// Stable sort by `key`; ties keep their incoming order.
pub fn order<T, F>(rows: &mut [T], direction: SortDirection, key: F)
where
    F: Fn(&T) -> f64,
{
    rows.sort_by(|a, b| {
        let ord = key(a).total_cmp(&key(b));
        match direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });
}

/// Sorts, assigns competition ranks (1, 2, 2, 4) and keeps the first `limit` rows.
pub fn rank<T, F>(
    mut rows: Vec<T>,
    direction: SortDirection,
    limit: Option<usize>,
    key: F,
) -> Vec<Ranked<T>>
where
    F: Fn(&T) -> f64,
{
    order(&mut rows, direction, &key);
    let mut ranked: Vec<Ranked<T>> = Vec::with_capacity(rows.len());
    let mut previous: Option<f64> = None;
    let mut current_rank = 0;
    for (index, row) in rows.into_iter().enumerate() {
        let value = key(&row);
        if previous.map_or(true, |p| p.total_cmp(&value) != Ordering::Equal) {
            current_rank = index + 1;
        }
        previous = Some(value);
        ranked.push(Ranked {
            rank: current_rank,
            item: row,
        });
    }
    if let Some(limit) = limit {
        ranked.truncate(limit);
    }
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Record {
        name: &'static str,
        wins: i32,
        losses: i32,
    }

    fn records() -> Vec<Record> {
        vec![
            Record {
                name: "B",
                wins: 8,
                losses: 25,
            },
            Record {
                name: "C",
                wins: 6,
                losses: 27,
            },
            Record {
                name: "A",
                wins: 25,
                losses: 8,
            },
        ]
    }

    #[test]
    fn test_sort_by_wins_desc() {
        let direction: SortDirection = "DESC".parse().unwrap();
        let board = rank(records(), direction, None, |r| f64::from(r.wins));
        let names: Vec<&str> = board.iter().map(|r| r.item.name).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
        assert_eq!(
            board.iter().map(|r| r.rank).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }

    #[test]
    fn test_sort_by_losses_asc() {
        let board = rank(records(), SortDirection::Asc, None, |r| {
            f64::from(r.losses)
        });
        let names: Vec<&str> = board.iter().map(|r| r.item.name).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_ties_share_rank_and_limit_slices() {
        let rows = vec![10.0, 30.0, 20.0, 30.0, 5.0];
        let board = rank(rows, SortDirection::Desc, Some(4), |v| *v);
        assert_eq!(
            board.iter().map(|r| r.rank).collect::<Vec<_>>(),
            vec![1, 1, 3, 4]
        );
        assert_eq!(board[3].item, 10.0);
    }

    #[test]
    fn test_direction_is_case_insensitive_and_strict() {
        assert_eq!("asc".parse::<SortDirection>().unwrap(), SortDirection::Asc);
        assert_eq!("DeSc".parse::<SortDirection>().unwrap(), SortDirection::Desc);
        assert!("descending".parse::<SortDirection>().is_err());
        assert!("".parse::<SortDirection>().is_err());
    }

    #[test]
    fn test_stat_keys() {
        for key in StatKey::ALL {
            assert_eq!(key.as_str().to_uppercase().parse::<StatKey>().unwrap(), key);
        }
        let err = "rebounds".parse::<StatKey>().unwrap_err();
        assert_eq!(err.status(), rocket::http::Status::UnprocessableEntity);
    }

    #[test]
    fn test_team_sort_key() {
        assert_eq!("Wins".parse::<TeamSortKey>().unwrap(), TeamSortKey::Wins);
        assert_eq!(
            "total_reb".parse::<TeamSortKey>().unwrap(),
            TeamSortKey::Stat(StatKey::TotalReb)
        );
        assert!("ties".parse::<TeamSortKey>().is_err());
        assert!("points".parse::<UserSortKey>().is_ok());
        assert!("fgm".parse::<UserSortKey>().is_err());
    }

    #[test]
    fn test_date_scope() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let yesterday = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
        assert_eq!(
            "TODAY".parse::<DateScope>().unwrap().resolve(today),
            Some(today)
        );
        assert_eq!(
            "yesterday".parse::<DateScope>().unwrap().resolve(today),
            Some(yesterday)
        );
        assert_eq!("season".parse::<DateScope>().unwrap().resolve(today), None);
        assert_eq!(
            "2023-12-31".parse::<DateScope>().unwrap(),
            DateScope::On(yesterday)
        );
        assert!("12/31/2023".parse::<DateScope>().is_err());
    }

    #[test]
    fn test_parse_or_defaults_only_when_absent() {
        assert_eq!(
            parse_or(None, StatKey::Points).unwrap(),
            StatKey::Points
        );
        assert_eq!(
            parse_or(Some("blocks"), StatKey::Points).unwrap(),
            StatKey::Blocks
        );
        assert!(parse_or(Some("bogus"), StatKey::Points).is_err());
    }
}
