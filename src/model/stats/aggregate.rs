/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Season, per-game and per-36 views over raw box score lines.
//!
//! Everything in here is pure: the keeper uses it to rebuild the season tables and the read
//! routes use it to turn stored totals into whichever view a caller asked for.

use schemars::JsonSchema;
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use std::str::FromStr;

/// Minutes basis for the normalized rate view
pub const PER_MINUTES: f64 = 36.0;

/// # Stat Line
/// The counting stats of one player or team, for a single game or summed over many.
///
/// Loads from any table carrying the box score columns, selected with `line_columns!`.
#[derive(
    diesel::Queryable, Serialize, Deserialize, JsonSchema, Clone, Copy, Debug, Default, PartialEq,
)]
pub struct StatLine {
    /// Minutes played (fractional; 34:30 is 34.5)
    pub minutes: f64,
    pub points: i32,
    /// Field goals made
    pub fgm: i32,
    /// Field goals attempted
    pub fga: i32,
    /// Free throws made
    pub ftm: i32,
    /// Free throws attempted
    pub fta: i32,
    /// Three pointers made
    pub tpm: i32,
    /// Three pointers attempted
    pub tpa: i32,
    pub off_reb: i32,
    pub def_reb: i32,
    pub assists: i32,
    pub fouls: i32,
    pub steals: i32,
    pub turnovers: i32,
    pub blocks: i32,
    pub plus_minus: i32,
}

impl StatLine {
    /// Rebounds are never stored; they are always offensive plus defensive.
    pub fn total_reb(&self) -> i32 {
        self.off_reb + self.def_reb
    }

    pub fn fgp(&self) -> f64 {
        ratio(self.fgm, self.fga)
    }

    pub fn ftp(&self) -> f64 {
        ratio(self.ftm, self.fta)
    }

    pub fn tpp(&self) -> f64 {
        ratio(self.tpm, self.tpa)
    }
}

impl AddAssign<&StatLine> for StatLine {
    fn add_assign(&mut self, other: &StatLine) {
        self.minutes += other.minutes;
        self.points += other.points;
        self.fgm += other.fgm;
        self.fga += other.fga;
        self.ftm += other.ftm;
        self.fta += other.fta;
        self.tpm += other.tpm;
        self.tpa += other.tpa;
        self.off_reb += other.off_reb;
        self.def_reb += other.def_reb;
        self.assists += other.assists;
        self.fouls += other.fouls;
        self.steals += other.steals;
        self.turnovers += other.turnovers;
        self.blocks += other.blocks;
        self.plus_minus += other.plus_minus;
    }
}

impl Add for StatLine {
    type Output = StatLine;

    fn add(mut self, other: StatLine) -> StatLine {
        self += &other;
        self
    }
}

impl<'a> Sum<&'a StatLine> for StatLine {
    fn sum<I: Iterator<Item = &'a StatLine>>(iter: I) -> StatLine {
        iter.fold(StatLine::default(), |mut acc, line| {
            acc += line;
            acc
        })
    }
}

/// made / attempted, or 0 when nothing was attempted
pub fn ratio(made: i32, attempted: i32) -> f64 {
    if attempted <= 0 {
        0.0
    } else {
        f64::from(made) / f64::from(attempted)
    }
}

/// # Stat Sheet
/// One view (totals, per game, or per 36 minutes) of an aggregate.
///
/// _**Note:** `fgp`, `ftp` and `tpp` are ratios of season makes to season attempts and are the
/// same in every view._
#[derive(Serialize, Deserialize, JsonSchema, Clone, Debug, PartialEq)]
pub struct StatSheet {
    /// Games the figures were taken over
    pub games_played: i32,
    pub minutes: f64,
    pub points: f64,
    pub fgm: f64,
    pub fga: f64,
    pub fgp: f64,
    pub ftm: f64,
    pub fta: f64,
    pub ftp: f64,
    pub tpm: f64,
    pub tpa: f64,
    pub tpp: f64,
    pub off_reb: f64,
    pub def_reb: f64,
    pub total_reb: f64,
    pub assists: f64,
    pub fouls: f64,
    pub steals: f64,
    pub turnovers: f64,
    pub blocks: f64,
    pub plus_minus: f64,
}

/// Which `StatSheet` a caller wants
#[derive(Serialize, Deserialize, JsonSchema, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum View {
    #[default]
    Totals,
    PerGame,
    Per36,
}

impl FromStr for View {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<View> {
        match s.to_ascii_lowercase().as_str() {
            "totals" | "total" => Ok(View::Totals),
            "per_game" | "pergame" => Ok(View::PerGame),
            "per_36" | "per36" => Ok(View::Per36),
            _ => crate::Error::validation(format!(
                "unknown view `{s}`; expected one of totals, per_game, per_36"
            )),
        }
    }
}

/// Games played plus the straight sum of every line.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Aggregate {
    pub games_played: i32,
    pub totals: StatLine,
}

impl Aggregate {
    pub fn from_lines<'a, I>(lines: I) -> Aggregate
    where
        I: IntoIterator<Item = &'a StatLine>,
    {
        let mut aggregate = Aggregate::default();
        for line in lines {
            aggregate.push(line);
        }
        aggregate
    }

    pub fn push(&mut self, line: &StatLine) -> &mut Self {
        self.games_played += 1;
        self.totals += line;
        self
    }

    pub fn view(&self, view: View) -> StatSheet {
        match view {
            View::Totals => self.totals(),
            View::PerGame => self.per_game(),
            View::Per36 => self.per_36(),
        }
    }

    pub fn totals(&self) -> StatSheet {
        self.scaled(1.0, 1.0)
    }

    pub fn per_game(&self) -> StatSheet {
        self.scaled(1.0, f64::from(self.games_played))
    }

    pub fn per_36(&self) -> StatSheet {
        self.scaled(PER_MINUTES, self.totals.minutes)
    }

    // Every counting stat becomes value * num / den; a zero denominator zeroes the sheet.
    fn scaled(&self, num: f64, den: f64) -> StatSheet {
        let scale = |value: f64| {
            if den > 0.0 {
                value * num / den
            } else {
                0.0
            }
        };
        let t = &self.totals;
        let off_reb = scale(f64::from(t.off_reb));
        let def_reb = scale(f64::from(t.def_reb));
        StatSheet {
            games_played: self.games_played,
            minutes: scale(t.minutes),
            points: scale(f64::from(t.points)),
            fgm: scale(f64::from(t.fgm)),
            fga: scale(f64::from(t.fga)),
            fgp: t.fgp(),
            ftm: scale(f64::from(t.ftm)),
            fta: scale(f64::from(t.fta)),
            ftp: t.ftp(),
            tpm: scale(f64::from(t.tpm)),
            tpa: scale(f64::from(t.tpa)),
            tpp: t.tpp(),
            off_reb,
            def_reb,
            total_reb: off_reb + def_reb,
            assists: scale(f64::from(t.assists)),
            fouls: scale(f64::from(t.fouls)),
            steals: scale(f64::from(t.steals)),
            turnovers: scale(f64::from(t.turnovers)),
            blocks: scale(f64::from(t.blocks)),
            plus_minus: scale(f64::from(t.plus_minus)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(points: i32, minutes: f64) -> StatLine {
        StatLine {
            minutes,
            points,
            ..StatLine::default()
        }
    }

    fn counting(sheet: &StatSheet) -> Vec<f64> {
        vec![
            sheet.minutes,
            sheet.points,
            sheet.fgm,
            sheet.fga,
            sheet.ftm,
            sheet.fta,
            sheet.tpm,
            sheet.tpa,
            sheet.off_reb,
            sheet.def_reb,
            sheet.total_reb,
            sheet.assists,
            sheet.fouls,
            sheet.steals,
            sheet.turnovers,
            sheet.blocks,
            sheet.plus_minus,
        ]
    }

    #[test]
    fn test_two_games_example() {
        let lines = vec![line(20, 30.0), line(10, 20.0)];
        let aggregate = Aggregate::from_lines(&lines);
        assert_eq!(aggregate.games_played, 2);
        assert_eq!(aggregate.totals().points, 30.0);
        assert_eq!(aggregate.per_game().points, 15.0);
        assert!((aggregate.per_36().points - 21.6).abs() < 1e-9);
    }

    #[test]
    fn test_zero_games_is_all_zero() {
        let aggregate = Aggregate::from_lines(&Vec::<StatLine>::new());
        for sheet in [aggregate.per_game(), aggregate.per_36()] {
            for value in counting(&sheet) {
                assert_eq!(value, 0.0);
                assert!(value.is_finite());
            }
            assert_eq!(sheet.fgp, 0.0);
        }
    }

    #[test]
    fn test_zero_minutes_per_36_is_zero() {
        // Did-not-play rows still count as a game but carry no minutes.
        let lines = vec![StatLine {
            points: 2,
            fgm: 1,
            fga: 1,
            ..StatLine::default()
        }];
        let aggregate = Aggregate::from_lines(&lines);
        assert_eq!(aggregate.per_game().points, 2.0);
        for value in counting(&aggregate.per_36()) {
            assert_eq!(value, 0.0);
        }
    }

    #[test]
    fn test_percentages_are_not_scaled() {
        let lines = vec![
            StatLine {
                minutes: 30.0,
                fgm: 5,
                fga: 10,
                ftm: 3,
                fta: 4,
                tpm: 0,
                tpa: 0,
                ..StatLine::default()
            },
            StatLine {
                minutes: 10.0,
                fgm: 1,
                fga: 2,
                ..StatLine::default()
            },
        ];
        let aggregate = Aggregate::from_lines(&lines);
        for sheet in [
            aggregate.totals(),
            aggregate.per_game(),
            aggregate.per_36(),
        ] {
            assert_eq!(sheet.fgp, 0.5);
            assert_eq!(sheet.ftp, 0.75);
            assert_eq!(sheet.tpp, 0.0);
        }
    }

    #[test]
    fn test_percentage_is_made_over_attempted_not_average() {
        // 1/1 and 0/9 average to 50% per game but the season is 10%
        let lines = vec![
            StatLine {
                fgm: 1,
                fga: 1,
                ..StatLine::default()
            },
            StatLine {
                fgm: 0,
                fga: 9,
                ..StatLine::default()
            },
        ];
        assert!((Aggregate::from_lines(&lines).totals().fgp - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_total_rebounds_in_every_view() {
        let lines = vec![
            StatLine {
                minutes: 33.0,
                off_reb: 3,
                def_reb: 7,
                ..StatLine::default()
            },
            StatLine {
                minutes: 17.5,
                off_reb: 1,
                def_reb: 4,
                ..StatLine::default()
            },
        ];
        let aggregate = Aggregate::from_lines(&lines);
        assert_eq!(aggregate.totals.total_reb(), 15);
        for view in [View::Totals, View::PerGame, View::Per36] {
            let sheet = aggregate.view(view);
            assert_eq!(sheet.total_reb, sheet.off_reb + sheet.def_reb);
        }
    }

    #[test]
    fn test_sum_of_lines() {
        let lines = vec![line(20, 30.0), line(10, 20.0)];
        let sum: StatLine = lines.iter().sum();
        assert_eq!(sum, line(30, 50.0));
        assert_eq!(lines[0] + lines[1], sum);
    }

    #[test]
    fn test_view_parsing() {
        assert_eq!("PER_36".parse::<View>().unwrap(), View::Per36);
        assert_eq!("per_game".parse::<View>().unwrap(), View::PerGame);
        assert_eq!("Totals".parse::<View>().unwrap(), View::Totals);
        assert!("per_48".parse::<View>().is_err());
    }
}
