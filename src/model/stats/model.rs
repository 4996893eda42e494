/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */
use crate::error::{MapRre, Result};
use crate::model::game::{Game, LineFilter, PlayerBoxScore, TeamBoxScore};
use crate::model::player::Player;
use crate::model::stats::aggregate::{Aggregate, StatLine, StatSheet, View};
use crate::model::stats::board::{rank, Ranked, SortDirection, StatKey, TeamSortKey};
use crate::model::sys::season_for;
use crate::model::team::Team;
use crate::schema::{player_season_stats, players, standings, team_season_stats};
use chrono::{NaiveDate, NaiveDateTime, Utc};
use diesel::prelude::*;
use schemars::JsonSchema;
use std::collections::{BTreeMap, HashMap};

/// A stored season aggregate, keyed by player or team id.
#[derive(Queryable, Debug, Clone, PartialEq)]
pub struct SeasonLine {
    pub entity_id: i32,
    pub games_played: i32,
    pub line: StatLine,
}

impl SeasonLine {
    pub fn aggregate(&self) -> Aggregate {
        Aggregate {
            games_played: self.games_played,
            totals: self.line,
        }
    }
}

#[derive(Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = player_season_stats)]
pub struct NewPlayerSeason {
    pub player_id: i32,
    pub season: i32,
    pub games_played: i32,
    pub minutes: f64,
    pub points: i32,
    pub fgm: i32,
    pub fga: i32,
    pub ftm: i32,
    pub fta: i32,
    pub tpm: i32,
    pub tpa: i32,
    pub off_reb: i32,
    pub def_reb: i32,
    pub assists: i32,
    pub fouls: i32,
    pub steals: i32,
    pub turnovers: i32,
    pub blocks: i32,
    pub plus_minus: i32,
    pub fgp: f64,
    pub ftp: f64,
    pub tpp: f64,
    pub updated: NaiveDateTime,
}

#[derive(Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = team_season_stats)]
pub struct NewTeamSeason {
    pub team_id: i32,
    pub season: i32,
    pub games_played: i32,
    pub minutes: f64,
    pub points: i32,
    pub fgm: i32,
    pub fga: i32,
    pub ftm: i32,
    pub fta: i32,
    pub tpm: i32,
    pub tpa: i32,
    pub off_reb: i32,
    pub def_reb: i32,
    pub assists: i32,
    pub fouls: i32,
    pub steals: i32,
    pub turnovers: i32,
    pub blocks: i32,
    pub plus_minus: i32,
    pub fgp: f64,
    pub ftp: f64,
    pub tpp: f64,
    pub updated: NaiveDateTime,
}

impl NewPlayerSeason {
    fn new(player_id: i32, season: i32, aggregate: &Aggregate, updated: NaiveDateTime) -> Self {
        let t = &aggregate.totals;
        NewPlayerSeason {
            player_id,
            season,
            games_played: aggregate.games_played,
            minutes: t.minutes,
            points: t.points,
            fgm: t.fgm,
            fga: t.fga,
            ftm: t.ftm,
            fta: t.fta,
            tpm: t.tpm,
            tpa: t.tpa,
            off_reb: t.off_reb,
            def_reb: t.def_reb,
            assists: t.assists,
            fouls: t.fouls,
            steals: t.steals,
            turnovers: t.turnovers,
            blocks: t.blocks,
            plus_minus: t.plus_minus,
            fgp: t.fgp(),
            ftp: t.ftp(),
            tpp: t.tpp(),
            updated,
        }
    }
}

impl NewTeamSeason {
    fn new(team_id: i32, season: i32, aggregate: &Aggregate, updated: NaiveDateTime) -> Self {
        let t = &aggregate.totals;
        NewTeamSeason {
            team_id,
            season,
            games_played: aggregate.games_played,
            minutes: t.minutes,
            points: t.points,
            fgm: t.fgm,
            fga: t.fga,
            ftm: t.ftm,
            fta: t.fta,
            tpm: t.tpm,
            tpa: t.tpa,
            off_reb: t.off_reb,
            def_reb: t.def_reb,
            assists: t.assists,
            fouls: t.fouls,
            steals: t.steals,
            turnovers: t.turnovers,
            blocks: t.blocks,
            plus_minus: t.plus_minus,
            fgp: t.fgp(),
            ftp: t.ftp(),
            tpp: t.tpp(),
            updated,
        }
    }
}

/// Groups lines by entity id into one aggregate each.
pub fn collect<'a, I>(lines: I) -> BTreeMap<i32, Aggregate>
where
    I: IntoIterator<Item = (i32, &'a StatLine)>,
{
    let mut aggregates: BTreeMap<i32, Aggregate> = BTreeMap::new();
    for (id, line) in lines {
        aggregates.entry(id).or_default().push(line);
    }
    aggregates
}

fn finished_in(season: i32) -> LineFilter {
    LineFilter {
        season: Some(season),
        finished_only: true,
        ..LineFilter::default()
    }
}

/// Replaces every player aggregate of `season` with one rebuilt from finished games.
pub fn rebuild_player_seasons(season: i32, conn: &mut PgConnection) -> Result<usize> {
    conn.transaction::<_, crate::Error, _>(|conn| {
        let lines = PlayerBoxScore::matching(finished_in(season), conn)?;
        let now = Utc::now().naive_utc();
        let rows: Vec<NewPlayerSeason> = collect(lines.iter().map(|r| (r.player_id, &r.line)))
            .iter()
            .map(|(id, aggregate)| NewPlayerSeason::new(*id, season, aggregate, now))
            .collect();
        diesel::delete(player_season_stats::table.filter(player_season_stats::season.eq(season)))
            .execute(conn)?;
        Ok(diesel::insert_into(player_season_stats::table)
            .values(&rows)
            .execute(conn)?)
    })
}

/// Replaces every team aggregate of `season` with one rebuilt from finished games.
pub fn rebuild_team_seasons(season: i32, conn: &mut PgConnection) -> Result<usize> {
    conn.transaction::<_, crate::Error, _>(|conn| {
        let lines = TeamBoxScore::matching(finished_in(season), conn)?;
        let now = Utc::now().naive_utc();
        let rows: Vec<NewTeamSeason> = collect(lines.iter().map(|r| (r.team_id, &r.line)))
            .iter()
            .map(|(id, aggregate)| NewTeamSeason::new(*id, season, aggregate, now))
            .collect();
        diesel::delete(team_season_stats::table.filter(team_season_stats::season.eq(season)))
            .execute(conn)?;
        Ok(diesel::insert_into(team_season_stats::table)
            .values(&rows)
            .execute(conn)?)
    })
}

fn player_season_lines(
    season: i32,
    player_ids: Option<&[i32]>,
    team: Option<i32>,
    conn: &mut PgConnection,
) -> Result<Vec<SeasonLine>> {
    let mut query = player_season_stats::table
        .inner_join(players::table)
        .filter(player_season_stats::season.eq(season))
        .select((
            player_season_stats::player_id,
            player_season_stats::games_played,
            line_columns!(player_season_stats),
        ))
        .into_boxed();
    if let Some(ids) = player_ids {
        query = query.filter(player_season_stats::player_id.eq_any(ids.to_vec()));
    }
    if let Some(team) = team {
        query = query.filter(players::team_id.eq(team));
    }
    query.load(conn).map_rre()
}

fn team_season_lines(
    season: i32,
    team_ids: Option<&[i32]>,
    conn: &mut PgConnection,
) -> Result<Vec<SeasonLine>> {
    let mut query = team_season_stats::table
        .filter(team_season_stats::season.eq(season))
        .select((
            team_season_stats::team_id,
            team_season_stats::games_played,
            line_columns!(team_season_stats),
        ))
        .into_boxed();
    if let Some(ids) = team_ids {
        query = query.filter(team_season_stats::team_id.eq_any(ids.to_vec()));
    }
    query.load(conn).map_rre()
}

/// # Standing
#[derive(Queryable, Selectable, Serialize, Deserialize, JsonSchema, Debug, Clone, PartialEq)]
#[diesel(table_name = standings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Standing {
    pub team_id: i32,
    pub season: i32,
    pub wins: i32,
    pub losses: i32,
    pub win_pct: f64,
    /// Position within the team's conference; tied teams share a rank
    pub conference_rank: i32,
    pub updated: NaiveDateTime,
}

#[derive(Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = standings)]
pub struct NewStanding {
    pub team_id: i32,
    pub season: i32,
    pub wins: i32,
    pub losses: i32,
    pub win_pct: f64,
    pub conference_rank: i32,
    pub updated: NaiveDateTime,
}

/// Win/loss records from finished games, with every team present even before its first game.
pub fn standings_table(
    teams: &[Team],
    games: &[Game],
    season: i32,
    updated: NaiveDateTime,
) -> Vec<NewStanding> {
    let mut records: HashMap<i32, (i32, i32)> = teams.iter().map(|t| (t.id, (0, 0))).collect();
    for game in games {
        let Some(winner) = game.winner_id else {
            continue;
        };
        let loser = if winner == game.home_team_id {
            game.away_team_id
        } else {
            game.home_team_id
        };
        records.entry(winner).or_default().0 += 1;
        records.entry(loser).or_default().1 += 1;
    }
    let mut conferences: BTreeMap<&str, Vec<NewStanding>> = BTreeMap::new();
    for team in teams {
        let (wins, losses) = records.get(&team.id).copied().unwrap_or_default();
        let played = wins + losses;
        conferences
            .entry(team.conference.as_str())
            .or_default()
            .push(NewStanding {
                team_id: team.id,
                season,
                wins,
                losses,
                win_pct: if played > 0 {
                    f64::from(wins) / f64::from(played)
                } else {
                    0.0
                },
                conference_rank: 0,
                updated,
            });
    }
    conferences
        .into_values()
        .flat_map(|rows| rank(rows, SortDirection::Desc, None, |s| s.win_pct))
        .map(|ranked| NewStanding {
            conference_rank: ranked.rank as i32,
            ..ranked.item
        })
        .collect()
}

pub fn rebuild_standings(season: i32, conn: &mut PgConnection) -> Result<usize> {
    conn.transaction::<_, crate::Error, _>(|conn| {
        let teams = Team::all(conn)?;
        let games = Game::finished_in_season(season, conn)?;
        let rows = standings_table(&teams, &games, season, Utc::now().naive_utc());
        diesel::delete(standings::table.filter(standings::season.eq(season))).execute(conn)?;
        Ok(diesel::insert_into(standings::table)
            .values(&rows)
            .execute(conn)?)
    })
}

impl Standing {
    pub fn for_season(season: i32, conn: &mut PgConnection) -> Result<Vec<Standing>> {
        standings::table
            .filter(standings::season.eq(season))
            .select(Standing::as_select())
            .load(conn)
            .map_rre()
    }

    /// Stat keys never reach here; `StandingRow::board` rejects them up front.
    pub fn sort_value(&self, key: TeamSortKey) -> f64 {
        match key {
            TeamSortKey::Wins => f64::from(self.wins),
            TeamSortKey::Losses => f64::from(self.losses),
            TeamSortKey::WinPct | TeamSortKey::Stat(_) => self.win_pct,
        }
    }
}

/// # Standings Row
#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, PartialEq)]
pub struct StandingRow {
    pub team: Team,
    #[serde(flatten)]
    pub standing: Standing,
}

impl StandingRow {
    pub fn board(
        season: i32,
        key: TeamSortKey,
        direction: SortDirection,
        limit: Option<usize>,
        conn: &mut PgConnection,
    ) -> Result<Vec<Ranked<StandingRow>>> {
        key_check(key)?;
        let teams: HashMap<i32, Team> = Team::all(conn)?.into_iter().map(|t| (t.id, t)).collect();
        let rows: Vec<StandingRow> = Standing::for_season(season, conn)?
            .into_iter()
            .filter_map(|standing| {
                teams.get(&standing.team_id).cloned().map(|team| StandingRow { team, standing })
            })
            .collect();
        Ok(rank(rows, direction, limit, |row| {
            row.standing.sort_value(key)
        }))
    }
}

fn key_check(key: TeamSortKey) -> Result<()> {
    match key {
        TeamSortKey::Stat(stat) => crate::Error::validation(format!(
            "standings sort by wins, losses or win_pct, not `{}`",
            stat.as_str()
        )),
        _ => Ok(()),
    }
}

/// Filters shared by the player and team stat boards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoardQuery {
    pub view: View,
    pub direction: SortDirection,
    /// A single day; `None` means season to date
    pub day: Option<NaiveDate>,
    pub game: Option<i32>,
    pub team: Option<i32>,
    pub limit: Option<usize>,
    /// Season used when no day narrows the board
    pub season: i32,
}

impl BoardQuery {
    fn effective_season(&self) -> i32 {
        self.day.map_or(self.season, season_for)
    }

    fn per_game_scope(&self) -> bool {
        self.game.is_some() || self.day.is_some()
    }

    fn line_filter(&self) -> LineFilter {
        LineFilter {
            game: self.game,
            date: self.day,
            team: self.team,
            season: None,
            finished_only: false,
        }
    }

    // Teams on the floor on the queried day, narrowed to `team` when given.
    fn scheduled_teams(&self, day: NaiveDate, conn: &mut PgConnection) -> Result<Vec<i32>> {
        let mut teams: Vec<i32> = Game::on_dates(&[day], conn)?
            .iter()
            .flat_map(|g| [g.home_team_id, g.away_team_id])
            .collect();
        if let Some(team) = self.team {
            teams.retain(|t| *t == team);
        }
        teams.sort_unstable();
        teams.dedup();
        Ok(teams)
    }
}

/// # Player Stat Row
#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, PartialEq)]
pub struct PlayerStatRow {
    pub player: Player,
    pub stats: StatSheet,
}

impl PlayerStatRow {
    pub fn board(
        query: BoardQuery,
        key: StatKey,
        conn: &mut PgConnection,
    ) -> Result<Vec<Ranked<PlayerStatRow>>> {
        let aggregates = if query.per_game_scope() {
            let lines = PlayerBoxScore::matching(query.line_filter(), conn)?;
            let mut aggregates = collect(lines.iter().map(|r| (r.player_id, &r.line)));
            if let (true, None, Some(day)) = (aggregates.is_empty(), query.game, query.day) {
                // Nothing played yet that day: show who is scheduled, with their season so far.
                let teams = query.scheduled_teams(day, conn)?;
                let ids: Vec<i32> = Player::on_teams(&teams, conn)?
                    .iter()
                    .map(|p| p.id)
                    .collect();
                let seasons: HashMap<i32, Aggregate> =
                    player_season_lines(query.effective_season(), Some(&ids), None, conn)?
                        .iter()
                        .map(|s| (s.entity_id, s.aggregate()))
                        .collect();
                aggregates = ids
                    .into_iter()
                    .map(|id| (id, seasons.get(&id).copied().unwrap_or_default()))
                    .collect();
            }
            aggregates
        } else {
            player_season_lines(query.effective_season(), None, query.team, conn)?
                .iter()
                .map(|s| (s.entity_id, s.aggregate()))
                .collect()
        };
        let ids: Vec<i32> = aggregates.keys().copied().collect();
        let rows: Vec<PlayerStatRow> = Player::by_ids(&ids, conn)?
            .into_iter()
            .filter_map(|player| {
                aggregates.get(&player.id).map(|aggregate| PlayerStatRow {
                    stats: aggregate.view(query.view),
                    player,
                })
            })
            .collect();
        Ok(rank(rows, query.direction, query.limit, |row| {
            row.stats.stat(key)
        }))
    }
}

/// # Team Stat Row
#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, PartialEq)]
pub struct TeamStatRow {
    pub team: Team,
    pub wins: i32,
    pub losses: i32,
    pub win_pct: f64,
    pub stats: StatSheet,
}

impl TeamStatRow {
    pub fn sort_value(&self, key: TeamSortKey) -> f64 {
        match key {
            TeamSortKey::Stat(stat) => self.stats.stat(stat),
            TeamSortKey::Wins => f64::from(self.wins),
            TeamSortKey::Losses => f64::from(self.losses),
            TeamSortKey::WinPct => self.win_pct,
        }
    }

    pub fn board(
        query: BoardQuery,
        key: TeamSortKey,
        conn: &mut PgConnection,
    ) -> Result<Vec<Ranked<TeamStatRow>>> {
        let aggregates: BTreeMap<i32, Aggregate> = if query.per_game_scope() {
            let lines = TeamBoxScore::matching(query.line_filter(), conn)?;
            let mut aggregates = collect(lines.iter().map(|r| (r.team_id, &r.line)));
            if let (true, None, Some(day)) = (aggregates.is_empty(), query.game, query.day) {
                let teams = query.scheduled_teams(day, conn)?;
                let seasons: HashMap<i32, Aggregate> =
                    team_season_lines(query.effective_season(), Some(&teams), conn)?
                        .iter()
                        .map(|s| (s.entity_id, s.aggregate()))
                        .collect();
                aggregates = teams
                    .into_iter()
                    .map(|id| (id, seasons.get(&id).copied().unwrap_or_default()))
                    .collect();
            }
            aggregates
        } else {
            let only = query.team.map(|team| vec![team]);
            team_season_lines(query.effective_season(), only.as_deref(), conn)?
                .iter()
                .map(|s| (s.entity_id, s.aggregate()))
                .collect()
        };
        let records: HashMap<i32, Standing> = Standing::for_season(query.effective_season(), conn)?
            .into_iter()
            .map(|s| (s.team_id, s))
            .collect();
        let ids: Vec<i32> = aggregates.keys().copied().collect();
        let rows: Vec<TeamStatRow> = Team::by_ids(&ids, conn)?
            .into_iter()
            .filter_map(|team| {
                let aggregate = aggregates.get(&team.id)?;
                let record = records.get(&team.id);
                Some(TeamStatRow {
                    wins: record.map_or(0, |r| r.wins),
                    losses: record.map_or(0, |r| r.losses),
                    win_pct: record.map_or(0.0, |r| r.win_pct),
                    stats: aggregate.view(query.view),
                    team,
                })
            })
            .collect();
        Ok(rank(rows, query.direction, query.limit, |row| {
            row.sort_value(key)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::game::GameStatus;

    fn team(id: i32, conference: &str) -> Team {
        Team {
            id,
            external_id: id,
            abbreviation: format!("T{id}"),
            city: String::new(),
            name: format!("Team {id}"),
            full_name: format!("Team {id}"),
            conference: conference.to_owned(),
            division: String::new(),
        }
    }

    fn final_game(id: i32, home: i32, away: i32, winner: i32) -> Game {
        Game {
            id,
            external_id: id,
            season: 2024,
            game_date: NaiveDate::from_ymd_opt(2024, 11, 1).unwrap(),
            start_time: None,
            home_team_id: home,
            away_team_id: away,
            status: GameStatus::Finished,
            period: 4,
            clock: None,
            home_score: Some(100),
            away_score: Some(90),
            winner_id: Some(winner),
        }
    }

    fn updated() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 11, 2)
            .unwrap()
            .and_hms_opt(6, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_collect_groups_by_entity() {
        let a = StatLine {
            points: 10,
            ..StatLine::default()
        };
        let b = StatLine {
            points: 4,
            ..StatLine::default()
        };
        let grouped = collect(vec![(1, &a), (2, &b), (1, &b)]);
        assert_eq!(grouped[&1].games_played, 2);
        assert_eq!(grouped[&1].totals.points, 14);
        assert_eq!(grouped[&2].games_played, 1);
    }

    #[test]
    fn test_standings_table() {
        let teams = vec![team(1, "East"), team(2, "East"), team(3, "West"), team(4, "East")];
        let games = vec![
            final_game(1, 1, 2, 1),
            final_game(2, 2, 1, 1),
            final_game(3, 3, 2, 2),
        ];
        let table = standings_table(&teams, &games, 2024, updated());
        let find = |id: i32| table.iter().find(|s| s.team_id == id).unwrap();

        assert_eq!((find(1).wins, find(1).losses), (2, 0));
        assert_eq!(find(1).win_pct, 1.0);
        assert_eq!(find(1).conference_rank, 1);
        assert_eq!((find(2).wins, find(2).losses), (1, 2));
        assert_eq!(find(2).conference_rank, 2);
        // No games yet: present, zero record, no division by zero
        assert_eq!((find(4).wins, find(4).losses), (0, 0));
        assert_eq!(find(4).win_pct, 0.0);
        assert_eq!(find(4).conference_rank, 3);
        // Ranked within its own conference
        assert_eq!(find(3).conference_rank, 1);
        assert_eq!(find(3).losses, 1);
    }

    #[test]
    fn test_standings_ties_share_rank() {
        let teams = vec![team(1, "West"), team(2, "West")];
        let table = standings_table(&teams, &[], 2024, updated());
        assert!(table.iter().all(|s| s.conference_rank == 1));
    }

    #[test]
    fn test_team_board_sorts_by_record() {
        let sheet = Aggregate::default().totals();
        let row = |id: i32, wins: i32, losses: i32| TeamStatRow {
            team: team(id, "East"),
            wins,
            losses,
            win_pct: f64::from(wins) / f64::from(wins + losses),
            stats: sheet.clone(),
        };
        let rows = vec![row(2, 8, 25), row(3, 6, 27), row(1, 25, 8)];
        let key: TeamSortKey = "wins".parse().unwrap();
        let board = rank(rows, SortDirection::Desc, None, |r| r.sort_value(key));
        let order: Vec<i32> = board.iter().map(|r| r.item.team.id).collect();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[test]
    fn test_standing_rejects_stat_keys() {
        assert!(key_check(TeamSortKey::Stat(StatKey::Points)).is_err());
        assert!(key_check(TeamSortKey::WinPct).is_ok());
    }
}
