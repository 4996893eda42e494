/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */
use crate::error::Result;
use crate::model::game::{Game, GameStatus};
use crate::model::player::Player;
use crate::model::stats::aggregate::StatLine;
use crate::model::user::User;
use crate::schema::{player_picks, team_picks};
use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::result::DatabaseErrorKind;
use diesel_derive_enum::DbEnum;
use schemars::JsonSchema;
use std::str::FromStr;

/// # Pick Stat
/// The stat a player pick is made on. `rebounds` is offensive plus defensive.
#[derive(DbEnum, Serialize, Deserialize, JsonSchema, Debug, Clone, Copy, PartialEq, Eq)]
#[ExistingTypePath = "crate::schema::sql_types::PickStat"]
#[serde(rename_all = "snake_case")]
pub enum PickStat {
    Points,
    Rebounds,
    Assists,
    Steals,
    Blocks,
    /// Three pointers made
    Tpm,
}

impl PickStat {
    pub fn value(&self, line: &StatLine) -> f64 {
        f64::from(match self {
            PickStat::Points => line.points,
            PickStat::Rebounds => line.total_reb(),
            PickStat::Assists => line.assists,
            PickStat::Steals => line.steals,
            PickStat::Blocks => line.blocks,
            PickStat::Tpm => line.tpm,
        })
    }
}

impl FromStr for PickStat {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<PickStat> {
        match s.to_ascii_lowercase().as_str() {
            "points" => Ok(PickStat::Points),
            "rebounds" => Ok(PickStat::Rebounds),
            "assists" => Ok(PickStat::Assists),
            "steals" => Ok(PickStat::Steals),
            "blocks" => Ok(PickStat::Blocks),
            "tpm" => Ok(PickStat::Tpm),
            _ => crate::Error::validation(format!(
                "unknown pick stat `{s}`; expected one of points, rebounds, assists, steals, blocks, tpm"
            )),
        }
    }
}

/// # Direction
#[derive(DbEnum, Serialize, Deserialize, JsonSchema, Debug, Clone, Copy, PartialEq, Eq)]
#[ExistingTypePath = "crate::schema::sql_types::PickDirection"]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Over,
    Under,
}

impl FromStr for Direction {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Direction> {
        match s.to_ascii_lowercase().as_str() {
            "over" => Ok(Direction::Over),
            "under" => Ok(Direction::Under),
            _ => crate::Error::validation(format!(
                "unknown pick direction `{s}`; expected over or under"
            )),
        }
    }
}

/// # Pick State
/// `open` until graded, then `won` or `lost` for good.
#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PickState {
    Open,
    Won,
    Lost,
}

impl PickState {
    /// The state after grading, or `None` when the pick was already settled.
    pub fn resolve(self, won: bool) -> Option<PickState> {
        match self {
            PickState::Open if won => Some(PickState::Won),
            PickState::Open => Some(PickState::Lost),
            PickState::Won | PickState::Lost => None,
        }
    }

    pub fn is_open(self) -> bool {
        self == PickState::Open
    }
}

impl From<Option<bool>> for PickState {
    fn from(result: Option<bool>) -> PickState {
        match result {
            None => PickState::Open,
            Some(true) => PickState::Won,
            Some(false) => PickState::Lost,
        }
    }
}

/// What a pick is about.
#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PickKind {
    Player {
        player_id: i32,
        stat: PickStat,
        direction: Direction,
        threshold: f64,
    },
    /// Wins if `team_id` wins the game
    Team { team_id: i32 },
}

/// # Pick
#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, PartialEq)]
pub struct Pick {
    pub id: i32,
    pub user_id: i32,
    pub game_id: i32,
    /// Points added to the user's total if the pick wins
    pub reward: i32,
    pub state: PickState,
    pub created: NaiveDateTime,
    #[serde(flatten)]
    pub kind: PickKind,
}

#[derive(Queryable, Selectable, Debug, Clone, PartialEq)]
#[diesel(table_name = player_picks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PlayerPickRow {
    pub(crate) id: i32,
    pub(crate) user_id: i32,
    pub(crate) player_id: i32,
    pub(crate) game_id: i32,
    pub(crate) stat: PickStat,
    pub(crate) direction: Direction,
    pub(crate) threshold: f64,
    pub(crate) reward: i32,
    pub(crate) result: Option<bool>,
    pub(crate) created: NaiveDateTime,
}

#[derive(Queryable, Selectable, Debug, Clone, PartialEq)]
#[diesel(table_name = team_picks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct TeamPickRow {
    pub(crate) id: i32,
    pub(crate) user_id: i32,
    pub(crate) team_id: i32,
    pub(crate) game_id: i32,
    pub(crate) reward: i32,
    pub(crate) result: Option<bool>,
    pub(crate) created: NaiveDateTime,
}

impl From<PlayerPickRow> for Pick {
    fn from(row: PlayerPickRow) -> Pick {
        Pick {
            id: row.id,
            user_id: row.user_id,
            game_id: row.game_id,
            reward: row.reward,
            state: PickState::from(row.result),
            created: row.created,
            kind: PickKind::Player {
                player_id: row.player_id,
                stat: row.stat,
                direction: row.direction,
                threshold: row.threshold,
            },
        }
    }
}

impl From<TeamPickRow> for Pick {
    fn from(row: TeamPickRow) -> Pick {
        Pick {
            id: row.id,
            user_id: row.user_id,
            game_id: row.game_id,
            reward: row.reward,
            state: PickState::from(row.result),
            created: row.created,
            kind: PickKind::Team {
                team_id: row.team_id,
            },
        }
    }
}

/// # New Player Pick
#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone)]
pub struct CreatePlayerPick {
    pub game_id: i32,
    pub player_id: i32,
    /// One of `points`, `rebounds`, `assists`, `steals`, `blocks`, `tpm`
    pub stat: String,
    /// `over` or `under`
    pub direction: String,
    pub threshold: f64,
    /// Defaults to the server's configured reward
    pub reward: Option<i32>,
}

/// # New Team Pick
#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone)]
pub struct CreateTeamPick {
    pub game_id: i32,
    pub team_id: i32,
    pub reward: Option<i32>,
}

fn checked_reward(reward: Option<i32>, default_reward: i32) -> Result<i32> {
    let reward = reward.unwrap_or(default_reward);
    if reward <= 0 {
        return crate::Error::validation(format!("reward must be positive, got {reward}"));
    }
    Ok(reward)
}

fn open_for_picks(game: &Game) -> Result<()> {
    if game.status != GameStatus::Scheduled {
        return crate::Error::validation(format!(
            "game {} has already started; picks close at tip-off",
            game.id
        ));
    }
    Ok(())
}

const DUPLICATE_PLAYER_PICK: &str = "a pick on this player, game and stat already exists";
const DUPLICATE_TEAM_PICK: &str = "a team pick on this game already exists";

/// Whether `player` may be picked in `game`; `already_picked` is the caller's existing pick on the same stat.
fn admit_player_pick(game: &Game, player: &Player, already_picked: bool) -> Result<()> {
    open_for_picks(game)?;
    if !player.team_id.map_or(false, |team| game.involves(team)) {
        return crate::Error::validation(format!(
            "player {} is not on either team in game {}",
            player.id, game.id
        ));
    }
    if already_picked {
        return crate::Error::validation(DUPLICATE_PLAYER_PICK);
    }
    Ok(())
}

fn admit_team_pick(game: &Game, team_id: i32, already_picked: bool) -> Result<()> {
    open_for_picks(game)?;
    if !game.involves(team_id) {
        return crate::Error::validation(format!(
            "team {} is not playing in game {}",
            team_id, game.id
        ));
    }
    if already_picked {
        return crate::Error::validation(DUPLICATE_TEAM_PICK);
    }
    Ok(())
}

// A concurrent insert can still trip the unique index after the duplicate check passed.
fn duplicate_as_validation(e: diesel::result::Error, message: &str) -> crate::Error {
    match e {
        diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            crate::Error::Validation {
                message: message.to_owned(),
            }
        }
        other => other.into(),
    }
}

impl Pick {
    pub fn by_user(user_id: i32, conn: &mut PgConnection) -> Result<Vec<Pick>> {
        let mut picks: Vec<Pick> = player_picks::table
            .filter(player_picks::user_id.eq(user_id))
            .select(PlayerPickRow::as_select())
            .load(conn)?
            .into_iter()
            .map(Pick::from)
            .collect();
        picks.extend(
            team_picks::table
                .filter(team_picks::user_id.eq(user_id))
                .select(TeamPickRow::as_select())
                .load(conn)?
                .into_iter()
                .map(Pick::from),
        );
        picks.sort_by(|a, b| b.created.cmp(&a.created).then(b.id.cmp(&a.id)));
        Ok(picks)
    }

    pub fn create_player(
        user_id: i32,
        request: CreatePlayerPick,
        default_reward: i32,
        conn: &mut PgConnection,
    ) -> Result<Pick> {
        let stat: PickStat = request.stat.parse()?;
        let direction: Direction = request.direction.parse()?;
        if !request.threshold.is_finite() {
            return crate::Error::validation("threshold must be a finite number");
        }
        let reward = checked_reward(request.reward, default_reward)?;
        conn.transaction::<_, crate::Error, _>(|conn| {
            User::by_id(user_id, conn).map_err(|_| crate::Error::Unauthorized {})?;
            let game = Game::by_id(request.game_id, conn)?;
            let player = Player::by_id(request.player_id, conn)?;
            let duplicate: bool = diesel::select(diesel::dsl::exists(
                player_picks::table
                    .filter(player_picks::user_id.eq(user_id))
                    .filter(player_picks::player_id.eq(player.id))
                    .filter(player_picks::game_id.eq(game.id))
                    .filter(player_picks::stat.eq(stat)),
            ))
            .get_result(conn)?;
            admit_player_pick(&game, &player, duplicate)?;
            diesel::insert_into(player_picks::table)
                .values((
                    player_picks::user_id.eq(user_id),
                    player_picks::player_id.eq(player.id),
                    player_picks::game_id.eq(game.id),
                    player_picks::stat.eq(stat),
                    player_picks::direction.eq(direction),
                    player_picks::threshold.eq(request.threshold),
                    player_picks::reward.eq(reward),
                ))
                .returning(PlayerPickRow::as_returning())
                .get_result(conn)
                .map(Pick::from)
                .map_err(|e| duplicate_as_validation(e, DUPLICATE_PLAYER_PICK))
        })
    }

    pub fn create_team(
        user_id: i32,
        request: CreateTeamPick,
        default_reward: i32,
        conn: &mut PgConnection,
    ) -> Result<Pick> {
        let reward = checked_reward(request.reward, default_reward)?;
        conn.transaction::<_, crate::Error, _>(|conn| {
            User::by_id(user_id, conn).map_err(|_| crate::Error::Unauthorized {})?;
            let game = Game::by_id(request.game_id, conn)?;
            let duplicate: bool = diesel::select(diesel::dsl::exists(
                team_picks::table
                    .filter(team_picks::user_id.eq(user_id))
                    .filter(team_picks::game_id.eq(game.id)),
            ))
            .get_result(conn)?;
            admit_team_pick(&game, request.team_id, duplicate)?;
            diesel::insert_into(team_picks::table)
                .values((
                    team_picks::user_id.eq(user_id),
                    team_picks::team_id.eq(request.team_id),
                    team_picks::game_id.eq(game.id),
                    team_picks::reward.eq(reward),
                ))
                .returning(TeamPickRow::as_returning())
                .get_result(conn)
                .map(Pick::from)
                .map_err(|e| duplicate_as_validation(e, DUPLICATE_TEAM_PICK))
        })
    }

    /// Someone else's pick is reported as missing.
    pub fn delete_player(user_id: i32, pick_id: i32, conn: &mut PgConnection) -> Result<Pick> {
        conn.transaction::<_, crate::Error, _>(|conn| {
            let pick: Pick = player_picks::table
                .find(pick_id)
                .filter(player_picks::user_id.eq(user_id))
                .select(PlayerPickRow::as_select())
                .first(conn)
                .map(Pick::from)?;
            Pick::check_deletable(&pick, conn)?;
            diesel::delete(player_picks::table.find(pick_id)).execute(conn)?;
            Ok(pick)
        })
    }

    pub fn delete_team(user_id: i32, pick_id: i32, conn: &mut PgConnection) -> Result<Pick> {
        conn.transaction::<_, crate::Error, _>(|conn| {
            let pick: Pick = team_picks::table
                .find(pick_id)
                .filter(team_picks::user_id.eq(user_id))
                .select(TeamPickRow::as_select())
                .first(conn)
                .map(Pick::from)?;
            Pick::check_deletable(&pick, conn)?;
            diesel::delete(team_picks::table.find(pick_id)).execute(conn)?;
            Ok(pick)
        })
    }

    fn check_deletable(pick: &Pick, conn: &mut PgConnection) -> Result<()> {
        if !pick.state.is_open() {
            return crate::Error::validation(format!("pick {} is already graded", pick.id));
        }
        open_for_picks(&Game::by_id(pick.game_id, conn)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stat_values() {
        let line = StatLine {
            points: 20,
            off_reb: 3,
            def_reb: 6,
            assists: 4,
            steals: 1,
            blocks: 2,
            tpm: 5,
            ..StatLine::default()
        };
        assert_eq!(PickStat::Points.value(&line), 20.0);
        assert_eq!(PickStat::Rebounds.value(&line), 9.0);
        assert_eq!(PickStat::Assists.value(&line), 4.0);
        assert_eq!(PickStat::Steals.value(&line), 1.0);
        assert_eq!(PickStat::Blocks.value(&line), 2.0);
        assert_eq!(PickStat::Tpm.value(&line), 5.0);
    }

    #[test]
    fn test_parsing_is_case_insensitive_and_strict() {
        assert_eq!("OVER".parse::<Direction>().unwrap(), Direction::Over);
        assert_eq!("under".parse::<Direction>().unwrap(), Direction::Under);
        assert!("sideways".parse::<Direction>().is_err());
        assert_eq!("Rebounds".parse::<PickStat>().unwrap(), PickStat::Rebounds);
        assert!("fgm".parse::<PickStat>().is_err());
    }

    #[test]
    fn test_state_transitions_are_one_way() {
        assert_eq!(PickState::Open.resolve(true), Some(PickState::Won));
        assert_eq!(PickState::Open.resolve(false), Some(PickState::Lost));
        assert_eq!(PickState::Won.resolve(false), None);
        assert_eq!(PickState::Lost.resolve(true), None);
        assert_eq!(PickState::from(None), PickState::Open);
        assert_eq!(PickState::from(Some(true)), PickState::Won);
    }

    #[test]
    fn test_reward_must_be_positive() {
        assert_eq!(checked_reward(None, 10).unwrap(), 10);
        assert_eq!(checked_reward(Some(25), 10).unwrap(), 25);
        assert!(checked_reward(Some(0), 10).is_err());
        assert!(checked_reward(None, -1).is_err());
    }

    fn game(status: GameStatus) -> Game {
        Game {
            id: 3,
            external_id: 300,
            season: 2024,
            game_date: chrono::NaiveDate::from_ymd_opt(2024, 11, 2).unwrap(),
            start_time: None,
            home_team_id: 10,
            away_team_id: 20,
            status,
            period: 0,
            clock: None,
            home_score: None,
            away_score: None,
            winner_id: None,
        }
    }

    fn player_on(team_id: Option<i32>) -> Player {
        Player {
            id: 7,
            external_id: 700,
            first_name: "Jalen".to_string(),
            last_name: "Brunson".to_string(),
            position: "G".to_string(),
            team_id,
        }
    }

    fn rule(result: Result<()>) -> String {
        match result {
            Err(crate::Error::Validation { message }) => message,
            other => panic!("expected a validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_second_pick_on_same_stat_rejected() {
        let scheduled = game(GameStatus::Scheduled);
        assert!(admit_player_pick(&scheduled, &player_on(Some(10)), false).is_ok());
        assert_eq!(
            rule(admit_player_pick(&scheduled, &player_on(Some(10)), true)),
            DUPLICATE_PLAYER_PICK
        );
        assert!(admit_team_pick(&scheduled, 20, false).is_ok());
        assert_eq!(rule(admit_team_pick(&scheduled, 20, true)), DUPLICATE_TEAM_PICK);
    }

    #[test]
    fn test_picks_close_at_tip_off() {
        for status in [GameStatus::InPlay, GameStatus::Finished] {
            let started = game(status);
            let message = rule(admit_player_pick(&started, &player_on(Some(10)), false));
            assert!(message.contains("already started"), "{message}");
            assert!(rule(admit_team_pick(&started, 10, false)).contains("already started"));
        }
    }

    #[test]
    fn test_pick_must_involve_the_game() {
        let scheduled = game(GameStatus::Scheduled);
        assert!(rule(admit_player_pick(&scheduled, &player_on(Some(30)), false))
            .contains("not on either team"));
        assert!(rule(admit_player_pick(&scheduled, &player_on(None), false))
            .contains("not on either team"));
        assert!(rule(admit_team_pick(&scheduled, 30, false)).contains("not playing"));
    }

    #[test]
    fn test_pick_serializes_with_variant_tag() {
        let pick = Pick {
            id: 1,
            user_id: 2,
            game_id: 3,
            reward: 10,
            state: PickState::Open,
            created: chrono::NaiveDate::from_ymd_opt(2024, 11, 2)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
            kind: PickKind::Team { team_id: 4 },
        };
        let value = serde_json::to_value(&pick).unwrap();
        assert_eq!(value["type"], "team");
        assert_eq!(value["team_id"], 4);
        assert_eq!(value["state"], "open");
    }
}
