/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

pub mod sql_types {
    #[derive(diesel::query_builder::QueryId, diesel::sql_types::SqlType)]
    #[diesel(postgres_type(name = "game_status"))]
    pub struct GameStatus;

    #[derive(diesel::query_builder::QueryId, diesel::sql_types::SqlType)]
    #[diesel(postgres_type(name = "pick_direction"))]
    pub struct PickDirection;

    #[derive(diesel::query_builder::QueryId, diesel::sql_types::SqlType)]
    #[diesel(postgres_type(name = "pick_stat"))]
    pub struct PickStat;
}

diesel::table! {
    teams (id) {
        id -> Int4,
        external_id -> Int4,
        abbreviation -> Varchar,
        city -> Varchar,
        name -> Varchar,
        full_name -> Varchar,
        conference -> Varchar,
        division -> Varchar,
    }
}

diesel::table! {
    players (id) {
        id -> Int4,
        external_id -> Int4,
        first_name -> Varchar,
        last_name -> Varchar,
        position -> Varchar,
        team_id -> Nullable<Int4>,
    }
}

diesel::table! {
    use diesel::sql_types::*;
    use super::sql_types::GameStatus;

    games (id) {
        id -> Int4,
        external_id -> Int4,
        season -> Int4,
        game_date -> Date,
        start_time -> Nullable<Timestamp>,
        home_team_id -> Int4,
        away_team_id -> Int4,
        status -> GameStatus,
        period -> Int4,
        clock -> Nullable<Varchar>,
        home_score -> Nullable<Int4>,
        away_score -> Nullable<Int4>,
        winner_id -> Nullable<Int4>,
    }
}

diesel::table! {
    player_box_scores (id) {
        id -> Int4,
        player_id -> Int4,
        team_id -> Int4,
        game_id -> Int4,
        minutes -> Float8,
        points -> Int4,
        fgm -> Int4,
        fga -> Int4,
        ftm -> Int4,
        fta -> Int4,
        tpm -> Int4,
        tpa -> Int4,
        off_reb -> Int4,
        def_reb -> Int4,
        assists -> Int4,
        fouls -> Int4,
        steals -> Int4,
        turnovers -> Int4,
        blocks -> Int4,
        plus_minus -> Int4,
    }
}

diesel::table! {
    team_box_scores (id) {
        id -> Int4,
        team_id -> Int4,
        game_id -> Int4,
        minutes -> Float8,
        points -> Int4,
        fgm -> Int4,
        fga -> Int4,
        ftm -> Int4,
        fta -> Int4,
        tpm -> Int4,
        tpa -> Int4,
        off_reb -> Int4,
        def_reb -> Int4,
        assists -> Int4,
        fouls -> Int4,
        steals -> Int4,
        turnovers -> Int4,
        blocks -> Int4,
        plus_minus -> Int4,
    }
}

diesel::table! {
    player_season_stats (player_id, season) {
        player_id -> Int4,
        season -> Int4,
        games_played -> Int4,
        minutes -> Float8,
        points -> Int4,
        fgm -> Int4,
        fga -> Int4,
        ftm -> Int4,
        fta -> Int4,
        tpm -> Int4,
        tpa -> Int4,
        off_reb -> Int4,
        def_reb -> Int4,
        assists -> Int4,
        fouls -> Int4,
        steals -> Int4,
        turnovers -> Int4,
        blocks -> Int4,
        plus_minus -> Int4,
        fgp -> Float8,
        ftp -> Float8,
        tpp -> Float8,
        updated -> Timestamp,
    }
}

diesel::table! {
    team_season_stats (team_id, season) {
        team_id -> Int4,
        season -> Int4,
        games_played -> Int4,
        minutes -> Float8,
        points -> Int4,
        fgm -> Int4,
        fga -> Int4,
        ftm -> Int4,
        fta -> Int4,
        tpm -> Int4,
        tpa -> Int4,
        off_reb -> Int4,
        def_reb -> Int4,
        assists -> Int4,
        fouls -> Int4,
        steals -> Int4,
        turnovers -> Int4,
        blocks -> Int4,
        plus_minus -> Int4,
        fgp -> Float8,
        ftp -> Float8,
        tpp -> Float8,
        updated -> Timestamp,
    }
}

diesel::table! {
    standings (team_id, season) {
        team_id -> Int4,
        season -> Int4,
        wins -> Int4,
        losses -> Int4,
        win_pct -> Float8,
        conference_rank -> Int4,
        updated -> Timestamp,
    }
}

diesel::table! {
    users (id) {
        id -> Int4,
        username -> Varchar,
        wins -> Int4,
        losses -> Int4,
        points -> Int4,
        created -> Timestamp,
    }
}

diesel::table! {
    use diesel::sql_types::*;
    use super::sql_types::{PickDirection, PickStat};

    player_picks (id) {
        id -> Int4,
        user_id -> Int4,
        player_id -> Int4,
        game_id -> Int4,
        stat -> PickStat,
        direction -> PickDirection,
        threshold -> Float8,
        reward -> Int4,
        result -> Nullable<Bool>,
        created -> Timestamp,
    }
}

diesel::table! {
    team_picks (id) {
        id -> Int4,
        user_id -> Int4,
        team_id -> Int4,
        game_id -> Int4,
        reward -> Int4,
        result -> Nullable<Bool>,
        created -> Timestamp,
    }
}

diesel::joinable!(players -> teams (team_id));
diesel::joinable!(player_box_scores -> games (game_id));
diesel::joinable!(player_box_scores -> players (player_id));
diesel::joinable!(team_box_scores -> games (game_id));
diesel::joinable!(player_season_stats -> players (player_id));
diesel::joinable!(team_season_stats -> teams (team_id));
diesel::joinable!(standings -> teams (team_id));
diesel::joinable!(player_picks -> games (game_id));
diesel::joinable!(player_picks -> users (user_id));
diesel::joinable!(team_picks -> games (game_id));
diesel::joinable!(team_picks -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(
    games,
    player_box_scores,
    player_picks,
    player_season_stats,
    players,
    standings,
    team_box_scores,
    team_picks,
    team_season_stats,
    teams,
    users,
);

/// Selects the box score columns of `$table` in `StatLine` field order.
macro_rules! line_columns {
    ($table:ident) => {
        (
            $table::minutes,
            $table::points,
            $table::fgm,
            $table::fga,
            $table::ftm,
            $table::fta,
            $table::tpm,
            $table::tpa,
            $table::off_reb,
            $table::def_reb,
            $table::assists,
            $table::fouls,
            $table::steals,
            $table::turnovers,
            $table::blocks,
            $table::plus_minus,
        )
    };
}
