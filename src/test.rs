/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */
use crate::error::ErrorBody;
use crate::model::auth::{AuthUser, Claims};
use crate::model::sys::route::PubSysInfo;
use crate::model::sys::{HoopsSettings, SysInfo};
use crate::rocket_launcher::{base, launcher};
use rocket::http::{ContentType, Header, Status};
use rocket::local::blocking::Client;

#[get("/whoami")]
fn whoami(user: AuthUser) -> String {
    user.id.to_string()
}

/// Everything that runs without a database: sys info, docs, catchers and the token guard.
fn client() -> Client {
    let rocket = base(rocket::build())
        .mount("/api", openapi_get_routes![crate::model::sys::route::sysinfo])
        .mount("/auth", routes![whoami]);
    Client::tracked(rocket).expect("valid rocket instance")
}

fn db_client() -> Client {
    Client::tracked(launcher()).expect("valid rocket instance with a database")
}

fn error_body(response: rocket::local::blocking::LocalResponse<'_>) -> ErrorBody {
    serde_json::from_str(&response.into_string().unwrap()).unwrap()
}

fn bearer_for(client: &Client, user_id: i32) -> Header<'static> {
    let key = client
        .rocket()
        .state::<SysInfo>()
        .unwrap()
        .settings
        .cookie_key
        .clone();
    let token = Claims {
        sub: user_id,
        exp: (chrono::Utc::now().timestamp() + 600) as usize,
    }
    .put(key.as_bytes())
    .unwrap();
    Header::new("Authorization", format!("Bearer {token}"))
}

#[test]
fn test_system_api() {
    let client = client();
    let response = client.get("/api/sys/info").dispatch();
    assert_eq!(response.status(), Status::Ok);
    let info: PubSysInfo = serde_json::from_str(&response.into_string().unwrap()).unwrap();
    assert!(!info.version.is_empty());
    assert_eq!(info.today.len(), 10);
    assert!(info.season >= HoopsSettings::default().current_season() - 1);
}

#[test]
fn test_openapi_document_served() {
    let client = client();
    let response = client.get("/api/openapi.json").dispatch();
    assert_eq!(response.status(), Status::Ok);
    let body = response.into_string().unwrap();
    assert!(body.contains("/sys/info"));
}

#[test]
fn test_unknown_route_is_json_404() {
    let client = client();
    let response = client.get("/api/nothing/here").dispatch();
    assert_eq!(response.status(), Status::NotFound);
    assert_eq!(error_body(response).status, 404);
}

#[test]
fn test_missing_token_is_json_401() {
    let client = client();
    let response = client.get("/auth/whoami").dispatch();
    assert_eq!(response.status(), Status::Unauthorized);
    assert_eq!(error_body(response).status, 401);
}

#[test]
fn test_garbage_token_rejected() {
    let client = client();
    let response = client
        .get("/auth/whoami")
        .header(Header::new("Authorization", "Bearer not-a-jwt"))
        .dispatch();
    assert_eq!(response.status(), Status::Unauthorized);
}

#[test]
fn test_signed_token_names_the_user() {
    let client = client();
    let response = client
        .get("/auth/whoami")
        .header(bearer_for(&client, 42))
        .dispatch();
    assert_eq!(response.status(), Status::Ok);
    assert_eq!(response.into_string().unwrap(), "42");
}

#[test]
#[ignore = "requires postgres"]
fn test_openapi_lists_every_board() {
    let client = db_client();
    let body = client
        .get("/api/openapi.json")
        .dispatch()
        .into_string()
        .unwrap();
    assert!(body.contains("/teams/stats"));
    assert!(body.contains("/users/leaderboard"));
}

#[test]
#[ignore = "requires postgres"]
fn test_picks_require_a_token() {
    let client = db_client();
    let response = client
        .post("/auth/picks/player")
        .header(ContentType::JSON)
        .body(r#"{"game_id": 1, "player_id": 2, "stat": "points", "direction": "over", "threshold": 19.5}"#)
        .dispatch();
    assert_eq!(response.status(), Status::Unauthorized);
    assert_eq!(error_body(response).status, 401);

    let response = client.get("/auth/me/picks").dispatch();
    assert_eq!(response.status(), Status::Unauthorized);

    let response = client.delete("/auth/picks/team/4").dispatch();
    assert_eq!(response.status(), Status::Unauthorized);
}

#[test]
#[ignore = "requires postgres"]
fn test_team_listing() {
    let client = db_client();
    let response = client.get("/api/teams").dispatch();
    assert_eq!(response.status(), Status::Ok);
}

#[test]
#[ignore = "requires postgres"]
fn test_bad_board_parameters_are_422() {
    let client = db_client();
    for uri in [
        "/api/players/stats?sort=dunks",
        "/api/players/stats?order=sideways",
        "/api/teams/stats?view=per_48",
        "/api/teams/stats?date=someday",
        "/api/teams/standings?sort=points",
        "/api/users/leaderboard?sort=assists",
        "/api/games?date=season",
    ] {
        let response = client.get(uri).dispatch();
        assert_eq!(response.status(), Status::UnprocessableEntity, "{uri}");
        assert!(!error_body(response).error.is_empty(), "{uri}");
    }
}

#[test]
#[ignore = "requires postgres"]
fn test_missing_entities_are_404() {
    let client = db_client();
    for uri in ["/api/team/-1", "/api/player/-1", "/api/game/-1", "/api/user/-1"] {
        let response = client.get(uri).dispatch();
        assert_eq!(response.status(), Status::NotFound, "{uri}");
    }
}

#[test]
#[ignore = "requires postgres"]
fn test_signed_token_reaches_pick_history() {
    let client = db_client();
    let response = client
        .get("/auth/me/picks")
        .header(bearer_for(&client, 1))
        .dispatch();
    assert_eq!(response.status(), Status::Ok);
}
