/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */
use crate::model::sys::SysInfo;
use rocket::serde::json::Json;
use rocket::State;
use schemars::JsonSchema;

/// # System Information
/// Gives some information about the running server.
#[openapi(tag = "System")]
#[get("/sys/info")]
pub(crate) async fn sysinfo(config: &State<SysInfo>) -> Json<PubSysInfo> {
    Json(PubSysInfo::from(config.inner()))
}

#[derive(Serialize, Deserialize, JsonSchema, Clone, Debug, PartialEq)]
pub struct PubSysInfo {
    pub(crate) version: String,
    pub(crate) name: String,
    /// Season the server treats as current
    pub(crate) season: i32,
    /// League-local date, `YYYY-MM-DD`
    pub(crate) today: String,
}

impl From<&SysInfo> for PubSysInfo {
    fn from(info: &SysInfo) -> PubSysInfo {
        PubSysInfo {
            version: git_version::git_version!(
                fallback = option_env!("GIT_HASH").unwrap_or(env!("CARGO_PKG_VERSION"))
            )
            .to_string(),
            name: info.settings.name.clone(),
            season: info.settings.current_season(),
            today: info.settings.today().format("%Y-%m-%d").to_string(),
        }
    }
}
