/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */
pub mod client;
pub mod model;
pub use client::HttpProvider;
pub use model::*;

use crate::error::Result;
use chrono::NaiveDate;

/// Source of league data. Ids in and out are the provider's own.
pub trait StatsProvider {
    fn teams(&self) -> Result<Vec<ApiTeam>>;
    fn players(&self) -> Result<Vec<ApiPlayer>>;
    fn games(&self, dates: &[NaiveDate]) -> Result<Vec<ApiGame>>;
    fn player_stats(&self, game_ids: &[i32]) -> Result<Vec<ApiStatLine>>;
}
