/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */
use crate::error::Result;
use crate::model::sys::ProviderSettings;
use crate::provider::model::{ApiGame, ApiPlayer, ApiStatLine, ApiTeam, Page};
use crate::provider::StatsProvider;
use chrono::NaiveDate;
use reqwest::blocking::Client;
use reqwest::header::AUTHORIZATION;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Upper bound on pages followed for one listing, in case a cursor never ends.
const MAX_PAGES: usize = 200;

/// Blocking client for the stats provider's REST API.
pub struct HttpProvider {
    client: Client,
    base_url: String,
    api_key: String,
    per_page: u32,
}

impl HttpProvider {
    pub fn new(settings: &ProviderSettings) -> Result<HttpProvider> {
        let client = Client::builder()
            .user_agent(concat!("rust-hoops/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(HttpProvider {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            per_page: settings.per_page.max(1),
        })
    }

    fn page<T: DeserializeOwned>(&self, path: &str, query: &[(String, String)]) -> Result<Page<T>> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.get(&url).query(query);
        if !self.api_key.is_empty() {
            request = request.header(AUTHORIZATION, &self.api_key);
        }
        Ok(request.send()?.error_for_status()?.json::<Page<T>>()?)
    }

    /// Follows `meta.next_cursor` until the listing is exhausted.
    fn all<T: DeserializeOwned>(&self, path: &str, filters: &[(String, String)]) -> Result<Vec<T>> {
        let mut rows = Vec::new();
        let mut cursor: Option<i64> = None;
        for _ in 0..MAX_PAGES {
            let mut query = filters.to_vec();
            query.push(("per_page".to_string(), self.per_page.to_string()));
            if let Some(cursor) = cursor {
                query.push(("cursor".to_string(), cursor.to_string()));
            }
            let page: Page<T> = self.page(path, &query)?;
            tracing::debug!(path, rows = page.data.len(), next = ?page.meta.next_cursor, "fetched page");
            rows.extend(page.data);
            match page.meta.next_cursor {
                Some(next) if Some(next) != cursor => cursor = Some(next),
                _ => return Ok(rows),
            }
        }
        tracing::warn!(path, "stopped following cursor after {MAX_PAGES} pages");
        Ok(rows)
    }
}

fn array_param<T: ToString>(name: &str, values: &[T]) -> Vec<(String, String)> {
    values
        .iter()
        .map(|v| (format!("{name}[]"), v.to_string()))
        .collect()
}

impl StatsProvider for HttpProvider {
    fn teams(&self) -> Result<Vec<ApiTeam>> {
        self.all("/teams", &[])
    }

    fn players(&self) -> Result<Vec<ApiPlayer>> {
        self.all("/players", &[])
    }

    fn games(&self, dates: &[NaiveDate]) -> Result<Vec<ApiGame>> {
        if dates.is_empty() {
            return Ok(Vec::new());
        }
        let days: Vec<String> = dates.iter().map(|d| d.format("%Y-%m-%d").to_string()).collect();
        self.all("/games", &array_param("dates", &days))
    }

    fn player_stats(&self, game_ids: &[i32]) -> Result<Vec<ApiStatLine>> {
        if game_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.all("/stats", &array_param("game_ids", game_ids))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_params_use_bracket_names() {
        assert_eq!(
            array_param("game_ids", &[3, 4]),
            vec![
                ("game_ids[]".to_string(), "3".to_string()),
                ("game_ids[]".to_string(), "4".to_string())
            ]
        );
    }

    #[test]
    fn empty_requests_skip_the_network() {
        let provider = HttpProvider::new(&ProviderSettings {
            base_url: "http://127.0.0.1:9".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert!(provider.games(&[]).unwrap().is_empty());
        assert!(provider.player_stats(&[]).unwrap().is_empty());
    }
}
