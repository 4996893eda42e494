/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */
use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveTime, Offset, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use schemars::JsonSchema;

#[derive(Serialize, Deserialize, JsonSchema, Debug)]
pub struct SysInfo {
    pub(crate) version: String,
    #[serde(skip_serializing)]
    pub(crate) settings: HoopsSettings,
}

/// Everything under `[<profile>.hoops]` in `Rocket.toml`.
#[derive(Serialize, Deserialize, JsonSchema, Clone, Debug)]
#[serde(default)]
pub struct HoopsSettings {
    pub name: String,
    pub base_url: String,
    pub cookie_key: String,
    /// Points a won pick pays out when the request does not name a reward
    pub default_reward: i32,
    /// League-local clock, as an offset from UTC
    pub utc_offset_hours: i32,
    /// Overrides the season derived from today's date
    pub season: Option<i32>,
    pub provider: ProviderSettings,
    pub schedule: ScheduleSettings,
}

#[derive(Serialize, Deserialize, JsonSchema, Clone, Debug)]
#[serde(default)]
pub struct ProviderSettings {
    pub base_url: String,
    pub api_key: String,
    pub per_page: u32,
}

#[derive(Serialize, Deserialize, JsonSchema, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ScheduleSettings {
    /// First league-local hour of the game window (inclusive)
    pub window_start_hour: u32,
    /// Last league-local hour of the game window (exclusive); may be smaller than the start
    /// hour, in which case the window wraps past midnight
    pub window_end_hour: u32,
    pub frequent_minutes: u32,
    /// League-local time of day for the daily tier, `HH:MM:SS`
    pub daily_time: String,
}

impl Default for SysInfo {
    fn default() -> SysInfo {
        SysInfo {
            version: env!("CARGO_PKG_VERSION").to_string(),
            settings: HoopsSettings::default(),
        }
    }
}

impl Default for HoopsSettings {
    fn default() -> HoopsSettings {
        HoopsSettings {
            name: String::from("Hoops Local"),
            base_url: String::from("http://localhost:8000"),
            cookie_key: rand::thread_rng()
                .sample_iter(&Alphanumeric)
                .take(32)
                .map(char::from)
                .collect(),
            default_reward: 10,
            utc_offset_hours: -5,
            season: None,
            provider: ProviderSettings::default(),
            schedule: ScheduleSettings::default(),
        }
    }
}

impl Default for ProviderSettings {
    fn default() -> ProviderSettings {
        ProviderSettings {
            base_url: String::from("https://api.balldontlie.io/v1"),
            api_key: String::new(),
            per_page: 100,
        }
    }
}

impl Default for ScheduleSettings {
    fn default() -> ScheduleSettings {
        ScheduleSettings {
            window_start_hour: 12,
            window_end_hour: 2,
            frequent_minutes: 15,
            daily_time: String::from("06:00:00"),
        }
    }
}

impl ScheduleSettings {
    pub fn daily_time(&self) -> crate::Result<NaiveTime> {
        NaiveTime::parse_from_str(&self.daily_time, "%H:%M:%S").or_else(|_| {
            crate::Error::validation(format!(
                "schedule.daily_time `{}` is not HH:MM:SS",
                self.daily_time
            ))
        })
    }

    pub fn in_window(&self, hour: u32) -> bool {
        let (start, end) = (self.window_start_hour, self.window_end_hour);
        if start <= end {
            hour >= start && hour < end
        } else {
            hour >= start || hour < end
        }
    }
}

impl HoopsSettings {
    pub fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_hours * 3600).unwrap_or_else(|| Utc.fix())
    }

    pub fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset())
    }

    pub fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }

    pub fn current_season(&self) -> i32 {
        self.season.unwrap_or_else(|| season_for(self.today()))
    }
}

/// Seasons are named for the year they tip off in October.
pub fn season_for(date: NaiveDate) -> i32 {
    if date.month() >= 10 {
        date.year()
    } else {
        date.year() - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_season_for() {
        assert_eq!(season_for(NaiveDate::from_ymd_opt(2024, 10, 22).unwrap()), 2024);
        assert_eq!(season_for(NaiveDate::from_ymd_opt(2025, 4, 13).unwrap()), 2024);
        assert_eq!(season_for(NaiveDate::from_ymd_opt(2025, 9, 30).unwrap()), 2024);
    }

    #[test]
    fn test_window_wraps_midnight() {
        let schedule = ScheduleSettings::default();
        assert!(schedule.in_window(12));
        assert!(schedule.in_window(23));
        assert!(schedule.in_window(1));
        assert!(!schedule.in_window(2));
        assert!(!schedule.in_window(8));

        let plain = ScheduleSettings {
            window_start_hour: 18,
            window_end_hour: 23,
            ..ScheduleSettings::default()
        };
        assert!(plain.in_window(18));
        assert!(!plain.in_window(23));
        assert!(!plain.in_window(3));
    }

    #[test]
    fn test_daily_time() {
        let schedule = ScheduleSettings::default();
        assert_eq!(
            schedule.daily_time().unwrap(),
            NaiveTime::from_hms_opt(6, 0, 0).unwrap()
        );
        let broken = ScheduleSettings {
            daily_time: String::from("6am"),
            ..ScheduleSettings::default()
        };
        assert!(broken.daily_time().is_err());
    }

    #[test]
    fn test_offset_defaults_to_utc_when_out_of_range() {
        let settings = HoopsSettings {
            utc_offset_hours: 48,
            ..HoopsSettings::default()
        };
        assert_eq!(settings.offset().local_minus_utc(), 0);
    }
}
