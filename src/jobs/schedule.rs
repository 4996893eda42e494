/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */
use crate::error::Result;
use crate::jobs::Tier;
use crate::model::sys::ScheduleSettings;
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike};

/// The first time strictly after `after` at which `tier` should run, on the same clock as `after`.
pub fn next_fire(
    tier: Tier,
    after: DateTime<FixedOffset>,
    schedule: &ScheduleSettings,
) -> Result<DateTime<FixedOffset>> {
    let local = after.naive_local();
    let next = match tier {
        Tier::Frequent => next_frequent(local, schedule)?,
        Tier::Hourly => next_hour(local),
        Tier::Daily => next_daily(local, schedule.daily_time()?),
    };
    after
        .offset()
        .from_local_datetime(&next)
        .single()
        .ok_or(crate::Error::InternalServerError {})
}

fn midnight(day: NaiveDate) -> NaiveDateTime {
    day.and_time(NaiveTime::MIN)
}

fn next_hour(local: NaiveDateTime) -> NaiveDateTime {
    midnight(local.date()) + Duration::hours(i64::from(local.hour()) + 1)
}

fn next_daily(local: NaiveDateTime, at: NaiveTime) -> NaiveDateTime {
    let today = local.date().and_time(at);
    if today > local {
        today
    } else {
        today + Duration::days(1)
    }
}

/// Slots are counted from midnight every day, so a step that does not divide the day evenly
/// restarts at 00:00.
fn next_frequent(local: NaiveDateTime, schedule: &ScheduleSettings) -> Result<NaiveDateTime> {
    let step = i64::from(schedule.frequent_minutes);
    if step == 0 {
        return crate::Error::validation("schedule.frequent_minutes must be positive");
    }
    let mut cursor = local;
    for _ in 0..(2 * 24 * 60 / step + 2) {
        let day_start = midnight(cursor.date());
        let since = (cursor - day_start).num_minutes();
        let mut slot = day_start + Duration::minutes((since / step + 1) * step);
        if slot.date() != cursor.date() {
            slot = day_start + Duration::days(1);
        }
        if schedule.in_window(slot.hour()) {
            return Ok(slot);
        }
        cursor = slot;
    }
    crate::Error::validation("schedule game window contains no hours")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eastern(d: u32, h: u32, m: u32, s: u32) -> DateTime<FixedOffset> {
        FixedOffset::west_opt(5 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 11, d, h, m, s)
            .unwrap()
    }

    fn settings() -> ScheduleSettings {
        ScheduleSettings::default()
    }

    #[test]
    fn test_frequent_inside_window() {
        let next = next_fire(Tier::Frequent, eastern(2, 19, 7, 12), &settings()).unwrap();
        assert_eq!(next, eastern(2, 19, 15, 0));
    }

    #[test]
    fn test_frequent_on_slot_moves_to_next_slot() {
        let next = next_fire(Tier::Frequent, eastern(2, 19, 15, 0), &settings()).unwrap();
        assert_eq!(next, eastern(2, 19, 30, 0));
    }

    #[test]
    fn test_frequent_wraps_past_midnight() {
        let next = next_fire(Tier::Frequent, eastern(2, 23, 50, 0), &settings()).unwrap();
        assert_eq!(next, eastern(3, 0, 0, 0));
    }

    #[test]
    fn test_frequent_skips_to_window_start() {
        let next = next_fire(Tier::Frequent, eastern(3, 1, 50, 0), &settings()).unwrap();
        assert_eq!(next, eastern(3, 12, 0, 0));
        let next = next_fire(Tier::Frequent, eastern(3, 9, 0, 0), &settings()).unwrap();
        assert_eq!(next, eastern(3, 12, 0, 0));
    }

    #[test]
    fn test_frequent_keeps_offset() {
        let after = eastern(2, 19, 7, 12);
        let next = next_fire(Tier::Frequent, after, &settings()).unwrap();
        assert_eq!(next.offset(), after.offset());
    }

    #[test]
    fn test_frequent_rejects_bad_settings() {
        let zero = ScheduleSettings {
            frequent_minutes: 0,
            ..settings()
        };
        assert!(next_fire(Tier::Frequent, eastern(2, 19, 0, 0), &zero).is_err());
        let closed = ScheduleSettings {
            window_start_hour: 5,
            window_end_hour: 5,
            ..settings()
        };
        assert!(next_fire(Tier::Frequent, eastern(2, 19, 0, 0), &closed).is_err());
    }

    #[test]
    fn test_hourly() {
        let next = next_fire(Tier::Hourly, eastern(2, 10, 59, 30), &settings()).unwrap();
        assert_eq!(next, eastern(2, 11, 0, 0));
        let next = next_fire(Tier::Hourly, eastern(2, 11, 0, 0), &settings()).unwrap();
        assert_eq!(next, eastern(2, 12, 0, 0));
        let next = next_fire(Tier::Hourly, eastern(2, 23, 10, 0), &settings()).unwrap();
        assert_eq!(next, eastern(3, 0, 0, 0));
    }

    #[test]
    fn test_daily() {
        let next = next_fire(Tier::Daily, eastern(2, 5, 59, 59), &settings()).unwrap();
        assert_eq!(next, eastern(2, 6, 0, 0));
        let next = next_fire(Tier::Daily, eastern(2, 6, 0, 0), &settings()).unwrap();
        assert_eq!(next, eastern(3, 6, 0, 0));
    }

    #[test]
    fn test_daily_bad_time() {
        let broken = ScheduleSettings {
            daily_time: "6am".to_string(),
            ..settings()
        };
        assert!(next_fire(Tier::Daily, eastern(2, 5, 0, 0), &broken).is_err());
    }
}
