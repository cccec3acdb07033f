#[cfg(test)]
mod tests {
    use crate::logic::{generate_available_slots_at, group_slots_by_day};
    use chrono::{DateTime, Datelike, Duration, TimeZone, Timelike, Utc};
    use chrono_tz::Tz;
    use proptest::prelude::*;
    use turnero_common::{CalendarEvent, EventDateTime};
    use turnero_config::ScheduleConfig;

    const ZONES: [Tz; 3] = [
        Tz::America__Argentina__Buenos_Aires,
        Tz::Europe__Zurich,
        Tz::America__New_York,
    ];

    // Divisors of 60, plus a few that leave a remainder.
    fn duration_strategy() -> impl Strategy<Value = u32> {
        prop::sample::select(vec![5u32, 10, 15, 20, 25, 30, 45, 60])
    }

    fn schedule_strategy() -> impl Strategy<Value = ScheduleConfig> {
        (
            duration_strategy(),
            prop::sample::subsequence((0u32..7).collect::<Vec<_>>(), 1..=7),
            0u32..23,
            1u32..=12,
            prop::option::of(0u32..3),
        )
            .prop_map(|(duration, days, start, length, break_offset)| {
                let end = (start + length).min(24);
                let (break_start_hour, break_end_hour) = match break_offset {
                    Some(offset) if start + offset + 1 <= end => {
                        (Some(start + offset), Some(start + offset + 1))
                    }
                    _ => (None, None),
                };
                ScheduleConfig {
                    slot_duration_minutes: duration,
                    available_days: days,
                    start_hour: start,
                    end_hour: end,
                    break_start_hour,
                    break_end_hour,
                }
            })
    }

    fn now_strategy() -> impl Strategy<Value = DateTime<Utc>> {
        // Any minute of 2025.
        (0i64..365 * 24 * 60).prop_map(|minutes| {
            Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(minutes)
        })
    }

    /// Events as (offset from now in minutes, length in minutes).
    fn events_strategy() -> impl Strategy<Value = Vec<(i64, i64)>> {
        prop::collection::vec((-120i64..14 * 24 * 60, 1i64..240), 0..12)
    }

    fn to_events(now: DateTime<Utc>, spans: &[(i64, i64)]) -> Vec<CalendarEvent> {
        spans
            .iter()
            .enumerate()
            .map(|(i, (offset, length))| {
                let start = now + Duration::minutes(*offset);
                let end = start + Duration::minutes(*length);
                CalendarEvent {
                    id: Some(format!("e{}", i)),
                    start: Some(EventDateTime::at(start.fixed_offset(), None)),
                    end: Some(EventDateTime::at(end.fixed_offset(), None)),
                    ..Default::default()
                }
            })
            .collect()
    }

    proptest! {
        #[test]
        fn test_slots_are_future_and_inside_schedule(
            config in schedule_strategy(),
            now in now_strategy(),
            zone in 0usize..3,
            days_ahead in 1i64..15,
        ) {
            let tz = ZONES[zone];
            let slots = generate_available_slots_at(&config, &[], days_ahead, now, tz);

            for slot in &slots {
                prop_assert!(slot.start > now);
                prop_assert_eq!(
                    slot.end - slot.start,
                    Duration::minutes(i64::from(config.slot_duration_minutes))
                );

                let local = slot.start.with_timezone(&tz);
                prop_assert!(config
                    .available_days
                    .contains(&local.weekday().num_days_from_sunday()));
                prop_assert!(local.hour() >= config.start_hour);
                prop_assert!(local.hour() < config.end_hour);
                if let (Some(b_start), Some(b_end)) = (config.break_start_hour, config.break_end_hour) {
                    prop_assert!(local.hour() < b_start || local.hour() >= b_end);
                }
                prop_assert!(local.minute() % config.slot_duration_minutes == 0);
                prop_assert!(slot.available);
            }
        }

        #[test]
        fn test_slots_are_strictly_increasing(
            config in schedule_strategy(),
            now in now_strategy(),
            zone in 0usize..3,
        ) {
            let slots = generate_available_slots_at(&config, &[], 14, now, ZONES[zone]);
            prop_assert!(slots.windows(2).all(|pair| pair[0].start < pair[1].start));
        }

        #[test]
        fn test_availability_matches_overlap(
            config in schedule_strategy(),
            now in now_strategy(),
            spans in events_strategy(),
        ) {
            let tz = ZONES[0];
            let events = to_events(now, &spans);
            let free = generate_available_slots_at(&config, &[], 14, now, tz);
            let slots = generate_available_slots_at(&config, &events, 14, now, tz);

            // Events only flip availability, never add or remove slots.
            prop_assert_eq!(free.len(), slots.len());

            for slot in &slots {
                let overlapping = spans.iter().any(|(offset, length)| {
                    let start = now + Duration::minutes(*offset);
                    let end = start + Duration::minutes(*length);
                    slot.start < end && slot.end > start
                });
                prop_assert_eq!(slot.available, !overlapping);
            }
        }

        #[test]
        fn test_grouping_keeps_every_available_slot(
            config in schedule_strategy(),
            now in now_strategy(),
            spans in events_strategy(),
        ) {
            let tz = ZONES[1];
            let slots = generate_available_slots_at(&config, &to_events(now, &spans), 14, now, tz);
            let days = group_slots_by_day(&slots);

            let grouped: usize = days.iter().map(|day| day.slots.len()).sum();
            prop_assert_eq!(grouped, slots.iter().filter(|slot| slot.available).count());
            prop_assert!(days.windows(2).all(|pair| pair[0].date < pair[1].date));
            for day in &days {
                prop_assert!(day.slots.iter().all(|slot| slot.start.date_naive() == day.date));
            }
        }
    }
}
