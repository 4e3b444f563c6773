use std::collections::HashSet;

use chrono::{TimeZone, Utc};
use proptest::prelude::*;

use lap_leaderboard::modules::catalog::Catalog;
use lap_leaderboard::modules::drill_down::history;
use lap_leaderboard::modules::models::lap_record::{Condition, LapRecord, LapTime};
use lap_leaderboard::modules::ranking::{rank, ClassFilter, Gap};
use lap_leaderboard::modules::verification::VerificationState;

const OWNERS: [&str; 4] = ["alice", "bob", "carol", "dave"];
const VEHICLES: [&str; 4] = ["bmw_m4_gt3", "audi_r8_lms", "bmw_m4_gt4", "unlisted_prototype"];

fn record(index: usize, owner: usize, vehicle: usize, total: u32) -> LapRecord {
    LapRecord {
        id: format!("lap-{}", index),
        owner: OWNERS[owner].to_string(),
        owner_email: None,
        track_id: "nurburgring".to_string(),
        vehicle_id: VEHICLES[vehicle].to_string(),
        time: LapTime::from_total_millis(total),
        condition: Condition::Dry,
        track_temp: None,
        input_device: None,
        verification: VerificationState::Unverified,
        timestamp: Utc.with_ymd_and_hms(2024, 7, 2, 9, 0, 0).unwrap(),
    }
}

fn records() -> impl Strategy<Value = Vec<LapRecord>> {
    prop::collection::vec((0usize..4, 0usize..4, 110_000u32..112_000), 0..30).prop_map(|laps| {
        laps.into_iter()
            .enumerate()
            .map(|(i, (owner, vehicle, total))| record(i, owner, vehicle, total))
            .collect()
    })
}

fn class_filter() -> impl Strategy<Value = ClassFilter> {
    prop_oneof![
        Just(ClassFilter::All),
        Just("GT3".parse::<ClassFilter>().unwrap()),
        Just("GT4".parse::<ClassFilter>().unwrap()),
        Just("TCX".parse::<ClassFilter>().unwrap()),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn leaderboard_is_one_sorted_row_per_competitor(records in records(), filter in class_filter()) {
        let catalog = Catalog::default();
        let board = rank(&records, filter, &catalog, None);

        let owners: HashSet<&str> = board.entries.iter().map(|e| e.owner.as_str()).collect();
        prop_assert_eq!(owners.len(), board.len());

        for (index, entry) in board.entries.iter().enumerate() {
            prop_assert_eq!(entry.rank, index + 1);
            prop_assert!(filter.matches(entry.class));

            let fastest = records
                .iter()
                .filter(|r| r.owner == entry.owner && filter.matches(catalog.class_of(&r.vehicle_id)))
                .map(|r| r.time)
                .min();
            prop_assert_eq!(Some(entry.record.time), fastest);
        }

        for pair in board.entries.windows(2) {
            prop_assert!(pair[0].record.time <= pair[1].record.time);
            prop_assert!(pair[0].gap.millis() <= pair[1].gap.millis());
        }
        if let Some(leader) = board.entries.first() {
            prop_assert_eq!(leader.gap, Gap::Reference);
            prop_assert_eq!(leader.gap_display.as_str(), "-");
        }
    }

    #[test]
    fn drill_down_gaps_are_self_relative(records in records(), owner in 0usize..4) {
        let garage = history(&records, OWNERS[owner], "nurburgring", &Catalog::default());
        let own = records.iter().filter(|r| r.owner == OWNERS[owner]).count();
        prop_assert_eq!(garage.entries.len(), own);

        if let Some(best) = garage.best() {
            for entry in &garage.entries {
                let expected = entry.record.total_millis() - best.record.total_millis();
                prop_assert_eq!(entry.gap.millis(), expected);
            }
        }
    }

    #[test]
    fn lap_time_parts_recombine_to_the_total(total in 1u32..3_600_000) {
        let time = LapTime::from_total_millis(total);
        prop_assert!(time.seconds() < 60);
        prop_assert!(time.milliseconds() < 1000);

        let rebuilt = LapTime::from_parts(time.minutes(), time.seconds(), time.milliseconds()).unwrap();
        prop_assert_eq!(rebuilt.total_millis(), total);
    }
}

#[test]
fn empty_class_is_an_empty_board() {
    let records = vec![record(0, 0, 0, 110_500), record(1, 1, 2, 111_000)];
    let board = rank(&records, "CUP".parse().unwrap(), &Catalog::default(), None);
    assert!(board.is_empty());
}
