use serde::{Deserialize, Serialize};

use crate::modules::catalog::Catalog;
use crate::modules::models::lap_record::LapRecord;
use crate::modules::models::vehicle::VehicleClass;
use crate::modules::ranking::Gap;

#[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
pub struct HistoryEntry {
    pub record: LapRecord,
    pub vehicle_name: String,
    pub class: VehicleClass,
    /// gap to the competitor's own best on this track
    pub gap: Gap,
    pub gap_display: String,
}

/// # garage history
/// every record one competitor holds on one track, across all classes
#[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
pub struct History {
    pub owner: String,
    pub track_id: String,
    pub entries: Vec<HistoryEntry>,
}

impl History {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn best(&self) -> Option<&HistoryEntry> {
        self.entries.first()
    }
}

/// # history
/// the drill-down view of a competitor on a track.
/// gaps are relative to the competitor's own fastest record, other
/// competitors play no part. an empty result is how the caller learns
/// that there is nothing left to drill into.
///
/// ## Arguments
/// * `records` - record snapshot, may contain other tracks and competitors
/// * `owner` - the competitor to show
/// * `track_id` - the track to show
/// * `catalog` - resolves vehicle names and classes
pub fn history(records: &[LapRecord], owner: &str, track_id: &str, catalog: &Catalog) -> History {
    let mut own: Vec<&LapRecord> = records
        .iter()
        .filter(|r| r.owner == owner && r.track_id == track_id)
        .collect();

    // stable, ties keep snapshot order
    own.sort_by_key(|r| r.time);

    let self_best = own.first().map(|r| r.time);
    let entries = own
        .into_iter()
        .map(|record| {
            let gap = match self_best {
                Some(best) if record.time != best => Gap::behind(best, record.time),
                _ => Gap::Reference,
            };
            let vehicle = catalog.vehicle(&record.vehicle_id);

            HistoryEntry {
                record: record.clone(),
                vehicle_name: vehicle.display_name,
                class: vehicle.class,
                gap,
                gap_display: gap.to_string(),
            }
        })
        .collect();

    History {
        owner: owner.to_string(),
        track_id: track_id.to_string(),
        entries,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::models::lap_record::tests::lap;

    #[test]
    fn gaps_are_relative_to_own_best() {
        let records = vec![
            lap("alice", "monza", "bmw_m4_gt3", 110_000),
            lap("alice", "monza", "bmw_m4_gt4", 108_500),
            lap("alice", "monza", "porsche_992_gt3_cup", 112_300),
            lap("bob", "monza", "bmw_m4_gt3", 101_000),
        ];
        let history = history(&records, "alice", "monza", &Catalog::default());

        let by_total = |total: u32| {
            history
                .entries
                .iter()
                .find(|e| e.record.total_millis() == total)
                .map(|e| e.gap.to_string())
                .unwrap()
        };
        assert_eq!(by_total(110_000), "+1.500");
        assert_eq!(by_total(108_500), "-");
        assert_eq!(by_total(112_300), "+3.800");

        let order: Vec<u32> = history.entries.iter().map(|e| e.record.total_millis()).collect();
        assert_eq!(order, vec![108_500, 110_000, 112_300]);
    }

    #[test]
    fn spans_all_classes_of_one_track_only() {
        let records = vec![
            lap("alice", "monza", "bmw_m4_gt3", 106_000),
            lap("alice", "monza", "bmw_m2_cs_racing", 118_000),
            lap("alice", "spa", "bmw_m4_gt3", 138_000),
        ];
        let history = history(&records, "alice", "monza", &Catalog::default());

        assert_eq!(history.entries.len(), 2);
        assert_eq!(history.entries[1].class, VehicleClass::TCX);
        assert_eq!(history.best().map(|e| e.record.total_millis()), Some(106_000));
    }

    #[test]
    fn nothing_left_gives_empty_history() {
        let records = vec![lap("bob", "monza", "bmw_m4_gt3", 101_000)];
        assert!(history(&records, "alice", "monza", &Catalog::default()).is_empty());
    }
}
