use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};

use crate::modules::catalog::Catalog;
use crate::modules::models::competitor::Identity;
use crate::modules::models::lap_record::{LapRecord, LapTime};
use crate::modules::models::vehicle::VehicleClass;

/// # class filter
#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy, Default)]
pub enum ClassFilter {
    #[default]
    All,
    Only(VehicleClass),
}

impl ClassFilter {
    pub fn matches(&self, class: VehicleClass) -> bool {
        match self {
            ClassFilter::All => true,
            ClassFilter::Only(wanted) => *wanted == class,
        }
    }
}

impl fmt::Display for ClassFilter {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ClassFilter::All => write!(f, "ALL"),
            ClassFilter::Only(class) => write!(f, "{}", class),
        }
    }
}

impl FromStr for ClassFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || s.eq_ignore_ascii_case("ALL") {
            return Ok(ClassFilter::All);
        }
        s.parse::<VehicleClass>().map(ClassFilter::Only)
    }
}

impl Serialize for ClassFilter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ClassFilter {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// # gap
/// time difference to a reference lap.
/// `Reference` is the sentinel for the lap everything is measured against.
#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum Gap {
    Reference,
    Behind(u32),
}

impl Gap {
    /// # gap between two laps
    /// `time` is never faster than `reference` in a sorted list, the
    /// subtraction saturates just in case.
    pub fn behind(reference: LapTime, time: LapTime) -> Gap {
        Gap::Behind(time.total_millis().saturating_sub(reference.total_millis()))
    }

    pub fn millis(&self) -> u32 {
        match self {
            Gap::Reference => 0,
            Gap::Behind(ms) => *ms,
        }
    }
}

/// seconds with three decimals, `-` for the reference
impl fmt::Display for Gap {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Gap::Reference => write!(f, "-"),
            Gap::Behind(ms) => write!(f, "+{}.{:03}", ms / 1000, ms % 1000),
        }
    }
}

#[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub owner: String,
    pub record: LapRecord,
    pub vehicle_name: String,
    pub class: VehicleClass,
    pub gap: Gap,
    pub gap_display: String,
    pub is_viewer: bool,
}

#[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
pub struct Leaderboard {
    pub class_filter: ClassFilter,
    pub entries: Vec<LeaderboardEntry>,
}

impl Leaderboard {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// # position of a competitor
    /// zero based index of the competitor's row
    pub fn position_of(&self, owner: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.owner == owner)
    }

    pub fn entry_of(&self, owner: &str) -> Option<&LeaderboardEntry> {
        self.position_of(owner).map(|i| &self.entries[i])
    }

    /// # mark the viewer
    /// flag the rows of `viewer`. boards are cached without a viewer and
    /// marked per request.
    pub fn mark_viewer(&mut self, viewer: Option<&Identity>) {
        for entry in self.entries.iter_mut() {
            entry.is_viewer = viewer.map(|v| v.owns(&entry.owner)).unwrap_or(false);
        }
    }

    /// the row of whoever is looking at the board
    pub fn viewer_entry(&self) -> Option<&LeaderboardEntry> {
        self.entries.iter().find(|e| e.is_viewer)
    }
}

/// # rank
/// build the public leaderboard from the records of one track.
///
/// every competitor appears once with their fastest lap in the class.
/// equal times keep the order they had in `records`.
///
/// ## Arguments
/// * `records` - the record snapshot of a track, in store order
/// * `class_filter` - the class to rank, or all classes
/// * `catalog` - resolves vehicle classes and names
/// * `viewer` - the competitor looking at the board, if signed in
///
/// ## Returns
/// * `Leaderboard` - the ranked entries, empty when nothing matches the filter
pub fn rank(
    records: &[LapRecord],
    class_filter: ClassFilter,
    catalog: &Catalog,
    viewer: Option<&Identity>,
) -> Leaderboard {
    // best record per owner, with the input position it was found at
    let mut best: Vec<(usize, &LapRecord)> = Vec::new();
    let mut slot_of_owner: HashMap<&str, usize> = HashMap::new();

    for (position, record) in records.iter().enumerate() {
        if !class_filter.matches(catalog.class_of(&record.vehicle_id)) {
            continue;
        }

        match slot_of_owner.get(record.owner.as_str()) {
            Some(&slot) => {
                if record.time < best[slot].1.time {
                    best[slot] = (position, record);
                }
            }
            None => {
                slot_of_owner.insert(&record.owner, best.len());
                best.push((position, record));
            }
        }
    }

    best.sort_by_key(|(position, record)| (record.time, *position));

    let leader = best.first().map(|(_, r)| r.time);
    let entries = best
        .into_iter()
        .enumerate()
        .map(|(index, (_, record))| {
            let gap = match (index, leader) {
                (0, _) | (_, None) => Gap::Reference,
                (_, Some(leader)) => Gap::behind(leader, record.time),
            };
            let vehicle = catalog.vehicle(&record.vehicle_id);

            LeaderboardEntry {
                rank: index + 1,
                owner: record.owner.clone(),
                record: record.clone(),
                vehicle_name: vehicle.display_name,
                class: vehicle.class,
                gap,
                gap_display: gap.to_string(),
                is_viewer: viewer.map(|v| v.owns(&record.owner)).unwrap_or(false),
            }
        })
        .collect();

    Leaderboard {
        class_filter,
        entries,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::models::lap_record::tests::lap;

    fn gaps(board: &Leaderboard) -> Vec<String> {
        board.entries.iter().map(|e| e.gap.to_string()).collect()
    }

    #[test]
    fn ranks_by_total_with_gap_to_leader() {
        let records = vec![
            lap("alice", "monza", "bmw_m4_gt3", 106_320),
            lap("bob", "monza", "ferrari_296_gt3", 105_998),
            lap("carol", "monza", "porsche_992_gt3_r", 107_001),
        ];
        let board = rank(&records, ClassFilter::All, &Catalog::default(), None);

        let totals: Vec<u32> = board.entries.iter().map(|e| e.record.total_millis()).collect();
        assert_eq!(totals, vec![105_998, 106_320, 107_001]);
        assert_eq!(gaps(&board), vec!["-", "+0.322", "+1.003"]);
        assert_eq!(board.entries.iter().map(|e| e.rank).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn keeps_only_the_best_lap_per_competitor() {
        let records = vec![
            lap("alice", "monza", "bmw_m4_gt3", 108_000),
            lap("alice", "monza", "ferrari_296_gt3", 106_000),
            lap("bob", "monza", "bmw_m4_gt3", 107_000),
        ];
        let board = rank(&records, ClassFilter::Only(VehicleClass::GT3), &Catalog::default(), None);

        assert_eq!(board.len(), 2);
        assert_eq!(board.entries[0].owner, "alice");
        assert_eq!(board.entries[0].record.vehicle_id, "ferrari_296_gt3");
        assert_eq!(board.entries[0].vehicle_name, "Ferrari 296 GT3 (2023)");
        assert_eq!(board.entries[1].gap, Gap::Behind(1_000));
    }

    #[test]
    fn class_filter_applies_before_grouping() {
        let records = vec![
            lap("alice", "monza", "bmw_m4_gt4", 118_000),
            lap("alice", "monza", "bmw_m4_gt3", 106_000),
            lap("bob", "monza", "porsche_718_cayman_gt4_mr", 117_500),
        ];
        let board = rank(&records, ClassFilter::Only(VehicleClass::GT4), &Catalog::default(), None);

        assert_eq!(board.entries[0].owner, "bob");
        assert_eq!(board.entries[1].record.total_millis(), 118_000);
        assert_eq!(board.entries[1].class, VehicleClass::GT4);
    }

    #[test]
    fn empty_class_gives_empty_board() {
        let records = vec![lap("alice", "monza", "bmw_m4_gt3", 106_000)];
        let board = rank(&records, ClassFilter::Only(VehicleClass::GTC), &Catalog::default(), None);
        assert!(board.is_empty());
        assert_eq!(board.position_of("alice"), None);
    }

    #[test]
    fn ties_keep_input_order() {
        let records = vec![
            lap("zed", "monza", "bmw_m4_gt3", 110_000),
            lap("bob", "monza", "bmw_m4_gt3", 105_000),
            lap("zed", "monza", "audi_r8_lms", 105_000),
            lap("amy", "monza", "bmw_m4_gt3", 105_000),
        ];
        let board = rank(&records, ClassFilter::All, &Catalog::default(), None);

        let owners: Vec<&str> = board.entries.iter().map(|e| e.owner.as_str()).collect();
        assert_eq!(owners, vec!["bob", "zed", "amy"]);
        assert_eq!(gaps(&board), vec!["-", "+0.000", "+0.000"]);
    }

    #[test]
    fn unknown_vehicles_count_as_default_class() {
        let records = vec![lap("alice", "monza", "mclaren_720s_evo", 106_320)];
        let board = rank(&records, ClassFilter::Only(VehicleClass::GT3), &Catalog::default(), None);
        assert_eq!(board.entries[0].vehicle_name, "mclaren_720s_evo");
    }

    #[test]
    fn marks_and_finds_the_viewer() {
        let records = vec![
            lap("alice", "monza", "bmw_m4_gt3", 106_320),
            lap("bob", "monza", "bmw_m4_gt3", 105_998),
        ];
        let viewer = Identity::new("alice", None);
        let board = rank(&records, ClassFilter::All, &Catalog::default(), Some(&viewer));

        assert_eq!(board.position_of("alice"), Some(1));
        assert_eq!(board.viewer_entry().map(|e| e.rank), Some(2));
        assert!(!board.entries[0].is_viewer);
    }

    #[test]
    fn class_filter_parsing() {
        assert_eq!("ALL".parse::<ClassFilter>().unwrap(), ClassFilter::All);
        assert_eq!("gt4".parse::<ClassFilter>().unwrap(), ClassFilter::Only(VehicleClass::GT4));
        assert!("F1".parse::<ClassFilter>().is_err());
        assert_eq!(ClassFilter::Only(VehicleClass::CUP).to_string(), "CUP");
    }
}
