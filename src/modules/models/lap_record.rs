use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use snafu::ensure;

use crate::errors::{CustomResult, ValidationSnafu};
use crate::modules::verification::VerificationState;

pub type RecordId = String;

const MILLIS_PER_MINUTE: u32 = 60_000;
const MILLIS_PER_SECOND: u32 = 1_000;

/// # lap time
/// the elapsed time of a lap. the total in milliseconds is the only thing
/// stored, minutes/seconds/milliseconds are always derived from it so the
/// parts can never disagree with the total.
#[derive(Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy)]
#[serde(into = "LapTimeParts", try_from = "LapTimeParts")]
pub struct LapTime {
    total_millis: u32,
}

impl LapTime {
    pub fn from_total_millis(total_millis: u32) -> LapTime {
        LapTime { total_millis }
    }

    /// # build from parts
    /// build a lap time from its display parts.
    ///
    /// ## Arguments
    /// * `minutes` - whole minutes
    /// * `seconds` - seconds, must be below 60
    /// * `milliseconds` - milliseconds, must be below 1000
    ///
    /// ## Returns
    /// * `LapTime` - the lap time, or a validation error for out of range parts
    pub fn from_parts(minutes: u32, seconds: u32, milliseconds: u32) -> CustomResult<LapTime> {
        ensure!(seconds < 60, ValidationSnafu { field: "seconds", message: "must be below 60" });
        ensure!(milliseconds < 1000, ValidationSnafu { field: "milliseconds", message: "must be below 1000" });

        let total = minutes
            .checked_mul(MILLIS_PER_MINUTE)
            .and_then(|m| m.checked_add(seconds * MILLIS_PER_SECOND + milliseconds));

        match total {
            Some(total_millis) => Ok(LapTime { total_millis }),
            None => ValidationSnafu { field: "minutes", message: "lap time too long" }.fail(),
        }
    }

    /// # parse the text fields of a form
    /// non-numeric input is a validation error on the offending field
    pub fn parse_parts(minutes: &str, seconds: &str, milliseconds: &str) -> CustomResult<LapTime> {
        let minutes = parse_field("minutes", minutes)?;
        let seconds = parse_field("seconds", seconds)?;
        let milliseconds = parse_field("milliseconds", milliseconds)?;
        LapTime::from_parts(minutes, seconds, milliseconds)
    }

    pub fn total_millis(&self) -> u32 {
        self.total_millis
    }

    pub fn minutes(&self) -> u32 {
        self.total_millis / MILLIS_PER_MINUTE
    }

    pub fn seconds(&self) -> u32 {
        (self.total_millis % MILLIS_PER_MINUTE) / MILLIS_PER_SECOND
    }

    pub fn milliseconds(&self) -> u32 {
        self.total_millis % MILLIS_PER_SECOND
    }
}

fn parse_field(field: &'static str, value: &str) -> CustomResult<u32> {
    match value.trim().parse::<u32>() {
        Ok(v) => Ok(v),
        Err(_) => ValidationSnafu { field, message: format!("`{}` is not a number", value) }.fail(),
    }
}

/// formats as `1:47.500`
impl fmt::Display for LapTime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{:02}.{:03}", self.minutes(), self.seconds(), self.milliseconds())
    }
}

/// wire shape of a lap time, carries the derived parts for display
#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub struct LapTimeParts {
    pub minutes: u32,
    pub seconds: u32,
    pub milliseconds: u32,
    /// checked against the parts when present
    #[serde(default)]
    pub total_milliseconds: Option<u32>,
}

impl From<LapTime> for LapTimeParts {
    fn from(time: LapTime) -> Self {
        LapTimeParts {
            minutes: time.minutes(),
            seconds: time.seconds(),
            milliseconds: time.milliseconds(),
            total_milliseconds: Some(time.total_millis()),
        }
    }
}

impl TryFrom<LapTimeParts> for LapTime {
    type Error = String;

    fn try_from(parts: LapTimeParts) -> Result<Self, Self::Error> {
        let time = LapTime::from_parts(parts.minutes, parts.seconds, parts.milliseconds)
            .map_err(|e| e.to_string())?;
        match parts.total_milliseconds {
            Some(total) if total != time.total_millis() => {
                Err(format!("total of {} ms does not match {}", total, time))
            }
            _ => Ok(time),
        }
    }
}

#[derive(Serialize, Deserialize, PartialEq, Eq, Hash, Debug, Clone, Copy, Default)]
pub enum Condition {
    #[default]
    Dry,
    Wet,
}

impl Condition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::Dry => "Dry",
            Condition::Wet => "Wet",
        }
    }
}

impl FromStr for Condition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Dry" | "dry" => Ok(Condition::Dry),
            "Wet" | "wet" => Ok(Condition::Wet),
            _ => Err(format!("unknown condition `{}`", s)),
        }
    }
}

#[derive(Serialize, Deserialize, PartialEq, Eq, Hash, Debug, Clone, Copy)]
pub enum InputDevice {
    Keyboard,
    Gamepad,
    Wheel,
}

impl InputDevice {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputDevice::Keyboard => "Keyboard",
            InputDevice::Gamepad => "Gamepad",
            InputDevice::Wheel => "Wheel",
        }
    }
}

impl FromStr for InputDevice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Keyboard" => Ok(InputDevice::Keyboard),
            "Gamepad" => Ok(InputDevice::Gamepad),
            "Wheel" => Ok(InputDevice::Wheel),
            _ => Err(format!("unknown input device `{}`", s)),
        }
    }
}

/// # lap record
/// a competitor's stored result for one (track, vehicle) configuration
#[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
pub struct LapRecord {
    pub id: RecordId,
    pub owner: String,
    pub owner_email: Option<String>,
    pub track_id: String,
    pub vehicle_id: String,
    pub time: LapTime,
    pub condition: Condition,
    pub track_temp: Option<i32>,
    pub input_device: Option<InputDevice>,
    pub verification: VerificationState,
    pub timestamp: DateTime<Utc>,
}

/// the values a competitor enters for a new or corrected lap
#[derive(Deserialize, Debug, Clone)]
pub struct LapDraft {
    pub track_id: String,
    pub vehicle_id: String,
    pub time: LapTime,
    #[serde(default)]
    pub condition: Condition,
    pub track_temp: Option<i32>,
    pub input_device: Option<InputDevice>,
    #[serde(default)]
    pub verification: VerificationState,
}

impl LapRecord {
    /// # create a record
    /// validate a draft and turn it into a record owned by `owner`.
    /// a record that fails validation never enters the pipeline.
    ///
    /// ## Arguments
    /// * `id` - the record id, generated when `None`
    /// * `owner` - display name of the owning competitor
    /// * `owner_email` - contact address of the owner
    /// * `draft` - the entered values
    /// * `timestamp` - submission time
    pub fn new(
        id: Option<RecordId>,
        owner: &str,
        owner_email: Option<&str>,
        draft: LapDraft,
        timestamp: DateTime<Utc>,
    ) -> CustomResult<LapRecord> {
        ensure!(!owner.trim().is_empty(), ValidationSnafu { field: "owner", message: "must not be empty" });
        ensure!(!draft.track_id.trim().is_empty(), ValidationSnafu { field: "track", message: "must not be empty" });
        ensure!(!draft.vehicle_id.trim().is_empty(), ValidationSnafu { field: "vehicle", message: "must not be empty" });
        ensure!(draft.time.total_millis() > 0, ValidationSnafu { field: "time", message: "must be greater than zero" });
        if let Some(temp) = draft.track_temp {
            ensure!((-50..=100).contains(&temp), ValidationSnafu { field: "track temperature", message: format!("{} °C is out of range", temp) });
        }

        Ok(LapRecord {
            id: id.unwrap_or_else(LapRecord::generate_id),
            owner: owner.to_string(),
            owner_email: owner_email.map(|e| e.to_string()),
            track_id: draft.track_id,
            vehicle_id: draft.vehicle_id,
            time: draft.time,
            condition: draft.condition,
            track_temp: draft.track_temp,
            input_device: draft.input_device,
            verification: draft.verification,
            timestamp,
        })
    }

    pub fn generate_id() -> RecordId {
        uuid::Uuid::new_v4().to_string()
    }

    pub fn total_millis(&self) -> u32 {
        self.time.total_millis()
    }

    /// # same configuration
    /// true when both records share owner, track and vehicle
    pub fn same_configuration(&self, other: &LapRecord) -> bool {
        self.owner == other.owner && self.track_id == other.track_id && self.vehicle_id == other.vehicle_id
    }

    pub fn is_verified(&self) -> bool {
        self.verification == VerificationState::AiVerified
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::TimeZone;

    pub(crate) fn lap(owner: &str, track: &str, vehicle: &str, total: u32) -> LapRecord {
        LapRecord {
            id: format!("{}-{}-{}-{}", owner, track, vehicle, total),
            owner: owner.to_string(),
            owner_email: None,
            track_id: track.to_string(),
            vehicle_id: vehicle.to_string(),
            time: LapTime::from_total_millis(total),
            condition: Condition::Dry,
            track_temp: None,
            input_device: None,
            verification: VerificationState::Unverified,
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn parts_are_derived_from_total() {
        let time = LapTime::from_total_millis(106_320);
        assert_eq!(time.minutes(), 1);
        assert_eq!(time.seconds(), 46);
        assert_eq!(time.milliseconds(), 320);
        assert_eq!(time.to_string(), "1:46.320");
    }

    #[test]
    fn decompose_and_recombine_reproduces_total() {
        for total in [0, 999, 1_000, 59_999, 60_000, 105_998, 3_599_999, 7_654_321] {
            let time = LapTime::from_total_millis(total);
            let rebuilt = LapTime::from_parts(time.minutes(), time.seconds(), time.milliseconds()).unwrap();
            assert_eq!(rebuilt.total_millis(), total);
        }
    }

    #[test]
    fn out_of_range_parts_are_rejected() {
        assert!(LapTime::from_parts(1, 60, 0).is_err());
        assert!(LapTime::from_parts(1, 59, 1000).is_err());
        assert!(LapTime::from_parts(1, 59, 999).is_ok());
    }

    #[test]
    fn non_numeric_text_is_rejected() {
        let err = LapTime::parse_parts("1", "4x", "320").unwrap_err();
        assert!(err.to_string().contains("seconds"), "{}", err);
        assert_eq!(LapTime::parse_parts(" 1", "47 ", "500").unwrap().total_millis(), 107_500);
    }

    #[test]
    fn inconsistent_wire_parts_fail_to_deserialize() {
        let ok = r#"{"minutes":1,"seconds":47,"milliseconds":500,"total_milliseconds":107500}"#;
        assert_eq!(serde_json::from_str::<LapTime>(ok).unwrap().total_millis(), 107_500);

        let bad = r#"{"minutes":1,"seconds":47,"milliseconds":500,"total_milliseconds":1}"#;
        assert!(serde_json::from_str::<LapTime>(bad).is_err());

        let parts_only = r#"{"minutes":1,"seconds":47,"milliseconds":500}"#;
        assert_eq!(serde_json::from_str::<LapTime>(parts_only).unwrap().total_millis(), 107_500);
        assert!(serde_json::from_str::<LapTime>(r#"{"minutes":1,"seconds":60,"milliseconds":0}"#).is_err());
    }

    #[test]
    fn draft_validation() {
        let draft = LapDraft {
            track_id: "monza".to_string(),
            vehicle_id: "bmw_m4_gt3".to_string(),
            time: LapTime::from_total_millis(107_500),
            condition: Condition::Wet,
            track_temp: Some(24),
            input_device: Some(InputDevice::Wheel),
            verification: VerificationState::Unverified,
        };
        let record = LapRecord::new(None, "J.Baldwin", Some("james@sim.com"), draft.clone(), Utc::now()).unwrap();
        assert_eq!(record.owner, "J.Baldwin");
        assert!(!record.id.is_empty());

        assert!(LapRecord::new(None, " ", None, draft.clone(), Utc::now()).is_err());

        let mut hot = draft.clone();
        hot.track_temp = Some(400);
        assert!(LapRecord::new(None, "J.Baldwin", None, hot, Utc::now()).is_err());

        let mut zero = draft;
        zero.time = LapTime::from_total_millis(0);
        assert!(LapRecord::new(None, "J.Baldwin", None, zero, Utc::now()).is_err());
    }
}
