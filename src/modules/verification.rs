use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::errors::{CustomResult, ValidationSnafu};
use crate::modules::catalog::Catalog;
use crate::modules::extraction::ExtractedFields;
use crate::modules::models::competitor::Identity;
use crate::modules::models::lap_record::{Condition, InputDevice, LapDraft, LapRecord, LapTime};

/// # verification state
/// whether the timing fields of a lap were last set by a complete automatic
/// extraction pass and not touched by hand since.
#[derive(Serialize, Deserialize, PartialEq, Eq, Hash, Debug, Clone, Copy, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationState {
    #[default]
    Unverified,
    AiVerified,
}

impl VerificationState {
    /// the optional `is_verified` column of the store
    pub fn from_flag(flag: Option<bool>) -> VerificationState {
        match flag {
            Some(true) => VerificationState::AiVerified,
            _ => VerificationState::Unverified,
        }
    }

    pub fn as_flag(&self) -> bool {
        *self == VerificationState::AiVerified
    }
}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum FormField {
    Minutes,
    Seconds,
    Milliseconds,
    Track,
    Vehicle,
    Condition,
    TrackTemp,
    InputDevice,
}

impl FormField {
    pub fn is_timing(&self) -> bool {
        matches!(self, FormField::Minutes | FormField::Seconds | FormField::Milliseconds)
    }
}

/// # state after a manual edit
/// editing a timing field drops any verification, other fields keep it
pub fn after_manual_edit(state: VerificationState, field: FormField) -> VerificationState {
    if field.is_timing() {
        VerificationState::Unverified
    } else {
        state
    }
}

/// # state after a correction
/// the fields a stored record differs in after a direct edit
pub fn changed_fields(stored: &LapRecord, corrected: &LapRecord) -> Vec<FormField> {
    let mut changed = Vec::new();
    if stored.time.minutes() != corrected.time.minutes() {
        changed.push(FormField::Minutes);
    }
    if stored.time.seconds() != corrected.time.seconds() {
        changed.push(FormField::Seconds);
    }
    if stored.time.milliseconds() != corrected.time.milliseconds() {
        changed.push(FormField::Milliseconds);
    }
    if stored.track_id != corrected.track_id {
        changed.push(FormField::Track);
    }
    if stored.vehicle_id != corrected.vehicle_id {
        changed.push(FormField::Vehicle);
    }
    if stored.condition != corrected.condition {
        changed.push(FormField::Condition);
    }
    if stored.track_temp != corrected.track_temp {
        changed.push(FormField::TrackTemp);
    }
    if stored.input_device != corrected.input_device {
        changed.push(FormField::InputDevice);
    }
    changed
}

/// the stored state run through every field a correction touches. the
/// state the client sends along is never trusted here.
pub fn after_correction(stored: &LapRecord, corrected: &LapRecord) -> VerificationState {
    changed_fields(stored, corrected)
        .into_iter()
        .fold(stored.verification, after_manual_edit)
}

/// # lap entry form
/// the values a competitor is entering for a lap, either a fresh
/// submission or a correction of one of their stored records.
#[derive(Debug, Clone)]
pub struct LapForm {
    pub minutes: String,
    pub seconds: String,
    pub milliseconds: String,
    pub track_id: String,
    pub vehicle_id: String,
    pub condition: Condition,
    pub track_temp: String,
    pub input_device: Option<InputDevice>,
    verification: VerificationState,
    editing: Option<LapRecord>,
}

impl LapForm {
    pub fn new(track_id: &str, vehicle_id: &str) -> LapForm {
        LapForm {
            minutes: String::new(),
            seconds: String::new(),
            milliseconds: String::new(),
            track_id: track_id.to_string(),
            vehicle_id: vehicle_id.to_string(),
            condition: Condition::Dry,
            track_temp: String::new(),
            input_device: Some(InputDevice::Wheel),
            verification: VerificationState::Unverified,
            editing: None,
        }
    }

    /// # edit an existing record
    /// prefill the form from a stored record, keeping its verification state
    pub fn edit(record: &LapRecord) -> LapForm {
        LapForm {
            minutes: record.time.minutes().to_string(),
            seconds: record.time.seconds().to_string(),
            milliseconds: record.time.milliseconds().to_string(),
            track_id: record.track_id.clone(),
            vehicle_id: record.vehicle_id.clone(),
            condition: record.condition,
            track_temp: record.track_temp.map(|t| t.to_string()).unwrap_or_default(),
            input_device: record.input_device,
            verification: record.verification,
            editing: Some(record.clone()),
        }
    }

    pub fn verification(&self) -> VerificationState {
        self.verification
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    fn touched(&mut self, field: FormField) {
        self.verification = after_manual_edit(self.verification, field);
    }

    pub fn set_minutes(&mut self, value: &str) {
        self.minutes = value.to_string();
        self.touched(FormField::Minutes);
    }

    pub fn set_seconds(&mut self, value: &str) {
        self.seconds = value.to_string();
        self.touched(FormField::Seconds);
    }

    pub fn set_milliseconds(&mut self, value: &str) {
        self.milliseconds = value.to_string();
        self.touched(FormField::Milliseconds);
    }

    pub fn set_track(&mut self, track_id: &str) {
        self.track_id = track_id.to_string();
        self.touched(FormField::Track);
    }

    pub fn set_vehicle(&mut self, vehicle_id: &str) {
        self.vehicle_id = vehicle_id.to_string();
        self.touched(FormField::Vehicle);
    }

    pub fn set_condition(&mut self, condition: Condition) {
        self.condition = condition;
        self.touched(FormField::Condition);
    }

    pub fn set_track_temp(&mut self, value: &str) {
        self.track_temp = value.to_string();
        self.touched(FormField::TrackTemp);
    }

    pub fn set_input_device(&mut self, device: Option<InputDevice>) {
        self.input_device = device;
        self.touched(FormField::InputDevice);
    }

    /// # apply an extraction pass
    /// copy every proposed value into the form. ids are only accepted when
    /// the catalog knows them, otherwise the entered value stays.
    /// the form becomes verified only when all three timing parts came
    /// from the extraction.
    ///
    /// ## Returns
    /// * `Vec<FormField>` - the fields that were filled
    pub fn apply_extraction(&mut self, fields: &ExtractedFields, catalog: &Catalog) -> Vec<FormField> {
        let mut filled = Vec::new();

        if let Some(minutes) = fields.minutes {
            self.minutes = minutes.to_string();
            filled.push(FormField::Minutes);
        }
        if let Some(seconds) = fields.seconds {
            self.seconds = seconds.to_string();
            filled.push(FormField::Seconds);
        }
        if let Some(milliseconds) = fields.milliseconds {
            self.milliseconds = milliseconds.to_string();
            filled.push(FormField::Milliseconds);
        }

        match fields.track_id.as_deref() {
            Some(track_id) if catalog.has_track(track_id) => {
                self.track_id = track_id.to_string();
                filled.push(FormField::Track);
            }
            Some(track_id) => {
                debug!(target: "modules/verification:apply_extraction", "ignoring unknown track id {}", track_id);
            }
            None => {}
        }

        match fields.vehicle_id.as_deref() {
            Some(vehicle_id) if catalog.has_vehicle(vehicle_id) => {
                self.vehicle_id = vehicle_id.to_string();
                filled.push(FormField::Vehicle);
            }
            Some(vehicle_id) => {
                debug!(target: "modules/verification:apply_extraction", "ignoring unknown vehicle id {}", vehicle_id);
            }
            None => {}
        }

        if fields.has_complete_time() {
            self.verification = VerificationState::AiVerified;
        } else {
            warn!(target: "modules/verification:apply_extraction", "extraction returned an incomplete lap time, verification unchanged");
        }

        filled
    }

    /// # failed extraction
    /// a failed or cancelled pass changes nothing
    pub fn extraction_failed(&mut self, reason: &str) {
        warn!(target: "modules/verification:extraction_failed", "extraction failed, keeping manual values: {}", reason);
    }

    /// # clear the uploaded image
    /// drops the verification, and for a new submission the extracted time with it
    pub fn clear_image(&mut self) {
        self.verification = VerificationState::Unverified;
        if self.editing.is_none() {
            self.minutes.clear();
            self.seconds.clear();
            self.milliseconds.clear();
        }
    }

    /// # build the record
    /// validate the form and produce the record to submit.
    /// editing keeps the id and original timestamp of the edited record.
    ///
    /// ## Arguments
    /// * `identity` - the competitor submitting, becomes the owner
    /// * `now` - submission time for new records
    pub fn build(&self, identity: &Identity, now: DateTime<Utc>) -> CustomResult<LapRecord> {
        let time = LapTime::parse_parts(&self.minutes, &self.seconds, &self.milliseconds)?;

        let track_temp = match self.track_temp.trim() {
            "" => None,
            text => match text.parse::<i32>() {
                Ok(t) => Some(t),
                Err(_) => {
                    return ValidationSnafu { field: "track temperature", message: format!("`{}` is not a number", text) }.fail();
                }
            },
        };

        let draft = LapDraft {
            track_id: self.track_id.clone(),
            vehicle_id: self.vehicle_id.clone(),
            time,
            condition: self.condition,
            track_temp,
            input_device: self.input_device,
            verification: self.verification,
        };

        let (id, timestamp) = match &self.editing {
            Some(original) => (Some(original.id.clone()), original.timestamp),
            None => (None, now),
        };

        LapRecord::new(id, &identity.name, identity.email.as_deref(), draft, timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::models::lap_record::tests::lap;

    #[test]
    fn correction_replays_the_changed_fields() {
        let mut stored = lap("alice", "monza", "bmw_m4_gt3", 106_320);
        stored.verification = VerificationState::AiVerified;

        let mut warmer = stored.clone();
        warmer.track_temp = Some(31);
        assert_eq!(changed_fields(&stored, &warmer), vec![FormField::TrackTemp]);
        assert_eq!(after_correction(&stored, &warmer), VerificationState::AiVerified);

        let mut slower = stored.clone();
        slower.time = LapTime::from_total_millis(106_500);
        assert_eq!(changed_fields(&stored, &slower), vec![FormField::Milliseconds]);
        assert_eq!(after_correction(&stored, &slower), VerificationState::Unverified);
    }

    fn extracted(minutes: Option<u32>, seconds: Option<u32>, milliseconds: Option<u32>) -> ExtractedFields {
        ExtractedFields {
            minutes,
            seconds,
            milliseconds,
            track_id: None,
            vehicle_id: None,
        }
    }

    fn verified_form() -> LapForm {
        let mut form = LapForm::new("monza", "bmw_m4_gt3");
        form.apply_extraction(&extracted(Some(1), Some(46), Some(320)), &Catalog::default());
        form
    }

    #[test]
    fn manual_timing_edit_drops_verification() {
        let mut form = verified_form();
        assert_eq!(form.verification(), VerificationState::AiVerified);
        assert_eq!(form.milliseconds, "320");

        form.set_milliseconds("500");
        assert_eq!(form.verification(), VerificationState::Unverified);
    }

    #[test]
    fn non_timing_edits_keep_verification() {
        let mut form = verified_form();
        form.set_condition(Condition::Wet);
        form.set_track_temp("31");
        form.set_input_device(Some(InputDevice::Gamepad));
        assert_eq!(form.verification(), VerificationState::AiVerified);
    }

    #[test]
    fn every_timing_field_counts() {
        for edit in [LapForm::set_minutes, LapForm::set_seconds, LapForm::set_milliseconds] {
            let mut form = verified_form();
            edit(&mut form, "1");
            assert_eq!(form.verification(), VerificationState::Unverified);
        }
    }

    #[test]
    fn incomplete_extraction_does_not_verify() {
        let mut form = LapForm::new("monza", "bmw_m4_gt3");
        form.set_milliseconds("123");
        let filled = form.apply_extraction(&extracted(Some(1), Some(47), None), &Catalog::default());

        assert_eq!(filled, vec![FormField::Minutes, FormField::Seconds]);
        assert_eq!(form.verification(), VerificationState::Unverified);
        assert_eq!(form.milliseconds, "123");
    }

    #[test]
    fn failed_extraction_keeps_entered_values() {
        let mut form = verified_form();
        form.extraction_failed("timeout");
        assert_eq!(form.verification(), VerificationState::AiVerified);
        assert_eq!((form.minutes.as_str(), form.seconds.as_str()), ("1", "46"));
    }

    #[test]
    fn unknown_ids_from_extraction_are_ignored() {
        let mut form = LapForm::new("monza", "bmw_m4_gt3");
        let fields = ExtractedFields {
            track_id: Some("atlantis".to_string()),
            vehicle_id: Some("porsche_992_gt3_r".to_string()),
            ..extracted(Some(1), Some(50), Some(0))
        };
        form.apply_extraction(&fields, &Catalog::default());
        assert_eq!(form.track_id, "monza");
        assert_eq!(form.vehicle_id, "porsche_992_gt3_r");
    }

    #[test]
    fn clearing_the_image_resets_new_submissions_only() {
        let mut form = verified_form();
        form.clear_image();
        assert_eq!(form.verification(), VerificationState::Unverified);
        assert!(form.minutes.is_empty());

        let mut stored = lap("J.Baldwin", "monza", "bmw_m4_gt3", 106_320);
        stored.verification = VerificationState::AiVerified;
        let mut form = LapForm::edit(&stored);
        form.clear_image();
        assert_eq!(form.verification(), VerificationState::Unverified);
        assert_eq!(form.minutes, "1");
    }

    #[test]
    fn build_validates_and_keeps_identity_of_edited_record() {
        let identity = Identity::new("J.Baldwin", Some("james@sim.com"));

        let mut form = LapForm::new("monza", "bmw_m4_gt3");
        form.set_minutes("1");
        form.set_seconds("60");
        form.set_milliseconds("0");
        assert!(form.build(&identity, Utc::now()).is_err());

        form.set_seconds("47");
        form.set_track_temp("hot");
        assert!(form.build(&identity, Utc::now()).is_err());

        form.set_track_temp("24");
        let record = form.build(&identity, Utc::now()).unwrap();
        assert_eq!(record.total_millis(), 107_000);
        assert_eq!(record.owner, "J.Baldwin");

        let stored = lap("J.Baldwin", "monza", "bmw_m4_gt3", 106_320);
        let mut form = LapForm::edit(&stored);
        form.set_milliseconds("300");
        let corrected = form.build(&identity, Utc::now()).unwrap();
        assert_eq!(corrected.id, stored.id);
        assert_eq!(corrected.timestamp, stored.timestamp);
        assert_eq!(corrected.total_millis(), 106_300);
    }
}
