use std::fmt;

use log::{debug, info, warn};
use serde::Serialize;
use snafu::prelude::*;

use crate::errors::{ConfigurationTakenSnafu, CustomResult, NotFoundSnafu, NotOwnerSnafu};
use crate::modules::cache::LeaderboardCache;
use crate::modules::models::competitor::Identity;
use crate::modules::models::lap_record::{LapRecord, LapTime};
use crate::modules::ranking::Gap;
use crate::modules::store::{with_schema_fallback, LapStore, StoreError};
use crate::modules::verification::after_correction;

/// how often a submission is re-decided after losing a race
const MAX_ATTEMPTS: usize = 2;

#[derive(Serialize, PartialEq, Eq, Debug, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    SlowerThanPersonalBest,
    /// another write for the same configuration landed first
    StaleWrite,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RejectReason::SlowerThanPersonalBest => write!(f, "slower than personal best"),
            RejectReason::StaleWrite => write!(f, "a faster lap was saved in the meantime"),
        }
    }
}

#[derive(Serialize, PartialEq, Eq, Debug, Clone, Copy)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum SubmissionOutcome {
    Inserted,
    Replaced { previous: LapTime },
    Rejected { reason: RejectReason },
}

impl SubmissionOutcome {
    pub fn is_accepted(&self) -> bool {
        !matches!(self, SubmissionOutcome::Rejected { .. })
    }
}

/// # reconcile
/// decide what a submission does to the stored personal best of its
/// configuration. pure, the caller performs the write.
///
/// ## Arguments
/// * `candidate` - the submitted lap
/// * `existing` - the stored record of the same owner, track and vehicle
///
/// ## Returns
/// * `SubmissionOutcome` - insert when nothing is stored, replace when strictly faster, reject otherwise
pub fn reconcile(candidate: &LapRecord, existing: Option<&LapRecord>) -> SubmissionOutcome {
    match existing {
        None => SubmissionOutcome::Inserted,
        Some(stored) if candidate.time < stored.time => SubmissionOutcome::Replaced { previous: stored.time },
        Some(_) => SubmissionOutcome::Rejected { reason: RejectReason::SlowerThanPersonalBest },
    }
}

/// # write report
/// the outcome of a submission plus whether the store kept the verification state
#[derive(Serialize, PartialEq, Eq, Debug, Clone)]
pub struct WriteReport {
    pub outcome: SubmissionOutcome,
    /// id of the stored personal best, absent on rejection
    pub record_id: Option<String>,
    pub verification_saved: bool,
    pub message: String,
}

impl WriteReport {
    fn new(outcome: SubmissionOutcome, candidate: &LapRecord, record_id: Option<String>, verification_saved: bool) -> WriteReport {
        let mut message = match outcome {
            SubmissionOutcome::Inserted => format!("Lap time {} saved.", candidate.time),
            SubmissionOutcome::Replaced { previous } => {
                let gain = Gap::behind(candidate.time, previous).millis();
                format!("New personal best {} (-{}.{:03} on {}).", candidate.time, gain / 1000, gain % 1000, previous)
            }
            SubmissionOutcome::Rejected { reason } => format!("Lap time {} not saved: {}.", candidate.time, reason),
        };
        if outcome.is_accepted() && !verification_saved {
            message.push_str(" The verification status could not be stored.");
        }

        WriteReport {
            outcome,
            record_id,
            verification_saved,
            message,
        }
    }
}

/// # edit report
#[derive(Serialize, PartialEq, Debug, Clone)]
pub struct EditReport {
    pub record: LapRecord,
    pub previous: LapTime,
    pub verification_saved: bool,
}

/// # submission reconciler
/// every write to the lap store goes through here. accepted mutations
/// invalidate the cached boards of the affected tracks.
pub struct Reconciler<'a> {
    store: &'a dyn LapStore,
    cache: &'a dyn LeaderboardCache,
}

impl<'a> Reconciler<'a> {
    pub fn new(store: &'a dyn LapStore, cache: &'a dyn LeaderboardCache) -> Reconciler<'a> {
        Reconciler { store, cache }
    }

    /// # submit a lap
    /// keep the candidate only when it is the first or a faster lap for its
    /// configuration. a write that loses a race against a concurrent one is
    /// decided again against the new state, and reported as a stale write
    /// when it keeps losing.
    ///
    /// ## Arguments
    /// * `candidate` - a validated record, owned by the submitting competitor
    ///
    /// ## Returns
    /// * `WriteReport` - rejections are reports too, only store failures are errors
    pub fn submit(&self, candidate: &LapRecord) -> CustomResult<WriteReport> {
        for attempt in 0..MAX_ATTEMPTS {
            let existing = self.store.find_for_configuration(&candidate.owner, &candidate.track_id, &candidate.vehicle_id)?;
            let outcome = reconcile(candidate, existing.as_ref());

            let written = match (outcome, &existing) {
                (SubmissionOutcome::Inserted, _) => {
                    match with_schema_fallback(candidate, |payload| self.store.insert_record(payload)) {
                        Ok(((), saved)) => Some((candidate.id.clone(), saved)),
                        Err(StoreError::Conflict) => None,
                        Err(error) => return Err(error.into()),
                    }
                }
                (SubmissionOutcome::Replaced { .. }, Some(stored)) => {
                    let mut replacement = candidate.clone();
                    replacement.id = stored.id.clone();
                    match with_schema_fallback(&replacement, |payload| self.store.replace_if_faster(&stored.id, payload))? {
                        (true, saved) => Some((stored.id.clone(), saved)),
                        (false, _) => None,
                    }
                }
                _ => {
                    debug!(target: "modules/reconciler:submit", "rejected {} for {} on {}: {}", candidate.time, candidate.owner, candidate.track_id, RejectReason::SlowerThanPersonalBest);
                    return Ok(WriteReport::new(outcome, candidate, None, false));
                }
            };

            match written {
                Some((record_id, saved)) => {
                    info!(target: "modules/reconciler:submit", "{:?} {} for {} on {} with {}", outcome, candidate.time, candidate.owner, candidate.track_id, candidate.vehicle_id);
                    self.cache.invalidate_track(&candidate.track_id);
                    return Ok(WriteReport::new(outcome, candidate, Some(record_id), saved));
                }
                None => {
                    warn!(target: "modules/reconciler:submit", "write for {} on {} lost a race (attempt {})", candidate.owner, candidate.track_id, attempt + 1);
                }
            }
        }

        let outcome = SubmissionOutcome::Rejected { reason: RejectReason::StaleWrite };
        Ok(WriteReport::new(outcome, candidate, None, false))
    }

    /// # edit a stored lap
    /// correct an existing record by id. no faster-than check, only the
    /// owner may do it. the id, owner and submission time stay, and the
    /// verification state follows the stored one through the changed fields.
    ///
    /// ## Arguments
    /// * `identity` - the competitor asking for the edit
    /// * `id` - the record to correct
    /// * `updated` - the corrected values
    pub fn edit(&self, identity: &Identity, id: &str, updated: &LapRecord) -> CustomResult<EditReport> {
        let stored = self.store.get_record(id)?.context(NotFoundSnafu { id })?;

        ensure!(identity.owns(&stored.owner), NotOwnerSnafu { id, competitor: identity.name.clone() });

        let mut record = updated.clone();
        record.id = stored.id.clone();
        record.owner = stored.owner.clone();
        record.owner_email = stored.owner_email.clone();
        record.timestamp = stored.timestamp;
        record.verification = after_correction(&stored, updated);

        let taken = ConfigurationTakenSnafu {
            owner: record.owner.clone(),
            track_id: record.track_id.clone(),
            vehicle_id: record.vehicle_id.clone(),
        };
        if !stored.same_configuration(&record) {
            let occupant = self.store.find_for_configuration(&record.owner, &record.track_id, &record.vehicle_id)?;
            ensure!(occupant.is_none(), taken.clone());
        }

        let (found, saved) = match with_schema_fallback(&record, |payload| self.store.update_record(id, payload)) {
            Ok(written) => written,
            Err(StoreError::Conflict) => return taken.fail(),
            Err(error) => return Err(error.into()),
        };
        ensure!(found, NotFoundSnafu { id });

        info!(target: "modules/reconciler:edit", "{} corrected {} from {} to {}", identity.name, id, stored.time, record.time);
        self.cache.invalidate_track(&stored.track_id);
        if stored.track_id != record.track_id {
            self.cache.invalidate_track(&record.track_id);
        }

        Ok(EditReport {
            record,
            previous: stored.time,
            verification_saved: saved,
        })
    }

    /// # delete a lap
    /// remove a record by id, allowed for its owner and administrators
    ///
    /// ## Returns
    /// * `LapRecord` - the removed record
    pub fn delete(&self, identity: &Identity, id: &str) -> CustomResult<LapRecord> {
        let stored = self.store.get_record(id)?.context(NotFoundSnafu { id })?;

        ensure!(identity.may_delete(&stored.owner), NotOwnerSnafu { id, competitor: identity.name.clone() });

        let removed = self.store.delete_record(id)?;
        ensure!(removed, NotFoundSnafu { id });

        info!(target: "modules/reconciler:delete", "{} deleted {} of {} on {}", identity.name, id, stored.owner, stored.track_id);
        self.cache.invalidate_track(&stored.track_id);
        Ok(stored)
    }
}
