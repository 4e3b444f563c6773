use std::sync::{Mutex, MutexGuard};

use log::error;

use crate::modules::models::lap_record::LapRecord;
use crate::modules::store::{
    BackendSnafu, ConflictSnafu, LapPayload, LapStore, SchemaMismatchSnafu, StoreResult,
    VERIFICATION_COLUMN,
};
use crate::modules::verification::VerificationState;

/// # in-memory store
/// process local store with the same semantics as the database store.
/// used when no database is configured and in tests.
#[derive(Debug, Default)]
pub struct MemoryLapStore {
    records: Mutex<Vec<LapRecord>>,
    legacy_schema: bool,
}

impl MemoryLapStore {
    pub fn new() -> MemoryLapStore {
        MemoryLapStore::default()
    }

    /// a store that behaves like a deployment without the verification column
    pub fn legacy() -> MemoryLapStore {
        MemoryLapStore {
            records: Mutex::new(Vec::new()),
            legacy_schema: true,
        }
    }

    pub fn with_records(records: Vec<LapRecord>) -> MemoryLapStore {
        MemoryLapStore {
            records: Mutex::new(records),
            legacy_schema: false,
        }
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Vec<LapRecord>>> {
        match self.records.lock() {
            Ok(guard) => Ok(guard),
            Err(poisoned) => {
                error!(target: "modules/store/memory:lock", "record lock poisoned: {}", poisoned);
                BackendSnafu { message: "record lock poisoned" }.fail()
            }
        }
    }

    fn stored_form(&self, payload: LapPayload) -> StoreResult<LapRecord> {
        if self.legacy_schema && payload.with_verification {
            return SchemaMismatchSnafu { column: VERIFICATION_COLUMN }.fail();
        }

        let mut record = payload.record.clone();
        record.verification = VerificationState::from_flag(payload.is_verified());
        Ok(record)
    }
}

impl LapStore for MemoryLapStore {
    fn list_records(&self, track_id: Option<&str>) -> StoreResult<Vec<LapRecord>> {
        let records = self.lock()?;
        let mut found: Vec<LapRecord> = records
            .iter()
            .filter(|r| track_id.map(|t| r.track_id == t).unwrap_or(true))
            .cloned()
            .collect();
        found.sort_by_key(|r| r.time);
        Ok(found)
    }

    fn get_record(&self, id: &str) -> StoreResult<Option<LapRecord>> {
        Ok(self.lock()?.iter().find(|r| r.id == id).cloned())
    }

    fn find_for_configuration(
        &self,
        owner: &str,
        track_id: &str,
        vehicle_id: &str,
    ) -> StoreResult<Option<LapRecord>> {
        Ok(self
            .lock()?
            .iter()
            .find(|r| r.owner == owner && r.track_id == track_id && r.vehicle_id == vehicle_id)
            .cloned())
    }

    fn insert_record(&self, payload: LapPayload) -> StoreResult<()> {
        let record = self.stored_form(payload)?;
        let mut records = self.lock()?;

        if records.iter().any(|r| r.id == record.id || r.same_configuration(&record)) {
            return ConflictSnafu.fail();
        }
        records.push(record);
        Ok(())
    }

    /// fails with `Conflict` when another record already holds the target configuration
    fn update_record(&self, id: &str, payload: LapPayload) -> StoreResult<bool> {
        let mut record = self.stored_form(payload)?;
        let mut records = self.lock()?;

        if records.iter().any(|r| r.id != id && r.same_configuration(&record)) {
            return ConflictSnafu.fail();
        }

        match records.iter_mut().find(|r| r.id == id) {
            Some(stored) => {
                record.id = stored.id.clone();
                *stored = record;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn replace_if_faster(&self, id: &str, payload: LapPayload) -> StoreResult<bool> {
        let mut record = self.stored_form(payload)?;
        let mut records = self.lock()?;

        match records.iter_mut().find(|r| r.id == id) {
            Some(stored) if stored.time > record.time => {
                record.id = stored.id.clone();
                *stored = record;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn delete_record(&self, id: &str) -> StoreResult<bool> {
        let mut records = self.lock()?;
        let before = records.len();
        records.retain(|r| r.id != id);
        Ok(records.len() != before)
    }
}
