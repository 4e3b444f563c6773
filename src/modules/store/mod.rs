use log::warn;
use snafu::prelude::*;

use crate::modules::models::lap_record::LapRecord;

pub mod memory;
pub mod postgres;

/// the optional column some store deployments do not have
pub const VERIFICATION_COLUMN: &str = "is_verified";

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum StoreError {
    #[snafu(display("column {column} is not supported by this store"))]
    SchemaMismatch { column: String },

    #[snafu(display("a conflicting record was written concurrently"))]
    Conflict,

    #[snafu(display("permission denied: {message}"))]
    PermissionDenied { message: String },

    #[snafu(display("could not connect to the store: {message}"))]
    Connection { message: String },

    #[snafu(display("{message}"))]
    Backend { message: String },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// # write payload
/// a record as it is written, with or without the optional verification column
#[derive(Debug, Clone, Copy)]
pub struct LapPayload<'a> {
    pub record: &'a LapRecord,
    pub with_verification: bool,
}

impl<'a> LapPayload<'a> {
    pub fn full(record: &'a LapRecord) -> LapPayload<'a> {
        LapPayload { record, with_verification: true }
    }

    pub fn without_verification(record: &'a LapRecord) -> LapPayload<'a> {
        LapPayload { record, with_verification: false }
    }

    pub fn is_verified(&self) -> Option<bool> {
        if self.with_verification {
            Some(self.record.verification.as_flag())
        } else {
            None
        }
    }
}

/// # lap store
/// the persistent record store. every write either fully happens or
/// returns an error, nothing is partially applied.
pub trait LapStore: Send + Sync {
    /// records of one track, or all, ordered by ascending total
    fn list_records(&self, track_id: Option<&str>) -> StoreResult<Vec<LapRecord>>;

    fn get_record(&self, id: &str) -> StoreResult<Option<LapRecord>>;

    fn find_for_configuration(
        &self,
        owner: &str,
        track_id: &str,
        vehicle_id: &str,
    ) -> StoreResult<Option<LapRecord>>;

    /// fails with `Conflict` when the configuration already has a record
    fn insert_record(&self, payload: LapPayload) -> StoreResult<()>;

    /// overwrite by id, returns false when the id does not exist. fails with
    /// `Conflict` when another record holds the target configuration
    fn update_record(&self, id: &str, payload: LapPayload) -> StoreResult<bool>;

    /// # guarded replace
    /// overwrite by id only while the stored total is strictly greater than
    /// the payload's total. the check and the write happen atomically.
    /// returns false when the guard did not hold.
    fn replace_if_faster(&self, id: &str, payload: LapPayload) -> StoreResult<bool>;

    fn delete_record(&self, id: &str) -> StoreResult<bool>;
}

/// # write with schema fallback
/// run a write with the verification column, and when the store does not
/// know that column run it once more without it.
///
/// ## Returns
/// * `(T, bool)` - the write result, and whether the verification state was saved
pub fn with_schema_fallback<T>(
    record: &LapRecord,
    mut write: impl FnMut(LapPayload) -> StoreResult<T>,
) -> StoreResult<(T, bool)> {
    match write(LapPayload::full(record)) {
        Ok(value) => Ok((value, true)),
        Err(StoreError::SchemaMismatch { column }) => {
            warn!(target: "modules/store:with_schema_fallback", "store does not support column {}, retrying without it. (record: {})", column, record.id);
            let value = write(LapPayload::without_verification(record))?;
            Ok((value, false))
        }
        Err(error) => Err(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::models::lap_record::tests::lap;

    #[test]
    fn falls_back_once_on_schema_mismatch() {
        let record = lap("alice", "monza", "bmw_m4_gt3", 106_000);
        let mut attempts = Vec::new();

        let result = with_schema_fallback(&record, |payload| {
            attempts.push(payload.with_verification);
            if payload.with_verification {
                SchemaMismatchSnafu { column: VERIFICATION_COLUMN }.fail()
            } else {
                Ok(7)
            }
        });

        assert_eq!(result.unwrap(), (7, false));
        assert_eq!(attempts, vec![true, false]);
    }

    #[test]
    fn other_errors_are_not_retried() {
        let record = lap("alice", "monza", "bmw_m4_gt3", 106_000);
        let mut attempts = 0;

        let result: StoreResult<((), bool)> = with_schema_fallback(&record, |_| {
            attempts += 1;
            PermissionDeniedSnafu { message: "row-level security" }.fail()
        });

        assert!(matches!(result, Err(StoreError::PermissionDenied { .. })));
        assert_eq!(attempts, 1);
    }

    #[test]
    fn second_failure_is_surfaced() {
        let record = lap("alice", "monza", "bmw_m4_gt3", 106_000);
        let result: StoreResult<((), bool)> = with_schema_fallback(&record, |payload| {
            if payload.with_verification {
                SchemaMismatchSnafu { column: VERIFICATION_COLUMN }.fail()
            } else {
                BackendSnafu { message: "disk full" }.fail()
            }
        });
        assert_eq!(result.unwrap_err().to_string(), "disk full");
    }
}
