use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use diesel::pg::{Pg, PgConnection};
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use log::{error, info, warn};

use crate::macros::database::db_handle_error;
use crate::modules::models::general::establish_connection;
use crate::modules::models::lap_record::{LapRecord, LapTime};
use crate::modules::store::{
    BackendSnafu, LapPayload, LapStore, StoreError, StoreResult, VERIFICATION_COLUMN,
};
use crate::modules::verification::VerificationState;
use crate::schema::lap_times;

#[derive(Queryable, Debug)]
struct LapRow {
    id: String,
    username: String,
    user_email: Option<String>,
    track_id: String,
    car_id: String,
    total_milliseconds: i32,
    timestamp: DateTime<Utc>,
    conditions: String,
    track_temp: Option<i32>,
    input_device: Option<String>,
    is_verified: Option<bool>,
}

/// row shape of deployments without the verification column
#[derive(Queryable, Debug)]
struct LegacyLapRow {
    id: String,
    username: String,
    user_email: Option<String>,
    track_id: String,
    car_id: String,
    total_milliseconds: i32,
    timestamp: DateTime<Utc>,
    conditions: String,
    track_temp: Option<i32>,
    input_device: Option<String>,
}

const LEGACY_COLUMNS: (
    lap_times::id,
    lap_times::username,
    lap_times::user_email,
    lap_times::track_id,
    lap_times::car_id,
    lap_times::total_milliseconds,
    lap_times::timestamp,
    lap_times::conditions,
    lap_times::track_temp,
    lap_times::input_device,
) = (
    lap_times::id,
    lap_times::username,
    lap_times::user_email,
    lap_times::track_id,
    lap_times::car_id,
    lap_times::total_milliseconds,
    lap_times::timestamp,
    lap_times::conditions,
    lap_times::track_temp,
    lap_times::input_device,
);

impl From<LegacyLapRow> for LapRow {
    fn from(row: LegacyLapRow) -> Self {
        LapRow {
            id: row.id,
            username: row.username,
            user_email: row.user_email,
            track_id: row.track_id,
            car_id: row.car_id,
            total_milliseconds: row.total_milliseconds,
            timestamp: row.timestamp,
            conditions: row.conditions,
            track_temp: row.track_temp,
            input_device: row.input_device,
            is_verified: None,
        }
    }
}

impl LapRow {
    /// minutes, seconds and milliseconds are rebuilt from the stored total
    fn into_record(self) -> StoreResult<LapRecord> {
        let total = match u32::try_from(self.total_milliseconds) {
            Ok(total) => total,
            Err(_) => {
                return BackendSnafu { message: format!("record {} has a negative lap time", self.id) }.fail();
            }
        };

        let condition = self.conditions.parse().unwrap_or_else(|e| {
            warn!(target: "modules/store/postgres:into_record", "{} (record: {})", e, self.id);
            Default::default()
        });
        let input_device = self.input_device.as_deref().and_then(|d| d.parse().ok());

        Ok(LapRecord {
            id: self.id,
            owner: self.username,
            owner_email: self.user_email,
            track_id: self.track_id,
            vehicle_id: self.car_id,
            time: LapTime::from_total_millis(total),
            condition,
            track_temp: self.track_temp,
            input_device,
            verification: VerificationState::from_flag(self.is_verified),
            timestamp: self.timestamp,
        })
    }
}

#[derive(Insertable)]
#[diesel(table_name = lap_times)]
struct NewLapRow<'a> {
    id: &'a str,
    username: &'a str,
    user_email: Option<&'a str>,
    track_id: &'a str,
    car_id: &'a str,
    total_milliseconds: i32,
    timestamp: DateTime<Utc>,
    conditions: &'a str,
    track_temp: Option<i32>,
    input_device: Option<&'a str>,
    is_verified: Option<bool>,
}

#[derive(Insertable)]
#[diesel(table_name = lap_times)]
struct LegacyNewLapRow<'a> {
    id: &'a str,
    username: &'a str,
    user_email: Option<&'a str>,
    track_id: &'a str,
    car_id: &'a str,
    total_milliseconds: i32,
    timestamp: DateTime<Utc>,
    conditions: &'a str,
    track_temp: Option<i32>,
    input_device: Option<&'a str>,
}

#[derive(AsChangeset)]
#[diesel(table_name = lap_times, treat_none_as_null = true)]
struct LapChangeset<'a> {
    username: &'a str,
    user_email: Option<&'a str>,
    track_id: &'a str,
    car_id: &'a str,
    total_milliseconds: i32,
    timestamp: DateTime<Utc>,
    conditions: &'a str,
    track_temp: Option<i32>,
    input_device: Option<&'a str>,
    is_verified: Option<bool>,
}

#[derive(AsChangeset)]
#[diesel(table_name = lap_times, treat_none_as_null = true)]
struct LegacyLapChangeset<'a> {
    username: &'a str,
    user_email: Option<&'a str>,
    track_id: &'a str,
    car_id: &'a str,
    total_milliseconds: i32,
    timestamp: DateTime<Utc>,
    conditions: &'a str,
    track_temp: Option<i32>,
    input_device: Option<&'a str>,
}

fn total_column(record: &LapRecord) -> StoreResult<i32> {
    match i32::try_from(record.total_millis()) {
        Ok(total) => Ok(total),
        Err(_) => BackendSnafu { message: format!("lap time of record {} is out of range", record.id) }.fail(),
    }
}

impl<'a> NewLapRow<'a> {
    fn from_payload(payload: &LapPayload<'a>) -> StoreResult<NewLapRow<'a>> {
        let record = payload.record;
        Ok(NewLapRow {
            id: &record.id,
            username: &record.owner,
            user_email: record.owner_email.as_deref(),
            track_id: &record.track_id,
            car_id: &record.vehicle_id,
            total_milliseconds: total_column(record)?,
            timestamp: record.timestamp,
            conditions: record.condition.as_str(),
            track_temp: record.track_temp,
            input_device: record.input_device.map(|d| d.as_str()),
            is_verified: payload.is_verified(),
        })
    }

    fn legacy(self) -> LegacyNewLapRow<'a> {
        LegacyNewLapRow {
            id: self.id,
            username: self.username,
            user_email: self.user_email,
            track_id: self.track_id,
            car_id: self.car_id,
            total_milliseconds: self.total_milliseconds,
            timestamp: self.timestamp,
            conditions: self.conditions,
            track_temp: self.track_temp,
            input_device: self.input_device,
        }
    }

    fn changeset(self) -> LapChangeset<'a> {
        LapChangeset {
            username: self.username,
            user_email: self.user_email,
            track_id: self.track_id,
            car_id: self.car_id,
            total_milliseconds: self.total_milliseconds,
            timestamp: self.timestamp,
            conditions: self.conditions,
            track_temp: self.track_temp,
            input_device: self.input_device,
            is_verified: self.is_verified,
        }
    }

    fn legacy_changeset(self) -> LegacyLapChangeset<'a> {
        LegacyLapChangeset {
            username: self.username,
            user_email: self.user_email,
            track_id: self.track_id,
            car_id: self.car_id,
            total_milliseconds: self.total_milliseconds,
            timestamp: self.timestamp,
            conditions: self.conditions,
            track_temp: self.track_temp,
            input_device: self.input_device,
        }
    }
}

/// # classify a database error
/// map diesel errors onto the store taxonomy. a missing verification
/// column is reported as a schema mismatch so the caller can retry without it.
pub fn classify(error: DieselError) -> StoreError {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            let message = info.message().to_string();
            if matches!(kind, DatabaseErrorKind::UniqueViolation) {
                StoreError::Conflict
            } else if message.contains(VERIFICATION_COLUMN) && message.contains("does not exist") {
                StoreError::SchemaMismatch { column: VERIFICATION_COLUMN.to_string() }
            } else if message.contains("row-level security") || message.contains("permission denied") {
                StoreError::PermissionDenied { message }
            } else {
                StoreError::Backend { message }
            }
        }
        _ => StoreError::Backend { message: error.to_string() },
    }
}

enum RowFilter<'a> {
    Track(Option<&'a str>),
    Id(&'a str),
    Configuration {
        owner: &'a str,
        track_id: &'a str,
        vehicle_id: &'a str,
    },
}

fn filtered<'a>(filter: &RowFilter<'a>) -> lap_times::BoxedQuery<'a, Pg> {
    let mut query = lap_times::table.into_boxed();
    match *filter {
        RowFilter::Track(Some(track)) => {
            query = query.filter(lap_times::track_id.eq(track));
        }
        RowFilter::Track(None) => {}
        RowFilter::Id(id) => {
            query = query.filter(lap_times::id.eq(id));
        }
        RowFilter::Configuration { owner, track_id, vehicle_id } => {
            query = query
                .filter(lap_times::username.eq(owner))
                .filter(lap_times::track_id.eq(track_id))
                .filter(lap_times::car_id.eq(vehicle_id));
        }
    }
    query.order(lap_times::total_milliseconds.asc())
}

/// # postgres store
/// diesel backed store. opens a connection per operation.
pub struct PgLapStore {
    database_url: String,
    legacy_schema: AtomicBool,
}

impl PgLapStore {
    pub fn new(database_url: &str) -> PgLapStore {
        PgLapStore {
            database_url: database_url.to_string(),
            legacy_schema: AtomicBool::new(false),
        }
    }

    fn connect(&self) -> StoreResult<PgConnection> {
        establish_connection(&self.database_url)
    }

    /// read rows, dropping the verification column once the store turned
    /// out not to have it
    fn load(&self, filter: RowFilter) -> StoreResult<Vec<LapRecord>> {
        let conn = &mut self.connect()?;

        let rows: Vec<LapRow> = if self.legacy_schema.load(Ordering::Relaxed) {
            self.load_legacy(conn, &filter)?
        } else {
            match filtered(&filter).load::<LapRow>(conn) {
                Ok(rows) => rows,
                Err(error) => match classify(error) {
                    StoreError::SchemaMismatch { .. } => {
                        info!(target: "modules/store/postgres:load", "store has no {} column, reading without it", VERIFICATION_COLUMN);
                        self.legacy_schema.store(true, Ordering::Relaxed);
                        self.load_legacy(conn, &filter)?
                    }
                    other => {
                        error!(target: "modules/store/postgres:load", "Error loading lap times: {}", other);
                        return Err(other);
                    }
                },
            }
        };

        rows.into_iter().map(LapRow::into_record).collect()
    }

    fn load_legacy(&self, conn: &mut PgConnection, filter: &RowFilter) -> StoreResult<Vec<LapRow>> {
        let rows: StoreResult<Vec<LegacyLapRow>> = db_handle_error!(
            filtered(filter).select(LEGACY_COLUMNS).load::<LegacyLapRow>(conn),
            "modules/store/postgres:load_legacy",
            "loading lap times"
        );
        Ok(rows?.into_iter().map(LapRow::from).collect())
    }
}

impl LapStore for PgLapStore {
    fn list_records(&self, track_id: Option<&str>) -> StoreResult<Vec<LapRecord>> {
        self.load(RowFilter::Track(track_id))
    }

    fn get_record(&self, id: &str) -> StoreResult<Option<LapRecord>> {
        Ok(self.load(RowFilter::Id(id))?.pop())
    }

    fn find_for_configuration(
        &self,
        owner: &str,
        track_id: &str,
        vehicle_id: &str,
    ) -> StoreResult<Option<LapRecord>> {
        let mut found = self.load(RowFilter::Configuration { owner, track_id, vehicle_id })?;
        Ok(if found.is_empty() { None } else { Some(found.remove(0)) })
    }

    fn insert_record(&self, payload: LapPayload) -> StoreResult<()> {
        let conn = &mut self.connect()?;
        let row = NewLapRow::from_payload(&payload)?;

        let result = if payload.with_verification {
            diesel::insert_into(lap_times::table).values(&row).execute(conn)
        } else {
            diesel::insert_into(lap_times::table).values(&row.legacy()).execute(conn)
        };

        let inserted = db_handle_error!(result, "modules/store/postgres:insert_record", format!("inserting lap time {}", payload.record.id));
        inserted.map(|_| ())
    }

    fn update_record(&self, id: &str, payload: LapPayload) -> StoreResult<bool> {
        let conn = &mut self.connect()?;
        let row = NewLapRow::from_payload(&payload)?;
        let target = lap_times::table.filter(lap_times::id.eq(id));

        let result = if payload.with_verification {
            diesel::update(target).set(&row.changeset()).execute(conn)
        } else {
            diesel::update(target).set(&row.legacy_changeset()).execute(conn)
        };

        let rows: StoreResult<usize> = db_handle_error!(result, "modules/store/postgres:update_record", format!("updating lap time {}", id));
        rows.map(|rows| rows > 0)
    }

    fn replace_if_faster(&self, id: &str, payload: LapPayload) -> StoreResult<bool> {
        let conn = &mut self.connect()?;
        let row = NewLapRow::from_payload(&payload)?;
        let candidate_total = row.total_milliseconds;

        // the total guard makes the check and the write one statement
        let target = lap_times::table
            .filter(lap_times::id.eq(id))
            .filter(lap_times::total_milliseconds.gt(candidate_total));

        let result = if payload.with_verification {
            diesel::update(target).set(&row.changeset()).execute(conn)
        } else {
            diesel::update(target).set(&row.legacy_changeset()).execute(conn)
        };

        let rows: StoreResult<usize> = db_handle_error!(result, "modules/store/postgres:replace_if_faster", format!("replacing lap time {}", id));
        rows.map(|rows| rows > 0)
    }

    fn delete_record(&self, id: &str) -> StoreResult<bool> {
        let conn = &mut self.connect()?;
        let result = diesel::delete(lap_times::table.filter(lap_times::id.eq(id))).execute(conn);
        let rows: StoreResult<usize> = db_handle_error!(result, "modules/store/postgres:delete_record", format!("deleting lap time {}", id));
        rows.map(|rows| rows > 0)
    }
}
