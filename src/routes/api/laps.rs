use chrono::Utc;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{delete, get, post, put, State};

use crate::modules::models::competitor::Identity;
use crate::modules::models::lap_record::{LapDraft, LapRecord};
use crate::modules::reconciler::{EditReport, WriteReport};
use crate::routes::responses::{ApiError, ApiResult};
use crate::routes::state::AppState;

/// # submit a lap
/// the signed in competitor becomes the owner. a slower lap is answered
/// with a rejection report, not an error.
#[post("/laps", format = "json", data = "<draft>")]
pub fn submit_lap(draft: Json<LapDraft>, identity: Identity, state: &State<AppState>) -> ApiResult<WriteReport> {
    let candidate = LapRecord::new(None, &identity.name, identity.email.as_deref(), draft.into_inner(), Utc::now())?;
    let report = state.reconciler().submit(&candidate)?;
    Ok(Json(report))
}

/// # correct a lap
/// owner only, skips the personal best check
#[put("/laps/<id>", format = "json", data = "<draft>")]
pub fn edit_lap(id: &str, draft: Json<LapDraft>, identity: Identity, state: &State<AppState>) -> ApiResult<EditReport> {
    let updated = LapRecord::new(Some(id.to_string()), &identity.name, identity.email.as_deref(), draft.into_inner(), Utc::now())?;
    let report = state.reconciler().edit(&identity, id, &updated)?;
    Ok(Json(report))
}

#[delete("/laps/<id>")]
pub fn delete_lap(id: &str, identity: Identity, state: &State<AppState>) -> ApiResult<LapRecord> {
    let removed = state.reconciler().delete(&identity, id)?;
    Ok(Json(removed))
}

/// # all laps
/// administrators only, newest first
#[get("/laps")]
pub fn list_laps(identity: Identity, state: &State<AppState>) -> ApiResult<Vec<LapRecord>> {
    if !identity.is_admin {
        return Err(ApiError::new(Status::Forbidden, "only administrators can list every lap"));
    }

    let mut records = state.store.list_records(None)?;
    records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    Ok(Json(records))
}
