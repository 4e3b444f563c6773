use rocket::serde::json::Json;
use rocket::{get, State};
use serde::Serialize;

use crate::errors::ValidationSnafu;
use crate::modules::catalog::{TrackInfo, VehicleInfo};
use crate::modules::ranking::ClassFilter;
use crate::routes::responses::{ApiError, ApiResult};
use crate::routes::state::AppState;

#[derive(Serialize, Debug)]
pub struct TrackItem {
    pub id: &'static str,
    #[serde(flatten)]
    pub info: TrackInfo,
}

#[derive(Serialize, Debug)]
pub struct VehicleItem {
    pub id: &'static str,
    pub brand: &'static str,
    #[serde(flatten)]
    pub info: VehicleInfo,
}

#[get("/tracks")]
pub fn list_tracks(state: &State<AppState>) -> Json<Vec<TrackItem>> {
    let tracks = state
        .catalog
        .tracks()
        .iter()
        .map(|track| TrackItem {
            id: track.id,
            info: state.catalog.track(track.id),
        })
        .collect();

    Json(tracks)
}

/// vehicles of one class, or all of them
#[get("/vehicles?<class>")]
pub fn list_vehicles(class: Option<&str>, state: &State<AppState>) -> ApiResult<Vec<VehicleItem>> {
    let filter = parse_class(class)?;

    let vehicles = state
        .catalog
        .vehicles()
        .iter()
        .filter(|vehicle| filter.matches(vehicle.class))
        .map(|vehicle| VehicleItem {
            id: vehicle.id,
            brand: vehicle.brand,
            info: state.catalog.vehicle(vehicle.id),
        })
        .collect();

    Ok(Json(vehicles))
}

pub fn parse_class(class: Option<&str>) -> Result<ClassFilter, ApiError> {
    match class {
        None => Ok(ClassFilter::All),
        Some(text) => text
            .parse::<ClassFilter>()
            .map_err(|message| ApiError::from(ValidationSnafu { field: "class", message }.build())),
    }
}
