use rocket::{catchers, routes, Build, Rocket};

use crate::routes::api::{catalog, extraction, laps, leaderboard};
use crate::routes::responses;
use crate::routes::state::AppState;

/// # build the server
/// every route lives under `/api`
pub fn build_rocket(state: AppState) -> Rocket<Build> {
    rocket::build()
        .manage(state)
        .mount("/api", routes![
            catalog::list_tracks,
            catalog::list_vehicles,
            leaderboard::get_leaderboard,
            leaderboard::get_history,
            laps::submit_lap,
            laps::edit_lap,
            laps::delete_lap,
            laps::list_laps,
            extraction::extract_fields,
        ])
        .register("/", catchers![
            responses::unauthorized,
            responses::not_found,
            responses::unprocessable,
        ])
}
