use log::{error, warn};
use rocket::serde::json::Json;
use rocket::{get, State};
use serde::Serialize;

use crate::macros::request_caching::{cache_response, read_cache_request};
use crate::modules::cache::{history_key, leaderboard_key};
use crate::modules::catalog::TrackInfo;
use crate::modules::drill_down::{history, History};
use crate::modules::models::competitor::Identity;
use crate::modules::ranking::{rank, Leaderboard};
use crate::routes::api::catalog::parse_class;
use crate::routes::responses::ApiResult;
use crate::routes::state::AppState;

#[derive(Serialize, Debug)]
pub struct LeaderboardResponse {
    pub track: TrackInfo,
    pub leaderboard: Leaderboard,
    /// rank of the signed in competitor, if ranked
    pub viewer_rank: Option<usize>,
}

#[derive(Serialize, Debug)]
pub struct HistoryResponse {
    pub track: TrackInfo,
    pub history: History,
}

/// # leaderboard of a track
/// boards of catalog tracks are cached per track and class without a
/// viewer, the viewer's row is marked per request
#[get("/tracks/<track_id>/leaderboard?<class>")]
pub fn get_leaderboard(
    track_id: &str,
    class: Option<&str>,
    viewer: Option<Identity>,
    state: &State<AppState>,
) -> ApiResult<LeaderboardResponse> {
    let class_filter = parse_class(class)?;
    let key = leaderboard_key(track_id, class_filter);

    let cached: Option<Leaderboard> = read_cache_request!(state.cache, key, "routes/api/leaderboard:get_leaderboard");
    let mut board = match cached {
        Some(board) => board,
        None => {
            let generation = state.cache.generation(track_id);
            let records = state.store.list_records(Some(track_id))?;
            let board = rank(&records, class_filter, &state.catalog, None);
            if state.catalog.has_track(track_id) {
                cache_response!(state.cache, track_id, key, board, generation, "routes/api/leaderboard:get_leaderboard");
            }
            board
        }
    };

    board.mark_viewer(viewer.as_ref());
    let viewer_rank = board.viewer_entry().map(|entry| entry.rank);

    Ok(Json(LeaderboardResponse {
        track: state.catalog.track(track_id),
        leaderboard: board,
        viewer_rank,
    }))
}

/// # drill-down of a competitor
/// only histories with at least one lap are cached
#[get("/tracks/<track_id>/drivers/<owner>")]
pub fn get_history(track_id: &str, owner: &str, state: &State<AppState>) -> ApiResult<HistoryResponse> {
    let key = history_key(track_id, owner);

    let cached: Option<History> = read_cache_request!(state.cache, key, "routes/api/leaderboard:get_history");
    let garage = match cached {
        Some(garage) => garage,
        None => {
            let generation = state.cache.generation(track_id);
            let records = state.store.list_records(Some(track_id))?;
            let garage = history(&records, owner, track_id, &state.catalog);
            if state.catalog.has_track(track_id) && !garage.is_empty() {
                cache_response!(state.cache, track_id, key, garage, generation, "routes/api/leaderboard:get_history");
            }
            garage
        }
    };

    Ok(Json(HistoryResponse {
        track: state.catalog.track(track_id),
        history: garage,
    }))
}
