use std::collections::HashMap;
use std::sync::Mutex;

use log::{debug, error};

use crate::macros::redis::delete_keys;
use crate::modules::ranking::ClassFilter;
use crate::modules::redis::Redis;

/// # leaderboard cache
/// serialized responses keyed per track. a failing cache only costs a
/// recomputation, so none of these operations report errors.
///
/// every track has a generation that `invalidate_track` bumps. a reader
/// takes the generation before it reads the store and hands it to `put`,
/// which drops the response when the track was invalidated in between.
pub trait LeaderboardCache: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    /// current generation of `track_id`, `None` when it cannot be read
    fn generation(&self, track_id: &str) -> Option<u64>;

    /// store `json` unless `track_id` moved past `generation`
    fn put(&self, track_id: &str, key: &str, json: &str, generation: u64);

    /// drop every cached response that belongs to `track_id`
    fn invalidate_track(&self, track_id: &str);
}

fn track_prefix(track_id: &str) -> String {
    format!("leaderboard:{}:", track_id)
}

fn generation_key(track_id: &str) -> String {
    format!("leaderboard-generation:{}", track_id)
}

pub fn leaderboard_key(track_id: &str, class_filter: ClassFilter) -> String {
    format!("{}{}", track_prefix(track_id), class_filter)
}

pub fn history_key(track_id: &str, owner: &str) -> String {
    format!("{}driver:{}", track_prefix(track_id), owner)
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<String, String>,
    generations: HashMap<String, u64>,
}

impl CacheState {
    fn generation(&self, track_id: &str) -> u64 {
        self.generations.get(track_id).copied().unwrap_or(0)
    }
}

#[derive(Debug, Default)]
pub struct MemoryLeaderboardCache {
    state: Mutex<CacheState>,
}

impl MemoryLeaderboardCache {
    pub fn new() -> MemoryLeaderboardCache {
        MemoryLeaderboardCache::default()
    }

    pub fn len(&self) -> usize {
        self.state.lock().map(|s| s.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LeaderboardCache for MemoryLeaderboardCache {
    fn get(&self, key: &str) -> Option<String> {
        match self.state.lock() {
            Ok(state) => state.entries.get(key).cloned(),
            Err(error) => {
                error!(target: "modules/cache:get", "cache lock poisoned: {}", error);
                None
            }
        }
    }

    fn generation(&self, track_id: &str) -> Option<u64> {
        match self.state.lock() {
            Ok(state) => Some(state.generation(track_id)),
            Err(error) => {
                error!(target: "modules/cache:generation", "cache lock poisoned: {}", error);
                None
            }
        }
    }

    fn put(&self, track_id: &str, key: &str, json: &str, generation: u64) {
        match self.state.lock() {
            Ok(mut state) => {
                if state.generation(track_id) != generation {
                    debug!(target: "modules/cache:put", "dropping {}, {} was invalidated while it was computed", key, track_id);
                    return;
                }
                state.entries.insert(key.to_string(), json.to_string());
            }
            Err(error) => {
                error!(target: "modules/cache:put", "cache lock poisoned: {}", error);
            }
        }
    }

    fn invalidate_track(&self, track_id: &str) {
        let prefix = track_prefix(track_id);
        match self.state.lock() {
            Ok(mut state) => {
                *state.generations.entry(track_id.to_string()).or_insert(0) += 1;
                state.entries.retain(|key, _| !key.starts_with(&prefix));
            }
            Err(error) => {
                error!(target: "modules/cache:invalidate_track", "cache lock poisoned: {}", error);
            }
        }
    }
}

/// # redis cache
/// connects per operation.
pub struct RedisLeaderboardCache {
    redis_url: String,
}

impl RedisLeaderboardCache {
    pub fn new(redis_url: &str) -> RedisLeaderboardCache {
        RedisLeaderboardCache {
            redis_url: redis_url.to_string(),
        }
    }
}

impl LeaderboardCache for RedisLeaderboardCache {
    fn get(&self, key: &str) -> Option<String> {
        let conn = &mut match Redis::connect(&self.redis_url) {
            Ok(conn) => conn,
            Err(error) => {
                error!(target: "modules/cache:get", "Error connecting to redis: {}", error);
                return None;
            }
        };

        match Redis::get_data::<&str, String>(conn, key) {
            Ok(data) => data,
            Err(error) => {
                error!(target: "modules/cache:get", "Error reading key {}: {}", key, error);
                None
            }
        }
    }

    fn generation(&self, track_id: &str) -> Option<u64> {
        let conn = &mut match Redis::connect(&self.redis_url) {
            Ok(conn) => conn,
            Err(error) => {
                error!(target: "modules/cache:generation", "Error connecting to redis: {}", error);
                return None;
            }
        };

        match Redis::get_data::<String, u64>(conn, generation_key(track_id)) {
            Ok(generation) => Some(generation.unwrap_or(0)),
            Err(error) => {
                error!(target: "modules/cache:generation", "Error reading generation of {}: {}", track_id, error);
                None
            }
        }
    }

    fn put(&self, track_id: &str, key: &str, json: &str, generation: u64) {
        let conn = &mut match Redis::connect(&self.redis_url) {
            Ok(conn) => conn,
            Err(error) => {
                error!(target: "modules/cache:put", "Error connecting to redis: {}", error);
                return;
            }
        };

        match Redis::set_if_unchanged(conn, &generation_key(track_id), generation, key, json) {
            Ok(true) => {}
            Ok(false) => {
                debug!(target: "modules/cache:put", "dropping {}, {} was invalidated while it was computed", key, track_id);
            }
            Err(error) => {
                error!(target: "modules/cache:put", "Error writing key {}: {}", key, error);
            }
        }
    }

    fn invalidate_track(&self, track_id: &str) {
        let conn = &mut match Redis::connect(&self.redis_url) {
            Ok(conn) => conn,
            Err(error) => {
                error!(target: "modules/cache:invalidate_track", "Error connecting to redis: {}", error);
                return;
            }
        };

        if let Err(error) = Redis::increment(conn, generation_key(track_id)) {
            error!(target: "modules/cache:invalidate_track", "Error bumping generation of {}: {}", track_id, error);
        }

        let keys = match Redis::keys(conn, format!("{}*", track_prefix(track_id))) {
            Ok(keys) => keys,
            Err(error) => {
                error!(target: "modules/cache:invalidate_track", "Error listing keys of {}: {}", track_id, error);
                return;
            }
        };

        debug!(target: "modules/cache:invalidate_track", "dropping {} cached responses of {}", keys.len(), track_id);
        delete_keys!(conn, keys, "modules/cache:invalidate_track");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::models::vehicle::VehicleClass;

    #[test]
    fn keys_are_scoped_per_track() {
        assert_eq!(leaderboard_key("monza", ClassFilter::All), "leaderboard:monza:ALL");
        assert_eq!(leaderboard_key("spa", ClassFilter::Only(VehicleClass::GT4)), "leaderboard:spa:GT4");
        assert_eq!(history_key("spa", "alice"), "leaderboard:spa:driver:alice");
    }

    #[test]
    fn invalidation_only_touches_one_track() {
        let cache = MemoryLeaderboardCache::new();
        cache.put("monza", &leaderboard_key("monza", ClassFilter::All), "[]", 0);
        cache.put("monza", &history_key("monza", "alice"), "[]", 0);
        cache.put("monza_junior", &leaderboard_key("monza_junior", ClassFilter::All), "[]", 0);

        cache.invalidate_track("monza");

        assert_eq!(cache.get(&leaderboard_key("monza", ClassFilter::All)), None);
        assert_eq!(cache.get(&history_key("monza", "alice")), None);
        assert_eq!(cache.get(&leaderboard_key("monza_junior", ClassFilter::All)), Some("[]".to_string()));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn board_computed_before_an_invalidation_is_not_stored() {
        let cache = MemoryLeaderboardCache::new();
        let key = leaderboard_key("monza", ClassFilter::All);

        let before = cache.generation("monza").unwrap();
        cache.invalidate_track("monza");
        cache.put("monza", &key, "stale", before);
        assert_eq!(cache.get(&key), None);

        let current = cache.generation("monza").unwrap();
        assert_eq!(current, before + 1);
        cache.put("monza", &key, "fresh", current);
        assert_eq!(cache.get(&key), Some("fresh".to_string()));
    }

    #[test]
    fn generations_are_per_track() {
        let cache = MemoryLeaderboardCache::new();
        let spa = cache.generation("spa").unwrap();
        cache.invalidate_track("monza");

        cache.put("spa", &leaderboard_key("spa", ClassFilter::All), "[]", spa);
        assert_eq!(cache.len(), 1);
    }
}
