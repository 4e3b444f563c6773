/// look up a cached response. evaluates to `Some(value)` on a hit,
/// unreadable entries count as a miss.
macro_rules! read_cache_request {
    ($cache:expr, $key:expr, $target:expr) => {
        match $cache.get(&$key) {
            Some(data) => match serde_json::from_str(&data) {
                Ok(cached) => Some(cached),
                Err(error) => {
                    warn!(target: $target, "Discarding unreadable cache entry {}: {}", $key, error);
                    None
                }
            },
            None => None,
        }
    };
}

/// store a response in the cache under the track generation taken before
/// the response was computed. failures are logged, the request goes on.
macro_rules! cache_response {
    ($cache:expr, $track_id:expr, $key:expr, $data:expr, $generation:expr, $target:expr) => {
        match ($generation, serde_json::to_string(&$data)) {
            (Some(generation), Ok(json)) => $cache.put($track_id, &$key, &json, generation),
            (None, _) => {
                warn!(target: $target, "No generation for {}, not caching {}", $track_id, $key);
            }
            (Some(_), Err(error)) => {
                error!(target: $target, "Error serializing response for {}: {}", $key, error);
            }
        }
    };
}

pub(crate) use cache_response;
pub(crate) use read_cache_request;
