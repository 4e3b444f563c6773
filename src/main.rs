use std::error::Error;

use log::{info, warn};

use lap_leaderboard::modules::cache::{LeaderboardCache, MemoryLeaderboardCache, RedisLeaderboardCache};
use lap_leaderboard::modules::helpers::logging::setup_logging;
use lap_leaderboard::modules::helpers::settings::Settings;
use lap_leaderboard::modules::store::memory::MemoryLapStore;
use lap_leaderboard::modules::store::postgres::PgLapStore;
use lap_leaderboard::modules::store::LapStore;
use lap_leaderboard::routes::server::build_rocket;
use lap_leaderboard::routes::state::AppState;

#[rocket::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let settings = Settings::from_env()?;
    setup_logging(&settings.logging_level, &settings.log_file)?;

    let store: Box<dyn LapStore> = match settings.database_url.as_deref() {
        Some(url) => Box::new(PgLapStore::new(url)),
        None => {
            warn!(target: "main", "DATABASE_URL not set, laps are kept in memory only");
            Box::new(MemoryLapStore::new())
        }
    };

    let cache: Box<dyn LeaderboardCache> = match settings.redis_url.as_deref() {
        Some(url) => Box::new(RedisLeaderboardCache::new(url)),
        None => {
            info!(target: "main", "REDIS_URL not set, caching leaderboards in memory");
            Box::new(MemoryLeaderboardCache::new())
        }
    };

    if settings.extraction_url.is_none() {
        info!(target: "main", "EXTRACTION_URL not set, screenshot extraction is disabled");
    }

    let _ = build_rocket(AppState::new(store, cache, settings)).launch().await?;
    Ok(())
}
