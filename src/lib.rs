pub mod errors;
pub mod schema;
pub mod modules;

pub(crate) mod macros {
    pub mod database;
    pub mod redis;
    pub mod request_caching;
}

pub mod routes {
    pub mod guards;
    pub mod responses;
    pub mod server;
    pub mod state;

    pub mod api {
        pub mod catalog;
        pub mod extraction;
        pub mod laps;
        pub mod leaderboard;
    }
}
