pub mod cache;
pub mod catalog;
pub mod drill_down;
pub mod extraction;
pub mod ranking;
pub mod reconciler;
pub mod redis;
pub mod store;
pub mod verification;
pub mod view;
pub mod visibility;

pub mod models {
    pub mod competitor;
    pub mod general;
    pub mod lap_record;
    pub mod track;
    pub mod vehicle;
}

pub mod helpers {
    pub mod logging;
    pub mod settings;
}
