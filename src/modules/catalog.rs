use std::collections::HashMap;

use serde::Serialize;

use crate::modules::models::track::{Track, TRACKS};
use crate::modules::models::vehicle::{Vehicle, VehicleClass, VEHICLES};

/// # resolved vehicle
/// display metadata for a vehicle id. unknown ids resolve to the raw id
/// and the default class.
#[derive(Serialize, PartialEq, Eq, Debug, Clone)]
pub struct VehicleInfo {
    pub display_name: String,
    pub class: VehicleClass,
    pub known: bool,
}

#[derive(Serialize, PartialEq, Eq, Debug, Clone)]
pub struct TrackInfo {
    pub display_name: String,
    pub country: Option<String>,
    pub length: Option<String>,
    pub known: bool,
}

/// # catalog
/// read-only reference data for vehicles and tracks.
/// records only reference these by id, so every lookup tolerates ids that
/// are not (or no longer) in the tables.
#[derive(Debug, Clone)]
pub struct Catalog {
    vehicles: Vec<Vehicle>,
    tracks: Vec<Track>,
    vehicle_index: HashMap<&'static str, usize>,
    track_index: HashMap<&'static str, usize>,
}

impl Default for Catalog {
    fn default() -> Self {
        Catalog::new(VEHICLES.to_vec(), TRACKS.to_vec())
    }
}

impl Catalog {
    pub fn new(vehicles: Vec<Vehicle>, tracks: Vec<Track>) -> Catalog {
        let vehicle_index = vehicles.iter().enumerate().map(|(i, v)| (v.id, i)).collect();
        let track_index = tracks.iter().enumerate().map(|(i, t)| (t.id, i)).collect();

        Catalog {
            vehicles,
            tracks,
            vehicle_index,
            track_index,
        }
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn find_vehicle(&self, id: &str) -> Option<&Vehicle> {
        self.vehicle_index.get(id).map(|i| &self.vehicles[*i])
    }

    pub fn find_track(&self, id: &str) -> Option<&Track> {
        self.track_index.get(id).map(|i| &self.tracks[*i])
    }

    pub fn has_vehicle(&self, id: &str) -> bool {
        self.vehicle_index.contains_key(id)
    }

    pub fn has_track(&self, id: &str) -> bool {
        self.track_index.contains_key(id)
    }

    /// # resolve a vehicle
    ///
    /// ## Arguments
    /// * `id` - the vehicle id of a record
    ///
    /// ## Returns
    /// * `VehicleInfo` - display name and class, never fails
    pub fn vehicle(&self, id: &str) -> VehicleInfo {
        match self.find_vehicle(id) {
            Some(vehicle) => VehicleInfo {
                display_name: vehicle.display_name(),
                class: vehicle.class,
                known: true,
            },
            None => VehicleInfo {
                display_name: id.to_string(),
                class: VehicleClass::default(),
                known: false,
            },
        }
    }

    pub fn class_of(&self, vehicle_id: &str) -> VehicleClass {
        self.find_vehicle(vehicle_id)
            .map(|v| v.class)
            .unwrap_or_default()
    }

    pub fn track(&self, id: &str) -> TrackInfo {
        match self.find_track(id) {
            Some(track) => TrackInfo {
                display_name: track.name.to_string(),
                country: Some(track.country.to_string()),
                length: Some(track.length()),
                known: true,
            },
            None => TrackInfo {
                display_name: id.to_string(),
                country: None,
                length: None,
                known: false,
            },
        }
    }

    pub fn track_ids(&self) -> Vec<&'static str> {
        self.tracks.iter().map(|t| t.id).collect()
    }

    pub fn vehicle_ids(&self) -> Vec<&'static str> {
        self.vehicles.iter().map(|v| v.id).collect()
    }
}
