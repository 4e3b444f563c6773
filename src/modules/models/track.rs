use serde::Serialize;

#[derive(Serialize, PartialEq, Eq, Debug, Clone)]
pub struct Track {
    pub id: &'static str,
    pub name: &'static str,
    pub country: &'static str,
    /// length of one lap in meters
    pub length_m: u32,
}

impl Track {
    /// # formatted length
    /// the lap length in kilometers with meter precision, e.g. `5.793 km`
    pub fn length(&self) -> String {
        format!("{}.{:03} km", self.length_m / 1000, self.length_m % 1000)
    }
}

const fn track(id: &'static str, name: &'static str, country: &'static str, length_m: u32) -> Track {
    Track { id, name, country, length_m }
}

pub const TRACKS: &[Track] = &[
    track("monza", "Monza Circuit", "Italy", 5793),
    track("zolder", "Zolder", "Belgium", 4011),
    track("brands_hatch", "Brands Hatch", "UK", 3916),
    track("silverstone", "Silverstone", "UK", 5891),
    track("paul_ricard", "Paul Ricard", "France", 5771),
    track("misano", "Misano World Circuit", "Italy", 4226),
    track("zandvoort", "Zandvoort", "Netherlands", 4259),
    track("spa", "Spa-Francorchamps", "Belgium", 7004),
    track("nurburgring", "Nürburgring", "Germany", 5148),
    track("hungaroring", "Hungaroring", "Hungary", 4381),
    track("barcelona", "Barcelona", "Spain", 4655),
    track("imola", "Imola", "Italy", 4909),
    track("mount_panorama", "Mount Panorama", "Australia", 6213),
    track("laguna_seca", "Laguna Seca", "USA", 3602),
    track("suzuka", "Suzuka", "Japan", 5807),
    track("kyalami", "Kyalami", "South Africa", 4522),
    track("oulton_park", "Oulton Park", "UK", 4307),
    track("snetterton", "Snetterton", "UK", 4779),
    track("donington", "Donington Park", "UK", 4020),
    track("valencia", "Valencia", "Spain", 4005),
    track("cota", "COTA", "USA", 5513),
    track("watkins_glen", "Watkins Glen", "USA", 5430),
    track("indianapolis", "Indianapolis", "USA", 3925),
    track("red_bull_ring", "Red Bull Ring", "Austria", 4318),
    track("nurburgring_24h", "Nürburgring 24h", "Germany", 25378),
];
