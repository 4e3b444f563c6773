use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// # vehicle class
/// the competition class a vehicle races in. leaderboards are filtered on this.
#[derive(Serialize, Deserialize, PartialEq, Eq, Hash, Debug, Clone, Copy, Default)]
pub enum VehicleClass {
    #[default]
    GT3,
    GT4,
    GT2,
    CUP,
    TCX,
    GTC,
}

impl VehicleClass {
    pub const ALL: [VehicleClass; 6] = [
        VehicleClass::GT3,
        VehicleClass::GT4,
        VehicleClass::GT2,
        VehicleClass::CUP,
        VehicleClass::TCX,
        VehicleClass::GTC,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleClass::GT3 => "GT3",
            VehicleClass::GT4 => "GT4",
            VehicleClass::GT2 => "GT2",
            VehicleClass::CUP => "CUP",
            VehicleClass::TCX => "TCX",
            VehicleClass::GTC => "GTC",
        }
    }
}

impl fmt::Display for VehicleClass {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for VehicleClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VehicleClass::ALL
            .iter()
            .find(|class| class.as_str().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| format!("unknown vehicle class `{}`", s))
    }
}

#[derive(Serialize, PartialEq, Eq, Debug, Clone)]
pub struct Vehicle {
    pub id: &'static str,
    pub name: &'static str,
    pub brand: &'static str,
    pub class: VehicleClass,
}

impl Vehicle {
    /// # display name
    /// the name shown in the leaderboard, the brand followed by the model
    pub fn display_name(&self) -> String {
        format!("{} {}", self.brand, self.name)
    }
}

const fn vehicle(
    id: &'static str,
    name: &'static str,
    class: VehicleClass,
    brand: &'static str,
) -> Vehicle {
    Vehicle { id, name, brand, class }
}

use VehicleClass::*;

pub const VEHICLES: &[Vehicle] = &[
    // GT3, current generation
    vehicle("amr_v8_vantage_gt3", "V8 Vantage GT3 (2019)", GT3, "Aston Martin"),
    vehicle("audi_r8_lms_evo_ii", "R8 LMS Evo II (2022)", GT3, "Audi"),
    vehicle("bmw_m4_gt3", "M4 GT3 (2022)", GT3, "BMW"),
    vehicle("ferrari_296_gt3", "296 GT3 (2023)", GT3, "Ferrari"),
    vehicle("ford_mustang_gt3", "Mustang GT3 (2024)", GT3, "Ford"),
    vehicle("honda_nsx_gt3_evo", "NSX GT3 Evo (2019)", GT3, "Honda"),
    vehicle("lamborghini_huracan_gt3_evo2", "Huracan GT3 Evo2 (2023)", GT3, "Lamborghini"),
    vehicle("mclaren_720s_gt3_evo", "720S GT3 Evo (2023)", GT3, "McLaren"),
    vehicle("mercedes_amg_gt3_evo", "AMG GT3 Evo (2020)", GT3, "Mercedes-AMG"),
    vehicle("porsche_992_gt3_r", "911 (992) GT3 R (2023)", GT3, "Porsche"),
    vehicle("bentley_continental_gt3_2018", "Continental GT3 (2018)", GT3, "Bentley"),
    vehicle("nissan_gt_r_nismo_gt3_2018", "GT-R Nismo GT3 (2018)", GT3, "Nissan"),
    // GT3, older generations
    vehicle("amr_v12_vantage_gt3", "V12 Vantage GT3 (2013)", GT3, "Aston Martin"),
    vehicle("audi_r8_lms_evo", "R8 LMS Evo (2019)", GT3, "Audi"),
    vehicle("audi_r8_lms", "R8 LMS (2015)", GT3, "Audi"),
    vehicle("bentley_continental_gt3_2015", "Continental GT3 (2015)", GT3, "Bentley"),
    vehicle("bmw_m6_gt3", "M6 GT3 (2017)", GT3, "BMW"),
    vehicle("bmw_z4_gt3", "Z4 GT3 (2011)", GT3, "BMW"),
    vehicle("ferrari_488_gt3_evo", "488 GT3 Evo (2020)", GT3, "Ferrari"),
    vehicle("ferrari_488_gt3", "488 GT3 (2018)", GT3, "Ferrari"),
    vehicle("honda_nsx_gt3", "NSX GT3 (2017)", GT3, "Honda"),
    vehicle("jaguar_g3", "G3 (2012)", GT3, "Jaguar"),
    vehicle("lamborghini_huracan_gt3_evo", "Huracan GT3 Evo (2019)", GT3, "Lamborghini"),
    vehicle("lamborghini_huracan_gt3", "Huracan GT3 (2015)", GT3, "Lamborghini"),
    vehicle("lexus_rc_f_gt3", "RC F GT3 (2016)", GT3, "Lexus"),
    vehicle("mclaren_720s_gt3", "720S GT3 (2019)", GT3, "McLaren"),
    vehicle("mclaren_650s_gt3", "650S GT3 (2015)", GT3, "McLaren"),
    vehicle("mercedes_amg_gt3", "AMG GT3 (2015)", GT3, "Mercedes-AMG"),
    vehicle("nissan_gt_r_nismo_gt3_2015", "GT-R Nismo GT3 (2015)", GT3, "Nissan"),
    vehicle("porsche_991ii_gt3_r", "911 (991II) GT3 R (2019)", GT3, "Porsche"),
    vehicle("porsche_991_gt3_r", "911 (991) GT3 R (2018)", GT3, "Porsche"),
    vehicle("reiter_engineering_r_ex_gt3", "R-EX GT3 (2017)", GT3, "Reiter Engineering"),
    // GT2
    vehicle("audi_r8_lms_gt2", "R8 LMS GT2 (2019)", GT2, "Audi"),
    vehicle("ktm_xbow_gt2", "X-Bow GT2 (2020)", GT2, "KTM"),
    vehicle("maserati_mc20_gt2", "MC20 GT2 (2023)", GT2, "Maserati"),
    vehicle("mercedes_amg_gt2", "AMG GT2 (2022)", GT2, "Mercedes-AMG"),
    vehicle("porsche_911_gt2_rs_cs_evo", "911 GT2 RS CS Evo (2019)", GT2, "Porsche"),
    vehicle("porsche_935", "935 (2019)", GT2, "Porsche"),
    // GT4
    vehicle("alpine_a110_gt4", "A110 GT4 (2018)", GT4, "Alpine"),
    vehicle("amr_v8_vantage_gt4", "V8 Vantage GT4 (2018)", GT4, "Aston Martin"),
    vehicle("audi_r8_lms_gt4", "R8 LMS GT4 (2016)", GT4, "Audi"),
    vehicle("bmw_m4_gt4", "M4 GT4 (2018)", GT4, "BMW"),
    vehicle("chevrolet_camaro_gt4r", "Camaro GT4.R (2017)", GT4, "Chevrolet"),
    vehicle("ginetta_g55_gt4", "G55 GT4 (2012)", GT4, "Ginetta"),
    vehicle("ktm_xbow_gt4", "X-Bow GT4 (2016)", GT4, "KTM"),
    vehicle("maserati_mc_gt4", "MC GT4 (2016)", GT4, "Maserati"),
    vehicle("mclaren_570s_gt4", "570S GT4 (2016)", GT4, "McLaren"),
    vehicle("mercedes_amg_gt4", "AMG GT4 (2016)", GT4, "Mercedes-AMG"),
    vehicle("porsche_718_cayman_gt4_mr", "718 Cayman GT4 MR (2019)", GT4, "Porsche"),
    vehicle("toyota_gr_supra_gt4", "GR Supra GT4 (2020)", GT4, "Toyota"),
    // CUP / TCX
    vehicle("porsche_992_gt3_cup", "911 (992) GT3 Cup (2021)", CUP, "Porsche"),
    vehicle("porsche_991ii_gt3_cup", "911 (991II) GT3 Cup (2017)", CUP, "Porsche"),
    vehicle("lamborghini_huracan_st_evo2", "Huracan ST Evo2 (2021)", CUP, "Lamborghini"),
    vehicle("lamborghini_huracan_st", "Huracan Super Trofeo (2015)", CUP, "Lamborghini"),
    vehicle("ferrari_488_challenge_evo", "488 Challenge Evo (2020)", CUP, "Ferrari"),
    vehicle("bmw_m2_cs_racing", "M2 CS Racing (2020)", TCX, "BMW"),
];
