//! Column names of the normalized incident table.

pub const AREA_NAME: &str = "area_name";
pub const TIME_OCC: &str = "time_occ";
pub const HOUR: &str = "hour";
pub const CRIME_TYPE: &str = "crm_cd_desc";
pub const LAT: &str = "lat";
pub const LON: &str = "lon";
pub const MOCODES: &str = "mocodes";
pub const VICT_SEX: &str = "vict_sex";

/// Secondary/tertiary crime codes and the free-text cross street.
pub const UNUSED: &[&str] = &["crm_cd_2", "crm_cd_3", "crm_cd_4", "cross_street"];
