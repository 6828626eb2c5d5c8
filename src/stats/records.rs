//! Typed rows produced by the aggregator.
//!
//! Field names match the column names of the normalized table and are the
//! binding contract for the charts and maps.

use serde::Serialize;

/// Per-column count used by the null and unique summaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnCount {
    pub column: String,
    pub count: usize,
}

/// Crimes in one area, anchored at the first coordinates seen for it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AreaTotal {
    pub area_name: String,
    pub crime_count: u64,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

impl AreaTotal {
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.lat.zip(self.lon)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AreaHourTotal {
    pub area_name: String,
    pub hour: i32,
    pub crime_count: u64,
}

/// One coordinate pair ranked within its area.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationCount {
    pub area_name: String,
    pub lat: f64,
    pub lon: f64,
    pub crime_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrimeTypeCount {
    pub area_name: String,
    #[serde(rename = "crm_cd_desc")]
    pub crime_type: String,
    pub crime_count: u64,
}
