//! Maps module - geographic views of the incident table.
//!
//! Two maps are built from the normalized table:
//! - crime heatmap: one weighted point per area, weight = incident count
//! - top locations: one marker per busiest coordinate, colored by area

mod leaflet;

pub use leaflet::{HeatPoint, LeafletMap, MapError, MapLayer, Marker};

use crate::config::MapConfig;
use crate::data::columns;
use crate::stats::{Aggregator, AnalysisError, LocationCount};
use polars::prelude::*;

/// Marker colors, assigned to areas in selection order and cycled.
pub const MARKER_PALETTE: [(&str, [u8; 3]); 5] = [
    ("blue", [56, 126, 184]),
    ("green", [77, 175, 74]),
    ("red", [215, 48, 39]),
    ("purple", [152, 78, 163]),
    ("orange", [255, 127, 0]),
];

/// Palette entry for the area at `index` in the selection.
pub fn marker_color(index: usize) -> (&'static str, [u8; 3]) {
    MARKER_PALETTE[index % MARKER_PALETTE.len()]
}

pub struct CrimeMaps;

impl CrimeMaps {
    /// Weighted heat points from per-area totals. Areas without coordinates
    /// are left off the map.
    pub fn heatmap(df: &DataFrame, settings: &MapConfig) -> Result<LeafletMap, AnalysisError> {
        require_coordinates(df, "crime_heatmap")?;

        let points: Vec<HeatPoint> = Aggregator::crime_by_area(df)?
            .iter()
            .filter_map(|total| {
                total.coordinates().map(|(lat, lon)| HeatPoint {
                    lat,
                    lon,
                    weight: total.crime_count as f64,
                })
            })
            .collect();
        log::debug!("Heatmap with {} weighted points", points.len());

        Ok(LeafletMap::new(
            settings.center_lat,
            settings.center_lon,
            settings.heatmap_zoom,
        )
        .with_layer(MapLayer::Heat {
            points,
            radius: settings.heat_radius,
            blur: settings.heat_blur,
        }))
    }

    /// Markers for the `top_n` busiest coordinates of each selected area.
    pub fn top_locations(
        df: &DataFrame,
        areas: &[String],
        top_n: usize,
        settings: &MapConfig,
    ) -> Result<LeafletMap, AnalysisError> {
        require_coordinates(df, "top_locations_map")?;

        let locations = Aggregator::top_locations_for_areas(df, areas, top_n)?;
        let markers = Self::markers(&locations, areas);

        Ok(LeafletMap::new(
            settings.center_lat,
            settings.center_lon,
            settings.markers_zoom,
        )
        .with_layer(MapLayer::Markers { markers }))
    }

    /// One marker per location, colored by the position of its area in
    /// `areas`.
    pub fn markers(locations: &[LocationCount], areas: &[String]) -> Vec<Marker> {
        locations
            .iter()
            .map(|loc| {
                let index = areas
                    .iter()
                    .position(|a| a == &loc.area_name)
                    .unwrap_or(0);
                Marker {
                    area_name: loc.area_name.clone(),
                    lat: loc.lat,
                    lon: loc.lon,
                    color: marker_color(index).0.to_string(),
                    popup: format!("{} - Crimes: {}", loc.area_name, loc.crime_count),
                }
            })
            .collect()
    }
}

fn require_coordinates(df: &DataFrame, operation: &'static str) -> Result<(), AnalysisError> {
    let missing: Vec<String> = [columns::LAT, columns::LON]
        .into_iter()
        .filter(|c| df.column(c).is_err())
        .map(String::from)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(AnalysisError::InvalidSchema { operation, missing })
    }
}
