//! Configuration file handling.
//!
//! Settings come from `crimescope.toml` in the working directory, or from
//! the file named by `CRIMESCOPE_CONFIG`. Every field has a default, so an
//! absent file is not an error.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "CRIMESCOPE_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "crimescope.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub filters: FilterConfig,

    #[serde(default)]
    pub analysis: AnalysisConfig,

    #[serde(default)]
    pub map: MapConfig,

    #[serde(default)]
    pub export: ExportConfig,
}

/// Input dataset settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// CSV loaded at startup.
    #[serde(default = "default_data_path")]
    pub path: PathBuf,

    /// Rows used for type inference; 0 scans the whole file.
    #[serde(default = "default_infer_schema_rows")]
    pub infer_schema_rows: usize,

    /// Reuse the normalized table for an unchanged file.
    #[serde(default = "default_true")]
    pub use_cache: bool,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: default_data_path(),
            infer_schema_rows: default_infer_schema_rows(),
            use_cache: true,
        }
    }
}

fn default_data_path() -> PathBuf {
    PathBuf::from("Crime_Data_from_2020_to_Present.csv")
}

fn default_infer_schema_rows() -> usize {
    0
}

fn default_true() -> bool {
    true
}

/// Area filter settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Areas preselected when present in the data.
    #[serde(default = "default_areas")]
    pub default_areas: Vec<String>,

    /// Number of areas preselected when none of the defaults exist.
    #[serde(default = "default_fallback_area_count")]
    pub fallback_area_count: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            default_areas: default_areas(),
            fallback_area_count: default_fallback_area_count(),
        }
    }
}

fn default_areas() -> Vec<String> {
    vec!["Central", "77th Street", "Pacific"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_fallback_area_count() -> usize {
    3
}

/// Ranking and preview sizes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_top_crime_types")]
    pub top_crime_types: usize,

    #[serde(default = "default_top_locations")]
    pub top_locations: usize,

    /// Rows shown in the raw data preview.
    #[serde(default = "default_preview_rows")]
    pub preview_rows: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            top_crime_types: default_top_crime_types(),
            top_locations: default_top_locations(),
            preview_rows: default_preview_rows(),
        }
    }
}

fn default_top_crime_types() -> usize {
    3
}

fn default_top_locations() -> usize {
    5
}

fn default_preview_rows() -> usize {
    500
}

/// Web map settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapConfig {
    #[serde(default = "default_center_lat")]
    pub center_lat: f64,

    #[serde(default = "default_center_lon")]
    pub center_lon: f64,

    #[serde(default = "default_heatmap_zoom")]
    pub heatmap_zoom: u8,

    #[serde(default = "default_markers_zoom")]
    pub markers_zoom: u8,

    #[serde(default = "default_heat_radius")]
    pub heat_radius: u32,

    #[serde(default = "default_heat_blur")]
    pub heat_blur: u32,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            center_lat: default_center_lat(),
            center_lon: default_center_lon(),
            heatmap_zoom: default_heatmap_zoom(),
            markers_zoom: default_markers_zoom(),
            heat_radius: default_heat_radius(),
            heat_blur: default_heat_blur(),
        }
    }
}

// Los Angeles city center
fn default_center_lat() -> f64 {
    34.0522
}

fn default_center_lon() -> f64 {
    -118.2437
}

fn default_heatmap_zoom() -> u8 {
    10
}

fn default_markers_zoom() -> u8 {
    11
}

fn default_heat_radius() -> u32 {
    15
}

fn default_heat_blur() -> u32 {
    10
}

/// Static chart export settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_chart_width")]
    pub chart_width: u32,

    #[serde(default = "default_chart_height")]
    pub chart_height: u32,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            chart_width: default_chart_width(),
            chart_height: default_chart_height(),
        }
    }
}

fn default_chart_width() -> u32 {
    1000
}

fn default_chart_height() -> u32 {
    600
}

impl DataConfig {
    pub fn schema_inference_rows(&self) -> Option<usize> {
        (self.infer_schema_rows > 0).then_some(self.infer_schema_rows)
    }
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load from `CRIMESCOPE_CONFIG` or `crimescope.toml`.
    ///
    /// An explicitly named file must exist; the default file is optional.
    pub fn load_default() -> Result<Self> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Self::load(Path::new(&path));
        }

        let default_path = Path::new(DEFAULT_CONFIG_FILE);
        if default_path.exists() {
            Self::load(default_path)
        } else {
            log::debug!("No {DEFAULT_CONFIG_FILE} found, using defaults");
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(
            config.data.path,
            PathBuf::from("Crime_Data_from_2020_to_Present.csv")
        );
        assert_eq!(config.analysis.top_crime_types, 3);
        assert_eq!(config.analysis.top_locations, 5);
        assert!(config.filters.default_areas.contains(&"Pacific".to_string()));
        assert_eq!(config.map.heatmap_zoom, 10);
    }

    #[test]
    fn test_parse_partial_config() {
        let toml_content = r#"
[data]
path = "data/incidents.csv"
use_cache = false

[filters]
default_areas = ["Hollywood"]

[analysis]
top_locations = 10
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.data.path, PathBuf::from("data/incidents.csv"));
        assert!(!config.data.use_cache);
        assert_eq!(config.data.infer_schema_rows, 0);
        assert_eq!(config.data.schema_inference_rows(), None);
        assert_eq!(config.filters.default_areas, vec!["Hollywood"]);
        assert_eq!(config.filters.fallback_area_count, 3);
        assert_eq!(config.analysis.top_locations, 10);
        assert_eq!(config.analysis.top_crime_types, 3);
        assert_eq!(config.map.center_lat, 34.0522);
    }

    #[test]
    fn test_load_reports_bad_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crimescope.toml");
        std::fs::write(&path, "[analysis]\ntop_locations = \"many\"\n").unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
