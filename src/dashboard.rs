//! One dashboard refresh: filter the normalized table and compute every
//! section from the result.
//!
//! Each section keeps its own `Result` so a missing column only removes the
//! sections that need it.

use crate::charts::{HeatmapGrid, StaticChartRenderer};
use crate::config::{AnalysisConfig, Config, MapConfig};
use crate::data::AreaFilter;
use crate::maps::{CrimeMaps, LeafletMap};
use crate::stats::{
    dataset_shape, list_columns, null_counts, unique_counts, Aggregator, AnalysisError,
    AreaHourTotal, AreaTotal, ColumnCount, CrimeTypeCount, LocationCount,
};
use polars::prelude::*;
use std::path::{Path, PathBuf};

pub type Section<T> = Result<T, AnalysisError>;

/// First rows of the filtered table, rendered as text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreviewTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl PreviewTable {
    pub fn from_frame(df: &DataFrame, max_rows: usize) -> Self {
        let head = df.head(Some(max_rows));
        let columns = list_columns(&head);
        let rows = (0..head.height())
            .map(|i| {
                head.get_columns()
                    .iter()
                    .map(|col| match col.get(i) {
                        Ok(AnyValue::Null) | Err(_) => String::new(),
                        Ok(val) => val.to_string().trim_matches('"').to_string(),
                    })
                    .collect()
            })
            .collect();
        Self { columns, rows }
    }
}

/// Everything the dashboard shows for one filter state.
#[derive(Debug)]
pub struct DashboardSnapshot {
    pub filtered: DataFrame,
    pub selected_areas: Vec<String>,
    pub shape: (usize, usize),
    pub columns: Vec<String>,
    pub null_counts: Vec<ColumnCount>,
    pub unique_counts: Section<Vec<ColumnCount>>,
    pub preview: PreviewTable,
    pub area_totals: Section<Vec<AreaTotal>>,
    pub time_area: Section<Vec<AreaHourTotal>>,
    /// `None` when no area is selected.
    pub top_crime_types: Option<Section<Vec<CrimeTypeCount>>>,
    /// `None` when no area is selected.
    pub top_locations: Option<Section<Vec<LocationCount>>>,
}

impl DashboardSnapshot {
    pub fn compute(
        df: &DataFrame,
        filter: &AreaFilter,
        settings: &AnalysisConfig,
    ) -> Result<Self, AnalysisError> {
        let filtered = filter.apply(df)?;
        let selected = filter.selected().to_vec();

        let has_selection = !selected.is_empty();

        let top_crime_types = has_selection.then(|| {
            log_section(
                "top crime types",
                Aggregator::top_crime_types_by_area(&filtered, &selected, settings.top_crime_types),
            )
        });
        let top_locations = has_selection.then(|| {
            log_section(
                "top locations",
                Aggregator::top_locations_for_areas(&filtered, &selected, settings.top_locations),
            )
        });

        Ok(Self {
            shape: dataset_shape(&filtered),
            columns: list_columns(&filtered),
            null_counts: null_counts(&filtered),
            unique_counts: unique_counts(&filtered).map_err(AnalysisError::from),
            preview: PreviewTable::from_frame(&filtered, settings.preview_rows),
            area_totals: log_section("area totals", Aggregator::crime_by_area(&filtered)),
            time_area: log_section("time vs area", Aggregator::time_area_counts(&filtered)),
            top_crime_types,
            top_locations,
            selected_areas: selected,
            filtered,
        })
    }

    /// Area totals largest first, as drawn by the bar charts.
    pub fn area_totals_by_count(&self) -> Option<Vec<AreaTotal>> {
        let mut totals = self.area_totals.as_ref().ok()?.clone();
        totals.sort_by(|a, b| b.crime_count.cmp(&a.crime_count));
        Some(totals)
    }

    pub fn heatmap_grid(&self) -> Option<HeatmapGrid> {
        self.time_area.as_ref().ok().map(|counts| HeatmapGrid::from_counts(counts))
    }

    pub fn heatmap_map(&self, settings: &MapConfig) -> Section<LeafletMap> {
        CrimeMaps::heatmap(&self.filtered, settings)
    }

    pub fn top_locations_map(&self, settings: &MapConfig, top_n: usize) -> Section<LeafletMap> {
        CrimeMaps::top_locations(&self.filtered, &self.selected_areas, top_n, settings)
    }

    /// Write the static charts and web maps for this snapshot into `dir`.
    /// A file that cannot be produced is skipped and the rest still written.
    pub fn export(&self, dir: &Path, config: &Config) -> ExportReport {
        let mut report = ExportReport::default();
        let (width, height) = (config.export.chart_width, config.export.chart_height);

        let path = dir.join("area_totals.png");
        match self.area_totals_by_count() {
            Some(totals) => report.record(
                path.clone(),
                StaticChartRenderer::render_area_bars(&totals, &path, width, height),
            ),
            None => report.skip(path, "area totals unavailable"),
        }

        let path = dir.join("time_area_heatmap.png");
        match self.heatmap_grid() {
            Some(grid) => report.record(
                path.clone(),
                StaticChartRenderer::render_time_area_heatmap(&grid, &path, width, height),
            ),
            None => report.skip(path, "time vs area counts unavailable"),
        }

        let path = dir.join("crime_heatmap.html");
        match self.heatmap_map(&config.map) {
            Ok(map) => report.record(path.clone(), map.write_html(&path, "Crime Heatmap")),
            Err(e) => report.skip(path, e),
        }

        let path = dir.join("top_locations.html");
        if self.selected_areas.is_empty() {
            report.skip(path, "no areas selected");
        } else {
            match self.top_locations_map(&config.map, config.analysis.top_locations) {
                Ok(map) => report.record(path.clone(), map.write_html(&path, "Top Crime Locations")),
                Err(e) => report.skip(path, e),
            }
        }

        report
    }
}

/// Outcome of [`DashboardSnapshot::export`].
#[derive(Debug, Default)]
pub struct ExportReport {
    pub written: Vec<PathBuf>,
    /// File name and reason.
    pub skipped: Vec<(String, String)>,
}

impl ExportReport {
    fn record<E: std::fmt::Display>(&mut self, path: PathBuf, result: Result<(), E>) {
        match result {
            Ok(()) => self.written.push(path),
            Err(e) => self.skip(path, e),
        }
    }

    fn skip(&mut self, path: PathBuf, reason: impl ToString) {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let reason = reason.to_string();
        log::warn!("Skipped {name}: {reason}");
        self.skipped.push((name, reason));
    }

    pub fn summary(&self) -> String {
        let mut text = format!("Exported {} file(s)", self.written.len());
        if !self.skipped.is_empty() {
            let names: Vec<&str> = self.skipped.iter().map(|(n, _)| n.as_str()).collect();
            text.push_str(&format!(", skipped {}", names.join(", ")));
        }
        text
    }
}

fn log_section<T>(name: &str, section: Section<T>) -> Section<T> {
    match &section {
        Err(e) if e.is_invalid_schema() => log::debug!("Section '{name}' unavailable: {e}"),
        Err(e) => log::warn!("Section '{name}' failed: {e}"),
        Ok(_) => {}
    }
    section
}

#[cfg(test)]
mod tests {
    use super::*;

    fn incidents() -> DataFrame {
        df!(
            "area_name" => ["Central", "Pacific", "Central", "Newton"],
            "hour" => [9i32, 14, 9, 0],
            "crm_cd_desc" => ["BURGLARY", "VANDALISM", "BURGLARY", "ARSON"],
            "lat" => [34.04, 33.99, 34.04, 34.01],
            "lon" => [-118.25, -118.44, -118.25, -118.26],
        )
        .unwrap()
    }

    #[test]
    fn test_empty_filter_uses_full_table() {
        let snap = DashboardSnapshot::compute(
            &incidents(),
            &AreaFilter::default(),
            &AnalysisConfig::default(),
        )
        .unwrap();

        assert_eq!(snap.shape, (4, 5));
        assert!(snap.top_crime_types.is_none());
        assert!(snap.top_locations.is_none());
        assert_eq!(snap.area_totals.as_ref().unwrap().len(), 3);
    }

    #[test]
    fn test_filtered_snapshot() {
        let snap = DashboardSnapshot::compute(
            &incidents(),
            &AreaFilter::new(["Central"]),
            &AnalysisConfig::default(),
        )
        .unwrap();

        assert_eq!(snap.shape, (2, 5));
        let types = snap.top_crime_types.unwrap().unwrap();
        assert_eq!(types.len(), 1);
        assert_eq!(types[0].crime_count, 2);
        let locations = snap.top_locations.unwrap().unwrap();
        assert_eq!(locations.len(), 1);
    }

    #[test]
    fn test_missing_columns_only_drop_their_sections() {
        let df = df!("area_name" => ["Central", "Pacific"]).unwrap();
        let snap =
            DashboardSnapshot::compute(&df, &AreaFilter::new(["Central"]), &AnalysisConfig::default())
                .unwrap();

        assert!(snap.area_totals.is_ok());
        assert!(snap.time_area.as_ref().unwrap_err().is_invalid_schema());
        assert!(snap.top_crime_types.unwrap().is_err());
        assert!(snap.top_locations.unwrap().is_err());
        assert_eq!(snap.preview.rows.len(), 1);
    }

    #[test]
    fn test_preview_limits_rows_and_blanks_nulls() {
        let df = df!("a" => [Some("x"), None, Some("z")], "b" => [1i32, 2, 3]).unwrap();
        let preview = PreviewTable::from_frame(&df, 2);
        assert_eq!(preview.columns, vec!["a", "b"]);
        assert_eq!(
            preview.rows,
            vec![
                vec!["x".to_string(), "1".to_string()],
                vec![String::new(), "2".to_string()],
            ]
        );
    }

    #[test]
    fn test_area_totals_by_count() {
        let snap = DashboardSnapshot::compute(
            &incidents(),
            &AreaFilter::default(),
            &AnalysisConfig::default(),
        )
        .unwrap();
        let ordered = snap.area_totals_by_count().unwrap();
        assert_eq!(ordered[0].area_name, "Central");
        assert_eq!(ordered[0].crime_count, 2);
    }

    #[test]
    fn test_export_skips_unavailable_sections() {
        let dir = tempfile::tempdir().unwrap();
        let df = df!("crm_cd_desc" => ["BURGLARY", "VANDALISM"]).unwrap();
        let snap =
            DashboardSnapshot::compute(&df, &AreaFilter::new(["Central"]), &AnalysisConfig::default())
                .unwrap();

        let report = snap.export(dir.path(), &Config::default());
        assert!(report.written.is_empty());
        let skipped: Vec<&str> = report.skipped.iter().map(|(n, _)| n.as_str()).collect();
        assert!(skipped.contains(&"area_totals.png"));
        assert!(skipped.contains(&"time_area_heatmap.png"));
        assert!(skipped.contains(&"crime_heatmap.html"));
        assert!(skipped.contains(&"top_locations.html"));
        assert!(!dir.path().join("crime_heatmap.html").exists());
        assert!(report.summary().contains("skipped"));
    }

    #[test]
    fn test_export_writes_maps() {
        let dir = tempfile::tempdir().unwrap();
        let snap = DashboardSnapshot::compute(
            &incidents(),
            &AreaFilter::new(["Central", "Pacific"]),
            &AnalysisConfig::default(),
        )
        .unwrap();

        let report = snap.export(dir.path(), &Config::default());
        assert!(report.written.contains(&dir.path().join("crime_heatmap.html")));
        assert!(report.written.contains(&dir.path().join("top_locations.html")));
        let html = std::fs::read_to_string(dir.path().join("top_locations.html")).unwrap();
        assert!(html.contains("Central - Crimes: 2"));
    }
}
