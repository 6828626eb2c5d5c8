//! Chart Viewer Widget
//! Central tabbed panel: Overview, Time vs Area and Maps.

use crate::charts::{ChartPlotter, HeatmapGrid};
use crate::config::MapConfig;
use crate::dashboard::{DashboardSnapshot, Section};
use crate::maps::LeafletMap;
use crate::stats::{AnalysisError, AreaTotal, ColumnCount};
use egui::{Color32, RichText, ScrollArea};

const SECTION_SPACING: f32 = 15.0;
const ERROR_COLOR: Color32 = Color32::from_rgb(220, 53, 69);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Overview,
    TimeVsArea,
    Maps,
}

/// Which web map the user asked to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapKind {
    Heatmap,
    TopLocations,
}

impl MapKind {
    pub fn title(self) -> &'static str {
        match self {
            MapKind::Heatmap => "Crime Heatmap",
            MapKind::TopLocations => "Top Crime Locations",
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            MapKind::Heatmap => "crime_heatmap.html",
            MapKind::TopLocations => "top_locations.html",
        }
    }
}

/// Actions triggered by the chart viewer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartViewerAction {
    None,
    OpenMap(MapKind),
}

/// Chart data derived once per snapshot, so redraws do not re-aggregate.
struct ViewData {
    snapshot: DashboardSnapshot,
    area_bars: Option<Vec<AreaTotal>>,
    heatmap_grid: Option<HeatmapGrid>,
    heatmap_map: Section<LeafletMap>,
    /// `None` when no area is selected.
    top_locations_map: Option<Section<LeafletMap>>,
}

#[derive(Default)]
pub struct ChartViewer {
    pub tab: Tab,
    view: Option<ViewData>,
}

impl ChartViewer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.view = None;
    }

    pub fn snapshot(&self) -> Option<&DashboardSnapshot> {
        self.view.as_ref().map(|v| &v.snapshot)
    }

    pub fn set_snapshot(&mut self, snapshot: DashboardSnapshot, settings: &MapConfig, top_locations: usize) {
        let top_locations_map = (!snapshot.selected_areas.is_empty())
            .then(|| snapshot.top_locations_map(settings, top_locations));

        self.view = Some(ViewData {
            area_bars: snapshot.area_totals_by_count(),
            heatmap_grid: snapshot.heatmap_grid(),
            heatmap_map: snapshot.heatmap_map(settings),
            top_locations_map,
            snapshot,
        });
    }

    /// The web map of `kind` for the current snapshot, if it could be built.
    pub fn map(&self, kind: MapKind) -> Option<&LeafletMap> {
        let view = self.view.as_ref()?;
        match kind {
            MapKind::Heatmap => view.heatmap_map.as_ref().ok(),
            MapKind::TopLocations => view.top_locations_map.as_ref()?.as_ref().ok(),
        }
    }

    pub fn show(&mut self, ui: &mut egui::Ui) -> ChartViewerAction {
        let Some(view) = &self.view else {
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new("No Data").size(20.0));
            });
            return ChartViewerAction::None;
        };

        ui.horizontal(|ui| {
            ui.selectable_value(&mut self.tab, Tab::Overview, RichText::new("📋 Overview").size(14.0));
            ui.selectable_value(&mut self.tab, Tab::TimeVsArea, RichText::new("🕒 Time vs Area").size(14.0));
            ui.selectable_value(&mut self.tab, Tab::Maps, RichText::new("🗺 Maps").size(14.0));
        });
        ui.separator();

        let mut action = ChartViewerAction::None;
        ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| match self.tab {
                Tab::Overview => Self::show_overview(ui, &view.snapshot),
                Tab::TimeVsArea => Self::show_time_vs_area(ui, view),
                Tab::Maps => action = Self::show_maps(ui, view),
            });
        action
    }

    fn show_overview(ui: &mut egui::Ui, snapshot: &DashboardSnapshot) {
        let (rows, cols) = snapshot.shape;
        section_title(ui, "Dataset Overview");
        ui.label(format!("Rows: {rows}    Columns: {cols}"));
        ui.label(
            RichText::new(snapshot.columns.join(", "))
                .size(11.0)
                .color(Color32::GRAY),
        );
        ui.add_space(SECTION_SPACING);

        ui.horizontal_top(|ui| {
            ui.vertical(|ui| {
                section_title(ui, "Missing Values");
                ChartPlotter::draw_table(ui, "null_counts", &["Column", "Missing"], &count_rows(&snapshot.null_counts));
            });
            ui.add_space(SECTION_SPACING);
            ui.vertical(|ui| {
                section_title(ui, "Unique Values");
                match &snapshot.unique_counts {
                    Ok(counts) => {
                        ChartPlotter::draw_table(ui, "unique_counts", &["Column", "Unique"], &count_rows(counts))
                    }
                    Err(e) => unavailable(ui, "Unique counts", e),
                }
            });
        });
        ui.add_space(SECTION_SPACING);

        section_title(ui, "Raw Data Preview");
        let preview = &snapshot.preview;
        ui.label(
            RichText::new(format!("First {} rows", preview.rows.len()))
                .size(11.0)
                .color(Color32::GRAY),
        );
        let headers: Vec<&str> = preview.columns.iter().map(String::as_str).collect();
        ScrollArea::both()
            .id_salt("preview_scroll")
            .max_height(400.0)
            .show(ui, |ui| {
                ChartPlotter::draw_table(ui, "preview", &headers, &preview.rows);
            });
    }

    fn show_time_vs_area(ui: &mut egui::Ui, view: &ViewData) {
        let snapshot = &view.snapshot;

        section_title(ui, "Crime Count by Time and Area");
        match (&view.heatmap_grid, &snapshot.time_area) {
            (Some(grid), _) if !grid.is_empty() => ChartPlotter::draw_time_area_heatmap(ui, grid),
            (_, Err(e)) => unavailable(ui, "Heatmap", e),
            _ => {
                ui.label("No incidents with a time of day.");
            }
        }
        ui.add_space(SECTION_SPACING);

        if let Some(types) = &snapshot.top_crime_types {
            section_title(ui, "Top Crime Types by Area");
            match types {
                Ok(types) => {
                    let rows: Vec<Vec<String>> = types
                        .iter()
                        .map(|t| vec![t.area_name.clone(), t.crime_type.clone(), t.crime_count.to_string()])
                        .collect();
                    ChartPlotter::draw_table(ui, "top_crime_types", &["Area", "Crime Type", "Count"], &rows);
                }
                Err(e) => unavailable(ui, "Top crime types", e),
            }
            ui.add_space(SECTION_SPACING);
        }

        section_title(ui, "Total Crimes by Area");
        match (&view.area_bars, &snapshot.area_totals) {
            (Some(totals), _) => ChartPlotter::draw_area_bar_chart(ui, totals),
            (None, Err(e)) => unavailable(ui, "Area totals", e),
            (None, Ok(_)) => {}
        }
    }

    fn show_maps(ui: &mut egui::Ui, view: &ViewData) -> ChartViewerAction {
        let mut action = ChartViewerAction::None;

        section_title(ui, MapKind::Heatmap.title());
        match &view.heatmap_map {
            Ok(map) => {
                if map_header(ui, map) {
                    action = ChartViewerAction::OpenMap(MapKind::Heatmap);
                }
                ChartPlotter::draw_map_preview(ui, "heatmap_preview", map);
            }
            Err(e) => unavailable(ui, "Heatmap", e),
        }
        ui.add_space(SECTION_SPACING);

        section_title(ui, MapKind::TopLocations.title());
        match &view.top_locations_map {
            None => {
                ui.label(RichText::new("Select areas to see their top locations.").color(Color32::GRAY));
            }
            Some(Ok(map)) => {
                if map_header(ui, map) {
                    action = ChartViewerAction::OpenMap(MapKind::TopLocations);
                }
                ChartPlotter::draw_map_preview(ui, "top_locations_preview", map);
            }
            Some(Err(e)) => unavailable(ui, "Top locations map", e),
        }

        action
    }
}

fn section_title(ui: &mut egui::Ui, title: &str) {
    ui.label(RichText::new(title).size(16.0).strong());
    ui.add_space(5.0);
}

fn unavailable(ui: &mut egui::Ui, what: &str, error: &AnalysisError) {
    let color = if error.is_invalid_schema() {
        Color32::GRAY
    } else {
        ERROR_COLOR
    };
    ui.label(RichText::new(format!("{what} not available: {error}")).color(color));
}

/// Point count plus the "Open in browser" button; true when clicked.
fn map_header(ui: &mut egui::Ui, map: &LeafletMap) -> bool {
    ui.horizontal(|ui| {
        ui.label(RichText::new(format!("{} points", map.points().len())).color(Color32::GRAY));
        ui.button("🌐 Open in browser").clicked()
    })
    .inner
}

fn count_rows(counts: &[ColumnCount]) -> Vec<Vec<String>> {
    counts
        .iter()
        .map(|c| vec![c.column.clone(), c.count.to_string()])
        .collect()
}
