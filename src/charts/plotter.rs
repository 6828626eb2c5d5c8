//! Chart Plotter Module
//! Interactive dashboard charts drawn with egui_plot and the egui painter.

use crate::charts::{ylgnbu, HeatmapGrid, HOURS};
use crate::maps::{LeafletMap, MapLayer, MARKER_PALETTE};
use crate::stats::AreaTotal;
use egui::{Align2, Color32, FontId, RichText, Sense, Stroke};
use egui_plot::{Bar, BarChart, Legend, Plot, Points};

pub const BAR_COLOR: Color32 = Color32::from_rgb(31, 119, 180);

const HEATMAP_LABEL_WIDTH: f32 = 120.0;
const HEATMAP_ROW_HEIGHT: f32 = 22.0;
const HEATMAP_AXIS_HEIGHT: f32 = 18.0;

pub struct ChartPlotter;

impl ChartPlotter {
    /// Horizontal bars, first entry on top.
    pub fn draw_area_bar_chart(ui: &mut egui::Ui, totals: &[AreaTotal]) {
        let n = totals.len();
        let labels: Vec<String> = totals.iter().map(|t| t.area_name.clone()).collect();

        let bars: Vec<Bar> = totals
            .iter()
            .enumerate()
            .map(|(i, total)| {
                Bar::new((n - 1 - i) as f64, total.crime_count as f64)
                    .name(&total.area_name)
                    .width(0.7)
            })
            .collect();

        let height = (n as f32 * 24.0).clamp(200.0, 600.0);

        Plot::new("area_totals")
            .height(height)
            .allow_scroll(false)
            .allow_zoom(false)
            .x_axis_label("Number of Crimes")
            .y_axis_label("Area Name")
            .y_axis_min_width(HEATMAP_LABEL_WIDTH)
            .y_axis_formatter(move |mark, _range| {
                let row = mark.value.round();
                if (mark.value - row).abs() > 1e-6 || row < 0.0 {
                    return String::new();
                }
                let row = row as usize;
                if row < n {
                    labels[n - 1 - row].clone()
                } else {
                    String::new()
                }
            })
            .show(ui, |plot_ui| {
                plot_ui.bar_chart(BarChart::new(bars).horizontal().color(BAR_COLOR));
            });
    }

    /// Hour × area grid painted cell by cell; hovering a cell shows its count.
    pub fn draw_time_area_heatmap(ui: &mut egui::Ui, grid: &HeatmapGrid) {
        let rows = grid.areas.len();
        let width = ui.available_width().max(HEATMAP_LABEL_WIDTH + HOURS as f32 * 12.0);
        let height = rows as f32 * HEATMAP_ROW_HEIGHT + HEATMAP_AXIS_HEIGHT;
        let (response, painter) =
            ui.allocate_painter(egui::vec2(width, height), Sense::hover());

        let rect = response.rect;
        let cell_w = (rect.width() - HEATMAP_LABEL_WIDTH) / HOURS as f32;
        let text_color = ui.visuals().text_color();
        let font = FontId::proportional(11.0);

        let cell_rect = |row: usize, hour: usize| {
            let min = egui::pos2(
                rect.left() + HEATMAP_LABEL_WIDTH + hour as f32 * cell_w,
                rect.top() + row as f32 * HEATMAP_ROW_HEIGHT,
            );
            egui::Rect::from_min_size(min, egui::vec2(cell_w, HEATMAP_ROW_HEIGHT))
        };

        for (row, area) in grid.areas.iter().enumerate() {
            painter.text(
                egui::pos2(
                    rect.left() + HEATMAP_LABEL_WIDTH - 6.0,
                    rect.top() + (row as f32 + 0.5) * HEATMAP_ROW_HEIGHT,
                ),
                Align2::RIGHT_CENTER,
                area,
                font.clone(),
                text_color,
            );
            for hour in 0..HOURS {
                let (r, g, b) = ylgnbu(grid.intensity(row, hour));
                painter.rect_filled(cell_rect(row, hour), 0.0, Color32::from_rgb(r, g, b));
            }
        }

        let axis_y = rect.top() + rows as f32 * HEATMAP_ROW_HEIGHT + HEATMAP_AXIS_HEIGHT / 2.0;
        for hour in (0..HOURS).step_by(2) {
            painter.text(
                egui::pos2(cell_rect(0, hour).center().x, axis_y),
                Align2::CENTER_CENTER,
                hour.to_string(),
                font.clone(),
                text_color,
            );
        }

        if let Some(pos) = response.hover_pos() {
            let col = ((pos.x - rect.left() - HEATMAP_LABEL_WIDTH) / cell_w).floor();
            let row = ((pos.y - rect.top()) / HEATMAP_ROW_HEIGHT).floor();
            if col >= 0.0 && row >= 0.0 && (col as usize) < HOURS && (row as usize) < rows {
                let (row, hour) = (row as usize, col as usize);
                painter.rect_stroke(cell_rect(row, hour), 0.0, Stroke::new(1.5, text_color));
                response.on_hover_text(format!(
                    "{} at {:02}:00 - {} crimes",
                    grid.areas[row],
                    hour,
                    grid.value(row, hour)
                ));
            }
        }
    }

    /// Lon/lat preview of a web map: heat points sized by weight, markers
    /// in their palette color.
    pub fn draw_map_preview(ui: &mut egui::Ui, id: &str, map: &LeafletMap) {
        Plot::new(id)
            .height(380.0)
            .data_aspect(1.0)
            .x_axis_label("Longitude")
            .y_axis_label("Latitude")
            .legend(Legend::default())
            .show(ui, |plot_ui| {
                for layer in &map.layers {
                    match layer {
                        MapLayer::Heat { points, .. } => {
                            let max = points.iter().map(|p| p.weight).fold(1.0, f64::max);
                            for point in points {
                                let (r, g, b) = ylgnbu(0.3 + 0.7 * point.weight / max);
                                plot_ui.points(
                                    Points::new(vec![[point.lon, point.lat]])
                                        .radius(4.0 + 12.0 * (point.weight / max) as f32)
                                        .color(Color32::from_rgb(r, g, b)),
                                );
                            }
                        }
                        MapLayer::Markers { markers } => {
                            for marker in markers {
                                plot_ui.points(
                                    Points::new(vec![[marker.lon, marker.lat]])
                                        .radius(6.0)
                                        .color(Self::named_color(&marker.color))
                                        .name(&marker.area_name),
                                );
                            }
                        }
                    }
                }
            });
    }

    fn named_color(name: &str) -> Color32 {
        MARKER_PALETTE
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, [r, g, b])| Color32::from_rgb(*r, *g, *b))
            .unwrap_or(Color32::GRAY)
    }

    /// Striped table with a bold header row.
    pub fn draw_table(ui: &mut egui::Ui, id: &str, headers: &[&str], rows: &[Vec<String>]) {
        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                egui::Grid::new(ui.make_persistent_id(id))
                    .striped(true)
                    .min_col_width(55.0)
                    .spacing([8.0, 4.0])
                    .show(ui, |ui| {
                        for header in headers {
                            ui.label(RichText::new(*header).strong().size(11.0));
                        }
                        ui.end_row();

                        for row in rows {
                            for cell in row {
                                ui.label(RichText::new(cell).size(11.0));
                            }
                            ui.end_row();
                        }
                    });
            });
    }
}
