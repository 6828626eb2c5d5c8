//! Control Panel Widget
//! Left side panel with the data source, area filter and export controls.

use crate::data::AreaFilter;
use egui::{Color32, RichText, ScrollArea};
use std::path::PathBuf;

/// Left side control panel with file selection and the area multiselect.
pub struct ControlPanel {
    pub data_path: Option<PathBuf>,
    /// Distinct areas of the loaded table, sorted.
    pub areas: Vec<String>,
    pub filter: AreaFilter,
    pub progress: f32,
    pub status: String,
    pub export_enabled: bool,
}

impl Default for ControlPanel {
    fn default() -> Self {
        Self {
            data_path: None,
            areas: Vec::new(),
            filter: AreaFilter::default(),
            progress: 0.0,
            status: "Ready".to_string(),
            export_enabled: false,
        }
    }
}

impl ControlPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the area list after a load.
    pub fn update_areas(&mut self, areas: Vec<String>, filter: AreaFilter) {
        self.areas = areas;
        self.filter = filter;
    }

    /// Draw the control panel
    pub fn show(&mut self, ui: &mut egui::Ui) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        // Title
        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("🚓 CrimeScope")
                    .size(22.0)
                    .color(Color32::from_rgb(100, 149, 237)),
            );
            ui.label(
                RichText::new("Crime Incident Analysis")
                    .size(11.0)
                    .color(Color32::GRAY),
            );
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Data Source Section =====
        ui.label(RichText::new("📁 Data Source").size(14.0).strong());
        ui.add_space(5.0);

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    let path_text = self
                        .data_path
                        .as_ref()
                        .and_then(|p| p.file_name())
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_else(|| "No file selected".to_string());

                    let color = if self.data_path.is_some() {
                        ui.visuals().strong_text_color()
                    } else {
                        Color32::GRAY
                    };
                    ui.label(RichText::new(&path_text).size(12.0).color(color));

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("📂 Browse").clicked() {
                            action = ControlPanelAction::BrowseCsv;
                        }
                    });
                });
            });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Area Filter Section =====
        ui.label(RichText::new("🗺 Areas").size(14.0).strong());
        ui.add_space(5.0);

        if self.areas.is_empty() {
            ui.label(RichText::new("No area column loaded").color(Color32::GRAY));
        } else {
            egui::Frame::none()
                .fill(ui.visuals().widgets.noninteractive.bg_fill)
                .rounding(5.0)
                .inner_margin(5.0)
                .show(ui, |ui| {
                    ScrollArea::vertical().max_height(260.0).show(ui, |ui| {
                        for area in &self.areas {
                            let mut checked = self.filter.contains(area);
                            if ui.checkbox(&mut checked, area).changed() {
                                self.filter.toggle(area);
                                action = ControlPanelAction::FilterChanged;
                            }
                        }
                    });
                });

            ui.add_space(5.0);
            ui.horizontal(|ui| {
                if ui.small_button("Select All").clicked() {
                    self.filter = AreaFilter::new(self.areas.iter().cloned());
                    action = ControlPanelAction::FilterChanged;
                }
                if ui.small_button("Clear All").clicked() {
                    self.filter.clear();
                    action = ControlPanelAction::FilterChanged;
                }
            });

            let selection = if self.filter.is_empty() {
                "All areas".to_string()
            } else {
                format!("{} of {} selected", self.filter.selected().len(), self.areas.len())
            };
            ui.label(RichText::new(selection).size(11.0).color(Color32::GRAY));
        }

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Action Buttons =====
        ui.vertical_centered(|ui| {
            ui.add_enabled_ui(self.export_enabled, |ui| {
                let button = egui::Button::new(RichText::new("📄 Export").size(14.0))
                    .min_size(egui::vec2(150.0, 30.0));
                if ui.add(button).clicked() {
                    action = ControlPanelAction::Export;
                }
            });
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Progress Section =====
        ui.label(RichText::new("📊 Status").size(14.0).strong());
        ui.add_space(5.0);

        if self.progress > 0.0 && self.progress < 100.0 {
            ui.add(
                egui::ProgressBar::new(self.progress / 100.0)
                    .show_percentage()
                    .animate(true),
            );
            ui.add_space(5.0);
        }

        let status_color = if self.status.contains("Error") {
            Color32::from_rgb(220, 53, 69)
        } else if self.status.contains("Loaded") || self.status.contains("Exported") {
            Color32::from_rgb(40, 167, 69)
        } else {
            Color32::GRAY
        };
        ui.label(RichText::new(&self.status).size(11.0).color(status_color));

        action
    }

    /// Set progress and status
    pub fn set_progress(&mut self, progress: f32, status: &str) {
        self.progress = progress;
        self.status = status.to_string();
    }
}

/// Actions triggered by control panel
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPanelAction {
    None,
    BrowseCsv,
    FilterChanged,
    Export,
}
