//! CrimeScope Main Application
//! Main window with control panel and chart viewer.

use crate::config::Config;
use crate::dashboard::DashboardSnapshot;
use crate::data::{
    available_areas, AreaFilter, CachePolicy, DataLoader, DataPipeline, DatasetCache, Normalizer,
    PipelineError,
};
use crate::gui::{ChartViewer, ChartViewerAction, ControlPanel, ControlPanelAction, MapKind};
use egui::SidePanel;
use polars::prelude::DataFrame;
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver};
use std::sync::Arc;
use std::thread;

/// Loading result from background thread
enum LoadResult {
    Progress(f32, String),
    Complete { path: PathBuf, df: Arc<DataFrame> },
    Error(PipelineError),
}

/// Main application window.
pub struct CrimeScopeApp {
    config: Config,
    pipeline: Arc<DataPipeline>,
    cache: Arc<DatasetCache>,
    dataset: Option<Arc<DataFrame>>,

    control_panel: ControlPanel,
    chart_viewer: ChartViewer,

    // Async loading
    load_rx: Option<Receiver<LoadResult>>,
    is_loading: bool,
}

impl CrimeScopeApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: Config) -> Self {
        let mut app = Self::with_config(config);
        let path = app.config.data.path.clone();
        app.start_load(path);
        app
    }

    fn with_config(config: Config) -> Self {
        let loader =
            DataLoader::new().with_infer_schema_rows(config.data.schema_inference_rows());
        let policy = if config.data.use_cache {
            CachePolicy::Memoize
        } else {
            CachePolicy::Bypass
        };

        Self {
            pipeline: Arc::new(DataPipeline::new(loader, Normalizer::new())),
            cache: Arc::new(DatasetCache::new(policy)),
            dataset: None,
            control_panel: ControlPanel::new(),
            chart_viewer: ChartViewer::new(),
            load_rx: None,
            is_loading: false,
            config,
        }
    }

    /// Ask for another CSV file and load it.
    fn handle_browse_csv(&mut self) {
        if self.is_loading {
            return;
        }

        if let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV Files", &["csv"])
            .pick_file()
        {
            self.start_load(path);
        }
    }

    /// Load and normalize `path` in a background thread.
    fn start_load(&mut self, path: PathBuf) {
        self.chart_viewer.clear();
        self.dataset = None;
        self.control_panel.export_enabled = false;
        self.control_panel.data_path = Some(path.clone());
        self.control_panel.set_progress(5.0, "Loading CSV file...");
        self.is_loading = true;

        let (tx, rx) = channel();
        self.load_rx = Some(rx);

        let pipeline = Arc::clone(&self.pipeline);
        let cache = Arc::clone(&self.cache);

        thread::spawn(move || {
            let _ = tx.send(LoadResult::Progress(30.0, "Reading and cleaning data...".to_string()));

            let result = match pipeline.run_cached(&cache, &path) {
                Ok(df) => LoadResult::Complete { path, df },
                Err(e) => LoadResult::Error(e),
            };
            let _ = tx.send(result);
        });
    }

    /// Check for loading results
    fn check_load_results(&mut self) {
        let rx = self.load_rx.take();
        if let Some(rx) = rx {
            let mut should_keep_receiver = true;

            while let Ok(result) = rx.try_recv() {
                match result {
                    LoadResult::Progress(progress, status) => {
                        self.control_panel.set_progress(progress, &status);
                    }
                    LoadResult::Complete { path, df } => {
                        self.on_loaded(df);
                        let (rows, cols) = (self.dataset_rows(), self.dataset_cols());
                        log::info!("Dashboard ready for {}", path.display());
                        self.control_panel.set_progress(
                            100.0,
                            &format!("Loaded {} rows, {} columns", rows, cols),
                        );
                        self.is_loading = false;
                        should_keep_receiver = false;
                    }
                    LoadResult::Error(error) => {
                        log::error!("{error}");
                        self.control_panel
                            .set_progress(0.0, &format!("Error: {}", error));
                        self.is_loading = false;
                        should_keep_receiver = false;
                    }
                }
            }

            if should_keep_receiver {
                self.load_rx = Some(rx);
            }
        }
    }

    fn on_loaded(&mut self, df: Arc<DataFrame>) {
        let areas = available_areas(&df);
        let filter = AreaFilter::with_defaults(
            &areas,
            &self.config.filters.default_areas,
            self.config.filters.fallback_area_count,
        );
        self.control_panel.update_areas(areas, filter);
        self.dataset = Some(df);
        self.refresh_dashboard();
    }

    fn dataset_rows(&self) -> usize {
        self.dataset.as_ref().map_or(0, |df| df.height())
    }

    fn dataset_cols(&self) -> usize {
        self.dataset.as_ref().map_or(0, |df| df.width())
    }

    /// Recompute every section for the current area filter.
    fn refresh_dashboard(&mut self) {
        let Some(df) = &self.dataset else {
            return;
        };

        match DashboardSnapshot::compute(df, &self.control_panel.filter, &self.config.analysis) {
            Ok(snapshot) => {
                self.chart_viewer.set_snapshot(
                    snapshot,
                    &self.config.map,
                    self.config.analysis.top_locations,
                );
                self.control_panel.export_enabled = true;
            }
            Err(e) => {
                log::error!("Dashboard refresh failed: {e}");
                self.chart_viewer.clear();
                self.control_panel.export_enabled = false;
                self.control_panel
                    .set_progress(0.0, &format!("Error: {}", e));
            }
        }
    }

    /// Write charts and maps for the current filter into a chosen folder.
    fn handle_export(&mut self) {
        let Some(snapshot) = self.chart_viewer.snapshot() else {
            self.control_panel.set_progress(0.0, "Nothing to export");
            return;
        };

        let Some(dir) = rfd::FileDialog::new().pick_folder() else {
            return;
        };

        let report = snapshot.export(&dir, &self.config);
        self.control_panel.set_progress(100.0, &report.summary());
    }

    /// Write the map to the temp directory and open it in the browser.
    fn handle_open_map(&mut self, kind: MapKind) {
        let Some(map) = self.chart_viewer.map(kind) else {
            return;
        };

        let path = std::env::temp_dir().join(format!("crimescope_{}", kind.file_name()));
        let result = map
            .write_html(&path, kind.title())
            .map_err(|e| e.to_string())
            .and_then(|()| open::that(&path).map_err(|e| e.to_string()));

        if let Err(e) = result {
            log::warn!("Could not open {}: {e}", path.display());
            self.control_panel
                .set_progress(0.0, &format!("Error: could not open map: {}", e));
        }
    }
}

impl eframe::App for CrimeScopeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.check_load_results();

        // Request repaint while loading
        if self.is_loading {
            ctx.request_repaint();
        }

        // Left panel - Control Panel
        SidePanel::left("control_panel")
            .min_width(260.0)
            .max_width(320.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    match self.control_panel.show(ui) {
                        ControlPanelAction::BrowseCsv => self.handle_browse_csv(),
                        ControlPanelAction::FilterChanged => self.refresh_dashboard(),
                        ControlPanelAction::Export => self.handle_export(),
                        ControlPanelAction::None => {}
                    }
                });
            });

        // Central panel - Chart Viewer
        egui::CentralPanel::default().show(ctx, |ui| {
            if let ChartViewerAction::OpenMap(kind) = self.chart_viewer.show(ui) {
                self.handle_open_map(kind);
            }
        });
    }
}
