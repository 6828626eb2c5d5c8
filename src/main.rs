//! CrimeScope - Crime Incident Analysis Dashboard
//!
//! Loads the configured incident CSV and shows it in an interactive window.

use anyhow::{Context, Result};
use crimescope::config::Config;
use crimescope::gui::CrimeScopeApp;
use eframe::egui;

fn init_logger() {
    pretty_env_logger::formatted_builder()
        .filter_level(log::LevelFilter::Info)
        .parse_env("RUST_LOG")
        .try_init()
        .ok();
}

fn main() -> Result<()> {
    init_logger();

    let config = Config::load_default().context("Failed to load configuration")?;
    log::info!("Dataset: {}", config.data.path.display());

    // Configure native options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 850.0])
            .with_min_inner_size([1000.0, 650.0])
            .with_title("CrimeScope"),
        ..Default::default()
    };

    eframe::run_native(
        "CrimeScope",
        options,
        Box::new(|cc| Ok(Box::new(CrimeScopeApp::new(cc, config)))),
    )
    .map_err(|e| anyhow::anyhow!("Window error: {e}"))
}
