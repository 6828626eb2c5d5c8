//! GUI module - User interface components

mod app;
mod chart_viewer;
mod control_panel;

pub use app::CrimeScopeApp;
pub use chart_viewer::{ChartViewer, ChartViewerAction, MapKind, Tab};
pub use control_panel::{ControlPanel, ControlPanelAction};
