//! Charts module - Chart rendering

mod heatmap;
mod plotter;
mod renderer;

pub use heatmap::{ylgnbu, HeatmapGrid, HOURS};
pub use plotter::ChartPlotter;
pub use renderer::{RenderError, StaticChartRenderer};
