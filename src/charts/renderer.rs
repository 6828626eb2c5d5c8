//! Static Chart Renderer
//! Draws the dashboard charts to PNG files with plotters.
//!
//! Charts:
//! 1. "Total Crimes by Area": horizontal bars, largest on top
//! 2. "Crime Count by Time and Area": hour (x) × area (y) heatmap

use crate::charts::{ylgnbu, HeatmapGrid, HOURS};
use crate::stats::AreaTotal;
use image::RgbImage;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::Path;
use thiserror::Error;

const BAR_COLOR: RGBColor = RGBColor(31, 119, 180);

/// Largest accepted width or height of an exported chart, in pixels.
pub const MAX_SIDE: u32 = 16_384;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Nothing to draw")]
    NoData,
    #[error("Invalid chart size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },
    #[error("Drawing failed: {0}")]
    Drawing(String),
    #[error("Image encoding failed: {0}")]
    Image(#[from] image::ImageError),
}

type DrawResult = Result<(), Box<dyn std::error::Error>>;

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Horizontal bar chart of `totals`, which are drawn in the given order
    /// from the top down.
    pub fn render_area_bars(
        totals: &[AreaTotal],
        path: &Path,
        width: u32,
        height: u32,
    ) -> Result<(), RenderError> {
        if totals.is_empty() {
            return Err(RenderError::NoData);
        }
        Self::render_png(path, width, height, |root| Self::draw_area_bars(root, totals))
    }

    pub fn render_time_area_heatmap(
        grid: &HeatmapGrid,
        path: &Path,
        width: u32,
        height: u32,
    ) -> Result<(), RenderError> {
        if grid.is_empty() {
            return Err(RenderError::NoData);
        }
        Self::render_png(path, width, height, |root| Self::draw_heatmap(root, grid))
    }

    fn render_png<F>(path: &Path, width: u32, height: u32, draw: F) -> Result<(), RenderError>
    where
        F: FnOnce(DrawingArea<BitMapBackend<'_>, Shift>) -> DrawResult,
    {
        let len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|pixels| pixels.checked_mul(3))
            .filter(|_| (1..=MAX_SIDE).contains(&width) && (1..=MAX_SIDE).contains(&height))
            .ok_or(RenderError::InvalidSize { width, height })?;

        let mut buffer = vec![0u8; len];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
            draw(root).map_err(|e| RenderError::Drawing(e.to_string()))?;
        }

        let img = RgbImage::from_raw(width, height, buffer)
            .ok_or_else(|| RenderError::Drawing("buffer size mismatch".to_string()))?;
        img.save(path)?;
        log::info!("Wrote chart {}", path.display());
        Ok(())
    }

    fn draw_area_bars<DB>(root: DrawingArea<DB, Shift>, totals: &[AreaTotal]) -> DrawResult
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        root.fill(&WHITE)?;

        let n = totals.len() as i32;
        let x_max = totals.iter().map(|t| t.crime_count).max().unwrap_or(1).max(1) as f64 * 1.05;
        let names: Vec<String> = totals.iter().map(|t| t.area_name.clone()).collect();

        let mut chart = ChartBuilder::on(&root)
            .caption("Total Crimes by Area", ("sans-serif", 24))
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(130)
            .build_cartesian_2d(0f64..x_max, (0..n).into_segmented())?;

        // Row 0 is the bottom of the chart, so the first area goes on row n - 1.
        let label_for = |v: &SegmentValue<i32>| match v {
            SegmentValue::CenterOf(row) => usize::try_from(n - 1 - row)
                .ok()
                .and_then(|i| names.get(i).cloned())
                .unwrap_or_default(),
            _ => String::new(),
        };

        chart
            .configure_mesh()
            .disable_y_mesh()
            .y_labels(totals.len())
            .y_label_formatter(&label_for)
            .x_label_formatter(&|v| format!("{:.0}", v))
            .x_desc("Number of Crimes")
            .y_desc("Area Name")
            .draw()?;

        chart.draw_series(totals.iter().enumerate().map(|(i, total)| {
            let row = n - 1 - i as i32;
            Rectangle::new(
                [
                    (0.0, SegmentValue::Exact(row)),
                    (total.crime_count as f64, SegmentValue::Exact(row + 1)),
                ],
                BAR_COLOR.filled(),
            )
        }))?;

        root.present()?;
        Ok(())
    }

    fn draw_heatmap<DB>(root: DrawingArea<DB, Shift>, grid: &HeatmapGrid) -> DrawResult
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        root.fill(&WHITE)?;

        let rows = grid.areas.len() as i32;
        let mut chart = ChartBuilder::on(&root)
            .caption("Crime Count by Time and Area", ("sans-serif", 24))
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(130)
            .build_cartesian_2d((0..HOURS as i32).into_segmented(), (0..rows).into_segmented())?;

        let area_label = |v: &SegmentValue<i32>| match v {
            SegmentValue::CenterOf(row) => usize::try_from(*row)
                .ok()
                .and_then(|i| grid.areas.get(i).cloned())
                .unwrap_or_default(),
            _ => String::new(),
        };
        let hour_label = |v: &SegmentValue<i32>| match v {
            SegmentValue::CenterOf(hour) => hour.to_string(),
            _ => String::new(),
        };

        chart
            .configure_mesh()
            .disable_mesh()
            .x_labels(HOURS)
            .y_labels(grid.areas.len())
            .x_label_formatter(&hour_label)
            .y_label_formatter(&area_label)
            .x_desc("Hour of Day")
            .y_desc("Area Name")
            .draw()?;

        chart.draw_series((0..grid.areas.len()).flat_map(|row| {
            (0..HOURS).map(move |hour| {
                let (r, g, b) = ylgnbu(grid.intensity(row, hour));
                let (x, y) = (hour as i32, row as i32);
                Rectangle::new(
                    [
                        (SegmentValue::Exact(x), SegmentValue::Exact(y)),
                        (SegmentValue::Exact(x + 1), SegmentValue::Exact(y + 1)),
                    ],
                    RGBColor(r, g, b).filled(),
                )
            })
        }))?;

        root.present()?;
        Ok(())
    }
}
