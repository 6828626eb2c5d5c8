//! Area × hour matrix behind both heatmap renderers.

use crate::stats::AreaHourTotal;

pub const HOURS: usize = 24;

/// Crime counts with one row per area (sorted) and one column per hour.
/// Hours without incidents are 0.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HeatmapGrid {
    pub areas: Vec<String>,
    pub cells: Vec<[u64; HOURS]>,
    pub max: u64,
}

impl HeatmapGrid {
    pub fn from_counts(counts: &[AreaHourTotal]) -> Self {
        let mut areas: Vec<String> = counts.iter().map(|c| c.area_name.clone()).collect();
        areas.sort();
        areas.dedup();

        let mut cells = vec![[0u64; HOURS]; areas.len()];
        for count in counts {
            let Ok(hour) = usize::try_from(count.hour) else {
                continue;
            };
            if hour >= HOURS {
                continue;
            }
            if let Ok(row) = areas.binary_search(&count.area_name) {
                cells[row][hour] += count.crime_count;
            }
        }

        let max = cells.iter().flatten().copied().max().unwrap_or(0);
        Self { areas, cells, max }
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }

    pub fn value(&self, row: usize, hour: usize) -> u64 {
        self.cells
            .get(row)
            .and_then(|r| r.get(hour))
            .copied()
            .unwrap_or(0)
    }

    /// Cell value scaled to [0, 1] against the largest cell.
    pub fn intensity(&self, row: usize, hour: usize) -> f64 {
        if self.max == 0 {
            0.0
        } else {
            self.value(row, hour) as f64 / self.max as f64
        }
    }
}

// Yellow-green-blue sequential scale, light to dark.
const YLGNBU: [(u8, u8, u8); 9] = [
    (255, 255, 217),
    (237, 248, 177),
    (199, 233, 180),
    (127, 205, 187),
    (65, 182, 196),
    (29, 145, 192),
    (34, 94, 168),
    (37, 52, 148),
    (8, 29, 88),
];

/// Color for an intensity in [0, 1].
pub fn ylgnbu(t: f64) -> (u8, u8, u8) {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let scaled = t * (YLGNBU.len() - 1) as f64;
    let lower = scaled.floor() as usize;
    let upper = (lower + 1).min(YLGNBU.len() - 1);
    let frac = scaled - lower as f64;

    let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;
    let (r0, g0, b0) = YLGNBU[lower];
    let (r1, g1, b1) = YLGNBU[upper];
    (lerp(r0, r1), lerp(g0, g1), lerp(b0, b1))
}
