//! Area selection applied to the normalized table.

use crate::data::columns;
use polars::prelude::*;
use std::collections::HashSet;

/// The set of areas picked in the sidebar, in selection order.
///
/// An empty selection means "no filter": the full table is used.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AreaFilter {
    selected: Vec<String>,
}

impl AreaFilter {
    pub fn new<I, S>(areas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut selected: Vec<String> = Vec::new();
        for area in areas {
            let area = area.into();
            if !selected.contains(&area) {
                selected.push(area);
            }
        }
        Self { selected }
    }

    /// Preselect the configured defaults that exist in the data, falling back
    /// to the first `fallback_count` areas when none of them do.
    pub fn with_defaults(available: &[String], defaults: &[String], fallback_count: usize) -> Self {
        let picked: Vec<&String> = available.iter().filter(|a| defaults.contains(a)).collect();
        if picked.is_empty() {
            Self::new(available.iter().take(fallback_count).cloned())
        } else {
            Self::new(picked.into_iter().cloned())
        }
    }

    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn contains(&self, area: &str) -> bool {
        self.selected.iter().any(|a| a == area)
    }

    pub fn toggle(&mut self, area: &str) {
        if let Some(pos) = self.selected.iter().position(|a| a == area) {
            self.selected.remove(pos);
        } else {
            self.selected.push(area.to_string());
        }
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    /// Rows whose area is in the selection; the whole table when the
    /// selection is empty or the table has no area column.
    pub fn apply(&self, df: &DataFrame) -> PolarsResult<DataFrame> {
        if self.selected.is_empty() || df.column(columns::AREA_NAME).is_err() {
            return Ok(df.clone());
        }
        filter_by_areas(df, &self.selected)
    }
}

/// Keep rows whose `area_name` is one of `areas`. Null areas never match.
pub fn filter_by_areas(df: &DataFrame, areas: &[String]) -> PolarsResult<DataFrame> {
    let wanted: HashSet<&str> = areas.iter().map(String::as_str).collect();
    let area_col = df.column(columns::AREA_NAME)?.cast(&DataType::String)?;
    let mask: BooleanChunked = area_col
        .str()?
        .into_iter()
        .map(|area| area.is_some_and(|a| wanted.contains(a)))
        .collect();
    df.filter(&mask)
}

/// Distinct non-null area names, sorted.
pub fn available_areas(df: &DataFrame) -> Vec<String> {
    let Ok(area_col) = df
        .column(columns::AREA_NAME)
        .and_then(|c| c.cast(&DataType::String))
    else {
        return Vec::new();
    };

    let mut areas: Vec<String> = area_col
        .str()
        .map(|ca| {
            ca.into_iter()
                .flatten()
                .map(str::to_string)
                .collect::<HashSet<String>>()
                .into_iter()
                .collect()
        })
        .unwrap_or_default();
    areas.sort();
    areas
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DataFrame {
        df!(
            "area_name" => [Some("Central"), Some("Pacific"), None, Some("Newton"), Some("Central")],
            "hour" => [1i32, 2, 3, 4, 5],
        )
        .unwrap()
    }

    #[test]
    fn test_empty_filter_keeps_everything() {
        let df = sample();
        let out = AreaFilter::default().apply(&df).unwrap();
        assert_eq!(out.height(), df.height());
    }

    #[test]
    fn test_filter_selects_areas() {
        let out = AreaFilter::new(["Central", "Newton"]).apply(&sample()).unwrap();
        let hours: Vec<Option<i32>> = out.column("hour").unwrap().i32().unwrap().into_iter().collect();
        assert_eq!(hours, vec![Some(1), Some(4), Some(5)]);
    }

    #[test]
    fn test_filter_without_area_column_is_noop() {
        let df = df!("hour" => [1i32, 2]).unwrap();
        let out = AreaFilter::new(["Central"]).apply(&df).unwrap();
        assert_eq!(out.height(), 2);
    }

    #[test]
    fn test_available_areas_sorted_distinct() {
        assert_eq!(available_areas(&sample()), vec!["Central", "Newton", "Pacific"]);
        assert!(available_areas(&df!("x" => [1i32]).unwrap()).is_empty());
    }

    #[test]
    fn test_defaults_and_fallback() {
        let available: Vec<String> = ["77th Street", "Central", "Harbor", "Newton"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let defaults = vec!["Central".to_string(), "Pacific".to_string()];

        let filter = AreaFilter::with_defaults(&available, &defaults, 3);
        assert_eq!(filter.selected(), &["Central".to_string()]);

        let filter = AreaFilter::with_defaults(&available, &["Topanga".to_string()], 3);
        assert_eq!(filter.selected(), &available[..3]);
    }

    #[test]
    fn test_toggle() {
        let mut filter = AreaFilter::new(["Central", "Central"]);
        assert_eq!(filter.selected().len(), 1);
        filter.toggle("Pacific");
        filter.toggle("Central");
        assert_eq!(filter.selected(), &["Pacific".to_string()]);
        assert!(filter.contains("Pacific"));
    }
}
