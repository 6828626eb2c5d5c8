//! Aggregator Module
//! Grouped counts and top-N rankings over the normalized incident table.
//!
//! Every operation checks its required columns first and fails with
//! [`AnalysisError::InvalidSchema`] naming all of the missing ones. Rows whose
//! grouping keys are null are not counted.
//!
//! Rankings are stable: groups with equal counts keep the order in which
//! they first appear in the table.

use crate::data::columns::{AREA_NAME, CRIME_TYPE, HOUR, LAT, LON};
use crate::data::filter_by_areas;
use crate::stats::{AreaHourTotal, AreaTotal, CrimeTypeCount, LocationCount};
use polars::prelude::*;
use thiserror::Error;

const CRIME_COUNT: &str = "crime_count";

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("{operation} requires missing column(s): {}", missing.join(", "))]
    InvalidSchema {
        operation: &'static str,
        missing: Vec<String>,
    },
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
}

impl AnalysisError {
    pub fn is_invalid_schema(&self) -> bool {
        matches!(self, AnalysisError::InvalidSchema { .. })
    }
}

fn has_column(df: &DataFrame, name: &str) -> bool {
    df.column(name).is_ok()
}

fn require(df: &DataFrame, operation: &'static str, required: &[&str]) -> Result<(), AnalysisError> {
    let missing: Vec<String> = required
        .iter()
        .filter(|name| !has_column(df, name))
        .map(|name| name.to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(AnalysisError::InvalidSchema { operation, missing })
    }
}

fn str_values(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<String>>> {
    let column = df.column(name)?.cast(&DataType::String)?;
    Ok(column
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

fn f64_values(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<f64>>> {
    let column = df.column(name)?.cast(&DataType::Float64)?;
    Ok(column.f64()?.into_iter().collect())
}

fn i32_values(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<i32>>> {
    let column = df.column(name)?.cast(&DataType::Int32)?;
    Ok(column.i32()?.into_iter().collect())
}

fn count_values(df: &DataFrame) -> PolarsResult<Vec<u64>> {
    let column = df.column(CRIME_COUNT)?.cast(&DataType::UInt64)?;
    Ok(column.u64()?.into_iter().map(|v| v.unwrap_or(0)).collect())
}

/// Count rows per distinct combination of `keys`, in first-seen order.
fn count_by(df: &DataFrame, keys: &[&str]) -> PolarsResult<DataFrame> {
    let not_null = keys
        .iter()
        .map(|k| col(*k).is_not_null())
        .reduce(|acc, e| acc.and(e))
        .unwrap_or_else(|| lit(true));

    df.clone()
        .lazy()
        .filter(not_null)
        .group_by_stable(keys.iter().map(|k| col(*k)).collect::<Vec<_>>())
        .agg([len().alias(CRIME_COUNT)])
        .collect()
}

/// Keep the first `n` rows of every area; `rows` must already be grouped by area.
fn take_per_area<T>(rows: Vec<T>, n: usize, area: impl Fn(&T) -> &str) -> Vec<T> {
    let mut taken: Vec<T> = Vec::new();
    let mut current: Option<String> = None;
    let mut in_area = 0usize;

    for row in rows {
        if current.as_deref() != Some(area(&row)) {
            current = Some(area(&row).to_string());
            in_area = 0;
        }
        if in_area < n {
            taken.push(row);
        }
        in_area += 1;
    }

    taken
}

/// Computes aggregate tables for the dashboard.
pub struct Aggregator;

impl Aggregator {
    /// Total crimes per area, sorted by area name.
    ///
    /// When both coordinate columns exist each area carries the coordinates
    /// of its first row in the table.
    pub fn crime_by_area(df: &DataFrame) -> Result<Vec<AreaTotal>, AnalysisError> {
        require(df, "crime_by_area", &[AREA_NAME])?;
        let with_coords = has_column(df, LAT) && has_column(df, LON);

        let mut aggs = vec![len().alias(CRIME_COUNT)];
        if with_coords {
            aggs.push(col(LAT).first());
            aggs.push(col(LON).first());
        }

        let grouped = df
            .clone()
            .lazy()
            .filter(col(AREA_NAME).is_not_null())
            .group_by_stable([col(AREA_NAME)])
            .agg(aggs)
            .collect()?;

        let areas = str_values(&grouped, AREA_NAME)?;
        let counts = count_values(&grouped)?;
        let (lats, lons) = if with_coords {
            (f64_values(&grouped, LAT)?, f64_values(&grouped, LON)?)
        } else {
            (vec![None; grouped.height()], vec![None; grouped.height()])
        };

        let mut totals: Vec<AreaTotal> = areas
            .into_iter()
            .zip(counts)
            .zip(lats.into_iter().zip(lons))
            .filter_map(|((area, crime_count), (lat, lon))| {
                Some(AreaTotal {
                    area_name: area?,
                    crime_count,
                    lat,
                    lon,
                })
            })
            .collect();

        totals.sort_by(|a, b| a.area_name.cmp(&b.area_name));
        Ok(totals)
    }

    /// Crimes per (area, hour), sorted by area then hour.
    pub fn time_area_counts(df: &DataFrame) -> Result<Vec<AreaHourTotal>, AnalysisError> {
        require(df, "time_area_counts", &[AREA_NAME, HOUR])?;

        let grouped = count_by(df, &[AREA_NAME, HOUR])?;
        let areas = str_values(&grouped, AREA_NAME)?;
        let hours = i32_values(&grouped, HOUR)?;
        let counts = count_values(&grouped)?;

        let mut totals: Vec<AreaHourTotal> = areas
            .into_iter()
            .zip(hours)
            .zip(counts)
            .filter_map(|((area, hour), crime_count)| {
                Some(AreaHourTotal {
                    area_name: area?,
                    hour: hour?,
                    crime_count,
                })
            })
            .collect();

        totals.sort_by(|a, b| a.area_name.cmp(&b.area_name).then(a.hour.cmp(&b.hour)));
        Ok(totals)
    }

    /// The `top_n` most frequent coordinate pairs within one area.
    pub fn top_locations_for_area(
        df: &DataFrame,
        area_name: &str,
        top_n: usize,
    ) -> Result<Vec<LocationCount>, AnalysisError> {
        require(df, "top_locations_for_area", &[AREA_NAME, LAT, LON])?;

        let in_area = filter_by_areas(df, &[area_name.to_string()])?;
        let mut locations = Self::location_counts(&in_area)?;
        locations.sort_by(|a, b| b.crime_count.cmp(&a.crime_count));
        locations.truncate(top_n);
        Ok(locations)
    }

    /// Up to `top_n` most frequent coordinate pairs for each of `areas`,
    /// sorted by area name then count descending.
    pub fn top_locations_for_areas(
        df: &DataFrame,
        areas: &[String],
        top_n: usize,
    ) -> Result<Vec<LocationCount>, AnalysisError> {
        require(df, "top_locations_for_areas", &[AREA_NAME, LAT, LON])?;

        let selected = filter_by_areas(df, areas)?;
        let mut locations = Self::location_counts(&selected)?;
        locations.sort_by(|a, b| {
            a.area_name
                .cmp(&b.area_name)
                .then(b.crime_count.cmp(&a.crime_count))
        });
        Ok(take_per_area(locations, top_n, |l| l.area_name.as_str()))
    }

    /// Up to `top_n` most frequent crime descriptions for each of `areas`,
    /// sorted by area name then count descending.
    pub fn top_crime_types_by_area(
        df: &DataFrame,
        areas: &[String],
        top_n: usize,
    ) -> Result<Vec<CrimeTypeCount>, AnalysisError> {
        require(df, "top_crime_types_by_area", &[AREA_NAME, CRIME_TYPE])?;

        let selected = filter_by_areas(df, areas)?;
        let grouped = count_by(&selected, &[AREA_NAME, CRIME_TYPE])?;
        let area_names = str_values(&grouped, AREA_NAME)?;
        let crime_types = str_values(&grouped, CRIME_TYPE)?;
        let counts = count_values(&grouped)?;

        let mut types: Vec<CrimeTypeCount> = area_names
            .into_iter()
            .zip(crime_types)
            .zip(counts)
            .filter_map(|((area, crime_type), crime_count)| {
                Some(CrimeTypeCount {
                    area_name: area?,
                    crime_type: crime_type?,
                    crime_count,
                })
            })
            .collect();

        types.sort_by(|a, b| {
            a.area_name
                .cmp(&b.area_name)
                .then(b.crime_count.cmp(&a.crime_count))
        });
        Ok(take_per_area(types, top_n, |t| t.area_name.as_str()))
    }

    /// Crimes per (area, lat, lon) in first-seen order.
    fn location_counts(df: &DataFrame) -> Result<Vec<LocationCount>, AnalysisError> {
        let grouped = count_by(df, &[AREA_NAME, LAT, LON])?;
        let areas = str_values(&grouped, AREA_NAME)?;
        let lats = f64_values(&grouped, LAT)?;
        let lons = f64_values(&grouped, LON)?;
        let counts = count_values(&grouped)?;

        Ok(areas
            .into_iter()
            .zip(lats.into_iter().zip(lons))
            .zip(counts)
            .filter_map(|((area, (lat, lon)), crime_count)| {
                Some(LocationCount {
                    area_name: area?,
                    lat: lat?,
                    lon: lon?,
                    crime_count,
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn incidents() -> DataFrame {
        df!(
            "area_name" => ["Central", "Central", "Pacific", "Central", "Pacific", "Newton"],
            "hour" => [9i32, 9, 14, 23, 14, 0],
            "crm_cd_desc" => [
                "BATTERY - SIMPLE ASSAULT",
                "VEHICLE - STOLEN",
                "VEHICLE - STOLEN",
                "BATTERY - SIMPLE ASSAULT",
                "BURGLARY",
                "VANDALISM",
            ],
            "lat" => [34.04, 34.05, 33.99, 34.04, 33.98, 34.01],
            "lon" => [-118.25, -118.24, -118.44, -118.25, -118.43, -118.26],
        )
        .unwrap()
    }

    fn areas(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_crime_by_area_counts_and_first_seen_coords() {
        let totals = Aggregator::crime_by_area(&incidents()).unwrap();

        let names: Vec<&str> = totals.iter().map(|t| t.area_name.as_str()).collect();
        assert_eq!(names, vec!["Central", "Newton", "Pacific"]);

        let central = &totals[0];
        assert_eq!(central.crime_count, 3);
        assert_eq!(central.coordinates(), Some((34.04, -118.25)));
        assert_eq!(totals[2].coordinates(), Some((33.99, -118.44)));

        let sum: u64 = totals.iter().map(|t| t.crime_count).sum();
        assert_eq!(sum, 6);
    }

    #[test]
    fn test_crime_by_area_without_coordinates() {
        let df = df!("area_name" => ["Central", "Central"], "lat" => [34.0, 34.1]).unwrap();
        let totals = Aggregator::crime_by_area(&df).unwrap();
        assert_eq!(totals.len(), 1);
        assert_eq!(totals[0].crime_count, 2);
        assert_eq!(totals[0].coordinates(), None);
    }

    #[test]
    fn test_crime_by_area_requires_area_name() {
        let df = df!("hour" => [1i32]).unwrap();
        match Aggregator::crime_by_area(&df) {
            Err(AnalysisError::InvalidSchema { missing, .. }) => {
                assert_eq!(missing, vec!["area_name".to_string()]);
            }
            other => panic!("expected InvalidSchema, got {other:?}"),
        }
    }

    #[test]
    fn test_null_areas_are_not_counted() {
        let df = df!("area_name" => [Some("Central"), None, Some("Central")]).unwrap();
        let totals = Aggregator::crime_by_area(&df).unwrap();
        assert_eq!(totals.len(), 1);
        assert_eq!(totals[0].crime_count, 2);
    }

    #[test]
    fn test_time_area_counts() {
        let totals = Aggregator::time_area_counts(&incidents()).unwrap();
        let rows: Vec<(&str, i32, u64)> = totals
            .iter()
            .map(|t| (t.area_name.as_str(), t.hour, t.crime_count))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("Central", 9, 2),
                ("Central", 23, 1),
                ("Newton", 0, 1),
                ("Pacific", 14, 2),
            ]
        );
    }

    #[test]
    fn test_time_area_counts_names_all_missing_columns() {
        let df = df!("lat" => [1.0]).unwrap();
        let err = Aggregator::time_area_counts(&df).unwrap_err();
        match err {
            AnalysisError::InvalidSchema { operation, missing } => {
                assert_eq!(operation, "time_area_counts");
                assert_eq!(missing, areas(&["area_name", "hour"]));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_top_locations_for_area() {
        let top = Aggregator::top_locations_for_area(&incidents(), "Central", 5).unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].crime_count, 2);
        assert_eq!((top[0].lat, top[0].lon), (34.04, -118.25));
        assert_eq!(top[1].crime_count, 1);

        let top_one = Aggregator::top_locations_for_area(&incidents(), "Central", 1).unwrap();
        assert_eq!(top_one.len(), 1);

        assert!(Aggregator::top_locations_for_area(&incidents(), "Central", 0)
            .unwrap()
            .is_empty());
        assert!(Aggregator::top_locations_for_area(&incidents(), "Harbor", 5)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_top_locations_ties_are_stable() {
        // Counts [5, 3, 3]; the two ties keep their first-seen order.
        let mut area = Vec::new();
        let mut lat = Vec::new();
        let mut lon = Vec::new();
        for (la, lo, n) in [(34.2, -118.2, 3), (34.1, -118.1, 5), (34.3, -118.3, 3)] {
            for _ in 0..n {
                area.push("Central");
                lat.push(la);
                lon.push(lo);
            }
        }
        let df = df!("area_name" => area, "lat" => lat, "lon" => lon).unwrap();

        let first = Aggregator::top_locations_for_areas(&df, &areas(&["Central"]), 5).unwrap();
        let second = Aggregator::top_locations_for_areas(&df, &areas(&["Central"]), 5).unwrap();

        let counts: Vec<u64> = first.iter().map(|l| l.crime_count).collect();
        assert_eq!(counts, vec![5, 3, 3]);
        assert_eq!(first, second);
        assert_eq!(first[1].lat, 34.2);
        assert_eq!(first[2].lat, 34.3);
    }

    #[test]
    fn test_top_locations_for_areas_ordering() {
        let top =
            Aggregator::top_locations_for_areas(&incidents(), &areas(&["Pacific", "Central"]), 1)
                .unwrap();
        let rows: Vec<(&str, u64)> = top
            .iter()
            .map(|l| (l.area_name.as_str(), l.crime_count))
            .collect();
        assert_eq!(rows, vec![("Central", 2), ("Pacific", 1)]);
    }

    #[test]
    fn test_top_locations_require_coordinates() {
        let df = df!("area_name" => ["Central"], "lat" => [34.0]).unwrap();
        let err = Aggregator::top_locations_for_areas(&df, &areas(&["Central"]), 5).unwrap_err();
        assert!(err.is_invalid_schema());
        assert!(err.to_string().contains("lon"));
    }

    #[test]
    fn test_top_crime_types_returns_fewer_than_n() {
        let top = Aggregator::top_crime_types_by_area(
            &incidents(),
            &areas(&["Central", "Pacific"]),
            3,
        )
        .unwrap();

        let pacific: Vec<&CrimeTypeCount> =
            top.iter().filter(|t| t.area_name == "Pacific").collect();
        assert_eq!(pacific.len(), 2);

        let rows: Vec<(&str, &str, u64)> = top
            .iter()
            .map(|t| (t.area_name.as_str(), t.crime_type.as_str(), t.crime_count))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("Central", "BATTERY - SIMPLE ASSAULT", 2),
                ("Central", "VEHICLE - STOLEN", 1),
                ("Pacific", "VEHICLE - STOLEN", 1),
                ("Pacific", "BURGLARY", 1),
            ]
        );
    }

    #[test]
    fn test_top_crime_types_zero_and_empty_selection() {
        let df = incidents();
        assert!(Aggregator::top_crime_types_by_area(&df, &areas(&["Central"]), 0)
            .unwrap()
            .is_empty());
        assert!(Aggregator::top_crime_types_by_area(&df, &[], 3)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_top_n_never_exceeds_limits() {
        let df = incidents();
        let selected = areas(&["Central", "Pacific", "Newton"]);
        for n in 0..5 {
            let top = Aggregator::top_crime_types_by_area(&df, &selected, n).unwrap();
            for area in &selected {
                let per_area: Vec<u64> = top
                    .iter()
                    .filter(|t| &t.area_name == area)
                    .map(|t| t.crime_count)
                    .collect();
                assert!(per_area.len() <= n);
                assert!(per_area.windows(2).all(|w| w[0] >= w[1]));
            }
        }
    }
}
