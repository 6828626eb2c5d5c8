//! Dataset snapshot figures: shape, columns, missing and distinct values.

use crate::stats::ColumnCount;
use polars::prelude::*;

/// (rows, columns)
pub fn dataset_shape(df: &DataFrame) -> (usize, usize) {
    (df.height(), df.width())
}

pub fn list_columns(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Missing values per column, in column order.
pub fn null_counts(df: &DataFrame) -> Vec<ColumnCount> {
    df.get_columns()
        .iter()
        .map(|col| ColumnCount {
            column: col.name().to_string(),
            count: col.null_count(),
        })
        .collect()
}

/// Distinct non-null values per column, in column order.
pub fn unique_counts(df: &DataFrame) -> PolarsResult<Vec<ColumnCount>> {
    df.get_columns()
        .iter()
        .map(|col| {
            let count = col.as_materialized_series().drop_nulls().n_unique()?;
            Ok(ColumnCount {
                column: col.name().to_string(),
                count,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DataFrame {
        df!(
            "area_name" => [Some("Central"), Some("Central"), None, Some("Pacific")],
            "hour" => [Some(1i32), None, None, Some(1)],
            "lat" => [34.0, 34.0, 34.1, 33.9],
        )
        .unwrap()
    }

    #[test]
    fn test_shape_and_columns() {
        let df = sample();
        assert_eq!(dataset_shape(&df), (4, 3));
        assert_eq!(list_columns(&df), vec!["area_name", "hour", "lat"]);
    }

    #[test]
    fn test_null_counts_in_column_order() {
        let counts: Vec<(String, usize)> = null_counts(&sample())
            .into_iter()
            .map(|c| (c.column, c.count))
            .collect();
        assert_eq!(
            counts,
            vec![
                ("area_name".to_string(), 1),
                ("hour".to_string(), 2),
                ("lat".to_string(), 0),
            ]
        );
    }

    #[test]
    fn test_unique_counts_ignore_nulls() {
        let counts: Vec<usize> = unique_counts(&sample())
            .unwrap()
            .into_iter()
            .map(|c| c.count)
            .collect();
        assert_eq!(counts, vec![2, 1, 3]);
    }

    #[test]
    fn test_empty_table() {
        let df = DataFrame::empty();
        assert_eq!(dataset_shape(&df), (0, 0));
        assert!(null_counts(&df).is_empty());
        assert!(unique_counts(&df).unwrap().is_empty());
    }
}
