//! CSV Data Loader Module
//! Reads the incident export into a Polars DataFrame, untouched.

use polars::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Data unavailable at {}: {reason}", path.display())]
    DataUnavailable { path: PathBuf, reason: String },
}

impl LoaderError {
    fn unavailable(path: &Path, reason: impl ToString) -> Self {
        LoaderError::DataUnavailable {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}

/// Handles CSV file loading with Polars.
#[derive(Debug, Clone)]
pub struct DataLoader {
    /// Rows scanned for type inference; `None` scans the whole file.
    infer_schema_rows: Option<usize>,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    pub fn new() -> Self {
        Self {
            infer_schema_rows: None,
        }
    }

    pub fn with_infer_schema_rows(mut self, rows: Option<usize>) -> Self {
        self.infer_schema_rows = rows;
        self
    }

    /// Load a CSV file using Polars.
    ///
    /// Columns and rows come back exactly as present in the source; only the
    /// column types are inferred. When a limited inference window picks a
    /// type that a later row breaks, the file is read again with the whole
    /// file scanned. A row that still does not fit fails the load.
    pub fn load_csv(&self, file_path: &Path) -> Result<DataFrame, LoaderError> {
        if !file_path.is_file() {
            return Err(LoaderError::unavailable(file_path, "file not found"));
        }

        log::info!("Reading CSV {}", file_path.display());

        let df = match (Self::read(file_path, self.infer_schema_rows), self.infer_schema_rows) {
            (Ok(df), _) => df,
            (Err(e), Some(rows)) => {
                log::warn!(
                    "Schema inferred from the first {rows} rows does not fit {}: {e}; rescanning the whole file",
                    file_path.display()
                );
                Self::read(file_path, None).map_err(|e| LoaderError::unavailable(file_path, e))?
            }
            (Err(e), None) => return Err(LoaderError::unavailable(file_path, e)),
        };

        if df.width() == 0 {
            return Err(LoaderError::unavailable(file_path, "no columns found"));
        }

        log::info!(
            "Loaded {} rows, {} columns from {}",
            df.height(),
            df.width(),
            file_path.display()
        );

        Ok(df)
    }

    fn read(file_path: &Path, infer_schema_rows: Option<usize>) -> PolarsResult<DataFrame> {
        LazyCsvReader::new(file_path)
            .with_has_header(true)
            .with_infer_schema_length(infer_schema_rows)
            .finish()?
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_missing_file_is_unavailable() {
        let err = DataLoader::new()
            .load_csv(Path::new("/definitely/not/here.csv"))
            .unwrap_err();
        assert!(matches!(err, LoaderError::DataUnavailable { .. }));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_load_keeps_raw_columns() {
        let file = write_csv("AREA NAME,TIME OCC,Vict Sex\nCentral,930,M\nPacific,2130,F\n");
        let df = DataLoader::new().load_csv(file.path()).unwrap();

        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(names, vec!["AREA NAME", "TIME OCC", "Vict Sex"]);
        assert_eq!(df.height(), 2);
        assert!(df.column("TIME OCC").unwrap().dtype().is_integer());
    }

    #[test]
    fn test_late_text_value_widens_limited_window() {
        let file = write_csv("AREA NAME,Premis Cd\nCentral,101\nCentral,101\nPacific,UNKNOWN\n");
        let df = DataLoader::new()
            .with_infer_schema_rows(Some(1))
            .load_csv(file.path())
            .unwrap();

        assert_eq!(df.height(), 3);
        let premises = df.column("Premis Cd").unwrap();
        assert_eq!(premises.dtype(), &DataType::String);
        assert_eq!(premises.str().unwrap().get(2), Some("UNKNOWN"));
    }

    #[test]
    fn test_empty_file_is_unavailable() {
        let file = write_csv("");
        let err = DataLoader::new().load_csv(file.path()).unwrap_err();
        assert!(matches!(err, LoaderError::DataUnavailable { .. }));
    }
}
