//! Data Normalizer Module
//! Cleans a raw incident table into the canonical shape the analysis expects.
//!
//! Normalization is a fixed sequence of steps. Each step declares the columns
//! it works on; when any of them is missing the step is skipped, so datasets
//! without the optional columns still normalize.

use crate::data::columns;
use polars::prelude::*;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NormalizeError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Malformed value {value:?} in column '{column}' at row {row}")]
    MalformedField {
        column: String,
        row: usize,
        value: String,
    },
    #[error("Columns {sources:?} all normalize to '{name}'")]
    DuplicateColumn { name: String, sources: Vec<String> },
}

/// A single cleaning step.
pub trait NormalizeStep {
    fn name(&self) -> &'static str;

    /// Columns that must exist for the step to run.
    fn required_columns(&self) -> Vec<&str> {
        Vec::new()
    }

    fn apply(&self, df: DataFrame) -> Result<DataFrame, NormalizeError>;
}

/// Canonical column name: trimmed, lowercase, spaces replaced by underscores.
pub fn normalize_column_name(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}

pub struct RenameColumns;

impl NormalizeStep for RenameColumns {
    fn name(&self) -> &'static str {
        "rename_columns"
    }

    fn apply(&self, mut df: DataFrame) -> Result<DataFrame, NormalizeError> {
        let originals: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect();
        let renamed: Vec<String> = originals
            .iter()
            .map(|name| normalize_column_name(name))
            .collect();

        for (i, name) in renamed.iter().enumerate() {
            if renamed[..i].contains(name) {
                let sources = originals
                    .iter()
                    .zip(&renamed)
                    .filter(|(_, target)| *target == name)
                    .map(|(source, _)| source.clone())
                    .collect();
                return Err(NormalizeError::DuplicateColumn {
                    name: name.clone(),
                    sources,
                });
            }
        }

        df.set_column_names(renamed)?;
        Ok(df)
    }
}

/// Removes rows equal to an earlier row in every column.
pub struct DropDuplicateRows;

impl NormalizeStep for DropDuplicateRows {
    fn name(&self) -> &'static str {
        "drop_duplicate_rows"
    }

    fn apply(&self, df: DataFrame) -> Result<DataFrame, NormalizeError> {
        let before = df.height();
        let deduped = df
            .lazy()
            .unique_stable(None, UniqueKeepStrategy::First)
            .collect()?;
        log::debug!("Dropped {} duplicate rows", before - deduped.height());
        Ok(deduped)
    }
}

/// Removes rows where the column is null.
pub struct DropNullRows {
    pub column: &'static str,
}

impl NormalizeStep for DropNullRows {
    fn name(&self) -> &'static str {
        "drop_null_rows"
    }

    fn required_columns(&self) -> Vec<&str> {
        vec![self.column]
    }

    fn apply(&self, df: DataFrame) -> Result<DataFrame, NormalizeError> {
        let before = df.height();
        let filtered = df
            .lazy()
            .filter(col(self.column).is_not_null())
            .collect()?;
        log::debug!(
            "Dropped {} rows with missing '{}'",
            before - filtered.height(),
            self.column
        );
        Ok(filtered)
    }
}

/// Removes whichever of the listed columns are present.
pub struct DropUnusedColumns {
    pub columns: &'static [&'static str],
}

impl NormalizeStep for DropUnusedColumns {
    fn name(&self) -> &'static str {
        "drop_unused_columns"
    }

    fn apply(&self, mut df: DataFrame) -> Result<DataFrame, NormalizeError> {
        for name in self.columns {
            if df.column(name).is_ok() {
                df = df.drop(name)?;
            }
        }
        Ok(df)
    }
}

/// Rewrites the raw `HMM`/`HHMM` time of occurrence as `HH:MM` and derives
/// the integer `hour` column.
pub struct FormatTimeOfDay {
    pub column: &'static str,
}

impl FormatTimeOfDay {
    /// Parse one raw value into its `HH:MM` form and hour.
    ///
    /// Already formatted values pass through unchanged so the step can be
    /// re-run on a normalized table.
    pub fn parse(raw: &str) -> Option<(String, i32)> {
        let raw = raw.trim();
        let digits = match raw.split_once(':') {
            Some((hh, mm)) if hh.len() == 2 && mm.len() == 2 => format!("{hh}{mm}"),
            Some(_) => return None,
            None => format!("{raw:0>4}"),
        };

        if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        let hour: i32 = digits[..2].parse().ok()?;
        let minute: i32 = digits[2..].parse().ok()?;
        if hour > 23 || minute > 59 {
            return None;
        }

        Some((format!("{}:{}", &digits[..2], &digits[2..]), hour))
    }

    fn malformed(&self, row: usize, value: String) -> NormalizeError {
        NormalizeError::MalformedField {
            column: self.column.to_string(),
            row,
            value,
        }
    }

    /// Float times (CSV columns inferred as `f64`) must hold whole numbers
    /// that fit an `i64`; anything else is malformed.
    fn whole_floats_as_text(&self, source: &Column) -> Result<Column, NormalizeError> {
        let floats = source.cast(&DataType::Float64)?;
        let mut text: Vec<Option<String>> = Vec::with_capacity(floats.len());

        for (row, value) in floats.f64()?.into_iter().enumerate() {
            match value {
                Some(v) if !v.is_finite()
                    || v.fract() != 0.0
                    || v < i64::MIN as f64
                    || v >= i64::MAX as f64 =>
                {
                    return Err(self.malformed(row, v.to_string()));
                }
                Some(v) => text.push(Some((v as i64).to_string())),
                None => text.push(None),
            }
        }

        Ok(Column::new(self.column.into(), text))
    }
}

impl NormalizeStep for FormatTimeOfDay {
    fn name(&self) -> &'static str {
        "format_time_of_day"
    }

    fn required_columns(&self) -> Vec<&str> {
        vec![self.column]
    }

    fn apply(&self, mut df: DataFrame) -> Result<DataFrame, NormalizeError> {
        let source = df.column(self.column)?;
        let as_text = if source.dtype().is_float() {
            self.whole_floats_as_text(source)?
        } else {
            source.cast(&DataType::String)?
        };
        let as_text = as_text.str()?;

        let mut times: Vec<Option<String>> = Vec::with_capacity(df.height());
        let mut hours: Vec<Option<i32>> = Vec::with_capacity(df.height());

        for (row, value) in as_text.into_iter().enumerate() {
            match value {
                Some(raw) => {
                    let (time, hour) = Self::parse(raw)
                        .ok_or_else(|| self.malformed(row, raw.to_string()))?;
                    times.push(Some(time));
                    hours.push(Some(hour));
                }
                None => {
                    times.push(None);
                    hours.push(None);
                }
            }
        }

        df.with_column(Column::new(self.column.into(), times))?;
        df.with_column(Column::new(columns::HOUR.into(), hours))?;
        Ok(df)
    }
}

/// Runs the normalization steps in order.
pub struct Normalizer {
    steps: Vec<Box<dyn NormalizeStep + Send + Sync>>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    /// The standard pipeline for the incident export.
    pub fn new() -> Self {
        Self {
            steps: vec![
                Box::new(RenameColumns),
                Box::new(DropDuplicateRows),
                Box::new(DropNullRows {
                    column: columns::MOCODES,
                }),
                Box::new(DropNullRows {
                    column: columns::VICT_SEX,
                }),
                Box::new(DropUnusedColumns {
                    columns: columns::UNUSED,
                }),
                Box::new(FormatTimeOfDay {
                    column: columns::TIME_OCC,
                }),
            ],
        }
    }

    /// Apply every step whose required columns are present.
    pub fn normalize(&self, df: DataFrame) -> Result<DataFrame, NormalizeError> {
        let mut df = df;
        for step in &self.steps {
            let missing: Vec<&str> = step
                .required_columns()
                .into_iter()
                .filter(|c| df.column(c).is_err())
                .collect();
            if !missing.is_empty() {
                log::debug!("Skipping {}: missing {:?}", step.name(), missing);
                continue;
            }
            df = step.apply(df)?;
        }

        log::info!(
            "Normalized table: {} rows, {} columns",
            df.height(),
            df.width()
        );
        Ok(df)
    }
}
