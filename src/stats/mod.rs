//! Stats module - Aggregations and dataset summaries

mod aggregator;
mod records;
mod summary;

pub use aggregator::{AnalysisError, Aggregator};
pub use records::{AreaHourTotal, AreaTotal, ColumnCount, CrimeTypeCount, LocationCount};
pub use summary::{dataset_shape, list_columns, null_counts, unique_counts};
