//! Data module - CSV loading, cleaning and filtering

pub mod columns;
mod cache;
mod filter;
mod loader;
mod normalizer;
mod pipeline;

pub use cache::{CacheKey, CachePolicy, DatasetCache};
pub use filter::{available_areas, filter_by_areas, AreaFilter};
pub use loader::{DataLoader, LoaderError};
pub use normalizer::{
    normalize_column_name, DropDuplicateRows, DropNullRows, DropUnusedColumns, FormatTimeOfDay,
    NormalizeError, NormalizeStep, Normalizer, RenameColumns,
};
pub use pipeline::{DataPipeline, PipelineError};
