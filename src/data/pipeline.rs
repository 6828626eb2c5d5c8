//! Load + normalize, the one-shot part of the dashboard.

use crate::data::{DataLoader, DatasetCache, LoaderError, NormalizeError, Normalizer};
use polars::prelude::DataFrame;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Fatal errors: no partial dataset is exposed after either of these.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Loader(#[from] LoaderError),
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
}

#[derive(Default)]
pub struct DataPipeline {
    loader: DataLoader,
    normalizer: Normalizer,
}

impl DataPipeline {
    pub fn new(loader: DataLoader, normalizer: Normalizer) -> Self {
        Self { loader, normalizer }
    }

    /// Read and clean the file at `path`.
    pub fn run(&self, path: &Path) -> Result<DataFrame, PipelineError> {
        let raw = self.loader.load_csv(path)?;
        Ok(self.normalizer.normalize(raw)?)
    }

    /// Same as [`DataPipeline::run`], memoized through `cache`.
    pub fn run_cached(
        &self,
        cache: &DatasetCache,
        path: &Path,
    ) -> Result<Arc<DataFrame>, PipelineError> {
        cache.get_or_load(path, |p| self.run(p))
    }
}
