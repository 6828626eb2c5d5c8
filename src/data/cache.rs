//! Memoization of the load + normalize pipeline.
//!
//! Entries are keyed by canonical path and modification time, so a file
//! rewritten on disk is loaded again while repeated interactions on the same
//! file reuse the normalized table.

use polars::prelude::DataFrame;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub path: PathBuf,
    pub modified: Option<SystemTime>,
}

impl CacheKey {
    pub fn for_path(path: &Path) -> Self {
        let path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        let modified = std::fs::metadata(&path)
            .and_then(|meta| meta.modified())
            .ok();
        Self { path, modified }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CachePolicy {
    /// Reuse a previously normalized table for the same input.
    #[default]
    Memoize,
    /// Always run the pipeline.
    Bypass,
}

/// Normalized tables by input identity.
#[derive(Debug, Default)]
pub struct DatasetCache {
    policy: CachePolicy,
    entries: Mutex<HashMap<CacheKey, Arc<DataFrame>>>,
}

impl DatasetCache {
    pub fn new(policy: CachePolicy) -> Self {
        Self {
            policy,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return the cached table for `path`, or run `load` and remember its result.
    /// Failures are never cached.
    pub fn get_or_load<F, E>(&self, path: &Path, load: F) -> Result<Arc<DataFrame>, E>
    where
        F: FnOnce(&Path) -> Result<DataFrame, E>,
    {
        if self.policy == CachePolicy::Bypass {
            return load(path).map(Arc::new);
        }

        let key = CacheKey::for_path(path);
        if let Some(df) = self.lock().get(&key) {
            log::debug!("Cache hit for {}", key.path.display());
            return Ok(Arc::clone(df));
        }

        log::debug!("Cache miss for {}", key.path.display());
        let df = Arc::new(load(path)?);
        self.lock().insert(key, Arc::clone(&df));
        Ok(df)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<CacheKey, Arc<DataFrame>>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;
    use std::cell::Cell;
    use std::io::Write;

    fn sample_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "a\n1").unwrap();
        file
    }

    #[test]
    fn test_memoize_loads_once() {
        let file = sample_file();
        let cache = DatasetCache::new(CachePolicy::Memoize);
        let calls = Cell::new(0);
        let load = |_: &Path| -> Result<DataFrame, PolarsError> {
            calls.set(calls.get() + 1);
            df!("a" => [1i32])
        };

        let first = cache.get_or_load(file.path(), load).unwrap();
        let second = cache.get_or_load(file.path(), load).unwrap();

        assert_eq!(calls.get(), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_bypass_always_loads() {
        let file = sample_file();
        let cache = DatasetCache::new(CachePolicy::Bypass);
        let calls = Cell::new(0);
        let load = |_: &Path| -> Result<DataFrame, PolarsError> {
            calls.set(calls.get() + 1);
            df!("a" => [1i32])
        };

        cache.get_or_load(file.path(), load).unwrap();
        cache.get_or_load(file.path(), load).unwrap();

        assert_eq!(calls.get(), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_errors_are_not_cached() {
        let file = sample_file();
        let cache = DatasetCache::default();

        let failed: Result<_, String> = cache.get_or_load(file.path(), |_| Err("boom".to_string()));
        assert!(failed.is_err());
        assert!(cache.is_empty());

        let ok: Result<_, String> =
            cache.get_or_load(file.path(), |_| df!("a" => [1i32]).map_err(|e| e.to_string()));
        assert!(ok.is_ok());
        assert_eq!(cache.len(), 1);
    }
}
