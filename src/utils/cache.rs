// src/utils/cache.rs
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::analysis::AnalysisRequest;
use crate::error::Result;
use crate::io::read_request;

/// Thread-safe cache of parsed request files, so batch jobs that share an
/// input parse it once
#[derive(Default)]
pub struct RequestCache {
    requests: Mutex<HashMap<PathBuf, Arc<AnalysisRequest>>>,
}

impl RequestCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_request<P: AsRef<Path>>(&self, path: P) -> Result<Arc<AnalysisRequest>> {
        let path_buf = path.as_ref().to_path_buf();

        if let Some(request) = self.requests.lock().get(&path_buf) {
            return Ok(Arc::clone(request));
        }

        // Parse without holding the lock; a racing parse of the same file
        // loses to whichever entry landed first
        let request = Arc::new(read_request(&path_buf)?);
        let mut cache = self.requests.lock();
        Ok(Arc::clone(cache.entry(path_buf).or_insert(request)))
    }

    pub fn clear(&self) {
        self.requests.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.lock().is_empty()
    }
}
