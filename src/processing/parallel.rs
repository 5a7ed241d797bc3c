// src/processing/parallel.rs
use std::sync::Arc;

use anyhow::{Context, Result};
use rayon::prelude::*;
use tracing::debug;

use crate::analysis::{analyze, AnalysisRequest, AnalysisResult};
use crate::config::ScoringConfig;
use crate::error;
use crate::utils::cache::RequestCache;

/// Runs independent field analyses on a dedicated thread pool. Analyses
/// share no state, so the only coordination is collecting results.
pub struct ParallelProcessor {
    threads: usize,
    cache: Option<Arc<RequestCache>>,
}

impl ParallelProcessor {
    pub fn new(threads: Option<usize>) -> Self {
        Self {
            threads: threads.unwrap_or_else(num_cpus::get).max(1),
            cache: None,
        }
    }

    pub fn with_cache(threads: Option<usize>, cache: Arc<RequestCache>) -> Self {
        Self {
            cache: Some(cache),
            ..Self::new(threads)
        }
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    pub fn cache(&self) -> Option<&Arc<RequestCache>> {
        self.cache.as_ref()
    }

    pub fn cache_size(&self) -> usize {
        self.cache.as_ref().map_or(0, |cache| cache.len())
    }

    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.clear();
        }
    }

    /// Apply `work` to every job on the pool. `on_done` sees each result on
    /// the calling thread as soon as it is ready; the returned results keep
    /// job order.
    pub fn process<T, R, W, D>(&self, jobs: &[T], work: W, mut on_done: D) -> Result<Vec<R>>
    where
        T: Sync,
        R: Send,
        W: Fn(&T) -> R + Sync,
        D: FnMut(usize, &R),
    {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.threads)
            .build()
            .context("Failed to build analysis thread pool")?;

        let mut results: Vec<Option<R>> = (0..jobs.len()).map(|_| None).collect();
        let (tx, rx) = flume::unbounded();
        let work = &work;

        std::thread::scope(|scope| {
            scope.spawn(move || {
                pool.install(|| {
                    jobs.par_iter().enumerate().for_each_with(tx, |tx, (i, job)| {
                        // Receiver outlives all senders
                        let _ = tx.send((i, work(job)));
                    });
                });
            });

            for (i, result) in rx.iter() {
                debug!(job = i, "Job finished");
                on_done(i, &result);
                results[i] = Some(result);
            }
        });

        results
            .into_iter()
            .enumerate()
            .map(|(i, r)| r.with_context(|| format!("Job {i} produced no result")))
            .collect()
    }

    /// Analyze many fields concurrently with one scoring configuration.
    pub fn analyze_all(
        &self,
        requests: &[AnalysisRequest],
        config: &ScoringConfig,
    ) -> Result<Vec<error::Result<AnalysisResult>>> {
        self.process(requests, |request| analyze(request, config), |_, _| {})
    }
}
