//! Data-parallel training and testing passes.
//!
//! The [`Orchestrator`] owns a fixed-size rayon pool and shards a contiguous
//! sample range into one near-equal slice per worker. Encoding is read-only
//! against the basis and classify set and runs unsynchronized; only the
//! shared [`TrainSet`] is contended, behind a mutex held for the duration of
//! a single O(dim) tally update. Misclassification and correctness counters
//! are worker-local and reduced after the join, so no counter update races a
//! tally update.
//!
//! Within a shard, samples are processed in index order. Across shards there
//! is no ordering guarantee: two workers correcting the same label's tallies
//! interleave arbitrarily, which makes retraining outcomes mildly
//! order-dependent. Each update is atomic under the lock, so the tallies
//! themselves never tear.

use std::sync::Mutex;

use rayon::prelude::*;

use crate::error::{HekaResult, ModelError};
use crate::hdc::basis::Basis;
use crate::hdc::classify::ClassifySet;
use crate::hdc::encode::encode;
use crate::hdc::train::TrainSet;

/// Default worker count, matching one shard per core on a typical desktop.
pub const DEFAULT_THREADS: usize = 8;

/// Fixed-size worker pool for bulk train/retrain/test passes.
pub struct Orchestrator {
    pool: rayon::ThreadPool,
    n_threads: usize,
}

impl Orchestrator {
    /// Build a pool of exactly `n_threads` workers (0 falls back to the
    /// default of 8).
    pub fn new(n_threads: usize) -> Result<Self, ModelError> {
        let n_threads = if n_threads == 0 {
            DEFAULT_THREADS
        } else {
            n_threads
        };
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(n_threads)
            .build()
            .map_err(|e| ModelError::ThreadPool {
                message: e.to_string(),
            })?;
        Ok(Self { pool, n_threads })
    }

    /// Number of workers in the pool.
    pub fn n_threads(&self) -> usize {
        self.n_threads
    }

    /// Near-equal contiguous shards covering `[0, n)`, one per worker.
    fn shards(&self, n: usize) -> Vec<(usize, usize)> {
        let t = self.n_threads;
        (0..t).map(|i| (n * i / t, n * (i + 1) / t)).collect()
    }

    /// One parallel training pass over `labels[..n]` / `features[..n]`.
    ///
    /// In batch mode (`retrain = false`) every sample's encoding is trained
    /// into the shared set. In retrain mode each sample is first classified
    /// against `classify_set`; on a wrong prediction the correct label is
    /// trained and the predicted label untrained inside one critical section.
    ///
    /// Returns the number of misclassified samples (always 0 in batch mode).
    pub fn train_pass(
        &self,
        basis: &Basis,
        train_set: &Mutex<TrainSet>,
        classify_set: &ClassifySet,
        labels: &[u8],
        features: &[Vec<u8>],
        n: usize,
        retrain: bool,
    ) -> HekaResult<usize> {
        let shards = self.shards(n);
        let per_shard: Vec<HekaResult<usize>> = self.pool.install(|| {
            shards
                .par_iter()
                .map(|&(start, end)| {
                    let mut wrong = 0usize;
                    for i in start..end {
                        let vector = encode(&features[i], basis)?;
                        let actual = labels[i] as usize;

                        if retrain {
                            let predicted = classify_set.classify(&vector)?;
                            if predicted != actual {
                                let mut set = train_set
                                    .lock()
                                    .map_err(|_| ModelError::TrainSetPoisoned)?;
                                set.train(&vector, actual)?;
                                set.untrain(&vector, predicted)?;
                                drop(set);
                                wrong += 1;
                            }
                        } else {
                            let mut set = train_set
                                .lock()
                                .map_err(|_| ModelError::TrainSetPoisoned)?;
                            set.train(&vector, actual)?;
                        }
                    }
                    Ok(wrong)
                })
                .collect()
        });

        let mut total_wrong = 0usize;
        for shard in per_shard {
            total_wrong += shard?;
        }
        Ok(total_wrong)
    }

    /// One parallel testing pass; returns the number of correct predictions.
    ///
    /// Pure: nothing is mutated, so workers share the basis and classify set
    /// without any locking.
    pub fn test_pass(
        &self,
        basis: &Basis,
        classify_set: &ClassifySet,
        labels: &[u8],
        features: &[Vec<u8>],
        n: usize,
    ) -> HekaResult<usize> {
        let shards = self.shards(n);
        let per_shard: Vec<HekaResult<usize>> = self.pool.install(|| {
            shards
                .par_iter()
                .map(|&(start, end)| {
                    let mut correct = 0usize;
                    for i in start..end {
                        let vector = encode(&features[i], basis)?;
                        let predicted = classify_set.classify(&vector)?;
                        if predicted == labels[i] as usize {
                            correct += 1;
                        }
                    }
                    Ok(correct)
                })
                .collect()
        });

        let mut total_correct = 0usize;
        for shard in per_shard {
            total_correct += shard?;
        }
        Ok(total_correct)
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("n_threads", &self.n_threads)
            .finish()
    }
}
