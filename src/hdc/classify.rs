//! Class prototypes and similarity classification.
//!
//! A [`ClassifySet`] is an immutable snapshot derived from a [`TrainSet`]:
//! one (optionally quantized) prototype vector per label plus its Euclidean
//! norm. Classification scores a query hypervector against every prototype by
//! a signed dot product normalized by the prototype's norm, and returns the
//! best label. The set is replaced wholesale after each retraining iteration.

use crate::error::{HdcError, HdcResult};

use super::train::TrainSet;
use super::{Dimension, Hypervector};

/// Per-label prototype vectors with precomputed norms.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifySet {
    dim: Dimension,
    class_vectors: Vec<Vec<i32>>,
    norms: Vec<f64>,
}

impl ClassifySet {
    /// An all-zero set for use before any training has happened.
    ///
    /// Norms default to 1.0 so classifying against an untrained model divides
    /// by one instead of zero; the resulting scores are meaningless but the
    /// call stays well-defined.
    pub fn blank(dim: Dimension, n_labels: usize) -> HdcResult<Self> {
        if dim.0 == 0 {
            return Err(HdcError::ZeroDimension);
        }
        if n_labels == 0 {
            return Err(HdcError::ZeroLabels);
        }
        Ok(Self {
            dim,
            class_vectors: vec![vec![0i32; dim.0]; n_labels],
            norms: vec![1.0; n_labels],
        })
    }

    /// Derive prototypes from a train-set snapshot.
    ///
    /// `quantize = 0` copies the tallies verbatim. Otherwise each label's
    /// tallies are binned into `quantize` buckets per sign: the divisor is
    /// `(max_abs + 1) / quantize` and every nonzero tally maps to
    /// `sign(v) * (|v| / divisor + 1)`, so magnitudes stay within
    /// `[1, quantize]` and no nonzero component collapses to zero.
    pub fn derive(train_set: &TrainSet, quantize: u32) -> Self {
        let dim = train_set.dim();
        let n_labels = train_set.n_labels();
        let mut class_vectors = Vec::with_capacity(n_labels);
        let mut norms = Vec::with_capacity(n_labels);

        for tallies in train_set.all_tallies() {
            let quantized: Vec<i32> = if quantize == 0 {
                tallies.clone()
            } else {
                // A real-valued divisor keeps every remapped magnitude within
                // [1, quantize]; integer division can overshoot the top bucket.
                let max_abs = tallies.iter().map(|v| v.unsigned_abs()).max().unwrap_or(0);
                let divisor = (max_abs as f64 + 1.0) / quantize as f64;
                tallies
                    .iter()
                    .map(|&v| {
                        v.signum() * ((v.unsigned_abs() as f64 / divisor) as i32 + 1)
                    })
                    .collect()
            };

            let norm: f64 = quantized
                .iter()
                .map(|&v| {
                    let v = v as f64;
                    v * v
                })
                .sum::<f64>()
                .sqrt();

            class_vectors.push(quantized);
            norms.push(norm);
        }

        Self {
            dim,
            class_vectors,
            norms,
        }
    }

    /// Reassemble a classify set from raw parts (model loading).
    pub fn from_parts(
        dim: Dimension,
        class_vectors: Vec<Vec<i32>>,
        norms: Vec<f64>,
    ) -> HdcResult<Self> {
        if dim.0 == 0 {
            return Err(HdcError::ZeroDimension);
        }
        if class_vectors.is_empty() || class_vectors.len() != norms.len() {
            return Err(HdcError::ZeroLabels);
        }
        for v in &class_vectors {
            if v.len() != dim.0 {
                return Err(HdcError::DimensionMismatch {
                    expected: dim.0,
                    actual: v.len(),
                });
            }
        }
        Ok(Self {
            dim,
            class_vectors,
            norms,
        })
    }

    /// The hypervector dimension.
    pub fn dim(&self) -> Dimension {
        self.dim
    }

    /// Number of label classes.
    pub fn n_labels(&self) -> usize {
        self.class_vectors.len()
    }

    /// The prototype vector for one label.
    pub fn class_vector(&self, label: usize) -> &[i32] {
        &self.class_vectors[label]
    }

    /// The Euclidean norm of one label's prototype.
    pub fn norm(&self, label: usize) -> f64 {
        self.norms[label]
    }

    /// Classify a query hypervector, returning the best-matching label.
    ///
    /// The similarity for each label sums `+prototype[j]` where the query bit
    /// is set and `-prototype[j]` where it is unset, scaled by the label's
    /// norm. The running best starts at negative infinity so any real label
    /// wins; exact score ties keep the lower label index.
    pub fn classify(&self, vector: &Hypervector) -> HdcResult<usize> {
        if vector.dim() != self.dim {
            return Err(HdcError::DimensionMismatch {
                expected: self.dim.0,
                actual: vector.dim().0,
            });
        }

        let mut best_label = 0usize;
        let mut best_score = f64::NEG_INFINITY;

        for (label, (prototype, &norm)) in
            self.class_vectors.iter().zip(self.norms.iter()).enumerate()
        {
            let mut similarity: i64 = 0;
            for (j, &component) in prototype.iter().enumerate() {
                if vector.get_bit(j) {
                    similarity += component as i64;
                } else {
                    similarity -= component as i64;
                }
            }
            let score = similarity as f64 / norm;
            if score > best_score {
                best_label = label;
                best_score = score;
            }
        }

        Ok(best_label)
    }
}
