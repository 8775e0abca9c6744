//! Per-label training accumulators.
//!
//! A [`TrainSet`] keeps one signed tally per label per bit position. Training
//! votes +1 where an encoded sample has a bit set and −1 where it doesn't;
//! untraining is the exact sign-inverse, used during error-driven retraining
//! to withdraw an earlier vote cast under the wrong label.

use crate::error::{HdcError, HdcResult};

use super::{Dimension, Hypervector};

/// Signed per-bit vote tallies for every label class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainSet {
    dim: Dimension,
    vectors: Vec<Vec<i32>>,
    n_train_samples: usize,
}

impl TrainSet {
    /// Create an all-zero train set for `n_labels` classes.
    pub fn new(dim: Dimension, n_labels: usize) -> HdcResult<Self> {
        if dim.0 == 0 {
            return Err(HdcError::ZeroDimension);
        }
        if n_labels == 0 {
            return Err(HdcError::ZeroLabels);
        }
        Ok(Self {
            dim,
            vectors: vec![vec![0i32; dim.0]; n_labels],
            n_train_samples: 0,
        })
    }

    /// The hypervector dimension.
    pub fn dim(&self) -> Dimension {
        self.dim
    }

    /// Number of label classes.
    pub fn n_labels(&self) -> usize {
        self.vectors.len()
    }

    /// Number of train/untrain operations applied so far.
    pub fn n_train_samples(&self) -> usize {
        self.n_train_samples
    }

    /// The tally vector for one label.
    pub fn tallies(&self, label: usize) -> HdcResult<&[i32]> {
        self.check_label(label)?;
        Ok(&self.vectors[label])
    }

    /// All tally vectors in label order.
    pub fn all_tallies(&self) -> &[Vec<i32>] {
        &self.vectors
    }

    /// Add an encoded sample's votes to `label`'s tallies.
    pub fn train(&mut self, vector: &Hypervector, label: usize) -> HdcResult<()> {
        self.apply(vector, label, 1)
    }

    /// Withdraw an encoded sample's votes from `label`'s tallies.
    ///
    /// `untrain` directly after `train` on the same vector and label restores
    /// the tallies exactly; the sample counter advances on both calls.
    pub fn untrain(&mut self, vector: &Hypervector, label: usize) -> HdcResult<()> {
        self.apply(vector, label, -1)
    }

    fn apply(&mut self, vector: &Hypervector, label: usize, sign: i32) -> HdcResult<()> {
        self.check_label(label)?;
        if vector.dim() != self.dim {
            return Err(HdcError::DimensionMismatch {
                expected: self.dim.0,
                actual: vector.dim().0,
            });
        }
        let tallies = &mut self.vectors[label];
        for (j, tally) in tallies.iter_mut().enumerate() {
            *tally += if vector.get_bit(j) { sign } else { -sign };
        }
        self.n_train_samples += 1;
        Ok(())
    }

    fn check_label(&self, label: usize) -> HdcResult<()> {
        if label >= self.vectors.len() {
            return Err(HdcError::LabelOutOfRange {
                label,
                n_labels: self.vectors.len(),
            });
        }
        Ok(())
    }
}
