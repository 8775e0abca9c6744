//! Random basis construction.
//!
//! A [`Basis`] holds one random hypervector per input feature position plus an
//! ordered chain of level vectors encoding quantized intensity. The level
//! chain is a Hamming walk: each level copies the previous one and flips a
//! fixed number of never-before-flipped bit positions, so the Hamming distance
//! from level 0 grows linearly with the level index. Closer intensity buckets
//! therefore stay closer in hypervector space, which is what lets the encoder
//! discriminate feature intensity at all.

use rand::Rng;

use crate::error::{HdcError, HdcResult};

use super::{Dimension, Hypervector};

/// Largest supported input feature count.
///
/// The encoder accumulates per-bit votes in 16-bit lanes, so one encoding can
/// bundle at most `u16::MAX` bound vectors.
pub const MAX_INPUTS: usize = u16::MAX as usize;

/// Fewest / most level vectors a basis can carry. Levels quantize a byte, so
/// more than 256 of them can never be addressed.
pub const MIN_LEVELS: usize = 2;
pub const MAX_LEVELS: usize = 256;

/// The random projection basis shared by every encoding of one model.
///
/// Immutable after construction; lives for the lifetime of the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Basis {
    dim: Dimension,
    basis_vectors: Vec<Hypervector>,
    level_vectors: Vec<Hypervector>,
}

impl Basis {
    /// Build a basis of `n_inputs` random vectors and an `n_levels` Hamming
    /// level walk, drawing all randomness from `rng`.
    ///
    /// Passing a seeded generator makes construction fully reproducible.
    pub fn new(
        dim: Dimension,
        n_inputs: usize,
        n_levels: usize,
        rng: &mut impl Rng,
    ) -> HdcResult<Self> {
        if dim.0 == 0 {
            return Err(HdcError::ZeroDimension);
        }
        if n_inputs == 0 {
            return Err(HdcError::ZeroInputs);
        }
        if n_inputs > MAX_INPUTS {
            return Err(HdcError::TooManyInputs {
                n_inputs,
                max: MAX_INPUTS,
            });
        }
        if !(MIN_LEVELS..=MAX_LEVELS).contains(&n_levels) {
            return Err(HdcError::LevelCountOutOfRange { n_levels });
        }

        // The walk must allot at least one fresh bit per level step, or the
        // chain would degenerate into identical levels.
        let flips_per_level = dim.0 / (n_levels - 1);
        if flips_per_level == 0 {
            return Err(HdcError::FlipBudgetExceeded {
                requested: n_levels - 1,
                available: dim.0,
            });
        }

        let basis_vectors: Vec<Hypervector> = (0..n_inputs)
            .map(|_| Hypervector::random(dim, rng))
            .collect();

        // Level 0 is independent random; each later level flips fresh bits.
        // The flipped set spans the whole chain, so a bit toggled between
        // levels k and k+1 is never toggled again.
        let mut level_vectors = Vec::with_capacity(n_levels);
        level_vectors.push(Hypervector::random(dim, rng));
        let mut flipped = vec![false; dim.0];
        for level in 1..n_levels {
            let mut next = level_vectors[level - 1].clone();
            for _ in 0..flips_per_level {
                let mut index = rng.gen_range(0..dim.0);
                while flipped[index] {
                    index = (index + 1) % dim.0;
                }
                flipped[index] = true;
                next.set_bit(index, !next.get_bit(index));
            }
            level_vectors.push(next);
        }

        Ok(Self {
            dim,
            basis_vectors,
            level_vectors,
        })
    }

    /// Reassemble a basis from already-built vectors (model loading).
    ///
    /// Validates counts and that every vector shares `dim`.
    pub fn from_parts(
        dim: Dimension,
        basis_vectors: Vec<Hypervector>,
        level_vectors: Vec<Hypervector>,
    ) -> HdcResult<Self> {
        if dim.0 == 0 {
            return Err(HdcError::ZeroDimension);
        }
        if basis_vectors.is_empty() {
            return Err(HdcError::ZeroInputs);
        }
        if !(MIN_LEVELS..=MAX_LEVELS).contains(&level_vectors.len()) {
            return Err(HdcError::LevelCountOutOfRange {
                n_levels: level_vectors.len(),
            });
        }
        for v in basis_vectors.iter().chain(level_vectors.iter()) {
            if v.dim() != dim {
                return Err(HdcError::DimensionMismatch {
                    expected: dim.0,
                    actual: v.dim().0,
                });
            }
        }
        Ok(Self {
            dim,
            basis_vectors,
            level_vectors,
        })
    }

    /// The hypervector dimension.
    pub fn dim(&self) -> Dimension {
        self.dim
    }

    /// Number of input feature positions.
    pub fn n_inputs(&self) -> usize {
        self.basis_vectors.len()
    }

    /// Number of intensity levels.
    pub fn n_levels(&self) -> usize {
        self.level_vectors.len()
    }

    /// Bit flips separating adjacent levels.
    pub fn flips_per_level(&self) -> usize {
        self.dim.0 / (self.level_vectors.len() - 1)
    }

    /// The basis vector for input position `index`.
    pub fn basis_vector(&self, index: usize) -> &Hypervector {
        &self.basis_vectors[index]
    }

    /// The level vector for intensity bucket `level`.
    pub fn level_vector(&self, level: usize) -> &Hypervector {
        &self.level_vectors[level]
    }

    /// All basis vectors in input order.
    pub fn basis_vectors(&self) -> &[Hypervector] {
        &self.basis_vectors
    }

    /// All level vectors in chain order.
    pub fn level_vectors(&self) -> &[Hypervector] {
        &self.level_vectors
    }
}
