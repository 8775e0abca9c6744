//! Hyperdimensional computing (HDC) core.
//!
//! This module implements the hypervector engine behind the classifier:
//!
//! - [`Hypervector`] — the fundamental bit-packed vector type
//! - [`basis::Basis`] — random basis and level vectors, built once per model
//! - [`encode`] — bind-and-bundle encoding of byte feature vectors
//! - [`train::TrainSet`] — per-label signed tally accumulation
//! - [`classify::ClassifySet`] — quantized prototypes and similarity classification

pub mod basis;
pub mod classify;
pub mod encode;
pub mod train;

use serde::{Deserialize, Serialize};

use crate::error::{HdcError, HdcResult};

/// Configurable hypervector dimensionality (number of bits).
///
/// Typical values: 10,000 for good capacity, 1,000 for testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimension(pub usize);

impl Dimension {
    /// Standard high-capacity dimension.
    pub const DEFAULT: Self = Self(10_000);

    /// Smaller dimension for fast testing.
    pub const TEST: Self = Self(1_000);

    /// Number of 64-bit words backing a vector at this dimension.
    ///
    /// One extra word of padding so byte- and word-granular scans never run
    /// past the live bits.
    pub fn word_len(self) -> usize {
        self.0 / 64 + 1
    }

    /// Number of bytes a vector occupies in the persisted model format.
    pub fn packed_byte_len(self) -> usize {
        self.0 / 8 + 1
    }
}

impl Default for Dimension {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A hypervector — a very-high-dimensional binary vector.
///
/// Bits are packed little-endian into `u64` words: component `i` is bit
/// `i % 64` of word `i / 64`. The backing storage carries one padding word
/// beyond the live bits; constructors keep the padding zeroed so equality
/// and serialization see a canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hypervector {
    words: Vec<u64>,
    dim: Dimension,
}

impl Hypervector {
    /// Create a zero hypervector (all bits 0).
    pub fn zero(dim: Dimension) -> Self {
        Self {
            words: vec![0u64; dim.word_len()],
            dim,
        }
    }

    /// Create a uniform-random hypervector using the given RNG.
    pub fn random(dim: Dimension, rng: &mut impl rand::Rng) -> Self {
        let mut words: Vec<u64> = (0..dim.word_len()).map(|_| rng.r#gen()).collect();
        mask_tail(&mut words, dim);
        Self { words, dim }
    }

    /// Reconstruct a hypervector from the packed byte form used by the model
    /// file (`dim/8 + 1` bytes, little-endian bit order).
    pub fn from_packed_bytes(bytes: &[u8], dim: Dimension) -> HdcResult<Self> {
        if bytes.len() != dim.packed_byte_len() {
            return Err(HdcError::DimensionMismatch {
                expected: dim.packed_byte_len(),
                actual: bytes.len(),
            });
        }
        let mut words = vec![0u64; dim.word_len()];
        for (i, &b) in bytes.iter().enumerate() {
            words[i / 8] |= (b as u64) << (8 * (i % 8));
        }
        mask_tail(&mut words, dim);
        Ok(Self { words, dim })
    }

    /// The packed byte form used by the model file.
    pub fn to_packed_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.dim.packed_byte_len());
        'outer: for word in &self.words {
            for byte in word.to_le_bytes() {
                if out.len() == self.dim.packed_byte_len() {
                    break 'outer;
                }
                out.push(byte);
            }
        }
        out
    }

    /// The dimension of this hypervector.
    pub fn dim(&self) -> Dimension {
        self.dim
    }

    /// The backing words, including the zeroed padding word.
    pub fn words(&self) -> &[u64] {
        &self.words
    }

    /// Get a single bit. Returns `true` if the bit is set.
    pub fn get_bit(&self, index: usize) -> bool {
        debug_assert!(index < self.dim.0);
        (self.words[index / 64] >> (index % 64)) & 1 == 1
    }

    /// Set a single bit.
    pub fn set_bit(&mut self, index: usize, value: bool) {
        debug_assert!(index < self.dim.0);
        if value {
            self.words[index / 64] |= 1u64 << (index % 64);
        } else {
            self.words[index / 64] &= !(1u64 << (index % 64));
        }
    }

    /// XOR two hypervectors into a new one (the bind operation).
    pub fn xor(&self, other: &Self) -> HdcResult<Self> {
        if self.dim != other.dim {
            return Err(HdcError::DimensionMismatch {
                expected: self.dim.0,
                actual: other.dim.0,
            });
        }
        let mut out = Self::zero(self.dim);
        out.xor_from(self, other);
        Ok(out)
    }

    /// XOR `a` and `b` word-wise into `self`, reusing the allocation.
    ///
    /// All three vectors must share a dimension; this is the hot path of the
    /// encoder, so the check is a debug assertion only.
    pub fn xor_from(&mut self, a: &Self, b: &Self) {
        debug_assert_eq!(self.dim, a.dim);
        debug_assert_eq!(self.dim, b.dim);
        for (out, (&x, &y)) in self.words.iter_mut().zip(a.words.iter().zip(b.words.iter())) {
            *out = x ^ y;
        }
    }

    /// Hamming distance to another hypervector of the same dimension.
    pub fn hamming(&self, other: &Self) -> HdcResult<u32> {
        if self.dim != other.dim {
            return Err(HdcError::DimensionMismatch {
                expected: self.dim.0,
                actual: other.dim.0,
            });
        }
        Ok(self
            .words
            .iter()
            .zip(other.words.iter())
            .map(|(&a, &b)| (a ^ b).count_ones())
            .sum())
    }

    /// Number of set bits.
    pub fn popcount(&self) -> u32 {
        self.words.iter().map(|w| w.count_ones()).sum()
    }
}

/// Clear every bit at or beyond `dim` so padding stays canonical.
fn mask_tail(words: &mut [u64], dim: Dimension) {
    let live = dim.0 % 64;
    let full_words = dim.0 / 64;
    if live != 0 {
        words[full_words] &= (1u64 << live) - 1;
    } else {
        words[full_words] = 0;
    }
    for w in words.iter_mut().skip(full_words + 1) {
        *w = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn seeded_rng() -> rand::rngs::StdRng {
        rand::rngs::StdRng::seed_from_u64(42)
    }

    #[test]
    fn dimension_lengths() {
        assert_eq!(Dimension(64).word_len(), 2);
        assert_eq!(Dimension(64).packed_byte_len(), 9);
        assert_eq!(Dimension(10_000).word_len(), 157);
        assert_eq!(Dimension(10_000).packed_byte_len(), 1251);
    }

    #[test]
    fn zero_is_all_clear() {
        let hv = Hypervector::zero(Dimension::TEST);
        assert_eq!(hv.popcount(), 0);
        assert_eq!(hv.dim(), Dimension::TEST);
    }

    #[test]
    fn bit_operations() {
        let mut hv = Hypervector::zero(Dimension(100));
        assert!(!hv.get_bit(0));
        hv.set_bit(0, true);
        assert!(hv.get_bit(0));
        hv.set_bit(63, true);
        hv.set_bit(64, true);
        assert!(hv.get_bit(63));
        assert!(hv.get_bit(64));
        hv.set_bit(0, false);
        assert!(!hv.get_bit(0));
        assert_eq!(hv.popcount(), 2);
    }

    #[test]
    fn random_masks_padding() {
        let mut rng = seeded_rng();
        let hv = Hypervector::random(Dimension(70), &mut rng);
        // Bits 70..128 live in the tail of word 1 and must be clear.
        for bit in 70..128 {
            assert_eq!((hv.words()[bit / 64] >> (bit % 64)) & 1, 0, "bit {bit}");
        }
    }

    #[test]
    fn random_is_roughly_balanced() {
        let mut rng = seeded_rng();
        let hv = Hypervector::random(Dimension::TEST, &mut rng);
        let ones = hv.popcount() as usize;
        assert!(
            ones > 400 && ones < 600,
            "popcount was {ones}, expected ~500"
        );
    }

    #[test]
    fn xor_is_self_inverse() {
        let mut rng = seeded_rng();
        let a = Hypervector::random(Dimension::TEST, &mut rng);
        let b = Hypervector::random(Dimension::TEST, &mut rng);
        let bound = a.xor(&b).unwrap();
        let recovered = bound.xor(&b).unwrap();
        assert_eq!(recovered, a);
    }

    #[test]
    fn xor_dimension_mismatch() {
        let a = Hypervector::zero(Dimension(100));
        let b = Hypervector::zero(Dimension(200));
        assert!(matches!(
            a.xor(&b),
            Err(HdcError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn hamming_counts_differing_bits() {
        let mut a = Hypervector::zero(Dimension(100));
        let mut b = Hypervector::zero(Dimension(100));
        a.set_bit(3, true);
        a.set_bit(99, true);
        b.set_bit(3, true);
        assert_eq!(a.hamming(&b).unwrap(), 1);
        assert_eq!(a.hamming(&a).unwrap(), 0);
    }

    #[test]
    fn packed_bytes_roundtrip() {
        let mut rng = seeded_rng();
        let hv = Hypervector::random(Dimension(100), &mut rng);
        let bytes = hv.to_packed_bytes();
        assert_eq!(bytes.len(), Dimension(100).packed_byte_len());
        let back = Hypervector::from_packed_bytes(&bytes, Dimension(100)).unwrap();
        assert_eq!(back, hv);
    }

    #[test]
    fn packed_bytes_rejects_wrong_width() {
        let bytes = vec![0u8; 5];
        assert!(matches!(
            Hypervector::from_packed_bytes(&bytes, Dimension(100)),
            Err(HdcError::DimensionMismatch { .. })
        ));
    }
}
