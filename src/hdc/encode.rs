//! Bind-and-bundle encoding of byte feature vectors.
//!
//! Each input byte selects a level vector by intensity bucket, which is
//! XOR-bound to that position's basis vector; the bound vectors are bundled
//! by per-bit majority vote into one hypervector.
//!
//! The majority count is kept branch-free. Hypervector bits sit near a 50/50
//! distribution, the worst case for a branch predictor, so a per-bit
//! conditional increment collapses throughput at real dimensions. Instead
//! each byte of a bound vector is split into two nibbles and expanded through
//! a 16-entry table into four 16-bit lanes of a `u64`, updating eight per-bit
//! counters with two lookups and two 64-bit additions.

use crate::error::{HdcError, HdcResult};

use super::basis::Basis;
use super::Hypervector;

/// Expands a nibble's four bits into four 16-bit counter lanes.
const NIBBLE_LANES: [u64; 16] = [
    0x0,
    0x1,
    0x1_0000,
    0x1_0001,
    0x1_0000_0000,
    0x1_0000_0001,
    0x1_0001_0000,
    0x1_0001_0001,
    0x1_0000_0000_0000,
    0x1_0000_0000_0001,
    0x1_0000_0001_0000,
    0x1_0000_0001_0001,
    0x1_0001_0000_0000,
    0x1_0001_0000_0001,
    0x1_0001_0001_0000,
    0x1_0001_0001_0001,
];

/// Encode one feature vector against a basis.
///
/// Deterministic: no randomness is drawn at encode time, so a fixed basis and
/// input always produce the identical hypervector. A bit in the result is set
/// iff strictly more than half of the bound vectors had it set; an exact tie
/// leaves it unset.
pub fn encode(input: &[u8], basis: &Basis) -> HdcResult<Hypervector> {
    let n_inputs = basis.n_inputs();
    if input.len() != n_inputs {
        return Err(HdcError::FeatureLengthMismatch {
            expected: n_inputs,
            actual: input.len(),
        });
    }

    let dim = basis.dim();
    let n_levels = basis.n_levels();
    let downscale = 256 / n_levels;
    let word_len = dim.word_len();

    // Two accumulator words per vector byte: 16-bit counts for 8 bit positions.
    let mut acc = vec![0u64; word_len * 16];
    let mut bound = Hypervector::zero(dim);

    for (position, &value) in input.iter().enumerate() {
        let level = ((value as usize) / downscale).min(n_levels - 1);
        bound.xor_from(basis.level_vector(level), basis.basis_vector(position));

        for (w, word) in bound.words().iter().enumerate() {
            for b in 0..8 {
                let byte = ((word >> (8 * b)) & 0xFF) as usize;
                acc[16 * w + 2 * b] += NIBBLE_LANES[byte & 0xF];
                acc[16 * w + 2 * b + 1] += NIBBLE_LANES[byte >> 4];
            }
        }
    }

    let half_n = (n_inputs / 2) as u64;
    let mut out = Hypervector::zero(dim);
    for j in 0..dim.0 {
        let count = lane_count(&acc, j);
        if count > half_n {
            out.set_bit(j, true);
        }
    }

    Ok(out)
}

/// Read the accumulated vote count for bit position `j`.
#[inline]
fn lane_count(acc: &[u64], j: usize) -> u64 {
    let word = j / 64;
    let bit = j % 64;
    let byte = bit / 8;
    let nibble = (bit % 8) / 4;
    let lane = bit % 4;
    (acc[16 * word + 2 * byte + nibble] >> (16 * lane)) & 0xFFFF
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hdc::Dimension;
    use rand::SeedableRng;

    fn seeded_rng() -> rand::rngs::StdRng {
        rand::rngs::StdRng::seed_from_u64(11)
    }

    fn test_basis(n_inputs: usize, n_levels: usize) -> Basis {
        Basis::new(Dimension(256), n_inputs, n_levels, &mut seeded_rng()).unwrap()
    }

    #[test]
    fn encoding_is_deterministic() {
        let basis = test_basis(16, 16);
        let input: Vec<u8> = (0..16).map(|i| (i * 16) as u8).collect();
        let a = encode(&input, &basis).unwrap();
        let b = encode(&input, &basis).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn wrong_input_length_is_rejected() {
        let basis = test_basis(16, 16);
        let input = vec![0u8; 15];
        assert!(matches!(
            encode(&input, &basis),
            Err(HdcError::FeatureLengthMismatch {
                expected: 16,
                actual: 15
            })
        ));
    }

    #[test]
    fn single_input_encoding_equals_bound_vector() {
        // With one input there is no vote to win: the encoding is exactly
        // level XOR basis.
        let basis = test_basis(1, 16);
        let input = [200u8];
        let encoded = encode(&input, &basis).unwrap();
        let expected = basis
            .level_vector(200 / 16)
            .xor(basis.basis_vector(0))
            .unwrap();
        assert_eq!(encoded, expected);
    }

    #[test]
    fn exact_tie_encodes_unset() {
        // Craft a basis by hand: all-zero level vectors make each bound
        // vector equal its basis vector. Two of four basis vectors set bit 5,
        // so the vote there is exactly 2 of 4 — a tie, which must stay unset.
        let dim = Dimension(64);
        let zero = Hypervector::zero(dim);
        let mut set = Hypervector::zero(dim);
        set.set_bit(5, true);

        let basis = Basis::from_parts(
            dim,
            vec![set.clone(), set, zero.clone(), zero.clone()],
            vec![zero.clone(), zero],
        )
        .unwrap();

        let encoded = encode(&[0, 0, 0, 0], &basis).unwrap();
        assert!(!encoded.get_bit(5));
        assert_eq!(encoded.popcount(), 0);
    }

    #[test]
    fn strict_majority_encodes_set() {
        // Three of four votes on bit 9 beats the threshold of 2.
        let dim = Dimension(64);
        let zero = Hypervector::zero(dim);
        let mut set = Hypervector::zero(dim);
        set.set_bit(9, true);

        let basis = Basis::from_parts(
            dim,
            vec![set.clone(), set.clone(), set, zero.clone()],
            vec![zero.clone(), zero],
        )
        .unwrap();

        let encoded = encode(&[0, 0, 0, 0], &basis).unwrap();
        assert!(encoded.get_bit(9));
        assert_eq!(encoded.popcount(), 1);
    }

    #[test]
    fn level_clamp_handles_non_dividing_level_counts() {
        // 256 / 3 = 85, so byte 255 would index level 3 of 3 without the
        // clamp. Must not panic and must use the last level.
        let basis = test_basis(4, 3);
        let encoded = encode(&[255, 255, 255, 255], &basis).unwrap();
        assert_eq!(encoded.dim(), basis.dim());
    }

    #[test]
    fn closer_intensity_buckets_encode_closer() {
        // All-identical-intensity inputs land on single level vectors, so
        // encoding distance tracks the level walk: bucket 10/255 is far from
        // bucket 250/255, and nearer to bucket 60/255.
        let basis = Basis::new(Dimension(1024), 8, 16, &mut seeded_rng()).unwrap();
        let low = encode(&[10u8; 8], &basis).unwrap();
        let mid = encode(&[60u8; 8], &basis).unwrap();
        let high = encode(&[250u8; 8], &basis).unwrap();

        let d_low_mid = low.hamming(&mid).unwrap();
        let d_low_high = low.hamming(&high).unwrap();
        assert!(
            d_low_mid < d_low_high,
            "expected bucket distance to grow: {d_low_mid} !< {d_low_high}"
        );
    }

    #[test]
    fn coarse_levels_spread_buckets_further_than_fine_levels_nearby() {
        // With 2 levels, intensities 10 and 250 sit on complementary level
        // vectors; with 16 levels the same pair spans 15 of 15 flip steps.
        // Both are near-maximal, but 16 levels must separate 10 from 60
        // far less than 2 levels separate 10 from 250.
        let fine = Basis::new(Dimension(1024), 8, 16, &mut seeded_rng()).unwrap();
        let coarse = Basis::new(Dimension(1024), 8, 2, &mut seeded_rng()).unwrap();

        let fine_near = encode(&[10u8; 8], &fine)
            .unwrap()
            .hamming(&encode(&[60u8; 8], &fine).unwrap())
            .unwrap();
        let coarse_far = encode(&[10u8; 8], &coarse)
            .unwrap()
            .hamming(&encode(&[250u8; 8], &coarse).unwrap())
            .unwrap();
        assert!(
            fine_near < coarse_far,
            "fine-grained nearby buckets ({fine_near}) should beat coarse opposite buckets ({coarse_far})"
        );
    }
}
