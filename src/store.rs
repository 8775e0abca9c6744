//! Binary model persistence.
//!
//! The model file is a fixed-order little-endian layout: a magic word and
//! format version, the scalar header (downsize, feature length, quantization,
//! input count, level count, label count, dimension), every basis vector's
//! packed bytes, every level vector's packed bytes, then per label the
//! prototype tallies as i32 values followed by the norm as an f64. No
//! checksum; a short read surfaces as an I/O error.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::error::{HekaResult, StoreError, StoreResult};
use crate::hdc::basis::Basis;
use crate::hdc::classify::ClassifySet;
use crate::hdc::{Dimension, Hypervector};
use crate::model::Model;

const MAGIC: [u8; 4] = *b"HEKA";
const VERSION: u32 = 1;

/// Largest dimension a model file may declare (a 32 MiB vector).
const MAX_DIMENSION: usize = 1 << 28;

/// Largest label count a model file may declare.
const MAX_LABELS: usize = 1 << 20;

/// Write `model` to `path` in the binary model format.
pub fn save(model: &Model, path: &Path) -> StoreResult<()> {
    let mut wtr = BufWriter::new(File::create(path)?);

    wtr.write_all(&MAGIC)?;
    wtr.write_all(&VERSION.to_le_bytes())?;

    let basis = model.basis();
    let classify_set = model.classify_set();
    write_u64(&mut wtr, model.downsize())?;
    write_u64(&mut wtr, model.feature_len() as u64)?;
    write_u64(&mut wtr, model.quantization() as u64)?;
    write_u64(&mut wtr, basis.n_inputs() as u64)?;
    write_u64(&mut wtr, basis.n_levels() as u64)?;
    write_u64(&mut wtr, classify_set.n_labels() as u64)?;
    write_u64(&mut wtr, basis.dim().0 as u64)?;

    for vector in basis.basis_vectors() {
        wtr.write_all(&vector.to_packed_bytes())?;
    }
    for vector in basis.level_vectors() {
        wtr.write_all(&vector.to_packed_bytes())?;
    }
    for label in 0..classify_set.n_labels() {
        for &component in classify_set.class_vector(label) {
            wtr.write_all(&component.to_le_bytes())?;
        }
        wtr.write_all(&classify_set.norm(label).to_le_bytes())?;
    }

    wtr.flush()?;
    Ok(())
}

/// Read a model from `path`, building its worker pool with `n_threads`.
///
/// The incremental train set is never persisted; the loaded model starts
/// without one.
pub fn load(path: &Path, n_threads: usize) -> HekaResult<Model> {
    let mut rdr = BufReader::new(File::open(path).map_err(StoreError::from)?);

    let mut magic = [0u8; 4];
    rdr.read_exact(&mut magic).map_err(StoreError::from)?;
    if magic != MAGIC {
        return Err(StoreError::BadMagic { found: magic }.into());
    }
    let version = read_u32(&mut rdr)?;
    if version != VERSION {
        return Err(StoreError::UnsupportedVersion {
            found: version,
            supported: VERSION,
        }
        .into());
    }

    let downsize = read_u64(&mut rdr)?;
    let feature_len = read_u64(&mut rdr)? as usize;
    let quantization = read_u64(&mut rdr)?;
    let n_inputs = read_u64(&mut rdr)? as usize;
    let n_levels = read_u64(&mut rdr)? as usize;
    let n_labels = read_u64(&mut rdr)? as usize;
    let dim = Dimension(read_u64(&mut rdr)? as usize);

    if quantization > u32::MAX as u64 {
        return Err(StoreError::Corrupt {
            message: format!("quantization {quantization} exceeds u32 range"),
        }
        .into());
    }
    // Bound the header fields before allocating buffers sized by them.
    if dim.0 == 0 || dim.0 > MAX_DIMENSION {
        return Err(StoreError::Corrupt {
            message: format!("dimension {} outside (0, {MAX_DIMENSION}]", dim.0),
        }
        .into());
    }
    if n_inputs == 0 || n_inputs > u16::MAX as usize {
        return Err(StoreError::Corrupt {
            message: format!("input count {n_inputs} outside (0, 65535]"),
        }
        .into());
    }
    if !(2..=256).contains(&n_levels) {
        return Err(StoreError::Corrupt {
            message: format!("level count {n_levels} outside [2, 256]"),
        }
        .into());
    }
    if n_labels == 0 || n_labels > MAX_LABELS {
        return Err(StoreError::Corrupt {
            message: format!("label count {n_labels} outside (0, {MAX_LABELS}]"),
        }
        .into());
    }

    let mut packed = vec![0u8; dim.packed_byte_len()];
    let mut read_vector = |rdr: &mut BufReader<File>| -> HekaResult<Hypervector> {
        rdr.read_exact(&mut packed).map_err(StoreError::from)?;
        Ok(Hypervector::from_packed_bytes(&packed, dim)?)
    };

    let mut basis_vectors = Vec::with_capacity(n_inputs);
    for _ in 0..n_inputs {
        basis_vectors.push(read_vector(&mut rdr)?);
    }
    let mut level_vectors = Vec::with_capacity(n_levels);
    for _ in 0..n_levels {
        level_vectors.push(read_vector(&mut rdr)?);
    }
    let basis = Basis::from_parts(dim, basis_vectors, level_vectors)?;

    let mut class_vectors = Vec::with_capacity(n_labels);
    let mut norms = Vec::with_capacity(n_labels);
    for _ in 0..n_labels {
        let mut prototype = Vec::with_capacity(dim.0);
        for _ in 0..dim.0 {
            prototype.push(read_i32(&mut rdr)?);
        }
        class_vectors.push(prototype);
        norms.push(read_f64(&mut rdr)?);
    }
    let classify_set = ClassifySet::from_parts(dim, class_vectors, norms)?;

    Model::from_parts(
        basis,
        classify_set,
        quantization as u32,
        downsize,
        feature_len,
        n_threads,
    )
}

fn write_u64(wtr: &mut impl Write, value: u64) -> StoreResult<()> {
    wtr.write_all(&value.to_le_bytes())?;
    Ok(())
}

fn read_u32(rdr: &mut impl Read) -> StoreResult<u32> {
    let mut buf = [0u8; 4];
    rdr.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_u64(rdr: &mut impl Read) -> StoreResult<u64> {
    let mut buf = [0u8; 8];
    rdr.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

fn read_i32(rdr: &mut impl Read) -> StoreResult<i32> {
    let mut buf = [0u8; 4];
    rdr.read_exact(&mut buf)?;
    Ok(i32::from_le_bytes(buf))
}

fn read_f64(rdr: &mut impl Read) -> StoreResult<f64> {
    let mut buf = [0u8; 8];
    rdr.read_exact(&mut buf)?;
    Ok(f64::from_le_bytes(buf))
}
