//! Labeled dataset contract and file I/O.
//!
//! A [`Dataset`] is the narrow interface the engine consumes: parallel arrays
//! of fixed-length byte feature vectors and single-byte labels. Loaders and
//! writers exist for the IDX pair format (big-endian headers, one label file
//! and one feature file) and for a single-file bincode snapshot.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DatasetError, DatasetResult};

const LABEL_MAGIC: u32 = 0x0000_0801;
const FEATURE_MAGIC: u32 = 0x0000_0803;

/// A labeled dataset: one label byte and one fixed-length feature vector per
/// sample, in matching order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    feature_len: usize,
    labels: Vec<u8>,
    features: Vec<Vec<u8>>,
}

impl Dataset {
    /// Assemble a dataset from parallel arrays, validating their shape.
    pub fn new(labels: Vec<u8>, features: Vec<Vec<u8>>, feature_len: usize) -> DatasetResult<Self> {
        if labels.len() != features.len() {
            return Err(DatasetError::CountMismatch {
                labels: labels.len(),
                features: features.len(),
            });
        }
        for (index, feature) in features.iter().enumerate() {
            if feature.len() != feature_len {
                return Err(DatasetError::FeatureShape {
                    index,
                    expected: feature_len,
                    actual: feature.len(),
                });
            }
        }
        Ok(Self {
            feature_len,
            labels,
            features,
        })
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether the dataset holds no samples.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Bytes per feature vector.
    pub fn feature_len(&self) -> usize {
        self.feature_len
    }

    /// All labels in sample order.
    pub fn labels(&self) -> &[u8] {
        &self.labels
    }

    /// All feature vectors in sample order.
    pub fn features(&self) -> &[Vec<u8>] {
        &self.features
    }

    /// One sample's label.
    pub fn label(&self, index: usize) -> u8 {
        self.labels[index]
    }

    /// One sample's feature vector.
    pub fn feature(&self, index: usize) -> &[u8] {
        &self.features[index]
    }

    /// Load a dataset from an IDX label/feature file pair.
    ///
    /// The magic words are skipped rather than validated; the historical
    /// tooling writes inconsistent magics and readers have always ignored
    /// them. Counts from the two headers must agree.
    pub fn load(labels_path: &Path, features_path: &Path) -> DatasetResult<Self> {
        let labels = load_labels(labels_path)?;
        let (features, feature_len) = load_features(features_path)?;
        if labels.len() != features.len() {
            return Err(DatasetError::CountMismatch {
                labels: labels.len(),
                features: features.len(),
            });
        }
        Ok(Self {
            feature_len,
            labels,
            features,
        })
    }

    /// Write the dataset as an IDX label/feature file pair.
    pub fn save(&self, labels_path: &Path, features_path: &Path) -> DatasetResult<()> {
        save_labels(labels_path, &self.labels)?;
        save_features(features_path, &self.features, self.feature_len)?;
        Ok(())
    }

    /// Restore a dataset from a single-file bincode snapshot.
    pub fn load_snapshot(path: &Path) -> DatasetResult<Self> {
        let file = File::open(path)?;
        let dataset: Dataset =
            bincode::deserialize_from(BufReader::new(file)).map_err(|e| DatasetError::Snapshot {
                message: e.to_string(),
            })?;
        Dataset::new(dataset.labels, dataset.features, dataset.feature_len)
    }

    /// Write the dataset as a single-file bincode snapshot.
    pub fn save_snapshot(&self, path: &Path) -> DatasetResult<()> {
        let file = File::create(path)?;
        bincode::serialize_into(BufWriter::new(file), self).map_err(|e| DatasetError::Snapshot {
            message: e.to_string(),
        })
    }
}

/// Load the labels of an IDX label file.
pub fn load_labels(path: &Path) -> DatasetResult<Vec<u8>> {
    let mut rdr = BufReader::new(File::open(path)?);
    let _magic = read_u32_be(&mut rdr)?;
    let count = read_u32_be(&mut rdr)? as usize;
    let mut labels = vec![0u8; count];
    rdr.read_exact(&mut labels)?;
    Ok(labels)
}

/// Write an IDX label file.
pub fn save_labels(path: &Path, labels: &[u8]) -> DatasetResult<()> {
    let mut wtr = BufWriter::new(File::create(path)?);
    write_u32_be(&mut wtr, LABEL_MAGIC)?;
    write_u32_be(&mut wtr, labels.len() as u32)?;
    wtr.write_all(labels)?;
    wtr.flush()?;
    Ok(())
}

/// Load the feature vectors of an IDX feature file.
///
/// Returns the vectors and the per-sample feature length (rows × cols).
pub fn load_features(path: &Path) -> DatasetResult<(Vec<Vec<u8>>, usize)> {
    let mut rdr = BufReader::new(File::open(path)?);
    let _magic = read_u32_be(&mut rdr)?;
    let count = read_u32_be(&mut rdr)? as usize;
    let rows = read_u32_be(&mut rdr)? as usize;
    let cols = read_u32_be(&mut rdr)? as usize;
    let feature_len = rows * cols;

    let mut features = Vec::with_capacity(count);
    for _ in 0..count {
        let mut feature = vec![0u8; feature_len];
        rdr.read_exact(&mut feature)?;
        features.push(feature);
    }
    Ok((features, feature_len))
}

/// Write an IDX feature file. Features are stored as `1 × feature_len` rows.
pub fn save_features(path: &Path, features: &[Vec<u8>], feature_len: usize) -> DatasetResult<()> {
    let mut wtr = BufWriter::new(File::create(path)?);
    write_u32_be(&mut wtr, FEATURE_MAGIC)?;
    write_u32_be(&mut wtr, features.len() as u32)?;
    write_u32_be(&mut wtr, 1)?;
    write_u32_be(&mut wtr, feature_len as u32)?;
    for (index, feature) in features.iter().enumerate() {
        if feature.len() != feature_len {
            return Err(DatasetError::FeatureShape {
                index,
                expected: feature_len,
                actual: feature.len(),
            });
        }
        wtr.write_all(feature)?;
    }
    wtr.flush()?;
    Ok(())
}

fn read_u32_be(rdr: &mut impl Read) -> DatasetResult<u32> {
    let mut buf = [0u8; 4];
    rdr.read_exact(&mut buf)?;
    Ok(u32::from_be_bytes(buf))
}

fn write_u32_be(wtr: &mut impl Write, value: u32) -> DatasetResult<()> {
    wtr.write_all(&value.to_be_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_dataset() -> Dataset {
        let labels = vec![0u8, 1, 1, 0];
        let features = vec![
            vec![0u8, 10, 20],
            vec![200u8, 210, 220],
            vec![190u8, 200, 255],
            vec![5u8, 0, 30],
        ];
        Dataset::new(labels, features, 3).unwrap()
    }

    #[test]
    fn new_validates_shape() {
        assert!(matches!(
            Dataset::new(vec![0, 1], vec![vec![0u8; 3]], 3),
            Err(DatasetError::CountMismatch {
                labels: 2,
                features: 1
            })
        ));
        assert!(matches!(
            Dataset::new(vec![0], vec![vec![0u8; 2]], 3),
            Err(DatasetError::FeatureShape {
                index: 0,
                expected: 3,
                actual: 2
            })
        ));
    }

    #[test]
    fn idx_pair_roundtrip() {
        let dir = tempfile::TempDir::new().unwrap();
        let labels_path = dir.path().join("labels.idx1-ubyte");
        let features_path = dir.path().join("features.idx3-ubyte");

        let dataset = sample_dataset();
        dataset.save(&labels_path, &features_path).unwrap();
        let loaded = Dataset::load(&labels_path, &features_path).unwrap();
        assert_eq!(loaded, dataset);
    }

    #[test]
    fn snapshot_roundtrip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("dataset.bin");

        let dataset = sample_dataset();
        dataset.save_snapshot(&path).unwrap();
        let loaded = Dataset::load_snapshot(&path).unwrap();
        assert_eq!(loaded, dataset);
    }

    #[test]
    fn truncated_label_file_is_an_io_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("labels.idx1-ubyte");
        // Header claims 100 labels but provides none.
        let mut wtr = BufWriter::new(File::create(&path).unwrap());
        write_u32_be(&mut wtr, LABEL_MAGIC).unwrap();
        write_u32_be(&mut wtr, 100).unwrap();
        wtr.flush().unwrap();
        drop(wtr);

        assert!(matches!(load_labels(&path), Err(DatasetError::Io { .. })));
    }

    #[test]
    fn mismatched_pair_counts_are_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let labels_path = dir.path().join("labels.idx1-ubyte");
        let features_path = dir.path().join("features.idx3-ubyte");

        save_labels(&labels_path, &[0, 1, 0]).unwrap();
        save_features(&features_path, &[vec![0u8; 2]], 2).unwrap();

        assert!(matches!(
            Dataset::load(&labels_path, &features_path),
            Err(DatasetError::CountMismatch {
                labels: 3,
                features: 1
            })
        ));
    }
}
