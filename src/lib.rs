//! # heka
//!
//! A hyperdimensional computing (HDC) classifier: byte feature vectors are
//! projected into high-dimensional binary hypervectors through a random
//! basis, accumulated into per-class prototypes, and classified by normalized
//! similarity.
//!
//! ## Architecture
//!
//! - **HDC core** (`hdc`): bit-packed hypervectors, basis and level-vector
//!   generation, bind-and-bundle encoding, train/untrain tallies, quantized
//!   prototypes and classification
//! - **Parallel passes** (`parallel`): fixed-size rayon pool sharding bulk
//!   train/retrain/test work over a mutex-protected accumulator
//! - **Model facade** (`model`): configuration, the train/retrain loop,
//!   incremental training, testing
//! - **Persistence** (`store`): versioned binary model format
//! - **Datasets** (`dataset`): the label/feature array contract plus IDX and
//!   snapshot file I/O
//!
//! ## Library usage
//!
//! ```no_run
//! use heka::dataset::Dataset;
//! use heka::model::{Model, ModelConfig};
//!
//! let data = Dataset::load(
//!     "train-labels.idx1-ubyte".as_ref(),
//!     "train-images.idx3-ubyte".as_ref(),
//! ).unwrap();
//!
//! let mut model = Model::new(&ModelConfig::default()).unwrap();
//! model.train(&data, data.len(), 4).unwrap();
//! let label = model.classify(data.feature(0)).unwrap();
//! println!("predicted {label}");
//! ```

pub mod dataset;
pub mod error;
pub mod hdc;
pub mod model;
pub mod parallel;
pub mod store;
