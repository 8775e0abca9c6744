//! Rich diagnostic error types for the heka engine.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes and help text so users know exactly what went wrong and
//! how to fix it.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for the heka engine.
///
/// Each variant wraps a subsystem-specific error, preserving the full diagnostic
/// chain (error codes, help text, sources) through to the user.
#[derive(Debug, Error, Diagnostic)]
pub enum HekaError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Hdc(#[from] HdcError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Dataset(#[from] DatasetError),
}

/// Result alias for operations that can fail anywhere in the engine.
pub type HekaResult<T> = std::result::Result<T, HekaError>;

// ---------------------------------------------------------------------------
// HDC core errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum HdcError {
    #[error("hypervector dimension must be greater than zero")]
    #[diagnostic(
        code(heka::hdc::zero_dimension),
        help("Pass a positive dimension, e.g. Dimension::DEFAULT (10,000 bits).")
    )]
    ZeroDimension,

    #[error("input feature count must be greater than zero")]
    #[diagnostic(
        code(heka::hdc::zero_inputs),
        help("A basis needs at least one input position to bind against.")
    )]
    ZeroInputs,

    #[error("input feature count {n_inputs} exceeds the maximum of {max}")]
    #[diagnostic(
        code(heka::hdc::too_many_inputs),
        help(
            "The bundle accumulator counts per-bit votes in 16-bit lanes, so at \
             most 65,535 inputs can be bundled into one encoding. Split the \
             feature vector or reduce its length."
        )
    )]
    TooManyInputs { n_inputs: usize, max: usize },

    #[error("level count {n_levels} is out of range [2, 256]")]
    #[diagnostic(
        code(heka::hdc::level_count),
        help(
            "Level vectors quantize byte intensities, so there must be between \
             2 and 256 of them. 16 is a good default."
        )
    )]
    LevelCountOutOfRange { n_levels: usize },

    #[error("level chain needs {requested} bit flips but only {available} bits exist")]
    #[diagnostic(
        code(heka::hdc::flip_budget),
        help(
            "Each level consumes dimension / (n_levels - 1) previously-unflipped \
             bit positions. Increase the dimension or reduce the level count."
        )
    )]
    FlipBudgetExceeded { requested: usize, available: usize },

    #[error("label count must be greater than zero")]
    #[diagnostic(
        code(heka::hdc::zero_labels),
        help("Train and classify sets need at least one label class.")
    )]
    ZeroLabels,

    #[error("label {label} is out of range for {n_labels} classes")]
    #[diagnostic(
        code(heka::hdc::label_range),
        help(
            "Labels must lie in [0, n_labels). Check the dataset's label bytes \
             against the label count the model was built with."
        )
    )]
    LabelOutOfRange { label: usize, n_labels: usize },

    #[error("dimension mismatch: expected {expected}, got {actual}")]
    #[diagnostic(
        code(heka::hdc::dim_mismatch),
        help(
            "All hypervectors in an operation must share the same dimension. \
             Check that they were created against the same basis."
        )
    )]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("feature vector has {actual} bytes, the basis expects {expected}")]
    #[diagnostic(
        code(heka::hdc::feature_len),
        help(
            "Each sample must have exactly n_inputs bytes. Verify the dataset's \
             feature length matches the model's input count."
        )
    )]
    FeatureLengthMismatch { expected: usize, actual: usize },
}

/// Result alias for HDC core operations.
pub type HdcResult<T> = std::result::Result<T, HdcError>;

// ---------------------------------------------------------------------------
// Model errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ModelError {
    #[error("invalid model configuration: {message}")]
    #[diagnostic(
        code(heka::model::invalid_config),
        help("Check the ModelConfig fields against the documented ranges.")
    )]
    InvalidConfig { message: String },

    #[error("failed to build worker thread pool: {message}")]
    #[diagnostic(
        code(heka::model::thread_pool),
        help(
            "The rayon thread pool could not be created. Reduce n_threads or \
             check process resource limits."
        )
    )]
    ThreadPool { message: String },

    #[error("training accumulator lock was poisoned by a worker panic")]
    #[diagnostic(
        code(heka::model::poisoned),
        help(
            "A worker thread panicked while holding the TrainSet lock. The \
             accumulator may be partially updated; restart training from a \
             fresh TrainSet."
        )
    )]
    TrainSetPoisoned,

    #[error("dataset feature length {actual} does not match the model's {expected}")]
    #[diagnostic(
        code(heka::model::dataset_shape),
        help(
            "The model was built for feature vectors of a fixed length. Load a \
             dataset with matching dimensions or build a new model."
        )
    )]
    DatasetShape { expected: usize, actual: usize },
}

/// Result alias for model operations.
pub type ModelResult<T> = std::result::Result<T, ModelError>;

// ---------------------------------------------------------------------------
// Store errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    #[error("I/O error: {source}")]
    #[diagnostic(
        code(heka::store::io),
        help(
            "A filesystem operation failed. Check that the path exists, has \
             correct permissions, and that the disk is not full."
        )
    )]
    Io {
        #[source]
        source: std::io::Error,
    },

    #[error("not a heka model file (bad magic {found:?})")]
    #[diagnostic(
        code(heka::store::bad_magic),
        help("The file does not start with the heka model magic. Check the path.")
    )]
    BadMagic { found: [u8; 4] },

    #[error("unsupported model format version {found} (this build reads version {supported})")]
    #[diagnostic(
        code(heka::store::version),
        help(
            "The model was written by an incompatible release. Retrain the \
             model or load it with a matching heka version."
        )
    )]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("corrupt model file: {message}")]
    #[diagnostic(
        code(heka::store::corrupt),
        help(
            "A header field is inconsistent with the rest of the file. The \
             file may be truncated or damaged; retrain and save again."
        )
    )]
    Corrupt { message: String },
}

impl From<std::io::Error> for StoreError {
    fn from(source: std::io::Error) -> Self {
        StoreError::Io { source }
    }
}

/// Result alias for model persistence.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

// ---------------------------------------------------------------------------
// Dataset errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum DatasetError {
    #[error("I/O error: {source}")]
    #[diagnostic(
        code(heka::dataset::io),
        help(
            "A dataset file could not be read or written. Check the path and \
             that the file is a complete IDX dump."
        )
    )]
    Io {
        #[source]
        source: std::io::Error,
    },

    #[error("label file has {labels} entries but feature file has {features}")]
    #[diagnostic(
        code(heka::dataset::count_mismatch),
        help(
            "Label and feature files must describe the same samples in the \
             same order. Make sure the two files belong to the same dataset."
        )
    )]
    CountMismatch { labels: usize, features: usize },

    #[error("sample {index} has {actual} feature bytes, expected {expected}")]
    #[diagnostic(
        code(heka::dataset::feature_shape),
        help("Every sample must have the dataset's declared feature length.")
    )]
    FeatureShape {
        index: usize,
        expected: usize,
        actual: usize,
    },

    #[error("snapshot codec error: {message}")]
    #[diagnostic(
        code(heka::dataset::snapshot),
        help(
            "The bincode snapshot could not be encoded or decoded. It may have \
             been written by an incompatible release; re-export the dataset."
        )
    )]
    Snapshot { message: String },
}

impl From<std::io::Error> for DatasetError {
    fn from(source: std::io::Error) -> Self {
        DatasetError::Io { source }
    }
}

/// Result alias for dataset operations.
pub type DatasetResult<T> = std::result::Result<T, DatasetError>;
