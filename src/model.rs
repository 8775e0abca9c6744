//! Model facade: top-level API for the heka classifier.
//!
//! A [`Model`] owns the random basis, the current classify set, the worker
//! pool, and (while incremental training is in progress) the retained
//! train set. It provides the public train / retrain / test / classify
//! surface and save/load entry points.

use std::path::Path;
use std::sync::Mutex;

use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;
use crate::error::{HekaResult, ModelError};
use crate::hdc::basis::Basis;
use crate::hdc::classify::ClassifySet;
use crate::hdc::encode::encode;
use crate::hdc::train::TrainSet;
use crate::hdc::Dimension;
use crate::parallel::{Orchestrator, DEFAULT_THREADS};
use crate::store;

/// Configuration for building a new model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Hypervector dimension (default: 10,000).
    pub dimension: Dimension,
    /// Bytes per input feature vector.
    pub n_inputs: usize,
    /// Intensity quantization granularity (default: 16 levels).
    pub n_levels: usize,
    /// Number of label classes.
    pub n_labels: usize,
    /// Class-vector quantization level count; 0 disables quantization.
    pub quantization: u32,
    /// Worker threads for bulk passes.
    pub n_threads: usize,
    /// Input downscale factor recorded for external resampling tooling.
    /// The engine carries it in the model header but never interprets it.
    pub downsize: u64,
    /// Seed for basis construction; the reproducibility knob.
    pub seed: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            dimension: Dimension::DEFAULT,
            n_inputs: 28 * 28,
            n_levels: 16,
            n_labels: 10,
            quantization: 0,
            n_threads: DEFAULT_THREADS,
            downsize: 1,
            seed: 0,
        }
    }
}

/// The heka HDC classifier.
///
/// The basis is immutable for the model's lifetime; the classify set is
/// replaced wholesale after every (re)training pass.
pub struct Model {
    basis: Basis,
    classify_set: ClassifySet,
    orchestrator: Orchestrator,
    quantization: u32,
    downsize: u64,
    feature_len: usize,
    train_state: Option<TrainSet>,
}

impl Model {
    /// Build an untrained model from a configuration.
    ///
    /// The basis is generated from `config.seed`, so equal configurations
    /// produce bit-identical models.
    pub fn new(config: &ModelConfig) -> HekaResult<Self> {
        if config.n_labels == 0 {
            return Err(ModelError::InvalidConfig {
                message: "n_labels must be > 0".into(),
            }
            .into());
        }

        tracing::info!(
            dim = config.dimension.0,
            n_inputs = config.n_inputs,
            n_levels = config.n_levels,
            n_labels = config.n_labels,
            quantization = config.quantization,
            seed = config.seed,
            "building model basis"
        );

        let mut rng = rand::rngs::StdRng::seed_from_u64(config.seed);
        let basis = Basis::new(
            config.dimension,
            config.n_inputs,
            config.n_levels,
            &mut rng,
        )?;
        let classify_set = ClassifySet::blank(config.dimension, config.n_labels)?;
        let orchestrator = Orchestrator::new(config.n_threads)?;

        Ok(Self {
            basis,
            classify_set,
            orchestrator,
            quantization: config.quantization,
            downsize: config.downsize,
            feature_len: config.n_inputs,
            train_state: None,
        })
    }

    /// Reassemble a model from persisted parts (used by [`store`]).
    pub(crate) fn from_parts(
        basis: Basis,
        classify_set: ClassifySet,
        quantization: u32,
        downsize: u64,
        feature_len: usize,
        n_threads: usize,
    ) -> HekaResult<Self> {
        let orchestrator = Orchestrator::new(n_threads)?;
        Ok(Self {
            basis,
            classify_set,
            orchestrator,
            quantization,
            downsize,
            feature_len,
            train_state: None,
        })
    }

    /// The model's basis.
    pub fn basis(&self) -> &Basis {
        &self.basis
    }

    /// The current classify set.
    pub fn classify_set(&self) -> &ClassifySet {
        &self.classify_set
    }

    /// Hypervector dimension.
    pub fn dimension(&self) -> Dimension {
        self.basis.dim()
    }

    /// Number of label classes.
    pub fn n_labels(&self) -> usize {
        self.classify_set.n_labels()
    }

    /// Class-vector quantization level count (0 = disabled).
    pub fn quantization(&self) -> u32 {
        self.quantization
    }

    /// Downscale factor recorded in the model header.
    pub fn downsize(&self) -> u64 {
        self.downsize
    }

    /// Bytes per input feature vector.
    pub fn feature_len(&self) -> usize {
        self.feature_len
    }

    /// Whether a retained train set from incremental training is present.
    pub fn has_train_state(&self) -> bool {
        self.train_state.is_some()
    }

    /// Classify one feature vector. Pure; no model state changes.
    pub fn classify(&self, feature: &[u8]) -> HekaResult<usize> {
        let vector = encode(feature, &self.basis)?;
        Ok(self.classify_set.classify(&vector)?)
    }

    /// Batch (re)build of the model's prototypes from a dataset.
    ///
    /// Runs one parallel training pass over `min(train_samples, len)`
    /// samples, derives the classify set, then runs `retrain_iterations`
    /// error-driven correction passes, re-deriving after each. Any train set
    /// retained from earlier incremental training is discarded first.
    pub fn train(
        &mut self,
        data: &Dataset,
        train_samples: usize,
        retrain_iterations: usize,
    ) -> HekaResult<()> {
        self.check_dataset(data)?;
        self.train_state = None;

        let n = train_samples.min(data.len());
        let train_set = Mutex::new(TrainSet::new(self.dimension(), self.n_labels())?);

        tracing::info!(samples = n, "training");
        self.orchestrator.train_pass(
            &self.basis,
            &train_set,
            &self.classify_set,
            data.labels(),
            data.features(),
            n,
            false,
        )?;
        {
            let set = train_set.lock().map_err(|_| ModelError::TrainSetPoisoned)?;
            self.classify_set = ClassifySet::derive(&set, self.quantization);
        }

        for iteration in 1..=retrain_iterations {
            let wrong = self.orchestrator.train_pass(
                &self.basis,
                &train_set,
                &self.classify_set,
                data.labels(),
                data.features(),
                n,
                true,
            )?;
            let set = train_set.lock().map_err(|_| ModelError::TrainSetPoisoned)?;
            self.classify_set = ClassifySet::derive(&set, self.quantization);
            tracing::info!(
                iteration,
                retrain_iterations,
                correct = n - wrong,
                samples = n,
                "retrain iteration finished"
            );
        }

        Ok(())
    }

    /// One incremental training iteration against a retained train set.
    ///
    /// The first call initializes the train set and runs in batch mode;
    /// subsequent calls run error-driven retraining against it. The classify
    /// set is re-derived after every call.
    pub fn train_one_iteration(&mut self, data: &Dataset, num_train: usize) -> HekaResult<()> {
        self.check_dataset(data)?;
        let n = num_train.min(data.len());

        let (state, retrain) = match self.train_state.take() {
            Some(state) => (state, true),
            None => (TrainSet::new(self.dimension(), self.n_labels())?, false),
        };

        let train_set = Mutex::new(state);
        let wrong = self.orchestrator.train_pass(
            &self.basis,
            &train_set,
            &self.classify_set,
            data.labels(),
            data.features(),
            n,
            retrain,
        )?;

        let state = train_set
            .into_inner()
            .map_err(|_| ModelError::TrainSetPoisoned)?;
        self.classify_set = ClassifySet::derive(&state, self.quantization);
        self.train_state = Some(state);

        tracing::info!(samples = n, retrain, wrong, "incremental iteration finished");
        Ok(())
    }

    /// Count correct predictions over `min(test_samples, len)` samples.
    pub fn test(&self, data: &Dataset, test_samples: usize) -> HekaResult<usize> {
        self.check_dataset(data)?;
        let n = test_samples.min(data.len());
        self.orchestrator.test_pass(
            &self.basis,
            &self.classify_set,
            data.labels(),
            data.features(),
            n,
        )
    }

    /// Persist the model to `path` in the binary model format.
    pub fn save(&self, path: &Path) -> HekaResult<()> {
        store::save(self, path)?;
        Ok(())
    }

    /// Load a model from `path` with the default worker count.
    ///
    /// The train set is never persisted, so incremental training after a
    /// load starts from a fresh accumulator.
    pub fn load(path: &Path) -> HekaResult<Self> {
        store::load(path, DEFAULT_THREADS)
    }

    /// Load a model from `path` with an explicit worker count.
    pub fn load_with_threads(path: &Path, n_threads: usize) -> HekaResult<Self> {
        store::load(path, n_threads)
    }

    fn check_dataset(&self, data: &Dataset) -> Result<(), ModelError> {
        if data.feature_len() != self.feature_len {
            return Err(ModelError::DatasetShape {
                expected: self.feature_len,
                actual: data.feature_len(),
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("dim", &self.basis.dim())
            .field("n_inputs", &self.basis.n_inputs())
            .field("n_levels", &self.basis.n_levels())
            .field("n_labels", &self.classify_set.n_labels())
            .field("quantization", &self.quantization)
            .field("has_train_state", &self.train_state.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> ModelConfig {
        ModelConfig {
            dimension: Dimension(512),
            n_inputs: 8,
            n_levels: 16,
            n_labels: 3,
            quantization: 0,
            n_threads: 2,
            downsize: 1,
            seed: 17,
        }
    }

    fn synthetic_dataset(n_per_class: usize, n_classes: usize, n_inputs: usize) -> Dataset {
        let mut labels = Vec::new();
        let mut features = Vec::new();
        for class in 0..n_classes {
            for k in 0..n_per_class {
                labels.push(class as u8);
                features.push(
                    (0..n_inputs)
                        .map(|i| ((i * 41 + class * 80 + k) % 256) as u8)
                        .collect(),
                );
            }
        }
        Dataset::new(labels, features, n_inputs).unwrap()
    }

    #[test]
    fn config_is_validated() {
        let config = ModelConfig {
            n_labels: 0,
            ..small_config()
        };
        assert!(Model::new(&config).is_err());
    }

    #[test]
    fn same_seed_builds_identical_models() {
        let config = small_config();
        let a = Model::new(&config).unwrap();
        let b = Model::new(&config).unwrap();
        assert_eq!(a.basis(), b.basis());
    }

    #[test]
    fn untrained_model_classifies_without_error() {
        let model = Model::new(&small_config()).unwrap();
        let label = model.classify(&[0u8; 8]).unwrap();
        assert!(label < 3);
    }

    #[test]
    fn dataset_shape_is_checked() {
        let mut model = Model::new(&small_config()).unwrap();
        let data = synthetic_dataset(2, 3, 5);
        assert!(model.train(&data, 100, 0).is_err());
        assert!(model.test(&data, 100).is_err());
    }

    #[test]
    fn training_learns_separable_classes() {
        let mut model = Model::new(&small_config()).unwrap();
        let data = synthetic_dataset(8, 3, 8);

        model.train(&data, data.len(), 1).unwrap();
        let correct = model.test(&data, data.len()).unwrap();
        assert!(
            correct * 10 >= data.len() * 9,
            "expected >=90% recall, got {correct}/{}",
            data.len()
        );
    }

    #[test]
    fn sample_counts_are_clamped_to_dataset_len() {
        let mut model = Model::new(&small_config()).unwrap();
        let data = synthetic_dataset(4, 3, 8);
        model.train(&data, usize::MAX, 0).unwrap();
        let correct = model.test(&data, usize::MAX).unwrap();
        assert!(correct <= data.len());
    }

    #[test]
    fn incremental_training_retains_state_across_calls() {
        let mut model = Model::new(&small_config()).unwrap();
        let data = synthetic_dataset(6, 3, 8);

        assert!(!model.has_train_state());
        model.train_one_iteration(&data, data.len()).unwrap();
        assert!(model.has_train_state());
        // Second call runs in retrain mode against the retained set.
        model.train_one_iteration(&data, data.len()).unwrap();
        assert!(model.has_train_state());

        let correct = model.test(&data, data.len()).unwrap();
        assert!(correct * 10 >= data.len() * 8);
    }

    #[test]
    fn batch_train_discards_incremental_state() {
        let mut model = Model::new(&small_config()).unwrap();
        let data = synthetic_dataset(4, 3, 8);
        model.train_one_iteration(&data, data.len()).unwrap();
        assert!(model.has_train_state());
        model.train(&data, data.len(), 0).unwrap();
        assert!(!model.has_train_state());
    }
}
