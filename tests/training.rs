//! End-to-end training and classification tests for the heka classifier.
//!
//! These exercise the full pipeline — dataset, encoding, parallel training,
//! retraining, and testing — on small synthetic datasets with well-separated
//! classes.

use heka::dataset::Dataset;
use heka::hdc::Dimension;
use heka::model::{Model, ModelConfig};

fn config(n_inputs: usize, n_labels: usize) -> ModelConfig {
    ModelConfig {
        dimension: Dimension(1024),
        n_inputs,
        n_levels: 16,
        n_labels,
        quantization: 0,
        n_threads: 4,
        downsize: 1,
        seed: 1234,
    }
}

/// Classes with distinct per-position intensity patterns, plus a small
/// per-sample perturbation that stays within one quantization bucket most of
/// the time.
fn separable_dataset(n_per_class: usize, n_classes: usize, n_inputs: usize) -> Dataset {
    let mut labels = Vec::new();
    let mut features = Vec::new();
    for class in 0..n_classes {
        for k in 0..n_per_class {
            labels.push(class as u8);
            features.push(
                (0..n_inputs)
                    .map(|i| {
                        let base = (i * 53 + class * 90) % 256;
                        ((base + (k % 3) * 2) % 256) as u8
                    })
                    .collect(),
            );
        }
    }
    Dataset::new(labels, features, n_inputs).unwrap()
}

#[test]
fn batch_training_recalls_training_set() {
    let data = separable_dataset(10, 3, 16);
    let mut model = Model::new(&config(16, 3)).unwrap();
    model.train(&data, data.len(), 0).unwrap();

    let correct = model.test(&data, data.len()).unwrap();
    assert!(
        correct * 10 >= data.len() * 9,
        "expected >=90% training recall, got {correct}/{}",
        data.len()
    );
}

#[test]
fn retraining_does_not_degrade_recall() {
    let data = separable_dataset(10, 3, 16);

    let mut plain = Model::new(&config(16, 3)).unwrap();
    plain.train(&data, data.len(), 0).unwrap();
    let baseline = plain.test(&data, data.len()).unwrap();

    let mut retrained = Model::new(&config(16, 3)).unwrap();
    retrained.train(&data, data.len(), 3).unwrap();
    let refined = retrained.test(&data, data.len()).unwrap();

    assert!(
        refined + 1 >= baseline,
        "retraining regressed recall: {refined} vs baseline {baseline}"
    );
}

#[test]
fn quantized_prototypes_still_classify() {
    let data = separable_dataset(10, 3, 16);
    let mut model = Model::new(&ModelConfig {
        quantization: 2,
        ..config(16, 3)
    })
    .unwrap();
    model.train(&data, data.len(), 1).unwrap();

    let correct = model.test(&data, data.len()).unwrap();
    assert!(
        correct * 10 >= data.len() * 8,
        "quantized recall collapsed: {correct}/{}",
        data.len()
    );
}

#[test]
fn classification_separates_unseen_perturbations() {
    // Training samples carry even perturbations {0, 2, 4}; an odd offset
    // never appears in the training set.
    let train = separable_dataset(8, 3, 16);
    let mut model = Model::new(&config(16, 3)).unwrap();
    model.train(&train, train.len(), 2).unwrap();

    for class in 0..3u8 {
        let feature: Vec<u8> = (0..16)
            .map(|i| {
                let base = (i * 53 + (class as usize) * 90) % 256;
                ((base + 1) % 256) as u8
            })
            .collect();
        let predicted = model.classify(&feature).unwrap();
        assert_eq!(
            predicted, class as usize,
            "held-out variant of class {class} misclassified"
        );
    }
}

#[test]
fn incremental_iterations_converge_on_training_set() {
    let data = separable_dataset(8, 3, 16);
    let mut model = Model::new(&config(16, 3)).unwrap();

    model.train_one_iteration(&data, data.len()).unwrap();
    let first = model.test(&data, data.len()).unwrap();

    for _ in 0..3 {
        model.train_one_iteration(&data, data.len()).unwrap();
    }
    let later = model.test(&data, data.len()).unwrap();

    assert!(
        later + 1 >= first,
        "incremental retraining regressed recall: {later} vs {first}"
    );
}

#[test]
fn empty_dataset_trains_to_a_blank_model() {
    let data = Dataset::new(vec![], vec![], 16).unwrap();
    let mut model = Model::new(&config(16, 3)).unwrap();
    model.train(&data, 100, 2).unwrap();

    // Nothing was accumulated; classification still works and test passes
    // count zero samples.
    assert_eq!(model.test(&data, 100).unwrap(), 0);
    let label = model.classify(&[0u8; 16]).unwrap();
    assert!(label < 3);
}

#[test]
fn mismatched_feature_length_is_a_model_error() {
    let data = separable_dataset(2, 2, 8);
    let mut model = Model::new(&config(16, 2)).unwrap();
    assert!(model.train(&data, data.len(), 0).is_err());
    assert!(model.test(&data, data.len()).is_err());
}
