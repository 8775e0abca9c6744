//! heka CLI: hyperdimensional computing classifier.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use heka::dataset::Dataset;
use heka::hdc::Dimension;
use heka::model::{Model, ModelConfig};

#[derive(Parser)]
#[command(name = "heka", version, about = "Hyperdimensional computing classifier")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a model on an IDX label/feature file pair.
    Train {
        /// Path to the IDX label file.
        #[arg(long)]
        labels: PathBuf,

        /// Path to the IDX feature file.
        #[arg(long)]
        features: PathBuf,

        /// Where to write the trained model.
        #[arg(long)]
        model: PathBuf,

        /// Hypervector dimension.
        #[arg(long, default_value = "10000")]
        dimension: usize,

        /// Intensity quantization levels.
        #[arg(long, default_value = "16")]
        levels: usize,

        /// Number of label classes.
        #[arg(long, default_value = "10")]
        classes: usize,

        /// Class-vector quantization levels (0 disables).
        #[arg(long, default_value = "0")]
        quantization: u32,

        /// Training samples to use (clamped to the dataset size).
        #[arg(long)]
        samples: Option<usize>,

        /// Error-driven retrain iterations after the initial pass.
        #[arg(long, default_value = "4")]
        retrain: usize,

        /// Worker threads.
        #[arg(long, default_value = "8")]
        threads: usize,

        /// Basis construction seed.
        #[arg(long, default_value = "0")]
        seed: u64,
    },

    /// Measure a trained model's accuracy on a test dataset.
    Test {
        /// Path to the trained model.
        #[arg(long)]
        model: PathBuf,

        /// Path to the IDX label file.
        #[arg(long)]
        labels: PathBuf,

        /// Path to the IDX feature file.
        #[arg(long)]
        features: PathBuf,

        /// Test samples to use (clamped to the dataset size).
        #[arg(long)]
        samples: Option<usize>,

        /// Worker threads.
        #[arg(long, default_value = "8")]
        threads: usize,

        /// Emit the result as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Classify a single sample out of a dataset.
    Classify {
        /// Path to the trained model.
        #[arg(long)]
        model: PathBuf,

        /// Path to the IDX label file.
        #[arg(long)]
        labels: PathBuf,

        /// Path to the IDX feature file.
        #[arg(long)]
        features: PathBuf,

        /// Sample index to classify.
        #[arg(long, default_value = "0")]
        index: usize,
    },

    /// Show a model's header fields.
    Info {
        /// Path to the trained model.
        #[arg(long)]
        model: PathBuf,

        /// Emit the result as JSON.
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Train {
            labels,
            features,
            model,
            dimension,
            levels,
            classes,
            quantization,
            samples,
            retrain,
            threads,
            seed,
        } => {
            let data = Dataset::load(&labels, &features).into_diagnostic()?;
            let config = ModelConfig {
                dimension: Dimension(dimension),
                n_inputs: data.feature_len(),
                n_levels: levels,
                n_labels: classes,
                quantization,
                n_threads: threads,
                downsize: 1,
                seed,
            };
            let mut trained = Model::new(&config).into_diagnostic()?;
            let n = samples.unwrap_or(data.len());
            trained.train(&data, n, retrain).into_diagnostic()?;
            trained.save(&model).into_diagnostic()?;
            println!("trained on {} samples, model written to {}", n.min(data.len()), model.display());
        }

        Commands::Test {
            model,
            labels,
            features,
            samples,
            threads,
            json,
        } => {
            let data = Dataset::load(&labels, &features).into_diagnostic()?;
            let loaded = Model::load_with_threads(&model, threads).into_diagnostic()?;
            let n = samples.unwrap_or(data.len()).min(data.len());
            let correct = loaded.test(&data, n).into_diagnostic()?;
            if json {
                let report = serde_json::json!({
                    "samples": n,
                    "correct": correct,
                    "accuracy": correct as f64 / n.max(1) as f64,
                });
                println!("{}", serde_json::to_string_pretty(&report).into_diagnostic()?);
            } else {
                println!(
                    "{correct}/{n} correct ({:.2}%)",
                    100.0 * correct as f64 / n.max(1) as f64
                );
            }
        }

        Commands::Classify {
            model,
            labels,
            features,
            index,
        } => {
            let data = Dataset::load(&labels, &features).into_diagnostic()?;
            if index >= data.len() {
                miette::bail!("sample index {index} out of range (dataset has {})", data.len());
            }
            let loaded = Model::load(&model).into_diagnostic()?;
            let predicted = loaded.classify(data.feature(index)).into_diagnostic()?;
            println!(
                "sample {index}: predicted {predicted}, actual {}",
                data.label(index)
            );
        }

        Commands::Info { model, json } => {
            let loaded = Model::load(&model).into_diagnostic()?;
            if json {
                let report = serde_json::json!({
                    "dimension": loaded.dimension().0,
                    "n_inputs": loaded.basis().n_inputs(),
                    "n_levels": loaded.basis().n_levels(),
                    "n_labels": loaded.n_labels(),
                    "quantization": loaded.quantization(),
                    "downsize": loaded.downsize(),
                    "feature_len": loaded.feature_len(),
                });
                println!("{}", serde_json::to_string_pretty(&report).into_diagnostic()?);
            } else {
                println!("dimension:    {}", loaded.dimension());
                println!("inputs:       {}", loaded.basis().n_inputs());
                println!("levels:       {}", loaded.basis().n_levels());
                println!("labels:       {}", loaded.n_labels());
                println!("quantization: {}", loaded.quantization());
                println!("downsize:     {}", loaded.downsize());
            }
        }
    }

    Ok(())
}
