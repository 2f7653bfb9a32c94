use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::{ensure, Context, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;
use tracing::info;

use super::config::{LoraConfig, ModelConfig, TrainConfig, TrainingArgs};
use crate::store::{self, InstructionPair};

pub const TRAIN_FILE: &str = "train.jsonl";
pub const EVAL_FILE: &str = "eval.jsonl";
pub const MANIFEST_FILE: &str = "train_config.json";
pub const FINAL_MODEL_DIR: &str = "final";

/// Everything the external trainer needs, on disk.
#[derive(Debug, Clone)]
pub struct TrainingJob {
    pub output_dir: PathBuf,
    pub manifest_path: PathBuf,
    pub train_path: PathBuf,
    pub eval_path: Option<PathBuf>,
    pub train_count: usize,
    pub eval_count: usize,
}

impl TrainingJob {
    pub fn final_model_dir(&self) -> PathBuf {
        self.output_dir.join(FINAL_MODEL_DIR)
    }
}

/// Manifest handed to the trainer via `--config`.
#[derive(Debug, Serialize)]
struct Manifest<'a> {
    model: &'a ModelConfig,
    lora: &'a LoraConfig,
    args: &'a TrainingArgs,
    train_file: &'a PathBuf,
    eval_file: Option<&'a PathBuf>,
    final_model_dir: PathBuf,
}

/// Split `pairs` and write the training files plus manifest into `args.output_dir`.
pub fn prepare(config: &TrainConfig, pairs: Vec<InstructionPair>) -> Result<TrainingJob> {
    config.validate()?;
    ensure!(!pairs.is_empty(), "no instruction pairs to train on");

    let output_dir = config.args.output_dir.clone();
    fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    let (train, eval) = split(pairs, config.eval_fraction, config.seed);

    let train_path = output_dir.join(TRAIN_FILE);
    store::write_jsonl(&train_path, &train)?;

    let eval_path = if eval.is_empty() {
        None
    } else {
        let path = output_dir.join(EVAL_FILE);
        store::write_jsonl(&path, &eval)?;
        Some(path)
    };

    let job = TrainingJob {
        manifest_path: output_dir.join(MANIFEST_FILE),
        output_dir,
        train_path,
        eval_path,
        train_count: train.len(),
        eval_count: eval.len(),
    };

    let manifest = Manifest {
        model: &config.model,
        lora: &config.lora,
        args: &config.args,
        train_file: &job.train_path,
        eval_file: job.eval_path.as_ref(),
        final_model_dir: job.final_model_dir(),
    };
    let file = File::create(&job.manifest_path)
        .with_context(|| format!("Failed to create {}", job.manifest_path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &manifest)
        .with_context(|| format!("Failed to write {}", job.manifest_path.display()))?;
    writer.flush()?;

    info!(
        train = job.train_count,
        eval = job.eval_count,
        dir = %job.output_dir.display(),
        "Training job prepared"
    );
    Ok(job)
}

/// Seeded shuffle, then hold out `fraction` for evaluation. At least one pair stays in train.
fn split(
    mut pairs: Vec<InstructionPair>,
    fraction: f64,
    seed: u64,
) -> (Vec<InstructionPair>, Vec<InstructionPair>) {
    if fraction <= 0.0 || pairs.len() < 2 {
        return (pairs, Vec::new());
    }
    let mut rng = StdRng::seed_from_u64(seed);
    pairs.shuffle(&mut rng);

    let total = pairs.len();
    let eval_count = ((total as f64) * fraction).round() as usize;
    let eval_count = eval_count.min(total - 1);
    let eval = pairs.split_off(total - eval_count);
    (pairs, eval)
}
