use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

const ENV_PREFIX: &str = "AFCORPUS_TRAIN";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub model_name: String,
    pub load_in_4bit: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_name: "google/gemma-2b".into(),
            load_in_4bit: true,
        }
    }
}

/// Low-rank adapter settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoraConfig {
    pub r: u32,
    pub alpha: u32,
    pub dropout: f64,
    pub target_modules: Vec<String>,
    pub bias: String,
    pub task_type: String,
}

impl Default for LoraConfig {
    fn default() -> Self {
        Self {
            r: 8,
            alpha: 32,
            dropout: 0.1,
            target_modules: vec!["q_proj".into(), "v_proj".into()],
            bias: "none".into(),
            task_type: "CAUSAL_LM".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingArgs {
    pub output_dir: PathBuf,
    pub num_train_epochs: u32,
    pub per_device_train_batch_size: u32,
    pub gradient_accumulation_steps: u32,
    pub learning_rate: f64,
    pub warmup_steps: u32,
    pub logging_steps: u32,
    pub eval_steps: u32,
    pub save_steps: u32,
    pub save_total_limit: u32,
    pub fp16: bool,
    pub load_best_model_at_end: bool,
}

impl Default for TrainingArgs {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("outputs"),
            num_train_epochs: 3,
            per_device_train_batch_size: 4,
            gradient_accumulation_steps: 4,
            learning_rate: 2e-4,
            warmup_steps: 100,
            logging_steps: 10,
            eval_steps: 500,
            save_steps: 500,
            save_total_limit: 3,
            fp16: true,
            load_best_model_at_end: true,
        }
    }
}

/// External program that performs the actual training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            program: "python3".into(),
            args: vec!["train_lora.py".into()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub model: ModelConfig,
    pub lora: LoraConfig,
    pub args: TrainingArgs,
    pub runner: RunnerConfig,
    /// Share of pairs held out for evaluation; 0 disables the eval split.
    pub eval_fraction: f64,
    pub seed: u64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            model: ModelConfig::default(),
            lora: LoraConfig::default(),
            args: TrainingArgs::default(),
            runner: RunnerConfig::default(),
            eval_fraction: 0.0,
            seed: 42,
        }
    }
}

impl TrainConfig {
    /// Defaults, overlaid by an optional TOML file and `AFCORPUS_TRAIN__*` env vars
    /// (`__` separates nesting, e.g. `AFCORPUS_TRAIN__LORA__R=16`).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        let cfg: TrainConfig = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to load training config")?
            .try_deserialize()
            .context("Failed to parse training config")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(!self.model.model_name.trim().is_empty(), "model_name must not be empty");
        ensure!(self.lora.r > 0, "lora.r must be > 0");
        ensure!(self.lora.alpha > 0, "lora.alpha must be > 0");
        ensure!(
            (0.0..1.0).contains(&self.lora.dropout),
            "lora.dropout must be in [0, 1), got {}",
            self.lora.dropout
        );
        ensure!(
            !self.lora.target_modules.is_empty(),
            "lora.target_modules must not be empty"
        );
        ensure!(self.args.num_train_epochs > 0, "num_train_epochs must be > 0");
        ensure!(
            self.args.per_device_train_batch_size > 0,
            "per_device_train_batch_size must be > 0"
        );
        ensure!(
            self.args.gradient_accumulation_steps > 0,
            "gradient_accumulation_steps must be > 0"
        );
        ensure!(self.args.learning_rate > 0.0, "learning_rate must be > 0");
        ensure!(
            (0.0..1.0).contains(&self.eval_fraction),
            "eval_fraction must be in [0, 1), got {}",
            self.eval_fraction
        );
        ensure!(!self.runner.program.trim().is_empty(), "runner.program must not be empty");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_run() {
        let c = TrainConfig::default();
        assert_eq!(c.model.model_name, "google/gemma-2b");
        assert_eq!((c.lora.r, c.lora.alpha), (8, 32));
        assert_eq!(c.lora.target_modules, vec!["q_proj", "v_proj"]);
        assert_eq!(c.lora.bias, "none");
        assert_eq!(c.lora.task_type, "CAUSAL_LM");
        assert_eq!(c.args.num_train_epochs, 3);
        assert_eq!(c.args.per_device_train_batch_size, 4);
        assert_eq!(c.args.gradient_accumulation_steps, 4);
        assert_eq!(c.args.learning_rate, 2e-4);
        assert_eq!(c.args.save_total_limit, 3);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn rejects_bad_values() {
        let mut c = TrainConfig::default();
        c.lora.dropout = 1.0;
        assert!(c.validate().is_err());

        let mut c = TrainConfig::default();
        c.lora.target_modules.clear();
        assert!(c.validate().is_err());

        let mut c = TrainConfig::default();
        c.args.learning_rate = 0.0;
        assert!(c.validate().is_err());

        let mut c = TrainConfig::default();
        c.eval_fraction = 1.0;
        assert!(c.validate().is_err());

        let mut c = TrainConfig::default();
        c.lora.r = 0;
        assert!(c.validate().is_err());
    }

    #[test]
    fn loads_partial_toml_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("train.toml");
        std::fs::write(
            &path,
            "eval_fraction = 0.1\n[lora]\nr = 16\ndropout = 0.05\n[args]\nnum_train_epochs = 1\n",
        )
        .unwrap();
        let c = TrainConfig::load(Some(&path)).unwrap();
        assert_eq!(c.lora.r, 16);
        assert_eq!(c.lora.dropout, 0.05);
        assert_eq!(c.lora.alpha, 32);
        assert_eq!(c.args.num_train_epochs, 1);
        assert_eq!(c.args.per_device_train_batch_size, 4);
        assert_eq!(c.eval_fraction, 0.1);
    }

    #[test]
    fn missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(TrainConfig::load(Some(&dir.path().join("nope.toml"))).is_err());
    }
}
