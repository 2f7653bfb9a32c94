use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use tokio::process::Command;
use tracing::info;

use super::config::RunnerConfig;
use super::job::TrainingJob;

/// Saved-model artifact produced by a training run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainedModel {
    pub dir: PathBuf,
}

pub trait FineTuner {
    async fn fine_tune(&self, job: &TrainingJob) -> Result<TrainedModel>;
}

/// Runs an external training program once: `<program> <args..> --config <manifest>`.
pub struct CommandTrainer {
    program: String,
    args: Vec<String>,
}

impl CommandTrainer {
    pub fn new(runner: &RunnerConfig) -> Self {
        Self {
            program: runner.program.clone(),
            args: runner.args.clone(),
        }
    }
}

impl FineTuner for CommandTrainer {
    async fn fine_tune(&self, job: &TrainingJob) -> Result<TrainedModel> {
        info!(
            program = %self.program,
            manifest = %job.manifest_path.display(),
            "Starting training..."
        );
        let start = Instant::now();

        let status = Command::new(&self.program)
            .args(&self.args)
            .arg("--config")
            .arg(&job.manifest_path)
            .status()
            .await
            .with_context(|| format!("Failed to launch {}", self.program))?;

        if !status.success() {
            bail!("Training failed: {} exited with {}", self.program, status);
        }

        let dir = job.final_model_dir();
        if !dir.is_dir() {
            bail!(
                "{} exited successfully but wrote no model to {}",
                self.program,
                dir.display()
            );
        }

        info!(
            "Model saved to {} ({:.1}s)",
            dir.display(),
            start.elapsed().as_secs_f64()
        );
        Ok(TrainedModel { dir })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::store::InstructionPair;
    use crate::train::{config::TrainConfig, job::prepare};

    fn job_in(dir: &std::path::Path) -> TrainingJob {
        let mut c = TrainConfig::default();
        c.args.output_dir = dir.to_path_buf();
        let pairs = vec![InstructionPair {
            instruction: "Vat hierdie artikel in Afrikaans saam:".into(),
            input: "inhoud".into(),
            output: "titel".into(),
        }];
        prepare(&c, pairs).unwrap()
    }

    fn shell(script: &str) -> CommandTrainer {
        // sh -c <script> --config <path>: $0 = --config, $1 = manifest path
        CommandTrainer::new(&RunnerConfig {
            program: "sh".into(),
            args: vec!["-c".into(), script.into()],
        })
    }

    #[tokio::test]
    async fn returns_final_model_dir() {
        let dir = tempfile::tempdir().unwrap();
        let job = job_in(dir.path());
        let trainer = shell(r#"test -f "$1" && mkdir -p "$(dirname "$1")/final""#);
        let model = trainer.fine_tune(&job).await.unwrap();
        assert_eq!(model.dir, dir.path().join("final"));
    }

    #[tokio::test]
    async fn non_zero_exit_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let job = job_in(dir.path());
        let err = shell("exit 3").fine_tune(&job).await.unwrap_err();
        assert!(err.to_string().contains("Training failed"), "{err}");
    }

    #[tokio::test]
    async fn missing_artifact_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let job = job_in(dir.path());
        let err = shell("true").fine_tune(&job).await.unwrap_err();
        assert!(err.to_string().contains("wrote no model"), "{err}");
    }

    #[tokio::test]
    async fn unknown_program_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let job = job_in(dir.path());
        let trainer = CommandTrainer::new(&RunnerConfig {
            program: "afcorpus-no-such-trainer".into(),
            args: vec![],
        });
        assert!(trainer.fine_tune(&job).await.is_err());
    }
}
