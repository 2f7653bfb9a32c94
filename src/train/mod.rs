//! Fine-tuning handoff. The optimisation loop lives in an external program;
//! this module assembles its configuration and training files and runs it once.
//!
//! The program is invoked as `<program> <args..> --config <output_dir>/train_config.json`.
//! The manifest is a JSON object with these fields:
//!
//! - `model`: `model_name`, `load_in_4bit`
//! - `lora`: `r`, `alpha`, `dropout`, `target_modules`, `bias`, `task_type`
//! - `args`: the trainer arguments (`output_dir`, `num_train_epochs`,
//!   `per_device_train_batch_size`, `gradient_accumulation_steps`, `learning_rate`,
//!   `warmup_steps`, `logging_steps`, `eval_steps`, `save_steps`, `save_total_limit`,
//!   `fp16`, `load_best_model_at_end`)
//! - `train_file`: JSONL of `{instruction, input, output}` records
//! - `eval_file`: same format, or `null` when there is no eval split
//! - `final_model_dir`: where the program must save the trained model
//!
//! The default runner, `python3 train_lora.py`, is not shipped here. Point
//! `runner.program`/`runner.args` at your own trainer.

pub mod config;
pub mod job;
pub mod runner;

pub use config::TrainConfig;
pub use job::prepare;
pub use runner::{CommandTrainer, FineTuner};
