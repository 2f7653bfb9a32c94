mod error;
mod fetcher;
mod logging;
mod pairs;
mod parser;
mod settings;
mod store;
mod train;
mod walker;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::fetcher::Fetcher;
use crate::settings::Settings;
use crate::store::Store;
use crate::train::{CommandTrainer, FineTuner, TrainConfig};
use crate::walker::{WalkOptions, Walker};

#[derive(Parser)]
#[command(name = "afcorpus", about = "Afrikaans Wikipedia corpus builder and fine-tuning launcher")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape category pages, save raw articles and instruction pairs
    Collect {
        /// Number of articles to collect
        #[arg(short = 'n', long = "num-pages", default_value = "50")]
        num_pages: usize,
        /// Skip article URLs already seen in this run
        #[arg(long)]
        dedup: bool,
        /// Exit with an error when no articles were collected
        #[arg(long)]
        fail_on_empty: bool,
    },
    /// Show counts for the saved corpus
    Stats {
        /// Sample titles to list
        #[arg(short = 'n', long, default_value = "10")]
        limit: usize,
    },
    /// Prepare a fine-tuning job from saved pairs and run the external trainer
    Train {
        /// Training config (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Override the base model identifier
        #[arg(long)]
        model: Option<String>,
        /// Override the number of epochs
        #[arg(long)]
        epochs: Option<u32>,
        /// Write the job files but do not launch the trainer
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load()?;
    if let Some(path) = logging::init(&settings)? {
        info!("Logging to {}", path.display());
    }

    let t0 = Instant::now();

    let result = match cli.command {
        Commands::Collect {
            num_pages,
            dedup,
            fail_on_empty,
        } => collect(&settings, num_pages, dedup || settings.dedup, fail_on_empty).await,
        Commands::Stats { limit } => stats(&settings, limit),
        Commands::Train {
            config,
            model,
            epochs,
            dry_run,
        } => {
            let mut cfg = TrainConfig::load(config.as_deref())?;
            if let Some(model) = model {
                cfg.model.model_name = model;
            }
            if let Some(epochs) = epochs {
                cfg.args.num_train_epochs = epochs;
            }
            run_training(&settings, &cfg, dry_run).await
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

async fn collect(settings: &Settings, num_pages: usize, dedup: bool, fail_on_empty: bool) -> Result<()> {
    info!("Starting data collection...");
    println!("Collecting {} articles...", num_pages);

    let fetcher = Fetcher::new(settings)?;
    info!(user_agent = fetcher.user_agent(), "Client identity chosen");
    let pb = ProgressBar::new(num_pages as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")?
            .progress_chars("=> "),
    );

    let walker = Walker::new(
        fetcher,
        WalkOptions {
            base_url: settings.base_url.clone(),
            delay: settings.request_delay(),
            dedup,
        },
    )
    .with_progress(pb);

    let (articles, walk) = walker.walk(&settings.categories, num_pages).await;
    println!("Collected {} articles", walk.records);
    println!(
        "  categories: {} visited, {} failed | links: {} | skipped: {} short, {} unparsable, {} network, {} duplicate",
        walk.categories_visited,
        walk.categories_failed,
        walk.links_seen,
        walk.too_short,
        walk.not_extractable,
        walk.network_errors,
        walk.duplicates,
    );

    if articles.is_empty() {
        warn!("No articles collected!");
        if fail_on_empty {
            bail!("no articles collected");
        }
    }

    let store = Store::new(&settings.output_dir);
    store.save_raw(&articles)?;

    let pairs = pairs::build(&articles);
    store.save_pairs(&pairs)?;
    println!("Created {} instruction pairs", pairs.len());
    Ok(())
}

fn stats(settings: &Settings, limit: usize) -> Result<()> {
    let store = Store::new(&settings.output_dir);
    let articles = store.load_raw()?;
    let pairs = store.load_pairs()?;

    let avg_chars = if articles.is_empty() {
        0
    } else {
        articles.iter().map(|a| a.content.chars().count()).sum::<usize>() / articles.len()
    };
    let unique_urls = articles
        .iter()
        .map(|a| a.url.as_str())
        .collect::<std::collections::HashSet<_>>()
        .len();

    println!("Directory: {}", store.dir().display());
    println!("Articles:  {}", articles.len());
    println!("Unique:    {}", unique_urls);
    println!("Avg chars: {}", avg_chars);
    println!("Pairs:     {}", pairs.len());

    if !articles.is_empty() && limit > 0 {
        println!("\n--- Titles ---");
        for (i, a) in articles.iter().take(limit).enumerate() {
            println!("{:>3} | {:<40} | {}", i + 1, truncate(&a.title, 40), a.url);
        }
    }
    Ok(())
}

async fn run_training(settings: &Settings, cfg: &TrainConfig, dry_run: bool) -> Result<()> {
    let store = Store::new(&settings.output_dir);
    let pairs = store.load_pairs()?;
    println!("Loaded {} instruction pairs from {}", pairs.len(), store.pairs_path().display());

    let job = train::prepare(cfg, pairs)?;
    println!(
        "Prepared job in {} ({} train, {} eval)",
        job.output_dir.display(),
        job.train_count,
        job.eval_count
    );
    println!(
        "  model: {} | LoRA r={} alpha={} dropout={} | epochs={}",
        cfg.model.model_name, cfg.lora.r, cfg.lora.alpha, cfg.lora.dropout, cfg.args.num_train_epochs
    );

    if dry_run {
        println!("Dry run: trainer not started. Config at {}", job.manifest_path.display());
        return Ok(());
    }

    let trainer = CommandTrainer::new(&cfg.runner);
    let model = trainer.fine_tune(&job).await?;
    println!("Model saved to {}", model.dir.display());
    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn cli_defaults_to_fifty_pages() {
        let cli = Cli::try_parse_from(["afcorpus", "collect"]).unwrap();
        match cli.command {
            Commands::Collect {
                num_pages,
                dedup,
                fail_on_empty,
            } => {
                assert_eq!(num_pages, 50);
                assert!(!dedup);
                assert!(!fail_on_empty);
            }
            _ => panic!("expected collect"),
        }
    }

    #[test]
    fn cli_accepts_num_pages() {
        let cli = Cli::try_parse_from(["afcorpus", "collect", "--num-pages", "3", "--dedup"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Collect { num_pages: 3, dedup: true, .. }
        ));
    }

    #[test]
    fn cli_rejects_non_numeric_pages() {
        assert!(Cli::try_parse_from(["afcorpus", "collect", "-n", "baie"]).is_err());
    }

    #[test]
    fn truncates_on_chars() {
        assert_eq!(truncate("Kaapstad", 20), "Kaapstad");
        assert_eq!(truncate("Geskiedenis", 4), "Gesk...");
        assert_eq!(truncate("ëëëëë", 2), "ëë...");
    }

    #[test]
    fn formats_durations() {
        assert_eq!(format_duration(Duration::from_millis(2500)), "2.5s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
        assert_eq!(format_duration(Duration::from_secs(3725)), "1h 2m 5s");
    }
}
