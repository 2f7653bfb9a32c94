use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

pub const RAW_ARTICLES_FILE: &str = "raw_articles.csv";
pub const INSTRUCTION_PAIRS_FILE: &str = "instruction_pairs.json";
pub const SOURCE_WIKIPEDIA: &str = "wikipedia";

const RAW_HEADER: [&str; 4] = ["title", "content", "source", "url"];

// ── Records ──

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRecord {
    pub title: String,
    pub content: String,
    pub source: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructionPair {
    pub instruction: String,
    pub input: String,
    pub output: String,
}

// ── Store ──

/// Fixed-name files inside one output directory. Every save is a full overwrite.
pub struct Store {
    dir: PathBuf,
}

impl Store {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn raw_path(&self) -> PathBuf {
        self.dir.join(RAW_ARTICLES_FILE)
    }

    pub fn pairs_path(&self) -> PathBuf {
        self.dir.join(INSTRUCTION_PAIRS_FILE)
    }

    /// Write the article table as CSV. The header row is written even when empty.
    pub fn save_raw(&self, articles: &[ArticleRecord]) -> Result<PathBuf> {
        let path = self.raw_path();
        write_atomic(&path, |file| {
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(file);
            writer.write_record(RAW_HEADER)?;
            for article in articles {
                writer.serialize(article)?;
            }
            writer.flush()?;
            Ok(())
        })?;
        info!("Saved {} articles to {}", articles.len(), path.display());
        Ok(path)
    }

    /// Write instruction pairs as one JSON object per line.
    pub fn save_pairs(&self, pairs: &[InstructionPair]) -> Result<PathBuf> {
        let path = self.pairs_path();
        write_jsonl(&path, pairs)?;
        info!("Saved {} instruction pairs to {}", pairs.len(), path.display());
        Ok(path)
    }

    pub fn load_raw(&self) -> Result<Vec<ArticleRecord>> {
        let path = self.raw_path();
        let mut reader = csv::Reader::from_path(&path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        let rows = reader
            .deserialize()
            .collect::<std::result::Result<Vec<ArticleRecord>, _>>()
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(rows)
    }

    pub fn load_pairs(&self) -> Result<Vec<InstructionPair>> {
        read_jsonl(&self.pairs_path())
    }
}

// ── Helpers ──

pub fn write_jsonl<T: Serialize>(path: &Path, items: &[T]) -> Result<()> {
    write_atomic(path, |file| {
        let mut writer = BufWriter::new(file);
        for item in items {
            serde_json::to_writer(&mut writer, item)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        Ok(())
    })
}

pub fn read_jsonl<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut items = Vec::new();
    for (line_num, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read {}", path.display()))?;
        if line.trim().is_empty() {
            continue;
        }
        let item = serde_json::from_str(&line)
            .with_context(|| format!("{}: line {}", path.display(), line_num + 1))?;
        items.push(item);
    }
    Ok(items)
}

/// Write to `<path>.tmp` then rename over `path`, creating the parent directory if needed.
fn write_atomic<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut File) -> Result<()>,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp = PathBuf::from(tmp_name);

    let mut file =
        File::create(&tmp).with_context(|| format!("Failed to create {}", tmp.display()))?;
    write(&mut file).with_context(|| format!("Failed to write {}", tmp.display()))?;
    file.sync_all()?;
    drop(file);

    fs::rename(&tmp, path)
        .with_context(|| format!("Failed to move {} to {}", tmp.display(), path.display()))?;
    Ok(())
}
