use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::settings::Settings;

const LOG_PREFIX: &str = "afcorpus_";
const LOG_SUFFIX: &str = ".log";

/// Stdout logging filtered by `RUST_LOG` (default `info`), plus an optional plain-text log file.
/// Returns the log file path when one was opened.
pub fn init(settings: &Settings) -> Result<Option<PathBuf>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());

    let (file_layer, log_path) = if settings.file_log_enabled() {
        fs::create_dir_all(&settings.log_dir)
            .with_context(|| format!("Failed to create {}", settings.log_dir.display()))?;
        prune_old_logs(
            &settings.log_dir,
            Duration::from_secs(settings.log_retention_days * 24 * 60 * 60),
        )?;
        let path = settings.log_dir.join(log_file_name(chrono::Local::now()));
        let file =
            File::create(&path).with_context(|| format!("Failed to create {}", path.display()))?;
        let layer = fmt::layer().with_ansi(false).with_writer(Mutex::new(file));
        (Some(layer), Some(path))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(log_path)
}

fn log_file_name(now: chrono::DateTime<chrono::Local>) -> String {
    format!("{}{}{}", LOG_PREFIX, now.format("%Y%m%d_%H%M%S"), LOG_SUFFIX)
}

/// Delete our own log files last modified more than `retention` ago. Returns how many were removed.
fn prune_old_logs(dir: &Path, retention: Duration) -> Result<usize> {
    let cutoff = SystemTime::now()
        .checked_sub(retention)
        .unwrap_or(SystemTime::UNIX_EPOCH);
    let mut removed = 0;

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if !(name.starts_with(LOG_PREFIX) && name.ends_with(LOG_SUFFIX)) {
            continue;
        }
        let modified = entry.metadata()?.modified()?;
        if modified < cutoff {
            fs::remove_file(entry.path())?;
            removed += 1;
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn file_name_has_timestamp() {
        let t = chrono::Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(log_file_name(t), "afcorpus_20240309_140507.log");
    }

    #[test]
    fn prunes_only_old_own_logs() {
        let dir = tempfile::tempdir().unwrap();
        let day = Duration::from_secs(24 * 60 * 60);

        let old = dir.path().join("afcorpus_20200101_000000.log");
        let fresh = dir.path().join("afcorpus_20990101_000000.log");
        let foreign = dir.path().join("other.log");
        for p in [&old, &fresh, &foreign] {
            File::create(p).unwrap();
        }
        let eleven_days_ago = SystemTime::now() - day * 11;
        for p in [&old, &foreign] {
            File::options()
                .write(true)
                .open(p)
                .unwrap()
                .set_modified(eleven_days_ago)
                .unwrap();
        }

        let removed = prune_old_logs(dir.path(), day * 10).unwrap();
        assert_eq!(removed, 1);
        assert!(!old.exists());
        assert!(fresh.exists());
        assert!(foreign.exists());
    }
}
