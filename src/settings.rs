use std::path::PathBuf;
use std::time::Duration;

use config::Config;
use serde::Deserialize;
use thiserror::Error;

const SETTINGS_FILE: &str = "afcorpus";
const ENV_PREFIX: &str = "AFCORPUS";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to load settings: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid settings: {0}")]
    Invalid(String),
}

/// Runtime settings for a collection run. Built once in `main` and passed down.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub base_url: String,
    pub output_dir: PathBuf,
    /// Empty path disables the file log.
    pub log_dir: PathBuf,
    pub log_retention_days: u64,
    pub categories: Vec<String>,
    pub request_timeout_secs: u64,
    pub request_delay_ms: u64,
    pub accept: String,
    pub accept_language: String,
    pub user_agents: Vec<String>,
    pub dedup: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: "https://af.wikipedia.org".into(),
            output_dir: PathBuf::from("data"),
            log_dir: PathBuf::from("logs"),
            log_retention_days: 10,
            categories: [
                "Suid-Afrika",
                "Afrikaanse_literatuur",
                "Afrikaanse_kultuur",
                "Geskiedenis_van_Suid-Afrika",
                "Suid-Afrikaanse_politiek",
                "Suid-Afrikaanse_musiek",
                "Afrikaanse_taal",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            request_timeout_secs: 10,
            request_delay_ms: 1000,
            accept: "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8".into(),
            accept_language: "af, en-US;q=0.7, en;q=0.3".into(),
            user_agents: USER_AGENTS.iter().map(|s| s.to_string()).collect(),
            dedup: false,
        }
    }
}

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
];

impl Settings {
    /// Defaults, overlaid by `afcorpus.toml` (optional) and `AFCORPUS_*` env vars.
    /// `AFCORPUS_CATEGORIES` is comma-separated. User agents contain commas, so they come from the file.
    pub fn load() -> Result<Self, SettingsError> {
        let settings: Settings = Config::builder()
            .add_source(config::File::with_name(SETTINGS_FILE).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("categories"),
            )
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(SettingsError::Invalid(format!(
                "base_url must be http(s), got {:?}",
                self.base_url
            )));
        }
        if self.categories.is_empty() {
            return Err(SettingsError::Invalid("categories must not be empty".into()));
        }
        if self.user_agents.iter().all(|ua| ua.trim().is_empty()) {
            return Err(SettingsError::Invalid("user_agents must not be empty".into()));
        }
        if self.request_timeout_secs == 0 {
            return Err(SettingsError::Invalid("request_timeout_secs must be > 0".into()));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn file_log_enabled(&self) -> bool {
        !self.log_dir.as_os_str().is_empty()
    }
}
