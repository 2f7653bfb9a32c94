use std::time::Duration;

use anyhow::{Context, Result};
use rand::seq::SliceRandom;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use tracing::debug;

use crate::error::FetchError;
use crate::settings::Settings;

/// Anything that can hand back the HTML of a URL.
pub trait PageSource {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// HTTP fetcher with a fixed timeout and a client identity picked once at construction.
pub struct Fetcher {
    client: reqwest::Client,
    timeout: Duration,
    user_agent: String,
}

impl Fetcher {
    pub fn new(settings: &Settings) -> Result<Self> {
        let user_agent = pick_user_agent(&settings.user_agents)
            .context("user agent pool is empty")?
            .to_string();

        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&user_agent).context("invalid user agent header")?,
        );
        headers.insert(
            ACCEPT,
            HeaderValue::from_str(&settings.accept).context("invalid accept header")?,
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_str(&settings.accept_language)
                .context("invalid accept-language header")?,
        );

        let timeout = settings.request_timeout();
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        debug!(user_agent = %user_agent, "HTTP client ready");
        Ok(Self {
            client,
            timeout,
            user_agent,
        })
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    fn transport_error(&self, url: &str, source: reqwest::Error) -> FetchError {
        if source.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
                timeout: self.timeout,
            }
        } else {
            FetchError::Transport {
                url: url.to_string(),
                source,
            }
        }
    }
}

impl PageSource for Fetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.transport_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        response.text().await.map_err(|e| self.transport_error(url, e))
    }
}

fn pick_user_agent(pool: &[String]) -> Option<&str> {
    let candidates: Vec<&String> = pool.iter().filter(|ua| !ua.trim().is_empty()).collect();
    candidates
        .choose(&mut rand::thread_rng())
        .copied()
        .map(String::as_str)
}
