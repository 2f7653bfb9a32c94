use std::collections::HashSet;
use std::time::Duration;

use indicatif::ProgressBar;
use tracing::{debug, info, trace, warn};

use crate::fetcher::PageSource;
use crate::parser::{article, category};
use crate::store::ArticleRecord;

pub struct WalkOptions {
    pub base_url: String,
    /// Pause after every article request.
    pub delay: Duration,
    /// Skip article URLs already requested during this walk.
    pub dedup: bool,
}

/// Counters for one walk.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WalkStats {
    pub categories_visited: usize,
    pub categories_failed: usize,
    pub links_seen: usize,
    pub records: usize,
    pub network_errors: usize,
    pub not_extractable: usize,
    pub too_short: usize,
    pub duplicates: usize,
}

/// Sequential crawl over category listing pages.
pub struct Walker<S> {
    source: S,
    options: WalkOptions,
    progress: ProgressBar,
}

impl<S: PageSource> Walker<S> {
    pub fn new(source: S, options: WalkOptions) -> Self {
        Self {
            source,
            options,
            progress: ProgressBar::hidden(),
        }
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Visit `categories` in order, collecting article records until `limit` is reached.
    pub async fn walk(&self, categories: &[String], limit: usize) -> (Vec<ArticleRecord>, WalkStats) {
        let mut records = Vec::new();
        let mut stats = WalkStats::default();
        let mut requested: HashSet<String> = HashSet::new();

        'categories: for name in categories {
            if records.len() >= limit {
                break;
            }

            let url = category::category_url(&self.options.base_url, name);
            let listing = match self.source.fetch(&url).await {
                Ok(html) => html,
                Err(e) => {
                    warn!("Error accessing category {}: {}", name, e);
                    stats.categories_failed += 1;
                    continue;
                }
            };
            stats.categories_visited += 1;

            let links = category::article_links(&listing);
            debug!(category = %name, links = links.len(), "Category listing parsed");

            for href in links {
                stats.links_seen += 1;
                let article_url = category::article_url(&self.options.base_url, &href);

                if self.options.dedup && !requested.insert(article_url.clone()) {
                    trace!("Skipping duplicate {}", article_url);
                    stats.duplicates += 1;
                    continue;
                }

                match self.source.fetch(&article_url).await {
                    Ok(html) => match article::extract(&html, &article_url) {
                        Ok(record) => {
                            debug!("Collected article: {}", record.title);
                            records.push(record);
                            self.progress.inc(1);
                        }
                        Err(e) if e.is_quality_gate() => {
                            trace!("Skipping {}: {}", article_url, e);
                            stats.too_short += 1;
                        }
                        Err(e) => {
                            debug!("Not extractable {}: {}", article_url, e);
                            stats.not_extractable += 1;
                        }
                    },
                    Err(e) => {
                        warn!("Error processing article {}: {}", href, e);
                        stats.network_errors += 1;
                    }
                }

                if records.len() >= limit {
                    break 'categories;
                }

                if !self.options.delay.is_zero() {
                    tokio::time::sleep(self.options.delay).await;
                }
            }
        }

        stats.records = records.len();
        self.progress.finish_and_clear();
        info!("Collected {} Wikipedia articles", records.len());
        (records, stats)
    }
}
