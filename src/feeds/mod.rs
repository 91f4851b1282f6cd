use crate::utils::fs::atomic_write;
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use url::Url;

/// Public feeds publishing freshly observed phishing URLs.
pub const FEED_URLS: &[&str] = &[
    "https://openphish.com/feed.txt",
    "https://raw.githubusercontent.com/mitchellkrogza/Phishing.Database/master/phishing-links-NEW-today.txt",
    "https://raw.githubusercontent.com/mitchellkrogza/Phishing.Database/master/phishing-links-ACTIVE-TODAY.txt",
    "https://raw.githubusercontent.com/mitchellkrogza/Phishing.Database/master/phishing-links-ACTIVE-today.txt",
    "https://phishunt.io/feed.txt",
];

/// Normalize a raw feed URL into the shape the hunter expects, or drop
/// it. Query and fragment never help locate a kit; a URL without a path
/// has nothing above the domain to probe; the trailing slash lets the
/// path reducer see the page's own path as a candidate.
pub fn normalize(raw: &str) -> Option<String> {
    let mut url = Url::parse(raw.trim()).ok()?;
    if url.path().is_empty() || url.path() == "/" {
        return None;
    }
    url.set_query(None);
    url.set_fragment(None);
    let mut normalized = url.to_string();
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    Some(normalized)
}

/// The deduplicated, normalized seed URL list backing `hunt`.
pub struct SeedList {
    path: PathBuf,
    urls: HashSet<String>,
}

impl SeedList {
    pub fn load(path: &Path) -> Result<Self> {
        let urls = if path.exists() {
            std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read seed list: {:?}", path))?
                .lines()
                .map(|line| line.trim_end().to_string())
                .filter(|line| !line.is_empty())
                .collect()
        } else {
            HashSet::new()
        };
        Ok(Self {
            path: path.to_path_buf(),
            urls,
        })
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn urls(&self) -> impl Iterator<Item = &String> {
        self.urls.iter()
    }

    pub fn clear(&mut self) {
        self.urls.clear();
    }

    /// Filters through `normalize` and dedups; returns how many URLs
    /// were actually new.
    pub fn merge<I, S>(&mut self, raw_urls: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let before = self.urls.len();
        for raw in raw_urls {
            if let Some(url) = normalize(raw.as_ref()) {
                self.urls.insert(url);
            }
        }
        self.urls.len() - before
    }

    pub fn write(&self) -> Result<()> {
        let mut content = String::new();
        for url in &self.urls {
            content.push_str(url);
            content.push('\n');
        }
        atomic_write(&self.path, content.as_bytes())
    }
}

/// Pulls every feed and merges it into the list. A dead feed is logged
/// and skipped; the others still land.
pub async fn refresh(client: &reqwest::Client, list: &mut SeedList) -> Result<()> {
    for feed in FEED_URLS {
        match fetch_feed(client, feed).await {
            Ok(raw_urls) => {
                let added = list.merge(raw_urls.iter().map(String::as_str));
                tracing::info!("{}/{} URLs added from {}", added, raw_urls.len(), feed);
            }
            Err(err) => {
                tracing::warn!("feed {} skipped: {}", feed, err);
            }
        }
    }
    list.write()
}

async fn fetch_feed(client: &reqwest::Client, feed: &str) -> Result<Vec<String>> {
    let response = client
        .get(feed)
        .send()
        .await
        .with_context(|| format!("Failed to fetch feed: {}", feed))?;
    if !response.status().is_success() {
        anyhow::bail!("feed returned status: {}", response.status());
    }
    let body = response.text().await?;
    Ok(body.split_whitespace().map(str::to_string).collect())
}
