use super::fingerprint::{fingerprint, kit_file_name};
use super::ledger::{Claim, OriginLedger};
use super::reducer::PrefixIter;
use super::validate::is_archive_payload;
use crate::core::errors::KithoundError;
use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Semaphore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HuntOutcome {
    /// A new archive was written and recorded.
    Downloaded,
    /// A validated probe hit an origin already in the ledger.
    AlreadyKnown,
    /// Every candidate was exhausted without a hit; not an error.
    Nothing,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct HuntTally {
    pub downloaded: usize,
    pub duplicates: usize,
    pub empty: usize,
}

enum Probe {
    Miss,
    Known,
    Downloaded(String),
}

#[derive(Error, Debug)]
enum ProbeError {
    /// Transient: swallowed by moving on to the next candidate.
    #[error(transparent)]
    Net(#[from] reqwest::Error),
    /// Transient: the claim was released, a later probe may retry.
    #[error("cannot write {path:?}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Fatal: the ledger is load-bearing for dedup correctness.
    #[error(transparent)]
    Ledger(KithoundError),
}

/// Probes truncated URL prefixes against a list of archive extensions
/// and downloads the first payload that validates as a real archive.
/// One instance is shared by every worker; all cross-task state lives
/// in the origin ledger.
pub struct KitHunter {
    client: reqwest::Client,
    ledger: Arc<OriginLedger>,
    extensions: &'static [&'static str],
    kits_dir: PathBuf,
    max_concurrent: usize,
}

impl KitHunter {
    pub fn new(
        ledger: Arc<OriginLedger>,
        kits_dir: PathBuf,
        extensions: &'static [&'static str],
        max_concurrent: usize,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("kithound")
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            ledger,
            extensions,
            kits_dir,
            max_concurrent,
        })
    }

    /// Runs one task per seed URL under a bounded pool. URLs are
    /// independent; ordering between them is not guaranteed.
    pub async fn hunt_all(self: Arc<Self>, urls: Vec<String>) -> Result<HuntTally> {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let tally = Arc::new(Mutex::new(HuntTally::default()));
        let bar = ProgressBar::new(urls.len() as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{bar:40.cyan/blue} {pos}/{len} URLs probed")?
                .progress_chars("=>-"),
        );

        let mut handles = Vec::new();
        for url in urls {
            let hunter = Arc::clone(&self);
            let sem = Arc::clone(&semaphore);
            let tally = Arc::clone(&tally);
            let bar = bar.clone();

            handles.push(tokio::spawn(async move {
                let _permit = sem.acquire().await.expect("semaphore closed");
                let outcome = hunter.acquire(&url).await?;
                {
                    let mut tally = tally.lock().unwrap();
                    match outcome {
                        HuntOutcome::Downloaded => tally.downloaded += 1,
                        HuntOutcome::AlreadyKnown => tally.duplicates += 1,
                        HuntOutcome::Nothing => tally.empty += 1,
                    }
                }
                bar.inc(1);
                anyhow::Ok(())
            }));
        }

        for result in futures::future::join_all(handles).await {
            result??;
        }
        bar.finish();

        let tally = *tally.lock().unwrap();
        Ok(tally)
    }

    /// Probes every (prefix, extension) candidate for one URL, most
    /// specific prefix first. First hit wins and ends the URL; network
    /// failures just move the loop along.
    pub async fn acquire(&self, url: &str) -> Result<HuntOutcome, KithoundError> {
        let origin = url.trim();
        for prefix in PrefixIter::new(origin) {
            for ext in self.extensions {
                match self.probe(&prefix, ext, origin).await {
                    Ok(Probe::Downloaded(name)) => {
                        tracing::info!("downloaded kit {} from {}{}", name, prefix, ext);
                        return Ok(HuntOutcome::Downloaded);
                    }
                    Ok(Probe::Known) => {
                        tracing::info!("kit already downloaded for {}{}", prefix, ext);
                        return Ok(HuntOutcome::AlreadyKnown);
                    }
                    Ok(Probe::Miss) => {}
                    Err(ProbeError::Ledger(err)) => return Err(err),
                    Err(err) => {
                        tracing::debug!("probe {}{} failed: {}", prefix, ext, err);
                    }
                }
            }
        }
        Ok(HuntOutcome::Nothing)
    }

    async fn probe(&self, prefix: &str, ext: &str, origin: &str) -> Result<Probe, ProbeError> {
        let candidate = format!("{}{}", prefix, ext);
        tracing::debug!("probing {}", candidate);

        let response = self.client.get(&candidate).send().await?;
        let status = response.status().as_u16();
        // Text-decodability cannot be judged on a stream prefix, so the
        // body is buffered before validation; the client timeout bounds
        // how much a hostile server can feed us.
        let body = response.bytes().await?;
        if !is_archive_payload(status, &body) {
            return Ok(Probe::Miss);
        }

        let fp = fingerprint(prefix);
        if self.ledger.claim(&fp) == Claim::Existing {
            return Ok(Probe::Known);
        }

        let file_name = kit_file_name(prefix, &fp, ext);
        let dest = self.kits_dir.join(&file_name);
        if let Err(source) = tokio::fs::write(&dest, &body).await {
            self.ledger.release(&fp);
            return Err(ProbeError::Write { path: dest, source });
        }

        self.ledger
            .record(&fp, &file_name, origin)
            .map_err(ProbeError::Ledger)?;
        Ok(Probe::Downloaded(file_name))
    }
}
