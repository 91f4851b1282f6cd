use super::classifier::KitRecord;
use super::signals::Detection;
use crate::core::errors::KithoundError;
use colored::Colorize;
use std::collections::HashSet;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

const HEADER: &[&str] = &[
    "kit",
    "error",
    "write_on_file",
    "send_by_mail",
    "send_by_telegram",
    "contains_artifact",
    "recurse_copy",
];

/// Append-only CSV of classification records, keyed by kit name. Doubles
/// as the re-run guard: kits whose name is already present are never
/// re-extracted or re-scanned.
pub struct StatsLedger {
    path: PathBuf,
    analyzed: HashSet<String>,
}

impl StatsLedger {
    /// Creates the file (with header) when missing, else loads every
    /// kit name. Open failure is fatal for the same reason as the
    /// origin ledger: without it every kit would be re-analyzed.
    pub fn open(path: &Path) -> Result<Self, KithoundError> {
        if !path.exists() {
            let mut writer = csv::Writer::from_path(path)
                .map_err(|e| KithoundError::Ledger(format!("cannot create {:?}: {}", path, e)))?;
            writer
                .write_record(HEADER)
                .and_then(|_| writer.flush().map_err(csv::Error::from))
                .map_err(|e| KithoundError::Ledger(format!("cannot write header: {}", e)))?;
        }

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(path)
            .map_err(|e| KithoundError::Ledger(format!("cannot open {:?}: {}", path, e)))?;

        let mut analyzed = HashSet::new();
        for row in reader.records() {
            let row = row.map_err(|e| KithoundError::Ledger(format!("bad row: {}", e)))?;
            if let Some(name) = row.get(0) {
                if !name.is_empty() {
                    analyzed.insert(name.to_string());
                }
            }
        }

        Ok(Self {
            path: path.to_path_buf(),
            analyzed,
        })
    }

    pub fn is_analyzed(&self, kit_name: &str) -> bool {
        self.analyzed.contains(kit_name)
    }

    pub fn len(&self) -> usize {
        self.analyzed.len()
    }

    /// Appends one row per record; rows are never rewritten.
    pub fn append(&mut self, records: &[KitRecord]) -> Result<(), KithoundError> {
        let file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|e| KithoundError::Ledger(format!("cannot append {:?}: {}", self.path, e)))?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        for record in records {
            writer
                .write_record(&[
                    record.name.clone(),
                    record.error.clone().unwrap_or_default(),
                    record.file_write.to_field(),
                    record.mail.to_field(),
                    record.bot_api.to_field(),
                    record.artifact.to_field(),
                    record.recurse_copy.to_field(),
                ])
                .map_err(|e| KithoundError::Ledger(format!("cannot write row: {}", e)))?;
            self.analyzed.insert(record.name.clone());
        }
        writer
            .flush()
            .map_err(|e| KithoundError::Ledger(format!("cannot flush {:?}: {}", self.path, e)))?;
        Ok(())
    }

    /// Re-reads the whole ledger and aggregates flag percentages. Rows
    /// with a non-empty error are excluded outright: an unextracted kit
    /// says nothing about behavior, so it must not dilute (or inflate)
    /// the percentages.
    pub fn aggregate(&self) -> Result<StatsSummary, KithoundError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(&self.path)
            .map_err(|e| KithoundError::Ledger(format!("cannot open {:?}: {}", self.path, e)))?;

        let mut summary = StatsSummary::default();
        for row in reader.records() {
            let row = row.map_err(|e| KithoundError::Ledger(format!("bad row: {}", e)))?;
            if row.get(0).map_or(true, str::is_empty) {
                continue;
            }
            summary.total += 1;
            if !row.get(1).unwrap_or_default().is_empty() {
                summary.failed += 1;
                continue;
            }

            let present = |idx: usize| Detection::from_field(row.get(idx).unwrap_or_default());
            if present(2).is_present() {
                summary.write_on_file += 1;
            }
            if present(3).is_present() {
                summary.send_by_mail += 1;
            }
            if present(4).is_present() {
                summary.send_by_telegram += 1;
            }
            if present(5).is_present() {
                summary.contains_artifact += 1;
            }
            if present(6).is_present() {
                summary.recurse_copy += 1;
            }
        }
        Ok(summary)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct StatsSummary {
    pub total: usize,
    pub failed: usize,
    pub write_on_file: usize,
    pub send_by_mail: usize,
    pub send_by_telegram: usize,
    pub contains_artifact: usize,
    pub recurse_copy: usize,
}

impl StatsSummary {
    /// Kits that extracted cleanly; the percentage denominator.
    pub fn clean(&self) -> usize {
        self.total - self.failed
    }

    pub fn pct(&self, count: usize) -> f64 {
        if self.clean() == 0 {
            0.0
        } else {
            (count as f64 / self.clean() as f64) * 100.0
        }
    }
}

pub fn print_summary(summary: &StatsSummary) {
    println!(
        "\n{}",
        format!(
            "──────── Kit statistics (total: {}, extraction errors: {}) ────────",
            summary.total, summary.failed
        )
        .green()
        .bold()
    );
    let row = |label: &str, count: usize| {
        println!(
            "  {} {:<22} {:>6.2}%",
            "•".cyan(),
            label,
            summary.pct(count)
        );
    };
    row("Write on file", summary.write_on_file);
    row("Send by email", summary.send_by_mail);
    row("Send on Telegram", summary.send_by_telegram);
    row("Contain results file", summary.contains_artifact);
    row("Do a recurse copy", summary.recurse_copy);
}
