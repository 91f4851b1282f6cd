use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub acquisition: AcquisitionConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Folder holding downloaded archives, the origin ledger, the stats
    /// ledger and the seed URL list.
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("phishing-kits"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AcquisitionConfig {
    /// Bounded worker pool size, one in-flight URL per permit.
    pub max_concurrent: usize,
    /// Per-request timeout in seconds; bounds stalls on dead hosts.
    pub timeout_secs: u64,
    /// Probe the ~30 legacy compression extensions instead of the
    /// common three. Overridable from the CLI.
    pub extended_extensions: bool,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 16,
            timeout_secs: 15,
            extended_extensions: false,
        }
    }
}

impl GlobalConfig {
    pub fn kits_dir(&self) -> PathBuf {
        self.storage.data_dir.clone()
    }

    pub fn origins_path(&self) -> PathBuf {
        self.storage.data_dir.join("origins.txt")
    }

    pub fn stats_path(&self) -> PathBuf {
        self.storage.data_dir.join("stats.csv")
    }

    pub fn url_list_path(&self) -> PathBuf {
        self.storage.data_dir.join("url_list.txt")
    }
}
