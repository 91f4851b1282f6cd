//! Phishing kit discovery and static classification.
//!
//! Two engines share this crate: acquisition (probe truncated URL
//! prefixes for exposed kit archives, validate payloads, dedup against
//! the origin ledger) and classification (unpack archives into an
//! ephemeral workspace, scan sources for exfiltration signals, persist
//! per-kit records to the stats ledger).

pub mod acquire;
pub mod analyze;
pub mod app;
pub mod cli;
pub mod config;
pub mod core;
pub mod feeds;
pub mod utils;
