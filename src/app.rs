use crate::{
    acquire::{KitHunter, OriginLedger, ALL_EXTENSIONS, MAIN_EXTENSIONS},
    analyze::{
        classifier::classify_kit,
        extract::{kit_name, Workspace},
        stats::print_summary,
        KitRecord, StatsLedger, EXTRACTABLE_EXTENSIONS,
    },
    cli::args::{Cli, Command},
    config::{ConfigLoader, GlobalConfig},
    feeds::{self, SeedList},
    utils::{fs, logging},
};
use anyhow::{Context, Result};
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

pub async fn run(cli: Cli) -> Result<()> {
    let level = logging::level_from_cli(&cli);
    logging::init(level)?;

    let config = ConfigLoader::load(cli.config.as_deref())?;
    fs::ensure_dir(&config.storage.data_dir)?;

    match cli.command {
        Command::Update { append } => update(&config, append).await,
        Command::Hunt { all_extensions } => hunt(&config, all_extensions).await,
        Command::Analyze => analyze_kits(&config),
        Command::Stats => show_stats(&config),
    }
}

async fn update(config: &GlobalConfig, append: bool) -> Result<()> {
    let client = reqwest::Client::builder()
        .user_agent("kithound")
        .timeout(Duration::from_secs(config.acquisition.timeout_secs))
        .build()?;

    let mut list = SeedList::load(&config.url_list_path())?;
    if !append {
        list.clear();
        tracing::info!("cleared existing seed list");
    }
    feeds::refresh(&client, &mut list).await?;

    println!(
        "Seed list now holds {} URLs",
        list.len().to_string().green().bold()
    );
    Ok(())
}

async fn hunt(config: &GlobalConfig, all_extensions: bool) -> Result<()> {
    let list = SeedList::load(&config.url_list_path())?;
    if list.is_empty() {
        println!("Seed list is empty; run `kithound update` first");
        return Ok(());
    }

    let ledger = Arc::new(OriginLedger::open(&config.origins_path())?);
    tracing::info!("origin ledger: {} known kits", ledger.len());

    let extensions = if all_extensions || config.acquisition.extended_extensions {
        ALL_EXTENSIONS
    } else {
        MAIN_EXTENSIONS
    };

    let hunter = Arc::new(KitHunter::new(
        ledger,
        config.kits_dir(),
        extensions,
        config.acquisition.max_concurrent,
        Duration::from_secs(config.acquisition.timeout_secs),
    )?);

    let urls: Vec<String> = list.urls().cloned().collect();
    let total = urls.len();
    let tally = hunter.hunt_all(urls).await?;

    println!(
        "\n{} URLs probed: {} downloaded, {} already known, {} empty",
        total,
        tally.downloaded.to_string().green().bold(),
        tally.duplicates.to_string().yellow(),
        tally.empty
    );
    Ok(())
}

fn analyze_kits(config: &GlobalConfig) -> Result<()> {
    let mut stats = StatsLedger::open(&config.stats_path())?;
    let workspace = Workspace::new().context("Failed to create extraction workspace")?;

    let mut records: Vec<KitRecord> = Vec::new();
    let mut extracted: Vec<(String, PathBuf)> = Vec::new();

    for (name, path, ext) in pending_archives(config, &stats)? {
        match workspace.extract(&path, &ext) {
            Ok(dir) => extracted.push((name, dir)),
            Err(err) => {
                tracing::warn!("extraction failed for {}: {}", name, err);
                records.push(KitRecord::extraction_failed(&name, &err));
            }
        }
    }

    for (name, dir) in extracted {
        let (record, scan) = classify_kit(&name, &dir);
        tracing::info!(
            "analyzed kit {}: {} files, {} opened",
            name,
            scan.files_seen,
            scan.files_opened
        );
        records.push(record);
    }

    if records.is_empty() {
        println!("No new kits to analyze");
    } else {
        println!("Analyzed {} new kits", records.len().to_string().green().bold());
        stats.append(&records)?;
    }

    print_summary(&stats.aggregate()?);
    Ok(())
}

fn show_stats(config: &GlobalConfig) -> Result<()> {
    let stats = StatsLedger::open(&config.stats_path())?;
    print_summary(&stats.aggregate()?);
    Ok(())
}

/// Downloaded archives the extractor can handle and the stats ledger
/// has not seen yet, in stable name order.
fn pending_archives(
    config: &GlobalConfig,
    stats: &StatsLedger,
) -> Result<Vec<(String, PathBuf, String)>> {
    let kits_dir = config.kits_dir();
    let mut entries: Vec<PathBuf> = std::fs::read_dir(&kits_dir)
        .with_context(|| format!("Failed to read kits dir: {:?}", kits_dir))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    entries.sort();

    let mut pending = Vec::new();
    for path in entries {
        let Some(ext) = EXTRACTABLE_EXTENSIONS
            .iter()
            .find(|ext| path.to_string_lossy().ends_with(*ext))
        else {
            continue;
        };
        let Some(name) = kit_name(&path, ext) else {
            continue;
        };
        if stats.is_analyzed(&name) {
            tracing::debug!("kit {} already analyzed, skipping", name);
            continue;
        }
        pending.push((name, path, ext.to_string()));
    }
    Ok(pending)
}
