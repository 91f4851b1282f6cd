use super::signals::{is_result_artifact, BehaviorProfile, Detection};
use crate::core::errors::KithoundError;
use std::path::Path;
use walkdir::WalkDir;

/// Source extensions whose content is worth scanning for signals.
const SOURCE_EXTENSIONS: &[&str] = &[".html", ".php"];

/// Final, immutable classification of one kit. Every flag is `Unknown`
/// when extraction failed, otherwise settled to `Absent` or
/// `PresentIn` once the tree walk finished.
#[derive(Debug, Clone)]
pub struct KitRecord {
    pub name: String,
    pub error: Option<String>,
    pub file_write: Detection,
    pub mail: Detection,
    pub bot_api: Detection,
    pub artifact: Detection,
    pub recurse_copy: Detection,
}

impl KitRecord {
    /// Record for a kit whose archive could not be unpacked: behavior
    /// unknown, distinct from scanned-and-absent.
    pub fn extraction_failed(name: &str, error: &KithoundError) -> Self {
        Self {
            name: name.to_string(),
            error: Some(error.to_string()),
            file_write: Detection::Unknown,
            mail: Detection::Unknown,
            bot_api: Detection::Unknown,
            artifact: Detection::Unknown,
            recurse_copy: Detection::Unknown,
        }
    }
}

/// Operator-facing counters; also the observable proof that the
/// short-circuit stops opening files once a kit is characterized.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScanStats {
    pub files_seen: usize,
    pub files_opened: usize,
}

/// Walks one extracted kit tree and derives its classification record.
///
/// Two independent checks run over the walk: every file name feeds the
/// results-artifact check, and `.html`/`.php` contents are scanned line
/// by line for the four exfiltration signals. Content scanning stops as
/// soon as all four are latched; the walk itself only ends early once
/// the artifact has been spotted too (its absence can only be proven by
/// the full tree). Unreadable and non-UTF-8 files are skipped silently.
pub fn classify_kit(name: &str, dir: &Path) -> (KitRecord, ScanStats) {
    let mut profile = BehaviorProfile::default();
    let mut artifact = Detection::Unknown;
    let mut stats = ScanStats::default();

    let walker = WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file());

    for entry in walker {
        stats.files_seen += 1;
        let file_name = entry.file_name().to_string_lossy().into_owned();

        if !artifact.is_present() && is_result_artifact(&file_name) {
            artifact.latch(&file_name);
        }

        if !profile.all_found() && has_source_extension(&file_name) {
            stats.files_opened += 1;
            scan_file_content(entry.path(), &file_name, &mut profile);
        }

        if profile.all_found() && artifact.is_present() {
            break;
        }
    }

    profile.settle();
    artifact.settle();

    let record = KitRecord {
        name: name.to_string(),
        error: None,
        file_write: profile.file_write,
        mail: profile.mail,
        bot_api: profile.bot_api,
        artifact,
        recurse_copy: profile.recurse_copy,
    };
    (record, stats)
}

fn has_source_extension(file_name: &str) -> bool {
    SOURCE_EXTENSIONS.iter().any(|ext| file_name.ends_with(ext))
}

fn scan_file_content(path: &Path, file_name: &str, profile: &mut BehaviorProfile) {
    // Binary or permission-denied files do not fail the kit.
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::debug!("skipping unreadable {:?}: {}", path, err);
            return;
        }
    };
    let Ok(content) = String::from_utf8(bytes) else {
        tracing::debug!("skipping non-UTF-8 {:?}", path);
        return;
    };

    for line in content.lines() {
        profile.scan_line(line, file_name);
        if profile.all_found() {
            break;
        }
    }
}
