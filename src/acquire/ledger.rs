use crate::core::errors::KithoundError;
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Hex fingerprints occupy the first 32 bytes of every ledger line.
const FINGERPRINT_LEN: usize = 32;

/// Persistent set of content-origin fingerprints, the sole arbiter of
/// "already seen". One line per downloaded kit:
///
/// `fingerprint - filename - url`
///
/// The whole file is loaded at construction; the in-memory set is the
/// single source of truth for the rest of the run. One mutex guards
/// both the set and the append handle so the check-then-record sequence
/// stays serialized across concurrent probes.
pub struct OriginLedger {
    path: PathBuf,
    inner: Mutex<Inner>,
}

struct Inner {
    seen: HashSet<String>,
    log: File,
}

/// Outcome of an atomic check-then-insert on a fingerprint.
#[derive(Debug, PartialEq, Eq)]
pub enum Claim {
    /// Caller now owns this fingerprint and must either commit or
    /// release it.
    New,
    /// Someone already downloaded (or is downloading) this origin.
    Existing,
}

impl OriginLedger {
    /// Eagerly loads the whole ledger. Failure here is fatal by design:
    /// running without the ledger would re-download every kit ever seen.
    pub fn open(path: &Path) -> Result<Self, KithoundError> {
        let mut log = OpenOptions::new()
            .read(true)
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| KithoundError::Ledger(format!("cannot open {:?}: {}", path, e)))?;

        log.seek(SeekFrom::Start(0))
            .map_err(|e| KithoundError::Ledger(format!("cannot seek {:?}: {}", path, e)))?;

        let mut seen = HashSet::new();
        for line in BufReader::new(&log).lines() {
            let line =
                line.map_err(|e| KithoundError::Ledger(format!("cannot read {:?}: {}", path, e)))?;
            let trimmed = line.trim_end();
            if trimmed.len() >= FINGERPRINT_LEN {
                seen.insert(trimmed[..FINGERPRINT_LEN].to_string());
            }
        }

        tracing::debug!("origin ledger loaded: {} fingerprints", seen.len());

        Ok(Self {
            path: path.to_path_buf(),
            inner: Mutex::new(Inner { seen, log }),
        })
    }

    pub fn contains(&self, fp: &str) -> bool {
        self.inner.lock().unwrap().seen.contains(fp)
    }

    /// Atomic check-then-insert. `Claim::New` hands ownership of the
    /// fingerprint to the caller; two workers racing on the same prefix
    /// cannot both get it.
    pub fn claim(&self, fp: &str) -> Claim {
        let mut inner = self.inner.lock().unwrap();
        if inner.seen.insert(fp.to_string()) {
            Claim::New
        } else {
            Claim::Existing
        }
    }

    /// Undo a claim whose download failed, so a later probe of the same
    /// origin can retry.
    pub fn release(&self, fp: &str) {
        self.inner.lock().unwrap().seen.remove(fp);
    }

    /// Append the durable record for a claimed fingerprint.
    pub fn record(&self, fp: &str, filename: &str, url: &str) -> Result<(), KithoundError> {
        let mut inner = self.inner.lock().unwrap();
        inner.seen.insert(fp.to_string());
        writeln!(inner.log, "{} - {} - {}", fp, filename, url)
            .and_then(|_| inner.log.flush())
            .map_err(|e| KithoundError::Ledger(format!("cannot append {:?}: {}", self.path, e)))
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().seen.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn fp(n: u8) -> String {
        format!("{:032x}", n)
    }

    #[test]
    fn record_then_contains() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("origins.txt");
        let ledger = OriginLedger::open(&path).unwrap();

        assert!(!ledger.contains(&fp(1)));
        ledger.record(&fp(1), "store#abcde.zip", "http://h.tld/store/a/").unwrap();
        assert!(ledger.contains(&fp(1)));

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            format!("{} - store#abcde.zip - http://h.tld/store/a/\n", fp(1))
        );
    }

    #[test]
    fn reload_collapses_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("origins.txt");
        fs::write(
            &path,
            format!(
                "{0} - a.zip - http://a/\n{1} - b.zip - http://b/\n{0} - a.zip - http://a/\n",
                fp(1),
                fp(2)
            ),
        )
        .unwrap();

        let ledger = OriginLedger::open(&path).unwrap();
        assert_eq!(ledger.len(), 2);
        assert!(ledger.contains(&fp(1)));
        assert!(ledger.contains(&fp(2)));
    }

    #[test]
    fn claim_is_exclusive_until_released() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = OriginLedger::open(&dir.path().join("origins.txt")).unwrap();

        assert_eq!(ledger.claim(&fp(7)), Claim::New);
        assert_eq!(ledger.claim(&fp(7)), Claim::Existing);

        ledger.release(&fp(7));
        assert_eq!(ledger.claim(&fp(7)), Claim::New);
    }

    #[test]
    fn append_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("origins.txt");
        {
            let ledger = OriginLedger::open(&path).unwrap();
            ledger.record(&fp(1), "a.zip", "http://a/").unwrap();
        }
        {
            let ledger = OriginLedger::open(&path).unwrap();
            ledger.record(&fp(2), "b.zip", "http://b/").unwrap();
        }
        let reopened = OriginLedger::open(&path).unwrap();
        assert_eq!(reopened.len(), 2);
    }

    #[test]
    fn open_fails_when_path_is_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            OriginLedger::open(dir.path()),
            Err(KithoundError::Ledger(_))
        ));
    }
}
