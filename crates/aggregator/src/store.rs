//! Ledger files on disk.
//!
//! Layout under the ledger root:
//! - `<symbol>/latest.json`: the current cycle
//! - `<symbol>/<YYYYMMDD>.json`: archived cycles, never overwritten

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use stashcraft_core::{
    checksum, is_date_stamp, Address, LedgerSnapshot, Result, StashError,
};

const LATEST: &str = "latest.json";

/// What `save` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOutcome {
    /// Where the new snapshot was written
    pub latest: PathBuf,
    /// Where the previous snapshot was moved, if the date rolled over
    pub archived: Option<PathBuf>,
}

/// Ledger directory for one distribution symbol.
#[derive(Debug, Clone)]
pub struct LedgerStore {
    dir: PathBuf,
}

impl LedgerStore {
    pub fn new(root: impl AsRef<Path>, symbol: &str) -> Self {
        Self {
            dir: root.as_ref().join(symbol),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn latest_path(&self) -> PathBuf {
        self.dir.join(LATEST)
    }

    pub fn archive_path(&self, date: &str) -> PathBuf {
        self.dir.join(format!("{}.json", date))
    }

    /// Load the current snapshot, or a genesis snapshot if none exists.
    pub fn load(&self, symbol: &str, token: &Address, date: &str) -> Result<LedgerSnapshot> {
        let path = self.latest_path();
        if !path.exists() {
            info!("No ledger at {}, starting from genesis", path.display());
            return Ok(LedgerSnapshot::genesis(symbol, *token, date));
        }

        let snapshot = Self::read_snapshot(&path)?;
        if snapshot.address != *token {
            return Err(StashError::corrupt(
                &path,
                format!(
                    "ledger is for token {}, not {}",
                    checksum(&snapshot.address),
                    checksum(token)
                ),
            ));
        }

        info!(
            "Loaded ledger {} ({}, {} claims, total {})",
            path.display(),
            snapshot.date,
            snapshot.claims.len(),
            snapshot.total,
        );
        Ok(snapshot)
    }

    /// Read `latest.json` without checking which token it belongs to.
    pub fn load_latest(&self) -> Result<Option<LedgerSnapshot>> {
        let path = self.latest_path();
        if !path.exists() {
            return Ok(None);
        }
        Self::read_snapshot(&path).map(Some)
    }

    /// Load an archived cycle by its date stamp.
    pub fn load_archive(&self, date: &str) -> Result<LedgerSnapshot> {
        if !is_date_stamp(date) {
            return Err(StashError::corrupt(
                self.archive_path(date),
                "archive date is not a YYYYMMDD stamp",
            ));
        }
        Self::read_snapshot(&self.archive_path(date))
    }

    /// Date stamps of every archived cycle, oldest first.
    pub fn archived_dates(&self) -> Result<Vec<String>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut dates: Vec<String> = fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let name = entry.file_name().into_string().ok()?;
                let stem = name.strip_suffix(".json")?;
                is_date_stamp(stem).then(|| stem.to_string())
            })
            .collect();
        dates.sort();
        Ok(dates)
    }

    fn read_snapshot(path: &Path) -> Result<LedgerSnapshot> {
        let contents = fs::read(path)?;
        let snapshot: LedgerSnapshot = serde_json::from_slice(&contents)
            .map_err(|e| StashError::corrupt(path, e.to_string()))?;
        snapshot
            .validate()
            .map_err(|reason| StashError::corrupt(path, reason))?;
        Ok(snapshot)
    }

    /// Persist `next`, archiving the existing file first if the date changed.
    ///
    /// All checks run before anything on disk changes. The new contents go to
    /// a temporary file that is renamed over `latest.json`, so a failed write
    /// never leaves a truncated ledger behind.
    pub fn save(&self, next: &LedgerSnapshot, previous: &LedgerSnapshot) -> Result<SaveOutcome> {
        let latest = self.latest_path();

        let archive = if previous.date != next.date && latest.exists() {
            if !is_date_stamp(&previous.date) {
                return Err(StashError::corrupt(&latest, "previous date is not a YYYYMMDD stamp"));
            }
            let archive = self.archive_path(&previous.date);
            if archive.exists() {
                return Err(StashError::ArchiveCollision(archive));
            }
            Some(archive)
        } else {
            None
        };

        let json = serde_json::to_string_pretty(next)
            .map_err(|e| StashError::Serialization(e.to_string()))?;

        fs::create_dir_all(&self.dir)?;
        let tmp_path = latest.with_extension("json.tmp");
        if let Err(e) = Self::write_synced(&tmp_path, json.as_bytes()) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }

        if let Err(e) = Self::commit(&tmp_path, &latest, archive.as_deref()) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }

        debug!("Wrote {} bytes to {}", json.len(), latest.display());
        Ok(SaveOutcome {
            latest,
            archived: archive,
        })
    }

    /// Move `latest` to `archive` (if any), then `tmp` over `latest`.
    ///
    /// If the second rename fails the archive is moved back, so `latest`
    /// keeps its previous contents.
    fn commit(tmp: &Path, latest: &Path, archive: Option<&Path>) -> std::io::Result<()> {
        if let Some(archive) = archive {
            fs::rename(latest, archive)?;
            info!("Archived {} -> {}", latest.display(), archive.display());
        }

        if let Err(e) = fs::rename(tmp, latest) {
            warn!("Failed to replace {}: {}", latest.display(), e);
            if let Some(archive) = archive {
                match fs::rename(archive, latest) {
                    Ok(()) => info!("Restored {} from {}", latest.display(), archive.display()),
                    Err(restore) => warn!(
                        "Failed to restore {} from {}: {}",
                        latest.display(),
                        archive.display(),
                        restore
                    ),
                }
            }
            return Err(e);
        }
        Ok(())
    }

    fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
        let mut file = fs::File::create(path)?;
        file.write_all(bytes)?;
        file.sync_all()
    }
}
