//! Rotation of processed artifacts into a timestamped archive.
//!
//! - `archive` moves every regular file of a directory into the archive as
//!   `{stem}_{YYYYMMDD_HHMMSS}.csv` (the extension is always `.csv`)
//! - `prune` deletes archived files older than the retention window, then
//!   trims each artifact's history to the newest `max_versions` copies
//!
//! Per-file failures are logged and collected in the report; they never abort
//! the remaining files.

use crate::error::{PipelineError, Result};
use crate::schema::ArchiveEntry;
use crate::utils::strip_timestamp_suffix;
use chrono::{DateTime, Duration, Local};
use log::{error, info, warn};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Files modified before `now - retention_days` are deleted.
    pub retention_days: i64,
    /// Newest versions kept per artifact; `None` disables the cap.
    pub max_versions: Option<usize>,
}

impl RetentionPolicy {
    pub fn days(retention_days: i64) -> Self {
        Self {
            retention_days,
            max_versions: None,
        }
    }

    pub fn with_max_versions(mut self, max_versions: usize) -> Self {
        self.max_versions = Some(max_versions);
        self
    }
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self::days(30)
    }
}

#[derive(Debug, Default)]
pub struct ArchiveReport {
    pub archived: Vec<ArchiveEntry>,
    pub failures: Vec<PipelineError>,
}

#[derive(Debug, Default)]
pub struct PruneReport {
    /// Removed because they fell outside the retention window.
    pub expired: Vec<PathBuf>,
    /// Removed because a newer set of versions filled the cap.
    pub over_cap: Vec<PathBuf>,
    pub failures: Vec<PipelineError>,
}

impl PruneReport {
    pub fn removed(&self) -> usize {
        self.expired.len() + self.over_cap.len()
    }
}

/// Name an archived copy of `file_name` receives at `now`.
pub fn archived_name(file_name: &Path, now: DateTime<Local>) -> String {
    let stem = file_name
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{}_{}.csv", stem, now.format(TIMESTAMP_FORMAT))
}

fn archive_io(path: &Path, source: std::io::Error) -> PipelineError {
    PipelineError::ArchiveIo {
        path: path.to_path_buf(),
        source,
    }
}

/// Regular files directly under `dir`, sorted by name, with their modification times.
fn list_files(dir: &Path) -> Result<Vec<(PathBuf, DateTime<Local>)>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| archive_io(dir, e))? {
        let entry = entry.map_err(|e| archive_io(dir, e))?;
        let path = entry.path();
        let metadata = match fs::metadata(&path) {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                continue;
            }
        };
        if !metadata.is_file() {
            continue;
        }
        let modified = metadata.modified().map_err(|e| archive_io(&path, e))?;
        files.push((path, DateTime::<Local>::from(modified)));
    }
    files.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(files)
}

pub fn archive(source_dir: &Path, archive_dir: &Path) -> Result<ArchiveReport> {
    archive_at(source_dir, archive_dir, Local::now())
}

/// Same-second collisions overwrite the earlier archived copy.
pub fn archive_at(
    source_dir: &Path,
    archive_dir: &Path,
    now: DateTime<Local>,
) -> Result<ArchiveReport> {
    let mut report = ArchiveReport::default();

    if !source_dir.is_dir() {
        warn!("Source directory does not exist: {}", source_dir.display());
        return Ok(report);
    }

    fs::create_dir_all(archive_dir).map_err(|e| archive_io(archive_dir, e))?;

    for (path, modified) in list_files(source_dir)? {
        let Some(file_name) = path.file_name() else {
            continue;
        };
        let target = archive_dir.join(archived_name(Path::new(file_name), now));

        match fs::rename(&path, &target) {
            Ok(()) => {
                info!("Archived: {} -> {}", path.display(), target.display());
                report.archived.push(ArchiveEntry {
                    original_path: path,
                    archived_path: target,
                    modified,
                });
            }
            Err(e) => {
                error!("Error archiving {}: {}", path.display(), e);
                report.failures.push(archive_io(&path, e));
            }
        }
    }

    Ok(report)
}

pub fn prune(archive_dir: &Path, policy: &RetentionPolicy) -> Result<PruneReport> {
    prune_at(archive_dir, policy, Local::now())
}

pub fn prune_at(
    archive_dir: &Path,
    policy: &RetentionPolicy,
    now: DateTime<Local>,
) -> Result<PruneReport> {
    let mut report = PruneReport::default();

    if !archive_dir.is_dir() {
        warn!("Archive directory does not exist: {}", archive_dir.display());
        return Ok(report);
    }

    // A window reaching past the representable range expires nothing.
    let cutoff = Duration::try_days(policy.retention_days).and_then(|d| now.checked_sub_signed(d));
    if cutoff.is_none() {
        warn!(
            "Retention window of {} days is out of range, no archive file expires",
            policy.retention_days
        );
    }
    let mut retained = Vec::new();

    for (path, modified) in list_files(archive_dir)? {
        if cutoff.is_some_and(|cutoff| modified < cutoff) {
            match fs::remove_file(&path) {
                Ok(()) => {
                    info!("Pruned archive file: {}", path.display());
                    report.expired.push(path);
                }
                Err(e) => {
                    error!("Error pruning {}: {}", path.display(), e);
                    report.failures.push(archive_io(&path, e));
                }
            }
        } else {
            retained.push((path, modified));
        }
    }

    let Some(max_versions) = policy.max_versions else {
        return Ok(report);
    };

    let mut versions: BTreeMap<String, Vec<(PathBuf, DateTime<Local>)>> = BTreeMap::new();
    for (path, modified) in retained {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let artifact = strip_timestamp_suffix(&stem).to_string();
        versions.entry(artifact).or_default().push((path, modified));
    }

    for (artifact, mut files) in versions {
        if files.len() <= max_versions {
            continue;
        }
        // Newest first; names carry the timestamp so they break mtime ties.
        files.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| b.0.cmp(&a.0)));
        for (path, _) in files.into_iter().skip(max_versions) {
            match fs::remove_file(&path) {
                Ok(()) => {
                    info!(
                        "Pruned archive file beyond {} versions of {}: {}",
                        max_versions,
                        artifact,
                        path.display()
                    );
                    report.over_cap.push(path);
                }
                Err(e) => {
                    error!("Error pruning {}: {}", path.display(), e);
                    report.failures.push(archive_io(&path, e));
                }
            }
        }
    }

    Ok(report)
}
