//! Result documents written after a sweep.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::{PerformanceSummary, SweepError, SweepReport};
use crate::params::ConfigId;

/// Saved sweeps kept in an output directory; older ones are pruned after each save.
pub const MAX_SAVED_SWEEPS: usize = 5;
const STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// The selected configuration, nested the way the league engine reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimalConfiguration {
    pub config_name: String,
    pub description: String,
    pub config_id: ConfigId,
    pub performance: PerformanceSummary,
    pub parameters: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedOutputs {
    pub optimal_config: PathBuf,
    pub report_json: PathBuf,
    pub report_csv: PathBuf,
}

/// Write the optimal configuration, the full report and one CSV row per
/// configuration under `dir`. File names carry the sweep's UTC timestamp.
pub fn save_sweep(report: &SweepReport, dir: &Path) -> Result<SavedOutputs, SweepError> {
    fs::create_dir_all(dir).map_err(|source| SweepError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let stamp = file_stamp(&report.generated_at);

    let optimal_config = dir.join(format!("optimal_{}_{stamp}.json", report.mode));
    write_json(&optimal_config, &report.optimal)?;

    let report_json = dir.join(format!("sweep_{}_{stamp}.json", report.mode));
    write_json(&report_json, report)?;

    let report_csv = dir.join(format!("sweep_{}_{stamp}.csv", report.mode));
    write_csv(&report_csv, report)?;

    let pruned = prune_saved_sweeps(dir, MAX_SAVED_SWEEPS)?;
    info!(
        optimal = %optimal_config.display(),
        report = %report_json.display(),
        csv = %report_csv.display(),
        pruned,
        "sweep results saved"
    );
    Ok(SavedOutputs {
        optimal_config,
        report_json,
        report_csv,
    })
}

/// Ranked configurations first, then the ones that never finished a run.
fn write_csv(path: &Path, report: &SweepReport) -> Result<(), SweepError> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in &report.ranked {
        writer.serialize(row)?;
    }
    for row in &report.failed {
        writer.serialize(row)?;
    }
    writer.flush().map_err(|source| SweepError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub(super) fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), SweepError> {
    let body = serde_json::to_string_pretty(value)?;
    fs::write(path, body).map_err(|source| SweepError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Delete every saved sweep but the `keep` newest and return how many files
/// went. The files of one sweep share its timestamp; other files are left alone.
pub fn prune_saved_sweeps(dir: &Path, keep: usize) -> Result<usize, SweepError> {
    let entries = fs::read_dir(dir).map_err(|source| SweepError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut saved: BTreeMap<NaiveDateTime, Vec<PathBuf>> = BTreeMap::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if let Some(stamp) = saved_stamp(&path) {
            saved.entry(stamp).or_default().push(path);
        }
    }

    let stale = saved.len().saturating_sub(keep);
    let mut removed = 0;
    for (stamp, paths) in saved.into_iter().take(stale) {
        for path in paths {
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(err) => warn!(path = %path.display(), error = %err, "failed to remove old sweep output"),
            }
        }
        debug!(%stamp, "pruned saved sweep");
    }
    Ok(removed)
}

/// `sweep_full_20261016_083005.csv` → its timestamp.
fn saved_stamp(path: &Path) -> Option<NaiveDateTime> {
    let stem = path.file_stem()?.to_str()?;
    if !(stem.starts_with("optimal_") || stem.starts_with("sweep_")) {
        return None;
    }
    let stamp = stem.get(stem.len().checked_sub(15)?..)?;
    NaiveDateTime::parse_from_str(stamp, STAMP_FORMAT).ok()
}

/// `2026-10-16T08:30:05.123+00:00` → `20261016_083005`.
fn file_stamp(rfc3339: &str) -> String {
    match chrono::DateTime::parse_from_rfc3339(rfc3339) {
        Ok(timestamp) => timestamp.format(STAMP_FORMAT).to_string(),
        Err(_) => chrono::Utc::now().format(STAMP_FORMAT).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stamp_is_filesystem_friendly() {
        assert_eq!(file_stamp("2026-10-16T08:30:05.123+00:00"), "20261016_083005");
        assert_eq!(file_stamp("not a time").len(), 15);
    }

    #[test]
    fn pruning_keeps_the_newest_sweeps() {
        let dir = std::env::temp_dir().join(format!("draftsim-prune-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        for second in 0..7 {
            let stamp = format!("20260101_00000{second}");
            for name in [
                format!("optimal_full_{stamp}.json"),
                format!("sweep_full_{stamp}.json"),
                format!("sweep_full_{stamp}.csv"),
            ] {
                fs::write(dir.join(name), "{}").unwrap();
            }
        }
        fs::write(dir.join("notes.txt"), "keep").unwrap();
        fs::write(dir.join("intermediate_01_BASE_BYE_PENALTY.json"), "{}").unwrap();

        assert_eq!(prune_saved_sweeps(&dir, MAX_SAVED_SWEEPS).unwrap(), 6);
        assert!(!dir.join("sweep_full_20260101_000000.csv").exists());
        assert!(!dir.join("optimal_full_20260101_000001.json").exists());
        assert!(dir.join("optimal_full_20260101_000002.json").exists());
        assert!(dir.join("sweep_full_20260101_000006.csv").exists());
        assert!(dir.join("notes.txt").exists());
        assert!(dir.join("intermediate_01_BASE_BYE_PENALTY.json").exists());
        assert_eq!(prune_saved_sweeps(&dir, MAX_SAVED_SWEEPS).unwrap(), 0);
        let _ = fs::remove_dir_all(dir);
    }
}
