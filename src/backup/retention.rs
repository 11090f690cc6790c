//! Count based retention of timestamped backups.
//!
//! Deciding what to delete ([`backups_to_delete`]) is pure; removing the files
//! is left to [`RetentionPolicy::prune_dir`].

use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::Result;
use crate::backup::result_error::WithMsg;

use chrono::NaiveDateTime;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fs::read_dir;
use std::path::{Path, PathBuf};
use validator::Validate;

/// Timestamp part of every backup file name, shared by naming and pruning
pub static BACKUP_TIME_FORMAT: &str = "%Y-%m-%dT%H-%M-%S";

/// Only this suffix is stripped before parsing the timestamp.
///
/// Compressed backups (`<timestamp>.tar.gz`, ...) therefore never parse and are
/// left alone by retention; `prune_dir` warns about them.
pub static RETENTION_SUFFIX: &str = ".tar";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackupEntry {
    pub name: String,
    pub timestamp: NaiveDateTime,
}

impl BackupEntry {
    /// `None` when the name is not `<timestamp>` or `<timestamp>.tar`
    pub fn parse<S: Into<String>>(name: S) -> Option<Self> {
        let name = name.into();
        let stem = name.strip_suffix(RETENTION_SUFFIX).unwrap_or(&name);
        let timestamp = NaiveDateTime::parse_from_str(stem, BACKUP_TIME_FORMAT).ok()?;
        Some(Self { name, timestamp })
    }
}

/// Names of the backups beyond the `keep` newest ones, oldest first
///
/// Names that do not parse as backups are neither kept nor deleted. Backups
/// with equal timestamps keep their input order.
pub fn backups_to_delete<I, S>(names: I, keep: usize) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let entries = names
        .into_iter()
        .filter_map(|name| BackupEntry::parse(name.as_ref()))
        .sorted_by_key(|entry| entry.timestamp)
        .collect_vec();

    let excess = entries.len().saturating_sub(keep);
    entries
        .into_iter()
        .take(excess)
        .map(|entry| entry.name)
        .collect()
}

fn looks_like_compressed_backup(name: &str) -> bool {
    name.split_once(".tar.")
        .is_some_and(|(stem, _)| NaiveDateTime::parse_from_str(stem, BACKUP_TIME_FORMAT).is_ok())
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Validate, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetentionPolicy {
    /// Number of newest backups to preserve
    pub keep: usize,
}

impl RetentionPolicy {
    pub fn new(keep: usize) -> Self {
        Self { keep }
    }

    pub fn backups_to_delete<I, S>(&self, names: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        backups_to_delete(names, self.keep)
    }

    /// Deletes the out of retention backups found directly in `dir`
    ///
    /// With `dry_run` the files are only reported. Returns the affected paths.
    pub fn prune_dir<P: AsRef<Path>>(&self, dir: P, dry_run: bool) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        let mut names = Vec::new();
        let listing = read_dir(dir)
            .map_err(Error::from)
            .with_msg(format!("Listing {dir:?} failed"))?;
        for entry in listing {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) => names.push(name),
                Err(name) => tracing::trace!("Ignoring non UTF-8 file name {:?}", name),
            }
        }
        names.sort_unstable();

        for name in names.iter().filter(|n| looks_like_compressed_backup(n)) {
            tracing::warn!(
                "{:?} looks like a compressed backup, only names ending in {:?} are subject to retention",
                name,
                RETENTION_SUFFIX
            );
        }

        let to_delete = self.backups_to_delete(&names);
        tracing::info!(
            "Keeping {} newest backups in {:?}, {} to delete",
            self.keep,
            dir,
            to_delete.len()
        );

        to_delete
            .into_iter()
            .map(|name| -> Result<PathBuf> {
                let path = dir.join(name);
                if dry_run {
                    tracing::info!("delete {}", path.display());
                } else {
                    tracing::info!("Removing out of retention file {:?}", path);
                    std::fs::remove_file(&path)
                        .map_err(Error::from)
                        .with_msg(format!("Removing {path:?} failed"))?;
                }
                Ok(path)
            })
            .collect()
    }
}
