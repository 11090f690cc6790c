//! Plain directory copy with a faithful dry run.

use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::Result;
use crate::backup::result_error::WithMsg;
use crate::backup::walk::{TraversalEntry, Walker};

use itertools::Itertools;
use std::fmt::{Display, Formatter};
use std::fs::{read_dir, File};
use std::path::{Path, PathBuf};

/// One filesystem action planned for a node of the source tree
///
/// `Display` renders the line logged for it, in dry runs and real runs alike.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CopyAction {
    MakePath { dst: PathBuf },
    Copy { src: PathBuf, dst: PathBuf },
    Skip { src: PathBuf },
}

impl CopyAction {
    fn plan<P: AsRef<Path>>(entry: TraversalEntry, dst_root: P) -> Self {
        let dst = entry.dst_in(dst_root);
        if entry.is_dir() {
            CopyAction::MakePath { dst }
        } else if entry.is_file() {
            CopyAction::Copy {
                src: entry.src().clone(),
                dst,
            }
        } else {
            CopyAction::Skip {
                src: entry.src().clone(),
            }
        }
    }

    fn apply(&self) -> Result<()> {
        match self {
            CopyAction::MakePath { dst } => std::fs::create_dir_all(dst)
                .map_err(Error::from)
                .with_msg(format!("Creating directory {dst:?} failed")),
            CopyAction::Copy { src, dst } => copy_file(src, dst),
            CopyAction::Skip { .. } => {
                tracing::info!("{self}");
                Ok(())
            }
        }
    }
}

impl Display for CopyAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CopyAction::MakePath { dst } => write!(f, "make path {}", dst.display()),
            CopyAction::Copy { src, dst } => {
                write!(f, "copy {} -> {}", src.display(), dst.display())
            }
            CopyAction::Skip { src } => {
                write!(f, "'{}' is not a regular file, skipping", src.display())
            }
        }
    }
}

/// Copies the tree under `src` onto `dst`
///
/// Directories are created recursively, regular files are copied byte for
/// byte (truncating existing destinations), anything else is skipped with a
/// notice. With `dry_run` every planned action is logged and nothing is
/// touched. The first error aborts the copy; what was already written stays.
///
/// Returns the actions in traversal order; their `Display` is exactly the line
/// logged for each of them.
pub fn copy_path<P1: AsRef<Path>, P2: AsRef<Path>>(
    src: P1,
    dst: P2,
    dry_run: bool,
) -> Result<Vec<CopyAction>> {
    let dst = dst.as_ref();
    let mut actions = Vec::new();

    for entry in Walker::new(src.as_ref()).entries() {
        let action = CopyAction::plan(entry?, dst);
        if dry_run {
            tracing::info!("{action}");
        } else {
            action.apply()?;
        }
        actions.push(action);
    }

    tracing::debug!(
        "{} {} actions from {:?} to {:?}",
        if dry_run { "Planned" } else { "Applied" },
        actions.len(),
        src.as_ref(),
        dst
    );
    Ok(actions)
}

/// Copies one regular file, creating or truncating `dst`
pub fn copy_file<P1: AsRef<Path>, P2: AsRef<Path>>(src: P1, dst: P2) -> Result<()> {
    let (src, dst) = (src.as_ref(), dst.as_ref());
    let res = (|| -> Result<u64> {
        let mut reader = File::open(src)?;
        let mut writer = File::create(dst)?;
        Ok(std::io::copy(&mut reader, &mut writer)?)
    })();

    res.map(|bytes| tracing::trace!("Copied {bytes} bytes {:?} -> {:?}", src, dst))
        .with_msg(format!("Copying {src:?} to {dst:?} failed"))
}

/// Removes everything under `dir`, keeping `dir` itself
///
/// Entries are removed in file name order; stops at the first entry that
/// cannot be removed.
pub fn clean_dir<P: AsRef<Path>>(dir: P) -> Result<()> {
    let dir = dir.as_ref();
    let paths = read_dir(dir)
        .map_err(Error::from)
        .with_msg(format!("Listing {dir:?} failed"))?
        .map_ok(|entry| entry.path())
        .collect::<std::io::Result<Vec<_>>>()?;

    for path in paths.into_iter().sorted_unstable() {
        let removed = if std::fs::symlink_metadata(&path)?.is_dir() {
            std::fs::remove_dir_all(&path)
        } else {
            std::fs::remove_file(&path)
        };
        removed
            .map_err(Error::from)
            .with_msg(format!("Removing {path:?} failed"))?;
        tracing::debug!("Removed {:?}", path);
    }

    Ok(())
}
