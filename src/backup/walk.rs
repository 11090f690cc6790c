//! Deterministic depth-first traversal of a source tree.
//!
//! The walk is the single producer shared by the copier, its dry run and the
//! tar archiver, so all of them see the same nodes in the same order.

use crate::backup::function_path;
use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::Result;
use crate::backup::result_error::WithDebugObjectAndFnName;

use derive_more::Display;
use dyn_iter::{DynIter, IntoDynIterator};
use function_name::named;
use getset::Getters;
use walkdir::{DirEntry, WalkDir};

use std::path::{Path, PathBuf, MAIN_SEPARATOR};

/// What kind of filesystem node a traversal entry points at
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
pub enum EntryKind {
    #[display("directory")]
    Dir,
    #[display("regular file")]
    File,
    /// Symlinks, devices, sockets, fifos
    #[display("other")]
    Other,
}

/// A single node visited during a walk
#[derive(Clone, Debug, PartialEq, Eq, Getters)]
#[getset(get = "pub")]
pub struct TraversalEntry {
    /// Path of the node as produced by the walk, usable for I/O
    src: PathBuf,
    /// Path relative to the walk root, empty for the root itself
    rel: PathBuf,
    kind: EntryKind,
}

impl TraversalEntry {
    fn from_dir_entry(root: &Path, de: DirEntry) -> Result<Self> {
        let file_type = de.file_type();
        let kind = if file_type.is_dir() {
            EntryKind::Dir
        } else if file_type.is_file() {
            EntryKind::File
        } else {
            EntryKind::Other
        };
        let src = de.into_path();
        let rel = src.strip_prefix(root)?.to_path_buf();

        tracing::trace!("Visiting {} {:?}", kind, src);
        Ok(Self { src, rel, kind })
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Dir
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    /// Relative path rendered with `/` separators, for logs and comparisons
    pub fn rel_slash(&self) -> String {
        to_slash(&self.rel)
    }

    /// Joins the relative path onto `root`, one component at a time
    ///
    /// Names are carried over as raw OS strings, never re-encoded.
    pub fn dst_in<P: AsRef<Path>>(&self, root: P) -> PathBuf {
        self.rel
            .components()
            .fold(root.as_ref().to_path_buf(), |path, component| path.join(component))
    }
}

/// Renders a path with `/` as the only separator
pub fn to_slash<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref().to_string_lossy();
    if MAIN_SEPARATOR == '/' {
        path.into_owned()
    } else {
        path.replace(MAIN_SEPARATOR, "/")
    }
}

/// Restartable walk over a directory tree
///
/// Every call to [`Walker::entries`] starts a fresh traversal. Nodes are
/// visited depth-first, parents before children, siblings sorted by file
/// name. Symlinks are reported as [`EntryKind::Other`] and never followed.
#[derive(Clone, Debug, Getters)]
#[getset(get = "pub")]
pub struct Walker {
    root: PathBuf,
}

impl Walker {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    #[named]
    pub fn entries<'a>(&self) -> DynIter<'a, Result<TraversalEntry>> {
        let root = self.root.clone();
        let strip_root = self.root.clone();

        WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .map(move |res| {
                res.map_err(Error::from)
                    .and_then(|de| TraversalEntry::from_dir_entry(&strip_root, de))
            })
            .map(move |res| res.with_debug_object_and_fn_name(root.clone(), function_path!()))
            .into_dyn_iter()
    }
}
