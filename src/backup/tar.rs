use crate::backup::format::{ArchiveFormat, UnknownFormatError};
use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::Result;
use crate::backup::result_error::WithMsg;
use crate::backup::walk::{TraversalEntry, Walker};

use dyn_iter::{DynIter, IntoDynIterator};
use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

/// What happens to one walked node when archiving
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TarAction {
    AppendDir { src: PathBuf, name: PathBuf },
    AppendFile { src: PathBuf, name: PathBuf },
    Skip { src: PathBuf },
}

impl TarAction {
    /// `None` for the walk root when the archive has no top-level folder
    fn plan(entry: TraversalEntry, top: &Path) -> Option<Self> {
        let name = entry.dst_in(top);
        if name.as_os_str().is_empty() {
            return None;
        }

        let src = entry.src().clone();
        Some(if entry.is_dir() {
            TarAction::AppendDir { src, name }
        } else if entry.is_file() {
            TarAction::AppendFile { src, name }
        } else {
            TarAction::Skip { src }
        })
    }
}

impl Display for TarAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TarAction::AppendDir { name, .. } => write!(f, "add directory {}", name.display()),
            TarAction::AppendFile { src, name } => {
                write!(f, "add {} as {}", src.display(), name.display())
            }
            TarAction::Skip { src } => {
                write!(f, "'{}' is not a regular file, skipping", src.display())
            }
        }
    }
}

/// Entries of the archive are nested under the source directory's own name
fn archive_root_name(src_dir: &Path) -> Result<PathBuf> {
    Ok(src_dir
        .canonicalize()?
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_default())
}

/// Plans the archive entries for `src_dir`, in walk order
pub fn plan_tree<'a, P: AsRef<Path>>(src_dir: P) -> Result<DynIter<'a, Result<TarAction>>> {
    let src_dir = src_dir.as_ref();
    let top = archive_root_name(src_dir)
        .with_msg(format!("Resolving source directory {src_dir:?} failed"))?;

    Ok(Walker::new(src_dir)
        .entries()
        .filter_map(move |entry| entry.map(|e| TarAction::plan(e, &top)).transpose())
        .into_dyn_iter())
}

/// Appends every directory and regular file under `src_dir` to `builder`
///
/// Returns how many entries were appended.
pub fn append_tree<W: Write, P: AsRef<Path>>(
    builder: &mut tar::Builder<W>,
    src_dir: P,
) -> Result<usize> {
    let mut entry_count = 0;
    for action in plan_tree(src_dir)? {
        match action? {
            TarAction::AppendDir { src, name } => {
                builder
                    .append_dir(&name, &src)
                    .map_err(Error::from)
                    .with_msg(format!("Archiving directory {src:?} failed"))?;
                entry_count += 1;
            }
            TarAction::AppendFile { src, name } => {
                builder
                    .append_path_with_name(&src, &name)
                    .map_err(Error::from)
                    .with_msg(format!("Archiving file {src:?} failed"))?;
                entry_count += 1;
            }
            skip @ TarAction::Skip { .. } => tracing::info!("{skip}"),
        }
    }
    Ok(entry_count)
}

/// Writes a tar stream of `src_dir` into `writer` and hands the writer back
pub fn write_tar_archive<W: Write, P: AsRef<Path>>(writer: W, src_dir: P) -> Result<W> {
    let mut builder = tar::Builder::new(writer);
    builder.follow_symlinks(false);

    let entry_count = append_tree(&mut builder, src_dir)?;
    tracing::info!("Processed {} archive entries", entry_count);

    Ok(builder.into_inner()?)
}

/// Unpacks `archive` into `dst`
///
/// Without an explicit format it is guessed from the archive's file name.
pub fn extract_archive<P1: AsRef<Path>, P2: AsRef<Path>>(
    archive: P1,
    format: Option<ArchiveFormat>,
    dst: P2,
) -> Result<()> {
    let (archive, dst) = (archive.as_ref(), dst.as_ref());
    let format = match format {
        Some(format) => format,
        None => {
            let name = archive
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            ArchiveFormat::from_file_name(&name)
                .ok_or(Error::from(UnknownFormatError { format: name }))
                .with_msg(format!("Cannot tell the archive format of {archive:?}"))?
        }
    };

    tracing::info!("Extracting {:?} as {} into {:?}", archive, format, dst);
    std::fs::create_dir_all(dst)?;
    let reader = File::open(archive)
        .map(BufReader::new)
        .map(|r| format.open_reader(r))
        .map_err(Error::from)
        .with_msg(format!("Opening {archive:?} failed"))?;

    tar::Archive::new(reader)
        .unpack(dst)
        .map_err(Error::from)
        .with_msg(format!("Unpacking {archive:?} into {dst:?} failed"))
}
