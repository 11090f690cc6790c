use crate::backup::compress::CompressionOptions;
use crate::backup::finish::Finish;
use crate::backup::format::ArchiveFormat;
use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::Result;
use crate::backup::result_error::{WithDebugObjectAndFnName, WithMsg};
use crate::backup::retention::{RetentionPolicy, BACKUP_TIME_FORMAT};
use crate::backup::tar::{plan_tree, write_tar_archive};
use crate::backup::validate::{validate_dir_exist, validate_dir_or_missing};

use bon::Builder;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use std::fs::File;
use std::io::{BufWriter, IntoInnerError};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use validator::Validate;

/// One backup job: which directory to archive, where, and how many to keep
#[skip_serializing_none]
#[derive(Clone, Serialize, Deserialize, Debug, Validate, Builder)]
#[serde(deny_unknown_fields)]
pub struct BackupConfig {
    #[validate(custom(function = validate_dir_exist))]
    #[builder(into)]
    pub src_dir: PathBuf,
    #[validate(custom(function = validate_dir_or_missing))]
    #[builder(into)]
    pub out_dir: PathBuf,
    #[serde(default)]
    #[builder(default)]
    pub format: ArchiveFormat,
    #[serde(default)]
    #[validate(nested)]
    #[builder(default)]
    pub compression: CompressionOptions,
    #[validate(nested)]
    pub retention: Option<RetentionPolicy>,
}

impl BackupConfig {
    /// Reads and validates a YAML config file
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        File::open(path)
            .map_err(Error::from)
            .and_then(|f| {
                serde_yml::from_reader::<_, BackupConfig>(f)
                    .map_err(Error::from)
                    .with_msg(format!("Parse YAML config failed: {:?}", path))
            })
            .and_then(|bc| {
                bc.validate()
                    .map_err(Error::from)
                    .map(|_| bc)
                    .with_msg(format!("Config validation failed: {:?}", path))
            })
    }

    /// `<timestamp>.<extension>`, the name of the backup taken at `dt`
    pub fn archive_file_name(&self, dt: DateTime<Utc>) -> String {
        format!("{}.{}", dt.format(BACKUP_TIME_FORMAT), self.format.extension())
    }

    /// Archives `src_dir` into `out_dir` and returns the new backup's path
    ///
    /// The archive is written to a hidden temporary file next to its final
    /// location and only renamed into place once the compressor is finished,
    /// so an interrupted run never leaves a truncated backup behind. An
    /// existing backup with the same name is not overwritten.
    pub fn create_archive(&self, dt: DateTime<Utc>) -> Result<PathBuf> {
        let file_name = self.archive_file_name(dt);
        let file_path = self.out_dir.join(&file_name);

        let res = (|| -> Result<()> {
            std::fs::create_dir_all(&self.out_dir)?;
            let tmp = tempfile::Builder::new()
                .prefix(&format!(".{file_name}."))
                .suffix(".tmp")
                .tempfile_in(&self.out_dir)?;
            debug!("Writing archive to temporary file {:?}", tmp.path());

            let writer = self
                .format
                .open_writer(BufWriter::new(tmp.as_file()), &self.compression)
                .map(BufWriter::new)?;

            write_tar_archive(writer, &self.src_dir)?
                .into_inner()
                .map_err(IntoInnerError::into_error)?
                .finish()?
                .into_inner()
                .map_err(IntoInnerError::into_error)?
                .sync_all()?;

            tmp.persist_noclobber(&file_path)
                .map_err(|e| Error::from(e.error))
                .with_msg(format!("Moving archive into place at {file_path:?} failed"))?;
            Ok(())
        })();

        res.with_debug_object_and_fn_name(self.clone(), "create_archive")
            .map(|_| file_path)
    }

    /// Takes one backup at `now`, then applies the retention policy if any
    ///
    /// With `dry_run` the archive contents and the backups that would be
    /// deleted are only logged. Returns the created backup, if one was written.
    pub fn run(&self, now: DateTime<Utc>, dry_run: bool) -> Result<Option<PathBuf>> {
        let created = if dry_run {
            info!(
                "Would create backup {:?}",
                self.out_dir.join(self.archive_file_name(now))
            );
            for action in plan_tree(&self.src_dir)? {
                info!("{}", action?);
            }
            None
        } else {
            info!("Trying to create backup...");
            let file_path = self.create_archive(now)?;
            info!("Created backup file: {:?}", &file_path);
            Some(file_path)
        };

        if let Some(retention) = &self.retention {
            if self.out_dir.is_dir() {
                retention.prune_dir(&self.out_dir, dry_run)?;
            } else {
                debug!("{:?} does not exist yet, nothing to prune", self.out_dir);
            }
        }

        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::format::SUPPORTED_FORMATS;
    use crate::backup::tar::extract_archive;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn create_test_tree(root: &Path) -> PathBuf {
        let src = root.join("data");
        std::fs::create_dir_all(src.join("sub")).unwrap();
        std::fs::write(src.join("file1.txt"), "content1").unwrap();
        std::fs::write(src.join("sub/file2.txt"), "content2").unwrap();
        src
    }

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 1, day, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_archive_file_name() {
        let config = BackupConfig::builder()
            .src_dir("/src")
            .out_dir("/out")
            .format(ArchiveFormat::Gzip)
            .build();

        assert_eq!(config.archive_file_name(at(2)), "2023-01-02T00-00-00.tar.gz");
    }

    #[test]
    fn test_create_archive_every_format() {
        let temp_dir = TempDir::new().unwrap();
        let src = create_test_tree(temp_dir.path());

        for format in SUPPORTED_FORMATS {
            let out_dir = temp_dir.path().join(format!("out-{format}"));
            let config = BackupConfig::builder()
                .src_dir(&src)
                .out_dir(&out_dir)
                .format(format)
                .compression(CompressionOptions::builder().level(1).threads(1).build())
                .build();

            let path = config.create_archive(at(1)).unwrap();
            assert_eq!(path, out_dir.join(config.archive_file_name(at(1))));
            assert_eq!(std::fs::read_dir(&out_dir).unwrap().count(), 1);

            let unpacked = temp_dir.path().join(format!("unpacked-{format}"));
            extract_archive(&path, None, &unpacked).unwrap();
            assert_eq!(
                std::fs::read_to_string(unpacked.join("data/file1.txt")).unwrap(),
                "content1"
            );
            assert_eq!(
                std::fs::read_to_string(unpacked.join("data/sub/file2.txt")).unwrap(),
                "content2"
            );
        }
    }

    #[test]
    fn test_create_archive_does_not_overwrite() {
        let temp_dir = TempDir::new().unwrap();
        let src = create_test_tree(temp_dir.path());
        let out_dir = temp_dir.path().join("out");
        let config = BackupConfig::builder().src_dir(&src).out_dir(&out_dir).build();

        config.create_archive(at(1)).unwrap();
        assert!(config.create_archive(at(1)).is_err());
        assert_eq!(std::fs::read_dir(&out_dir).unwrap().count(), 1);
    }

    #[test]
    fn test_failed_archive_leaves_no_temporary_file() {
        let temp_dir = TempDir::new().unwrap();
        let out_dir = temp_dir.path().join("out");
        let config = BackupConfig::builder()
            .src_dir(temp_dir.path().join("missing"))
            .out_dir(&out_dir)
            .build();

        let err = config.create_archive(at(1)).unwrap_err();
        assert!(err.to_string().contains("create_archive failed"));
        assert_eq!(std::fs::read_dir(&out_dir).unwrap().count(), 0);
    }

    #[test]
    fn test_run_prunes_old_backups() {
        let temp_dir = TempDir::new().unwrap();
        let src = create_test_tree(temp_dir.path());
        let out_dir = temp_dir.path().join("out");
        let config = BackupConfig::builder()
            .src_dir(&src)
            .out_dir(&out_dir)
            .retention(RetentionPolicy::new(2))
            .build();

        for day in 1..=4 {
            config.run(at(day), false).unwrap();
        }

        let mut names: Vec<_> = std::fs::read_dir(&out_dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        names.sort();
        assert_eq!(names, vec!["2023-01-03T00-00-00.tar", "2023-01-04T00-00-00.tar"]);
    }

    #[test]
    fn test_run_dry_run_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let src = create_test_tree(temp_dir.path());
        let out_dir = temp_dir.path().join("out");
        let config = BackupConfig::builder()
            .src_dir(&src)
            .out_dir(&out_dir)
            .retention(RetentionPolicy::new(0))
            .build();

        assert_eq!(config.run(at(1), true).unwrap(), None);
        assert!(!out_dir.exists());
    }

    #[test]
    fn test_from_yaml_file() {
        let temp_dir = TempDir::new().unwrap();
        let src = create_test_tree(temp_dir.path());
        let config_path = temp_dir.path().join("config.yml");
        std::fs::write(
            &config_path,
            format!(
                "src_dir: {:?}\nout_dir: {:?}\nformat: xz\ncompression:\n  level: 9\nretention:\n  keep: 3\n",
                src,
                temp_dir.path().join("out")
            ),
        )
        .unwrap();

        let config = BackupConfig::from_yaml_file(&config_path).unwrap();
        assert_eq!(config.format, ArchiveFormat::Xz);
        assert_eq!(config.compression.level, Some(9));
        assert_eq!(config.retention, Some(RetentionPolicy::new(3)));
        assert!(!temp_dir.path().join("out").exists());
    }

    #[test]
    fn test_from_yaml_file_rejects_unknown_format() {
        let temp_dir = TempDir::new().unwrap();
        let src = create_test_tree(temp_dir.path());
        let config_path = temp_dir.path().join("config.yml");
        std::fs::write(
            &config_path,
            format!("src_dir: {:?}\nout_dir: {:?}\nformat: zip\n", src, src),
        )
        .unwrap();

        let err = BackupConfig::from_yaml_file(&config_path).unwrap_err();
        assert!(err.to_string().contains("supported"));
    }

    #[test]
    fn test_validation_rejects_missing_source() {
        let temp_dir = TempDir::new().unwrap();
        let config = BackupConfig::builder()
            .src_dir(temp_dir.path().join("missing"))
            .out_dir(temp_dir.path())
            .build();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_bad_level() {
        let temp_dir = TempDir::new().unwrap();
        let config = BackupConfig::builder()
            .src_dir(temp_dir.path())
            .out_dir(temp_dir.path())
            .compression(CompressionOptions::builder().level(12).build())
            .build();

        assert!(config.validate().is_err());
    }
}
