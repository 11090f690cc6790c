//! # dir-backup
//!
//! Copies or archives a directory tree and keeps a bounded number of backups.
//!
//! ## Features
//!
//! - **Directory Copy**: Plain tree copy with a dry run that logs every planned action
//! - **Archives**: Tar, optionally compressed with lz4, bzip2, gzip, snappy or xz
//! - **Retention**: Keep the newest N timestamped backups, delete the rest
//! - **Extraction**: Unpack any archive produced by the tool
//!
//! ## Quick Start
//!
//! ```no_run
//! use dir_backup::backup::backup_config::BackupConfig;
//!
//! // Load and validate configuration from a YAML file
//! let config = BackupConfig::from_yaml_file("config.yml")?;
//!
//! // Take one backup now and prune old ones
//! config.run(chrono::Utc::now(), false)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod backup;
