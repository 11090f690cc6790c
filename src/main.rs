use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use dir_backup::backup::backup_config::BackupConfig;
use dir_backup::backup::compress::CompressionOptions;
use dir_backup::backup::copy::{clean_dir, copy_path};
use dir_backup::backup::format::ArchiveFormat;
use dir_backup::backup::result_error::error::Error;
use dir_backup::backup::result_error::result::Result;
use dir_backup::backup::result_error::WithMsg;
use dir_backup::backup::retention::RetentionPolicy;
use dir_backup::backup::tar::extract_archive;
use std::path::PathBuf;
use std::process::exit;
use tracing::{error, info};
use validator::Validate;

/// Copy or archive a directory and delete old backups
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Archive a directory into a timestamped tarball, then prune old backups
    Backup(BackupArgs),
    /// Copy a directory tree onto another directory
    Copy {
        src: PathBuf,
        dst: PathBuf,
        /// Empty the destination first
        #[arg(long)]
        clean: bool,
        /// Only log what would be done
        #[arg(long)]
        dry_run: bool,
    },
    /// Delete all but the newest backups in a directory
    Prune {
        dir: PathBuf,
        /// Number of newest backups to keep
        #[arg(short, long)]
        keep: usize,
        /// Only log what would be deleted
        #[arg(long)]
        dry_run: bool,
    },
    /// Unpack a backup archive
    Extract {
        archive: PathBuf,
        dst: PathBuf,
        /// Archive format, guessed from the file name when omitted
        #[arg(short, long)]
        format: Option<ArchiveFormat>,
    },
}

/// Flags override the values of the config file
#[derive(Args, Debug)]
struct BackupArgs {
    /// Location of YAML config file
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Directory to back up
    #[arg(long)]
    src_dir: Option<PathBuf>,
    /// Directory receiving the backups
    #[arg(long)]
    out_dir: Option<PathBuf>,
    /// One of tar, lz4, bzip2, gzip, sz, xz
    #[arg(short, long)]
    format: Option<ArchiveFormat>,
    /// Compression level (0-9)
    #[arg(short, long)]
    level: Option<u32>,
    /// XZ encoder threads
    #[arg(long)]
    threads: Option<u32>,
    /// Number of newest backups to keep
    #[arg(short, long)]
    keep: Option<usize>,
    /// Only log what would be done
    #[arg(long)]
    dry_run: bool,
}

impl BackupArgs {
    fn into_config(self) -> Result<BackupConfig> {
        let file_config = match &self.config {
            Some(path) => Some(BackupConfig::from_yaml_file(path)?),
            None => None,
        };
        let (src_dir, out_dir, format, compression, retention) = match file_config {
            Some(c) => (
                Some(c.src_dir),
                Some(c.out_dir),
                c.format,
                c.compression,
                c.retention,
            ),
            None => (None, None, ArchiveFormat::default(), CompressionOptions::default(), None),
        };

        let config = BackupConfig::builder()
            .src_dir(self.src_dir.or(src_dir).ok_or(Error::MissingSetting("src_dir"))?)
            .out_dir(self.out_dir.or(out_dir).ok_or(Error::MissingSetting("out_dir"))?)
            .format(self.format.unwrap_or(format))
            .compression(CompressionOptions {
                level: self.level.or(compression.level),
                threads: self.threads.or(compression.threads),
            })
            .maybe_retention(self.keep.map(RetentionPolicy::new).or(retention))
            .build();

        config
            .validate()
            .map_err(Error::from)
            .with_msg("Config validation failed")?;
        Ok(config)
    }
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Backup(args) => {
            let dry_run = args.dry_run;
            args.into_config()?.run(Utc::now(), dry_run)?;
        }
        Command::Copy {
            src,
            dst,
            clean,
            dry_run,
        } => {
            if clean && dst.is_dir() {
                if dry_run {
                    info!("clean {}", dst.display());
                } else {
                    clean_dir(&dst).with_msg(format!("Cleaning {dst:?} failed"))?;
                }
            }
            let actions = copy_path(&src, &dst, dry_run)?;
            info!("Copied {:?} to {:?}, {} entries", src, dst, actions.len());
        }
        Command::Prune { dir, keep, dry_run } => {
            let deleted = RetentionPolicy::new(keep).prune_dir(&dir, dry_run)?;
            info!("{} backups out of retention", deleted.len());
        }
        Command::Extract {
            archive,
            dst,
            format,
        } => extract_archive(&archive, format, &dst)?,
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli.command) {
        error!("{e}");
        exit(1);
    }
}
