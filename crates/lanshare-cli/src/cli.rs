//! CLI argument parsing using clap.

use clap::Parser;
use lanshare_core::ShareConfig;
use lanshare_core::config::ArchiveMode;
use lanshare_core::config::DeletePolicy;
use log::LevelFilter;
use std::net::IpAddr;
use std::net::Ipv4Addr;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "lanshare")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory to share
    #[arg(value_name = "ROOT", default_value = ".")]
    pub root: PathBuf,

    /// Address to listen on
    #[arg(short, long, value_name = "ADDR", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub bind: IpAddr,

    /// Port to listen on
    #[arg(short, long, default_value_t = 8000)]
    pub port: u16,

    /// Stop a bulk delete at the first missing entry
    #[arg(long)]
    pub stop_on_missing: bool,

    /// Stream archives while compressing instead of staging them on disk
    #[arg(long)]
    pub stream_archives: bool,

    /// Keep staged archives after they have been sent
    #[arg(long, conflicts_with = "stream_archives")]
    pub keep_archives: bool,

    /// Directory for staged archives (default: system temp dir)
    #[arg(long, value_name = "DIR")]
    pub staging_dir: Option<PathBuf>,

    /// Compression level (0-9)
    #[arg(short = 'l', long, default_value_t = 6, value_parser = clap::value_parser!(u8).range(0..=9))]
    pub compression_level: u8,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Cli {
    /// Socket address to bind.
    pub const fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }

    /// Default log level; `RUST_LOG` takes precedence.
    pub const fn log_level(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::Debug
        } else if self.quiet {
            LevelFilter::Error
        } else {
            LevelFilter::Info
        }
    }

    pub fn share_config(&self) -> ShareConfig {
        let delete_policy = if self.stop_on_missing {
            DeletePolicy::StopOnMissing
        } else {
            DeletePolicy::ContinueOnMissing
        };
        let archive_mode = if self.stream_archives {
            ArchiveMode::Streamed
        } else {
            ArchiveMode::Staged
        };

        ShareConfig::new(&self.root)
            .with_delete_policy(delete_policy)
            .with_archive_mode(archive_mode)
            .with_keep_archives(self.keep_archives)
            .with_staging_dir(self.staging_dir.clone())
            .with_compression_level(self.compression_level)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_command_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["lanshare"]);
        assert_eq!(cli.root, PathBuf::from("."));
        assert_eq!(cli.addr(), "0.0.0.0:8000".parse::<SocketAddr>().unwrap());
        assert_eq!(cli.log_level(), LevelFilter::Info);

        let config = cli.share_config();
        assert_eq!(config.delete_policy, DeletePolicy::ContinueOnMissing);
        assert_eq!(config.archive_mode, ArchiveMode::Staged);
        assert!(!config.keep_archives);
        assert_eq!(config.staging_dir, None);
        assert_eq!(config.compression_level, 6);
    }

    #[test]
    fn test_all_options() {
        let cli = Cli::parse_from([
            "lanshare",
            "/srv/share",
            "--bind",
            "127.0.0.1",
            "-p",
            "9000",
            "--stop-on-missing",
            "--stream-archives",
            "--staging-dir",
            "/var/tmp",
            "-l",
            "9",
            "-v",
        ]);
        assert_eq!(cli.addr(), "127.0.0.1:9000".parse::<SocketAddr>().unwrap());
        assert_eq!(cli.log_level(), LevelFilter::Debug);

        let config = cli.share_config();
        assert_eq!(config.root, PathBuf::from("/srv/share"));
        assert_eq!(config.delete_policy, DeletePolicy::StopOnMissing);
        assert_eq!(config.archive_mode, ArchiveMode::Streamed);
        assert_eq!(config.staging_dir, Some(PathBuf::from("/var/tmp")));
        assert_eq!(config.compression_level, 9);
    }

    #[test]
    fn test_compression_level_range() {
        assert!(Cli::try_parse_from(["lanshare", "-l", "10"]).is_err());
        assert!(Cli::try_parse_from(["lanshare", "-l", "0"]).is_ok());
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        assert!(Cli::try_parse_from(["lanshare", "-v", "-q"]).is_err());
    }

    #[test]
    fn test_keep_archives_conflicts_with_streaming() {
        assert!(Cli::try_parse_from(["lanshare", "--keep-archives", "--stream-archives"]).is_err());
    }
}
