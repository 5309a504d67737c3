pub mod capture;
pub mod doctor;
pub mod init;
pub mod label;
pub mod sort;
pub mod stats;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Parser)]
#[command(name = "sightsprite", version)]
#[command(about = "Capture, label and sort camera images into training datasets", long_about = None)]
pub struct Cli {
    /// Log level for diagnostics on stderr (RUST_LOG overrides)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default config.toml into the app home
    Init {
        /// Overwrite an existing configuration
        #[arg(long)]
        force: bool,
    },
    /// Check configuration, camera and label file
    Doctor,
    /// Show capture and labeling counters
    Stats,
    /// Capture a single image
    Snapshot {
        /// Output file, including extension
        path: PathBuf,
        /// Open the image in the configured viewer afterwards
        #[arg(long)]
        show: bool,
    },
    /// Capture images on a fixed interval
    Snapshots {
        /// Directory to save images into
        dir: PathBuf,
        /// File name prefix
        #[arg(long)]
        stem: Option<String>,
        /// Seconds between saved images
        #[arg(long)]
        interval: Option<f64>,
        /// Total seconds to run
        #[arg(long)]
        duration: Option<f64>,
        /// Keep <app home>/preview.png updated with the latest frame
        #[arg(long)]
        preview: bool,
    },
    /// Record a short clip as numbered frames
    Record {
        /// Directory the clip folder is created in
        dir: PathBuf,
        /// Requested frames per second (capped by the source)
        #[arg(long)]
        fps: Option<f64>,
        /// Seconds to record
        #[arg(long)]
        duration: Option<f64>,
    },
    /// Label images with number keys
    Label {
        /// Directory with the images to label
        image_dir: PathBuf,
        /// Comma separated categories, at most 5 (e.g. dog,cat)
        #[arg(long)]
        categories: Option<String>,
        /// Labels CSV (defaults to the configured one)
        #[arg(long)]
        labels: Option<PathBuf>,
    },
    /// Review saved labels: relabel or delete
    Review {
        /// Directory with the labeled images
        image_dir: PathBuf,
        /// Comma separated categories, at most 5
        #[arg(long)]
        categories: Option<String>,
        /// Labels CSV (defaults to the configured one)
        #[arg(long)]
        labels: Option<PathBuf>,
    },
    /// Copy labeled images into one folder per label
    Sort {
        /// Directory with the labeled images
        source_dir: PathBuf,
        /// Directory the label folders are created in
        output_dir: PathBuf,
        /// Labels CSV (defaults to the configured one)
        #[arg(long)]
        labels: Option<PathBuf>,
    },
}

/// Flag raised by Ctrl-C while a capture loop runs. A second Ctrl-C exits
/// immediately.
pub fn install_stop_flag() -> Arc<AtomicBool> {
    let stop = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&stop);

    std::thread::spawn(move || {
        let rt = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(rt) => rt,
            Err(e) => {
                tracing::warn!(error = %e, "Ctrl-C handling unavailable");
                return;
            }
        };
        rt.block_on(async {
            while tokio::signal::ctrl_c().await.is_ok() {
                if flag.swap(true, Ordering::SeqCst) {
                    std::process::exit(130);
                }
            }
        });
    });

    stop
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_snapshots_overrides() {
        let cli = Cli::parse_from([
            "sightsprite", "snapshots", "shots", "--stem", "night2", "--interval", "5",
            "--duration", "60", "--preview",
        ]);
        match cli.command {
            Some(Commands::Snapshots { dir, stem, interval, duration, preview }) => {
                assert_eq!(dir, PathBuf::from("shots"));
                assert_eq!(stem.as_deref(), Some("night2"));
                assert_eq!(interval, Some(5.0));
                assert_eq!(duration, Some(60.0));
                assert!(preview);
            }
            _ => panic!("expected snapshots command"),
        }
    }

    #[test]
    fn test_parse_global_log_level_after_subcommand() {
        let cli = Cli::parse_from(["sightsprite", "sort", "a", "b", "--log-level", "debug"]);
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert!(matches!(cli.command, Some(Commands::Sort { .. })));
    }
}
