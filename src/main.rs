//! # Sightsprite
//!
//! Camera capture and dataset labeling from the terminal: take snapshots
//! on a schedule, record short clips, label images with number keys,
//! review the labels and sort the images into one folder per label.

use clap::Parser;
use colored::*;
use commands::{Cli, Commands};

// Modules
pub mod camera;
pub mod capture;
pub mod commands;
pub mod config;
pub mod files;
pub mod labeling;
pub mod labels;
pub mod logging;
pub mod sort;
pub mod stats;
pub mod ui;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = logging::init_logging(cli.log_level.as_deref()) {
        eprintln!("{} {e:#}", "⚠️  Logging disabled:".yellow());
    }

    if let Err(e) = run(cli) {
        eprintln!("\n{} {}", "❌ Error:".red().bold(), e);
        for cause in e.chain().skip(1) {
            eprintln!("   {} {}", "caused by:".red(), cause);
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let home = config::app_home();
    tracing::debug!(home = %home.display(), "app home");

    let Some(command) = cli.command else {
        ui::show_banner();
        ui::show_help();
        return Ok(());
    };

    match command {
        Commands::Init { force } => return commands::init::handle_init_command(&home, force),
        Commands::Doctor => {
            commands::doctor::handle_doctor_command(&home);
            return Ok(());
        }
        _ => {}
    }

    let config = config::SightspriteConfig::load(&home)?;

    match command {
        Commands::Init { .. } | Commands::Doctor => Ok(()),
        Commands::Stats => commands::stats::handle_stats_command(&home, &config),
        Commands::Snapshot { path, show } => {
            commands::capture::handle_snapshot(&home, &config, &path, show)
        }
        Commands::Snapshots { dir, stem, interval, duration, preview } => {
            commands::capture::handle_snapshots(
                &home,
                &config,
                commands::capture::SnapshotArgs { dir, stem, interval, duration, preview },
            )
        }
        Commands::Record { dir, fps, duration } => {
            commands::capture::handle_record(&home, &config, dir, fps, duration)
        }
        Commands::Label { image_dir, categories, labels } => {
            commands::label::handle_label(&home, &config, &image_dir, categories.as_deref(), labels)
        }
        Commands::Review { image_dir, categories, labels } => {
            commands::label::handle_review(&home, &config, &image_dir, categories.as_deref(), labels)
        }
        Commands::Sort { source_dir, output_dir, labels } => {
            commands::sort::handle_sort(&home, &config, &source_dir, &output_dir, labels)
        }
    }
}
