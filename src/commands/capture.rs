use crate::camera;
use crate::capture::{self, RecordOptions, SnapshotOptions, SystemClock};
use crate::config::SightspriteConfig;
use crate::stats::SightspriteStats;
use crate::ui;
use anyhow::Context;
use colored::*;
use std::path::{Path, PathBuf};
use std::time::Duration;

const PREVIEW_FILE: &str = "preview.png";

fn open_camera(config: &SightspriteConfig) -> anyhow::Result<Box<dyn camera::FrameSource>> {
    let spinner = ui::spinner("   📷 Setting up camera... this may take a moment.");
    let source = camera::open_source(&config.camera);
    spinner.finish_and_clear();
    let source = source?;
    println!("   📷 Source: {}", source.describe().cyan());
    Ok(source)
}

pub fn handle_snapshot(
    home: &Path,
    config: &SightspriteConfig,
    path: &Path,
    show: bool,
) -> anyhow::Result<()> {
    println!("\n{}", format!("📸 Capturing to {}", path.display()).bold());
    let mut source = open_camera(config)?;
    let saved = capture::snapshot(source.as_mut(), path)?;
    println!("   ✅ Saved {}", saved.display().to_string().green());

    if show {
        match config.labeling.viewer_command.as_deref() {
            Some(viewer) if !viewer.is_empty() => ui::open_detached(viewer, &saved),
            _ => println!(
                "   ℹ️  Set labeling.viewer_command in {} to open images.",
                SightspriteConfig::path(home).display()
            ),
        }
    }

    SightspriteStats::bump(home, |s| s.snapshots_saved += 1);
    Ok(())
}

/// Non-negative seconds from the command line or config as a `Duration`.
fn seconds(name: &str, secs: f64) -> anyhow::Result<Duration> {
    if !(secs >= 0.0) {
        anyhow::bail!("{} must be non-negative seconds, got {}", name, secs);
    }
    Duration::try_from_secs_f64(secs)
        .with_context(|| format!("{} of {} seconds is out of range", name, secs))
}

pub struct SnapshotArgs {
    pub dir: PathBuf,
    pub stem: Option<String>,
    pub interval: Option<f64>,
    pub duration: Option<f64>,
    pub preview: bool,
}

/// Command line values win over the config file.
pub fn snapshot_options(
    home: &Path,
    config: &SightspriteConfig,
    args: SnapshotArgs,
) -> anyhow::Result<SnapshotOptions> {
    let defaults = &config.snapshots;
    let save_interval = seconds("interval", args.interval.unwrap_or(defaults.save_interval_secs))?;
    let duration = seconds("duration", args.duration.unwrap_or(defaults.duration_secs))?;

    Ok(SnapshotOptions {
        directory: args.dir,
        filename_stem: args.stem.unwrap_or_else(|| defaults.filename_stem.clone()),
        save_interval,
        duration,
        poll_interval: Duration::from_millis(defaults.poll_interval_ms.max(1)),
        preview: (args.preview || defaults.preview).then(|| home.join(PREVIEW_FILE)),
    })
}

pub fn handle_snapshots(
    home: &Path,
    config: &SightspriteConfig,
    args: SnapshotArgs,
) -> anyhow::Result<()> {
    let options = snapshot_options(home, config, args)?;
    println!("\n{}", "📸 Snapshot session".bold());
    let mut source = open_camera(config)?;
    if let Some(preview) = &options.preview {
        println!("   👀 Preview: {}", preview.display().to_string().cyan());
    }
    println!("{}", "   Press Ctrl-C to stop early.".dimmed());

    let stop = super::install_stop_flag();
    let report = capture::snapshots(source.as_mut(), &options, &SystemClock::new(), &stop)?;

    println!(
        "\n   ✅ Done. {} snapshots saved{}.",
        report.saved.len().to_string().green(),
        if report.failed_reads > 0 {
            format!(", {} frames could not be read", report.failed_reads)
        } else {
            String::new()
        }
    );
    let saved = report.saved.len() as u64;
    SightspriteStats::bump(home, |s| s.snapshots_saved += saved);
    Ok(())
}

pub fn handle_record(
    home: &Path,
    config: &SightspriteConfig,
    dir: PathBuf,
    fps: Option<f64>,
    duration: Option<f64>,
) -> anyhow::Result<()> {
    let fps = fps.unwrap_or(config.record.fps);
    let duration_secs = duration.unwrap_or(config.record.duration_secs);
    let duration = seconds("duration", duration_secs)?;

    println!(
        "\n{}",
        format!("🎬 Capturing {duration_secs} seconds of video at up to {fps} FPS...").bold()
    );
    let mut source = open_camera(config)?;
    let stop = super::install_stop_flag();
    let options = RecordOptions {
        directory: dir,
        fps,
        duration,
    };
    let report = capture::record(source.as_mut(), &options, &SystemClock::new(), &stop)?;

    if !report.complete() {
        println!(
            "{}",
            format!(
                "   ⚠️  Clip ended early: {} of {} frames.",
                report.manifest.frames, report.requested_frames
            )
            .yellow()
        );
    }
    let frames = report.manifest.frames;
    SightspriteStats::bump(home, |s| {
        s.clips_recorded += 1;
        s.frames_recorded += frames;
    });
    Ok(())
}
