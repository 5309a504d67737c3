//! # Capture
//!
//! Turns a [`FrameSource`] into files on disk: a single snapshot, a timed
//! series of snapshots, or a short clip stored as numbered PNG frames.
//!
//! The loops take a [`Clock`] and a stop flag so they can be driven by a
//! manual clock in tests and interrupted with Ctrl-C in the CLI.

use crate::camera::FrameSource;
use crate::config::FALLBACK_FPS;
use anyhow::Context;
use chrono::{DateTime, Local};
use colored::*;
use image::{Rgb, RgbImage};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

pub const CLIP_MANIFEST: &str = "clip.toml";

const MARKER_CENTER: (i64, i64) = (30, 30);
const MARKER_RADIUS: i64 = 25;
const MARKER_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// Time as seen by the capture loops.
pub trait Clock {
    /// Time elapsed since the clock was created.
    fn elapsed(&self) -> Duration;
    /// Wall-clock time, used for file names.
    fn wall_time(&self) -> DateTime<Local>;
    fn sleep(&self, duration: Duration);
}

pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    fn wall_time(&self) -> DateTime<Local> {
        Local::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// `<stem>_<MM_DD_HH_MM_SS_mmm>.png`
pub fn snapshot_filename(stem: &str, time: DateTime<Local>) -> String {
    format!("{}_{}.png", stem, time.format("%m_%d_%H_%M_%S_%3f"))
}

/// Decides when the snapshot loop saves and when it stops.
///
/// The first poll is always due. After a save the next one is due a full
/// interval after that poll, so slow reads push the schedule back rather
/// than causing bursts.
#[derive(Debug, Clone)]
pub struct SnapshotSchedule {
    save_interval: Duration,
    duration: Duration,
    next_due: Duration,
}

impl SnapshotSchedule {
    pub fn new(save_interval: Duration, duration: Duration) -> Self {
        Self {
            save_interval,
            duration,
            next_due: Duration::ZERO,
        }
    }

    pub fn finished(&self, elapsed: Duration) -> bool {
        elapsed > self.duration
    }

    /// Returns true (and reschedules) when a frame seen at `elapsed`
    /// should be saved.
    pub fn take_due(&mut self, elapsed: Duration) -> bool {
        if elapsed >= self.next_due {
            self.next_due = elapsed + self.save_interval;
            true
        } else {
            false
        }
    }
}

/// Draws the filled red dot that flags a saved frame in the preview.
pub fn draw_capture_marker(image: &mut RgbImage) {
    let (width, height) = image.dimensions();
    let (cx, cy) = MARKER_CENTER;
    let r2 = MARKER_RADIUS * MARKER_RADIUS;

    for y in (cy - MARKER_RADIUS).max(0)..=(cy + MARKER_RADIUS).min(height as i64 - 1) {
        for x in (cx - MARKER_RADIUS).max(0)..=(cx + MARKER_RADIUS).min(width as i64 - 1) {
            let (dx, dy) = (x - cx, y - cy);
            if dx * dx + dy * dy <= r2 {
                image.put_pixel(x as u32, y as u32, MARKER_COLOR);
            }
        }
    }
}

/// Captures one frame and writes it to `path`. The format follows the
/// extension.
pub fn snapshot(source: &mut dyn FrameSource, path: &Path) -> anyhow::Result<PathBuf> {
    let frame = source.read_frame().context("could not capture image")?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    frame
        .image
        .save(path)
        .with_context(|| format!("failed to write {}", path.display()))?;

    tracing::info!(
        path = %path.display(),
        captured_at = %frame.captured_at.to_rfc3339(),
        "snapshot saved"
    );
    Ok(path.to_path_buf())
}

#[derive(Debug, Clone)]
pub struct SnapshotOptions {
    pub directory: PathBuf,
    pub filename_stem: String,
    pub save_interval: Duration,
    pub duration: Duration,
    pub poll_interval: Duration,
    /// Where the latest displayed frame is written, if anywhere.
    pub preview: Option<PathBuf>,
}

#[derive(Debug, Default)]
pub struct SnapshotReport {
    pub saved: Vec<PathBuf>,
    pub failed_reads: usize,
    pub interrupted: bool,
}

/// Saves a frame every `save_interval` until `duration` has passed.
///
/// A failed read is reported and the loop keeps going. Frames between
/// saves are only used for the preview.
pub fn snapshots(
    source: &mut dyn FrameSource,
    options: &SnapshotOptions,
    clock: &dyn Clock,
    stop: &AtomicBool,
) -> anyhow::Result<SnapshotReport> {
    fs::create_dir_all(&options.directory).with_context(|| {
        format!("failed to create {}", options.directory.display())
    })?;
    if let Some(parent) = options
        .preview
        .as_deref()
        .and_then(Path::parent)
        .filter(|p| !p.as_os_str().is_empty())
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    println!(
        "   📁 Saving snapshots to {}",
        options.directory.display().to_string().cyan()
    );
    println!(
        "   ⏱️  Saving every {:.1}s for {:.1}s",
        options.save_interval.as_secs_f64(),
        options.duration.as_secs_f64()
    );

    let mut schedule = SnapshotSchedule::new(options.save_interval, options.duration);
    let mut report = SnapshotReport::default();

    loop {
        if stop.load(Ordering::SeqCst) {
            println!("{}", "   ⏹️  Interrupted by user.".yellow());
            report.interrupted = true;
            break;
        }

        let elapsed = clock.elapsed();
        if schedule.finished(elapsed) {
            break;
        }

        let frame = match source.read_frame() {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read frame");
                report.failed_reads += 1;
                clock.sleep(options.poll_interval);
                continue;
            }
        };

        let saved_now = schedule.take_due(elapsed);
        if saved_now {
            let path = options
                .directory
                .join(snapshot_filename(&options.filename_stem, clock.wall_time()));
            frame
                .image
                .save(&path)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!(
                "\t[{}] Saved: {}",
                report.saved.len(),
                crate::files::file_name_of(&path).green()
            );
            tracing::debug!(path = %path.display(), "snapshot saved");
            report.saved.push(path);
        }

        if let Some(preview) = &options.preview {
            let mut display = frame.image;
            if saved_now {
                draw_capture_marker(&mut display);
            }
            if let Err(e) = display.save(preview) {
                tracing::warn!(error = %e, path = %preview.display(), "failed to update preview");
            }
        }

        clock.sleep(options.poll_interval);
    }

    tracing::info!(
        saved = report.saved.len(),
        failed_reads = report.failed_reads,
        "snapshot session finished"
    );
    Ok(report)
}

/// Frame rate actually used for a clip: the requested rate capped by what
/// the source reports, with a 30 fps fallback when it reports nothing.
pub fn effective_fps(requested: f64, native: Option<f64>) -> f64 {
    let native = native
        .filter(|fps| fps.is_finite() && *fps > 0.0)
        .unwrap_or(FALLBACK_FPS);
    requested.min(native)
}

pub fn total_frames(fps: f64, duration: Duration) -> u64 {
    (fps * duration.as_secs_f64()).floor() as u64
}

#[derive(Debug, Clone)]
pub struct RecordOptions {
    pub directory: PathBuf,
    pub fps: f64,
    pub duration: Duration,
}

/// Written next to the frames of every clip.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ClipManifest {
    pub fps: f64,
    pub width: u32,
    pub height: u32,
    pub frames: u64,
    pub started_at: String,
}

#[derive(Debug)]
pub struct ClipReport {
    pub directory: PathBuf,
    pub manifest: ClipManifest,
    pub requested_frames: u64,
}

impl ClipReport {
    pub fn complete(&self) -> bool {
        self.manifest.frames == self.requested_frames
    }
}

/// Records `duration` worth of frames into `<directory>/clip_<timestamp>/`.
///
/// Stops early on the first failed read or on the stop flag; the frames
/// written so far are kept and the manifest reflects them.
pub fn record(
    source: &mut dyn FrameSource,
    options: &RecordOptions,
    clock: &dyn Clock,
    stop: &AtomicBool,
) -> anyhow::Result<ClipReport> {
    if !(options.fps > 0.0) {
        anyhow::bail!("fps must be positive, got {}", options.fps);
    }

    let native = source.native_fps();
    let fps = effective_fps(options.fps, native);
    let period = Duration::try_from_secs_f64(1.0 / fps)
        .with_context(|| format!("fps {} is too low to record", fps))?;
    println!(
        "   🎞️  Using {:.2} FPS (source supports {:.2})",
        fps,
        native.unwrap_or(FALLBACK_FPS)
    );

    let requested_frames = total_frames(fps, options.duration);
    let started = clock.wall_time();
    let clip_dir = options
        .directory
        .join(format!("clip_{}", started.format("%Y%m%d_%H%M%S")));
    fs::create_dir_all(&clip_dir)
        .with_context(|| format!("failed to create {}", clip_dir.display()))?;

    println!("   Capturing {} frames...", requested_frames);
    let mut manifest = ClipManifest {
        fps,
        width: 0,
        height: 0,
        frames: 0,
        started_at: started.to_rfc3339(),
    };

    let progress = crate::ui::progress_bar(requested_frames, "recording");
    while manifest.frames < requested_frames {
        if stop.load(Ordering::SeqCst) {
            progress.println("   ⏹️  Interrupted by user.");
            break;
        }

        let frame = match source.read_frame() {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!(error = %e, "failed to read frame, ending clip");
                break;
            }
        };
        if manifest.frames == 0 {
            let (width, height) = frame.dimensions();
            manifest.width = width;
            manifest.height = height;
            tracing::info!(width, height, "clip resolution");
        }

        let path = clip_dir.join(format!("frame_{:05}.png", manifest.frames));
        frame
            .image
            .save(&path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        manifest.frames += 1;
        progress.inc(1);

        clock.sleep(period);
    }
    progress.finish_and_clear();

    fs::write(clip_dir.join(CLIP_MANIFEST), toml::to_string_pretty(&manifest)?)?;
    println!(
        "   ✅ Clip saved to {}",
        clip_dir.display().to_string().cyan()
    );

    Ok(ClipReport {
        directory: clip_dir,
        manifest,
        requested_frames,
    })
}
