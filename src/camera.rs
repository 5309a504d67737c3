//! # Frame sources
//!
//! Sightsprite does not link a native camera binding. A [`CommandCamera`]
//! runs an external grabber (ffmpeg by default) once per frame and decodes
//! the encoded image it writes to stdout. A [`DirectorySource`] replays
//! image files, which is how recorded sessions are re-run and how the
//! capture loops are exercised without hardware.

use crate::config::{CameraConfig, SourceKind};
use crate::files;
use anyhow::Context;
use chrono::{DateTime, Local};
use image::RgbImage;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// One decoded frame.
#[derive(Debug, Clone)]
pub struct Frame {
    pub image: RgbImage,
    pub captured_at: DateTime<Local>,
}

impl Frame {
    pub fn new(image: RgbImage) -> Self {
        Self {
            image,
            captured_at: Local::now(),
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

/// Anything that can hand out frames one at a time.
pub trait FrameSource {
    /// Reads the next frame. An error means this read failed; callers
    /// decide whether to retry.
    fn read_frame(&mut self) -> anyhow::Result<Frame>;

    /// Frame rate the device reports, if it knows one.
    fn native_fps(&self) -> Option<f64>;

    /// Short human readable description for status lines.
    fn describe(&self) -> String;
}

/// Spawns `program args...` per frame and decodes its stdout.
pub struct CommandCamera {
    program: String,
    args: Vec<String>,
    native_fps: Option<f64>,
    /// Frame grabbed while opening, handed out by the first read.
    warm_up: Option<Frame>,
}

impl CommandCamera {
    /// Builds the camera and grabs a first frame to prove the device opens.
    /// That frame is returned by the first `read_frame`.
    pub fn open(command: &[String], native_fps: Option<f64>) -> anyhow::Result<Self> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| anyhow::anyhow!("camera.command is empty"))?;

        let mut camera = Self {
            program: program.clone(),
            args: args.to_vec(),
            native_fps,
            warm_up: None,
        };
        let first = camera
            .grab()
            .with_context(|| format!("could not open camera via `{}`", camera.program))?;
        tracing::info!(
            program = %camera.program,
            width = first.image.width(),
            height = first.image.height(),
            "camera opened"
        );
        camera.warm_up = Some(first);
        Ok(camera)
    }

    /// Checks that the grabber program can be spawned at all.
    pub fn program_available(command: &[String]) -> bool {
        let Some(program) = command.first() else {
            return false;
        };
        Command::new(program)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok()
    }

    fn grab(&self) -> anyhow::Result<Frame> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("failed to run `{}`", self.program))?;

        if !output.status.success() || output.stdout.is_empty() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!(
                "could not capture image ({}): {}",
                output.status,
                stderr.trim()
            );
        }

        let image = image::load_from_memory(&output.stdout)
            .context("camera output is not a decodable image")?
            .to_rgb8();
        Ok(Frame::new(image))
    }
}

impl FrameSource for CommandCamera {
    fn read_frame(&mut self) -> anyhow::Result<Frame> {
        match self.warm_up.take() {
            Some(frame) => Ok(frame),
            None => self.grab(),
        }
    }

    fn native_fps(&self) -> Option<f64> {
        self.native_fps
    }

    fn describe(&self) -> String {
        format!("command `{}`", self.program)
    }
}

/// Cycles through the images of a directory, in name order.
pub struct DirectorySource {
    dir: PathBuf,
    paths: Vec<PathBuf>,
    index: usize,
    native_fps: Option<f64>,
}

impl DirectorySource {
    pub fn new(dir: &Path, native_fps: Option<f64>) -> anyhow::Result<Self> {
        let paths = files::list_images(dir)?;
        if paths.is_empty() {
            anyhow::bail!("could not open {}: no image files found", dir.display());
        }
        Ok(Self {
            dir: dir.to_path_buf(),
            paths,
            index: 0,
            native_fps,
        })
    }
}

impl FrameSource for DirectorySource {
    fn read_frame(&mut self) -> anyhow::Result<Frame> {
        if self.index >= self.paths.len() {
            self.index = 0;
        }
        let path = &self.paths[self.index];
        self.index += 1;

        let image = image::open(path)
            .with_context(|| format!("failed to decode {}", path.display()))?
            .to_rgb8();
        Ok(Frame::new(image))
    }

    fn native_fps(&self) -> Option<f64> {
        self.native_fps
    }

    fn describe(&self) -> String {
        format!("directory {} ({} images)", self.dir.display(), self.paths.len())
    }
}

/// Opens the source selected in the config.
pub fn open_source(config: &CameraConfig) -> anyhow::Result<Box<dyn FrameSource>> {
    match config.source {
        SourceKind::Command => {
            let camera = CommandCamera::open(&config.command, config.native_fps)?;
            Ok(Box::new(camera))
        }
        SourceKind::Directory => {
            let dir = config
                .directory
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("camera.directory must be set for the directory source"))?;
            Ok(Box::new(DirectorySource::new(dir, config.native_fps)?))
        }
    }
}
