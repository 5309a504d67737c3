use anyhow::Context;
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Current Sightsprite version (read from Cargo.toml at compile time)
pub const SIGHTSPRITE_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const CONFIG_FILE: &str = "config.toml";

/// Environment variable that overrides the app home directory.
pub const HOME_ENV: &str = "SIGHTSPRITE_HOME";

/// Maximum number of categories the labeler maps to number keys.
pub const MAX_CATEGORIES: usize = 5;

/// Fallback frame rate when a source cannot report its own.
pub const FALLBACK_FPS: f64 = 30.0;

/// Where frames come from.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Spawn `camera.command` once per frame and decode its stdout.
    #[default]
    Command,
    /// Replay image files from `camera.directory`.
    Directory,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct CameraConfig {
    pub source: SourceKind,
    pub command: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub native_fps: Option<f64>,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            source: SourceKind::Command,
            command: default_camera_command(),
            directory: None,
            native_fps: None,
        }
    }
}

fn default_camera_command() -> Vec<String> {
    [
        "ffmpeg", "-loglevel", "error", "-f", "v4l2", "-i", "/dev/video0", "-frames:v", "1",
        "-f", "image2pipe", "-vcodec", "png", "-",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct SnapshotConfig {
    pub filename_stem: String,
    pub save_interval_secs: f64,
    pub duration_secs: f64,
    pub poll_interval_ms: u64,
    pub preview: bool,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            filename_stem: "image".to_string(),
            save_interval_secs: 60.0,
            duration_secs: 3600.0,
            poll_interval_ms: 100,
            preview: false,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct RecordConfig {
    pub fps: f64,
    pub duration_secs: f64,
}

impl Default for RecordConfig {
    fn default() -> Self {
        Self {
            fps: 30.0,
            duration_secs: 5.0,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct LabelingConfig {
    pub categories: Vec<String>,
    /// Relative paths are resolved against the app home.
    pub labels_csv: PathBuf,
    pub batch_size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewer_command: Option<Vec<String>>,
}

impl Default for LabelingConfig {
    fn default() -> Self {
        Self {
            categories: Vec::new(),
            labels_csv: PathBuf::from("labels.csv"),
            batch_size: 10,
            viewer_command: None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct SightspriteConfig {
    pub version: String,
    pub camera: CameraConfig,
    pub snapshots: SnapshotConfig,
    pub record: RecordConfig,
    pub labeling: LabelingConfig,
}

impl Default for SightspriteConfig {
    fn default() -> Self {
        Self {
            version: SIGHTSPRITE_VERSION.to_string(),
            camera: CameraConfig::default(),
            snapshots: SnapshotConfig::default(),
            record: RecordConfig::default(),
            labeling: LabelingConfig::default(),
        }
    }
}

/// Resolves the app home: `$SIGHTSPRITE_HOME`, else `$HOME/.sightsprite`.
pub fn app_home() -> PathBuf {
    if let Some(home) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
        return PathBuf::from(home);
    }
    let user_home = std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    user_home.join(".sightsprite")
}

impl SightspriteConfig {
    pub fn path(home: &Path) -> PathBuf {
        home.join(CONFIG_FILE)
    }

    pub fn save(&self, home: &Path) -> anyhow::Result<()> {
        fs::create_dir_all(home)
            .with_context(|| format!("failed to create app home {}", home.display()))?;
        let toml = toml::to_string_pretty(self)?;
        fs::write(Self::path(home), toml)?;
        Ok(())
    }

    /// Parses `config.toml` as it is on disk, without migrating. A missing
    /// file yields defaults.
    pub fn read(home: &Path) -> anyhow::Result<Self> {
        let config_path = Self::path(home);
        if !config_path.exists() {
            tracing::debug!(path = %config_path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("failed to read {}", config_path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("invalid config at {}", config_path.display()))
    }

    /// Loads `config.toml` from the app home.
    ///
    /// A missing file yields defaults. Missing fields fall back to their
    /// defaults, and a file written by an older version is migrated and
    /// saved back.
    pub fn load(home: &Path) -> anyhow::Result<Self> {
        let mut config = Self::read(home)?;

        if config.version != SIGHTSPRITE_VERSION {
            println!(
                "{}",
                format!(
                    "   🔄 Migrating configuration from version {} to {}...",
                    if config.version.is_empty() { "unknown" } else { config.version.as_str() },
                    SIGHTSPRITE_VERSION
                )
                .yellow()
            );
            config = Self::migrate(config);
            config.save(home)?;
            println!("{}", "   ✅ Configuration migrated".green());
        }

        Ok(config)
    }

    /// Brings an older config up to the current version.
    fn migrate(mut config: SightspriteConfig) -> SightspriteConfig {
        config.version = SIGHTSPRITE_VERSION.to_string();

        if config.camera.command.is_empty() {
            config.camera.command = default_camera_command();
        }
        if config.snapshots.filename_stem.trim().is_empty() {
            config.snapshots.filename_stem = SnapshotConfig::default().filename_stem;
        }
        if config.snapshots.poll_interval_ms == 0 {
            config.snapshots.poll_interval_ms = SnapshotConfig::default().poll_interval_ms;
        }
        if config.labeling.batch_size == 0 {
            config.labeling.batch_size = LabelingConfig::default().batch_size;
        }
        if config.labeling.labels_csv.as_os_str().is_empty() {
            config.labeling.labels_csv = LabelingConfig::default().labels_csv;
        }

        config
    }

    /// Labels CSV path with relative paths anchored at the app home.
    pub fn labels_csv(&self, home: &Path) -> PathBuf {
        if self.labeling.labels_csv.is_absolute() {
            self.labeling.labels_csv.clone()
        } else {
            home.join(&self.labeling.labels_csv)
        }
    }
}

/// Writes a fresh default config. Refuses to overwrite unless `force`.
pub fn run_init(home: &Path, force: bool) -> anyhow::Result<PathBuf> {
    let config_path = SightspriteConfig::path(home);
    if config_path.exists() && !force {
        anyhow::bail!(
            "A configuration already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }
    SightspriteConfig::default().save(home)?;
    Ok(config_path)
}

/// Splits a comma separated category list, dropping blanks.
pub fn parse_categories(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .map(|c| c.to_string())
        .collect()
}
