use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const STATS_FILE: &str = "stats.json";

#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SightspriteStats {
    pub snapshots_saved: u64,
    pub clips_recorded: u64,
    pub frames_recorded: u64,
    pub images_labeled: u64,
    pub images_sorted: u64,
}

impl SightspriteStats {
    pub fn load(home: &Path) -> Self {
        let stats_path = home.join(STATS_FILE);
        if let Ok(content) = fs::read_to_string(stats_path) {
            serde_json::from_str(&content).unwrap_or_default()
        } else {
            Self::default()
        }
    }

    pub fn save(&self, home: &Path) {
        let stats_path = home.join(STATS_FILE);
        if let Ok(content) = serde_json::to_string_pretty(self) {
            if let Err(e) = fs::create_dir_all(home).and_then(|_| fs::write(&stats_path, content)) {
                tracing::warn!(error = %e, path = %stats_path.display(), "failed to save stats");
            }
        }
    }

    /// Load, apply `update`, save.
    pub fn bump(home: &Path, update: impl FnOnce(&mut Self)) {
        let mut stats = Self::load(home);
        update(&mut stats);
        stats.save(home);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_or_corrupt_file_gives_defaults() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(SightspriteStats::load(tmp.path()), SightspriteStats::default());

        fs::write(tmp.path().join(STATS_FILE), "{ not json").unwrap();
        assert_eq!(SightspriteStats::load(tmp.path()), SightspriteStats::default());
    }

    #[test]
    fn test_save_creates_home() {
        let tmp = TempDir::new().unwrap();
        let home = tmp.path().join("fresh");
        SightspriteStats::bump(&home, |s| s.clips_recorded += 1);
        assert_eq!(SightspriteStats::load(&home).clips_recorded, 1);
    }

    #[test]
    fn test_bump_accumulates() {
        let tmp = TempDir::new().unwrap();
        SightspriteStats::bump(tmp.path(), |s| s.snapshots_saved += 3);
        SightspriteStats::bump(tmp.path(), |s| {
            s.snapshots_saved += 1;
            s.images_labeled += 2;
        });

        let stats = SightspriteStats::load(tmp.path());
        assert_eq!(stats.snapshots_saved, 4);
        assert_eq!(stats.images_labeled, 2);
        assert_eq!(stats.clips_recorded, 0);
    }
}
