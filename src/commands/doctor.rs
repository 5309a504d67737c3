use crate::camera::CommandCamera;
use crate::config::{MAX_CATEGORIES, SIGHTSPRITE_VERSION, SightspriteConfig, SourceKind};
use crate::files;
use crate::labels::LabelStore;
use colored::Colorize;
use std::path::Path;

/// Check that config.toml (if present) parses. The file is never migrated
/// or rewritten here.
pub fn check_config(home: &Path) -> anyhow::Result<SightspriteConfig> {
    SightspriteConfig::read(home)
}

/// Version the config was written by, when it differs from this build
pub fn outdated_version(config: &SightspriteConfig) -> Option<&str> {
    (config.version != SIGHTSPRITE_VERSION).then_some(config.version.as_str())
}

/// Check that the app home can be created and written to
pub fn check_home_writable(home: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(home)?;
    let probe = home.join(".doctor_probe");
    std::fs::write(&probe, b"ok")?;
    std::fs::remove_file(&probe)?;
    Ok(())
}

/// Check that the configured frame source can work, returning a short
/// description of what was found
pub fn check_camera(config: &SightspriteConfig) -> anyhow::Result<String> {
    match config.camera.source {
        SourceKind::Command => {
            let program = config
                .camera
                .command
                .first()
                .ok_or_else(|| anyhow::anyhow!("camera.command is empty"))?;
            if !CommandCamera::program_available(&config.camera.command) {
                anyhow::bail!("`{}` could not be started", program);
            }
            Ok(format!("command `{}`", program))
        }
        SourceKind::Directory => {
            let dir = config
                .camera
                .directory
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("camera.directory is not set"))?;
            let count = files::list_images(dir)?.len();
            if count == 0 {
                anyhow::bail!("no images in {}", dir.display());
            }
            Ok(format!("directory {} ({} images)", dir.display(), count))
        }
    }
}

/// Check the category list against the number-key limit
pub fn check_categories(config: &SightspriteConfig) -> anyhow::Result<usize> {
    let count = config.labeling.categories.len();
    if count > MAX_CATEGORIES {
        anyhow::bail!("{} categories configured, at most {} supported", count, MAX_CATEGORIES);
    }
    Ok(count)
}

/// Check the labels CSV, returning the row count (None when absent)
pub fn check_labels(path: &Path) -> anyhow::Result<Option<usize>> {
    let store = LabelStore::open(path)?;
    if !store.exists() {
        return Ok(None);
    }
    Ok(Some(store.read_all()?.len()))
}

/// Main handler for the doctor command with colored output
pub fn handle_doctor_command(home: &Path) {
    println!("\n{}", "🏥 Sightsprite Doctor".bold().cyan());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let mut issues = 0;

    // Check 1: Config file
    print!("   ");
    let config = match check_config(home) {
        Ok(config) => {
            println!("{} Config file", "✅".green());
            println!("      └─ {}", SightspriteConfig::path(home).display().to_string().cyan());
            if let Some(version) = outdated_version(&config) {
                println!(
                    "      └─ {}",
                    format!(
                        "Written by version {}; it will be migrated on the next run",
                        if version.is_empty() { "unknown" } else { version }
                    )
                    .yellow()
                );
            }
            config
        }
        Err(e) => {
            println!("{} Config file", "❌".red());
            println!("      └─ Error: {}", e.to_string().red());
            issues += 1;
            SightspriteConfig::default()
        }
    };

    // Check 2: App home
    print!("   ");
    match check_home_writable(home) {
        Ok(()) => println!("{} App home writable", "✅".green()),
        Err(e) => {
            println!("{} App home writable", "❌".red());
            println!("      └─ {}", e.to_string().red());
            issues += 1;
        }
    }

    // Check 3: Camera
    print!("   ");
    match check_camera(&config) {
        Ok(found) => {
            println!("{} Camera", "✅".green());
            println!("      └─ {}", found.cyan());
        }
        Err(e) => {
            println!("{} Camera", "❌".red());
            println!("      └─ {}", e.to_string().red());
            issues += 1;
        }
    }

    // Check 4: Categories
    print!("   ");
    match check_categories(&config) {
        Ok(0) => {
            println!("{} Categories", "⚠️ ".yellow());
            println!("      └─ {}", "None configured; pass --categories when labeling".yellow());
        }
        Ok(_) => {
            println!("{} Categories", "✅".green());
            println!("      └─ {}", config.labeling.categories.join(", ").cyan());
        }
        Err(e) => {
            println!("{} Categories", "❌".red());
            println!("      └─ {}", e.to_string().red());
            issues += 1;
        }
    }

    // Check 5: Labels CSV
    print!("   ");
    let labels_path = config.labels_csv(home);
    match check_labels(&labels_path) {
        Ok(Some(rows)) => {
            println!("{} Labels file", "✅".green());
            println!("      └─ {} rows in {}", rows.to_string().cyan(), labels_path.display());
        }
        Ok(None) => {
            println!("{} Labels file", "⚠️ ".yellow());
            println!("      └─ {}", "Not created yet; run 'sightsprite label <dir>'".yellow());
        }
        Err(e) => {
            println!("{} Labels file", "❌".red());
            println!("      └─ {}", e.to_string().red());
            issues += 1;
        }
    }

    // Summary
    println!();
    if issues == 0 {
        println!("{}", "✅ All critical checks passed!".green().bold());
    } else if issues == 1 {
        println!("{}", format!("⚠️  {} critical issue found", issues).yellow().bold());
    } else {
        println!("{}", format!("⚠️  {} critical issues found", issues).yellow().bold());
    }

    println!();

    // Exit with error code if issues > 0
    if issues > 0 {
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_check_config_ok_without_file() {
        let tmp = TempDir::new().unwrap();
        assert!(check_config(tmp.path()).is_ok());
    }

    #[test]
    fn test_check_config_does_not_migrate() {
        let tmp = TempDir::new().unwrap();
        let path = SightspriteConfig::path(tmp.path());
        let original = "version = \"0.0.1\"\n[labeling]\nbatch_size = 0\n";
        std::fs::write(&path, original).unwrap();

        let config = check_config(tmp.path()).unwrap();
        assert_eq!(outdated_version(&config), Some("0.0.1"));
        assert_eq!(config.labeling.batch_size, 0);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), original);

        assert_eq!(outdated_version(&SightspriteConfig::default()), None);
    }

    #[test]
    fn test_check_config_err_when_invalid() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(SightspriteConfig::path(tmp.path()), "labeling = 3").unwrap();
        assert!(check_config(tmp.path()).is_err());
    }

    #[test]
    fn test_check_home_writable_creates_dir() {
        let tmp = TempDir::new().unwrap();
        let home = tmp.path().join("home");
        check_home_writable(&home).unwrap();
        assert!(home.is_dir());
        assert!(!home.join(".doctor_probe").exists(), "probe file is cleaned up");
    }

    #[test]
    fn test_check_camera_directory_source() {
        let tmp = TempDir::new().unwrap();
        let mut config = SightspriteConfig::default();
        config.camera.source = SourceKind::Directory;
        assert!(check_camera(&config).is_err(), "directory must be set");

        config.camera.directory = Some(tmp.path().to_path_buf());
        assert!(check_camera(&config).is_err(), "empty directory");

        std::fs::write(tmp.path().join("a.png"), "").unwrap();
        assert!(check_camera(&config).unwrap().contains("1 images"));
    }

    #[test]
    fn test_check_camera_missing_program() {
        let mut config = SightspriteConfig::default();
        config.camera.command = vec!["definitely-not-a-real-grabber-binary".to_string()];
        assert!(check_camera(&config).is_err());
    }

    #[test]
    fn test_check_categories_limit() {
        let mut config = SightspriteConfig::default();
        assert_eq!(check_categories(&config).unwrap(), 0);
        config.labeling.categories = (0..6).map(|i| format!("c{i}")).collect();
        assert!(check_categories(&config).is_err());
    }

    #[test]
    fn test_check_labels_absent_and_present() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("labels.csv");
        assert_eq!(check_labels(&path).unwrap(), None);

        std::fs::write(&path, "filename,label\na.png,dog\n").unwrap();
        assert_eq!(check_labels(&path).unwrap(), Some(1));

        std::fs::write(&path, "name\na.png\n").unwrap();
        assert!(check_labels(&path).is_err());
    }
}
