use crate::config::{self, SightspriteConfig};
use colored::*;
use std::path::Path;

pub fn handle_init_command(home: &Path, force: bool) -> anyhow::Result<()> {
    println!("\n{}", "🚀 Sightsprite Init".bold().green());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("   🏠 App home: {}", home.display().to_string().cyan());

    let config_path = config::run_init(home, force)?;
    println!(
        "   ✅ Configuration created at: {}",
        config_path.display().to_string().cyan()
    );
    println!("\n   {} Next steps:", "💡".yellow());
    println!("      edit [camera] and [labeling] in {}", SightspriteConfig::path(home).display());
    println!("      sightsprite doctor                 # check the setup");
    println!("      sightsprite snapshots shots/       # collect images");
    println!("      sightsprite label shots/           # label them");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_fails_when_config_exists() {
        let tmp = TempDir::new().unwrap();
        handle_init_command(tmp.path(), false).unwrap();
        assert!(SightspriteConfig::path(tmp.path()).exists());

        let err = handle_init_command(tmp.path(), false).unwrap_err();
        assert!(err.to_string().contains("--force"), "{err}");
        assert!(handle_init_command(tmp.path(), true).is_ok());
    }
}
