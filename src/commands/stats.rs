use crate::config::SightspriteConfig;
use crate::labels::LabelStore;
use crate::stats::SightspriteStats;
use colored::*;
use std::path::Path;

pub fn handle_stats_command(home: &Path, config: &SightspriteConfig) -> anyhow::Result<()> {
    let s = SightspriteStats::load(home);

    println!("\n{}", "📊 SIGHTSPRITE DASHBOARD".bright_green().bold());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("📸 Snapshots saved:  {}", s.snapshots_saved.to_string().cyan());
    println!(
        "🎬 Clips recorded:   {} ({} frames)",
        s.clips_recorded.to_string().cyan(),
        s.frames_recorded
    );
    println!("🏷️  Images labeled:   {}", s.images_labeled.to_string().cyan());
    println!("🗂️  Images sorted:    {}", s.images_sorted.to_string().cyan());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let store = LabelStore::open(&config.labels_csv(home))?;
    let records = store.read_all()?;
    if records.is_empty() {
        println!("   No labels yet in {}", store.path().display());
    } else {
        super::label::print_distribution(&records);
    }
    Ok(())
}
