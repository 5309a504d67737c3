use crate::config::SightspriteConfig;
use crate::sort::sort_images_by_label;
use crate::stats::SightspriteStats;
use colored::*;
use std::path::{Path, PathBuf};

pub fn handle_sort(
    home: &Path,
    config: &SightspriteConfig,
    source_dir: &Path,
    output_dir: &Path,
    labels: Option<PathBuf>,
) -> anyhow::Result<()> {
    let labels_file = labels.unwrap_or_else(|| config.labels_csv(home));

    println!(
        "\n{} {} → {}",
        "🗂️  Sorting images".bold(),
        source_dir.display(),
        output_dir.display()
    );
    println!("   Using labels in {}", labels_file.display().to_string().cyan());

    let report = sort_images_by_label(&labels_file, source_dir, output_dir)?;
    for (label, count) in &report.per_label {
        println!("   📁 {:<20} {}", label.yellow(), count);
    }
    println!(
        "   ✅ Sorting done. {} images copied. Check {} for results.",
        report.total().to_string().green(),
        output_dir.display()
    );

    let sorted = report.total() as u64;
    SightspriteStats::bump(home, |s| s.images_sorted += sorted);
    Ok(())
}
