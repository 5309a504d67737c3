use crate::config::{SightspriteConfig, parse_categories};
use crate::labeling::{LabelSession, LabelStep, ReviewSession, ReviewStep};
use crate::labels::{self, LabelStore};
use crate::stats::SightspriteStats;
use crate::ui::{self, ImageViewer};
use colored::*;
use console::Term;
use dialoguer::{Input, theme::ColorfulTheme};
use std::path::{Path, PathBuf};

/// Categories from the command line, else the config, else asked for.
pub fn resolve_categories(
    config: &SightspriteConfig,
    cli: Option<&str>,
) -> anyhow::Result<Vec<String>> {
    if let Some(raw) = cli {
        return Ok(parse_categories(raw));
    }
    if !config.labeling.categories.is_empty() {
        return Ok(config.labeling.categories.clone());
    }

    let raw: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("Categories (comma separated, up to 5)")
        .interact_text()?;
    Ok(parse_categories(&raw))
}

fn labels_path(home: &Path, config: &SightspriteConfig, cli: Option<PathBuf>) -> PathBuf {
    cli.unwrap_or_else(|| config.labels_csv(home))
}

pub fn handle_label(
    home: &Path,
    config: &SightspriteConfig,
    image_dir: &Path,
    categories: Option<&str>,
    labels: Option<PathBuf>,
) -> anyhow::Result<()> {
    let categories = resolve_categories(config, categories)?;
    let store = LabelStore::open(&labels_path(home, config, labels))?;
    let mut session =
        LabelSession::new(image_dir, categories, store, config.labeling.batch_size)?;

    if session.total() == 0 {
        println!("{}", "   ℹ️  No valid images found or all images labeled.".yellow());
        return Ok(());
    }

    ui::section("🏷️  Image Labeling Tool");
    let term = Term::stdout();
    let mut viewer = ImageViewer::new(config.labeling.viewer_command.as_deref());
    let mut redraw = true;

    while let Some(path) = session.current().map(Path::to_path_buf) {
        if redraw {
            let size = match ui::image_size(&path) {
                Ok((w, h)) => format!("{w}x{h}"),
                Err(e) => {
                    println!(
                        "{}",
                        format!("   ❌ Failed to load {}: {e}", path.display()).red()
                    );
                    if session.skip_unreadable() {
                        continue;
                    }
                    break;
                }
            };
            if let Some(viewer) = viewer.as_mut() {
                viewer.show(&path);
            }
            if let Some(lines) = session.prompt() {
                ui::print_prompt(&lines, Some(&size));
            }
        }

        let step = session.handle_key(ui::read_key(&term));
        redraw = true;
        match &step {
            LabelStep::Labeled { filename, label } => {
                println!("   ✅ Labeled: {} -> {}", filename, label.green());
            }
            LabelStep::Skipped { filename } => println!("   ⏭️  Skipped: {filename}"),
            LabelStep::Ignored(key) => {
                println!("{}", format!("   Ignored key: {key:?}").dimmed());
                redraw = false;
            }
            LabelStep::Quit => {}
            LabelStep::Finished => {
                println!("{}", "   🎉 Finished labeling all images.".green().bold());
            }
        }
        if step.is_terminal() {
            break;
        }
    }

    let labeled = session.labeled_count() as u64;
    SightspriteStats::bump(home, |s| s.images_labeled += labeled);
    Ok(())
}

pub fn print_distribution(records: &[labels::LabelRecord]) {
    println!("   Label distribution:");
    for (label, count) in labels::distribution(records) {
        println!("   {:<20} {}", label.yellow(), count.to_string().cyan());
    }
}

pub fn handle_review(
    home: &Path,
    config: &SightspriteConfig,
    image_dir: &Path,
    categories: Option<&str>,
    labels: Option<PathBuf>,
) -> anyhow::Result<()> {
    let categories = resolve_categories(config, categories)?;
    let store = LabelStore::open(&labels_path(home, config, labels))?;
    let Some(mut session) = ReviewSession::open(store, categories)? else {
        return Ok(());
    };

    ui::section("🔍 Label Review Tool");
    print_distribution(session.records());

    let term = Term::stdout();
    let mut viewer = ImageViewer::new(config.labeling.viewer_command.as_deref());
    let mut redraw = true;

    loop {
        let Some(record) = session.current() else {
            break;
        };
        let path = image_dir.join(&record.filename);

        if redraw {
            let size = match ui::image_size(&path) {
                Ok((w, h)) => format!("{w}x{h}"),
                Err(e) => {
                    println!(
                        "{}",
                        format!("   ❌ Failed to load {}: {e}", record.filename).red()
                    );
                    if session.skip_unreadable() {
                        continue;
                    }
                    println!("   No more labeled images to review.");
                    break;
                }
            };
            if let Some(viewer) = viewer.as_mut() {
                viewer.show(&path);
            }
            if let Some(lines) = session.prompt() {
                ui::print_prompt(&lines, Some(&size));
            }
        }

        let step = session.handle_key(ui::read_key(&term))?;
        redraw = true;
        match &step {
            ReviewStep::Moved => {}
            ReviewStep::Relabeled { filename, to, .. } => {
                println!("   ✏️  Relabeling {} to {}", filename, to.green());
            }
            ReviewStep::Unchanged { filename, label } => {
                println!("   No change: {filename} remains labeled as {label}");
            }
            ReviewStep::Deleted { filename } => {
                println!("   🗑️  Removing label for {filename}");
            }
            ReviewStep::Ignored(key) => {
                println!("{}", format!("   Ignored key: {key:?}").dimmed());
                redraw = false;
            }
            ReviewStep::Quit => println!("   Quitting review."),
            ReviewStep::Finished => println!("   No more labeled images to review."),
        }
        if step.is_terminal() {
            break;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_categories_take_precedence() {
        let mut config = SightspriteConfig::default();
        config.labeling.categories = vec!["night".to_string()];
        assert_eq!(
            resolve_categories(&config, Some("dog, cat")).unwrap(),
            vec!["dog", "cat"]
        );
        assert_eq!(resolve_categories(&config, None).unwrap(), vec!["night"]);
    }

    #[test]
    fn test_labels_path_prefers_cli() {
        let config = SightspriteConfig::default();
        let home = Path::new("/home/user/.sightsprite");
        assert_eq!(labels_path(home, &config, None), home.join("labels.csv"));
        assert_eq!(
            labels_path(home, &config, Some(PathBuf::from("mine.csv"))),
            PathBuf::from("mine.csv")
        );
    }
}
