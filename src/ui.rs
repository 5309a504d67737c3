//! Terminal interaction helpers: banner, progress indicators, key input
//! and the optional external image viewer.

use crate::labeling::Key;
use colored::*;
use console::Term;
use std::path::Path;
use std::process::{Child, Command, Stdio};

/// Prints the Sightsprite banner at program start.
pub fn show_banner() {
    println!();
    println!(
        "{}",
        "╔═══════════════════════════════════════════════╗".bright_cyan()
    );
    println!(
        "{}",
        "        👁️  sightsprite · camera dataset kit".bright_white().bold()
    );
    println!(
        "{}",
        "╚═══════════════════════════════════════════════╝".bright_cyan()
    );
}

pub fn section(title: &str) {
    println!("\n{}", title.bold().cyan());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}

pub fn spinner(message: &str) -> indicatif::ProgressBar {
    let pb = indicatif::ProgressBar::new_spinner();
    pb.set_style(
        indicatif::ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

pub fn progress_bar(len: u64, message: &str) -> indicatif::ProgressBar {
    let pb = indicatif::ProgressBar::new(len);
    pb.set_style(
        indicatif::ProgressStyle::default_bar()
            .template("{spinner:.green} {msg} [{bar:30.cyan/blue}] {pos}/{len}")
            .unwrap()
            .progress_chars("=> "),
    );
    pb.set_message(message.to_string());
    pb
}

/// Prints the three prompt lines of a labeling or review session.
pub fn print_prompt(lines: &[String; 3], detail: Option<&str>) {
    println!();
    match detail {
        Some(detail) => println!("🖼️  {}  {}", lines[0].bold(), detail.dimmed()),
        None => println!("🖼️  {}", lines[0].bold()),
    }
    println!("   {}", lines[1].cyan());
    println!("   {}", lines[2].dimmed());
}

/// Blocks for one keypress. Ctrl-C and read errors come back as `q` so
/// sessions always get a chance to save.
pub fn read_key(term: &Term) -> Key {
    match term.read_key() {
        Ok(console::Key::Char('\u{3}')) | Ok(console::Key::Escape) => Key::Char('q'),
        Ok(console::Key::Char(c)) => Key::Char(c.to_ascii_lowercase()),
        Ok(console::Key::ArrowLeft) => Key::Left,
        Ok(console::Key::ArrowRight) => Key::Right,
        Ok(_) => Key::Other,
        Err(e) => {
            tracing::debug!(error = %e, "key read interrupted");
            Key::Char('q')
        }
    }
}

/// Pixel size of an image file, without decoding the pixels.
pub fn image_size(path: &Path) -> anyhow::Result<(u32, u32)> {
    Ok(image::image_dimensions(path)?)
}

/// External viewer process showing the current image. At most one window
/// is kept open; showing a new image closes the previous one.
pub struct ImageViewer {
    command: Vec<String>,
    child: Option<Child>,
}

impl ImageViewer {
    pub fn new(command: Option<&[String]>) -> Option<Self> {
        let command = command.filter(|c| !c.is_empty())?;
        Some(Self {
            command: command.to_vec(),
            child: None,
        })
    }

    pub fn show(&mut self, path: &Path) {
        self.close();
        match spawn_viewer(&self.command, path) {
            Ok(child) => self.child = Some(child),
            Err(e) => tracing::warn!(error = %e, "failed to start image viewer"),
        }
    }

    pub fn close(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

impl Drop for ImageViewer {
    fn drop(&mut self) {
        self.close();
    }
}

/// Opens `path` in the viewer and leaves the window to the user.
pub fn open_detached(command: &[String], path: &Path) {
    if let Err(e) = spawn_viewer(command, path) {
        tracing::warn!(error = %e, "failed to start image viewer");
    }
}

fn spawn_viewer(command: &[String], path: &Path) -> anyhow::Result<Child> {
    let (program, args) = command
        .split_first()
        .ok_or_else(|| anyhow::anyhow!("viewer command is empty"))?;
    Ok(Command::new(program)
        .args(args)
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?)
}

/// Shows the available commands.
pub fn show_help() {
    section("⌨️  COMMANDS");
    println!("  sightsprite init [--force]            {}", "Write a default config".dimmed());
    println!("  sightsprite doctor                    {}", "Check config, camera and labels".dimmed());
    println!("  sightsprite snapshot <file>           {}", "Capture one image".dimmed());
    println!("  sightsprite snapshots <dir>           {}", "Capture images on an interval".dimmed());
    println!("  sightsprite record <dir>              {}", "Record a short clip as frames".dimmed());
    println!("  sightsprite label <dir>               {}", "Label images with number keys".dimmed());
    println!("  sightsprite review <dir>              {}", "Review, relabel or delete labels".dimmed());
    println!("  sightsprite sort <src> <out>          {}", "Copy images into label folders".dimmed());
    println!("  sightsprite stats                     {}", "Show counters and label distribution".dimmed());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_viewer_needs_a_command() {
        assert!(ImageViewer::new(None).is_none());
        assert!(ImageViewer::new(Some(&[])).is_none());
        assert!(ImageViewer::new(Some(&["feh".to_string()])).is_some());
    }

    #[test]
    fn test_image_size_reads_header() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("frame.png");
        image::RgbImage::new(64, 48).save(&path).unwrap();
        assert_eq!(image_size(&path).unwrap(), (64, 48));

        std::fs::write(tmp.path().join("bad.png"), "nope").unwrap();
        assert!(image_size(&tmp.path().join("bad.png")).is_err());
    }
}
