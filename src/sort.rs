//! # Dataset sorting
//!
//! Copies labeled images into one folder per label:
//! `output_dir/<label>/<filename>`. Labels are handled in sorted order and
//! sources are copied, never moved.

use crate::labels;
use anyhow::Context;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Default)]
pub struct SortReport {
    /// Images copied per label, in label order.
    pub per_label: BTreeMap<String, usize>,
    pub label_dirs: Vec<PathBuf>,
}

impl SortReport {
    pub fn total(&self) -> usize {
        self.per_label.values().sum()
    }
}

pub fn sort_images_by_label(
    labels_file: &Path,
    source_dir: &Path,
    output_dir: &Path,
) -> anyhow::Result<SortReport> {
    tracing::info!(
        source = %source_dir.display(),
        output = %output_dir.display(),
        labels = %labels_file.display(),
        "sorting images"
    );

    let records = labels::read_label_csv(labels_file)?;

    let mut by_label: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for record in &records {
        by_label
            .entry(record.label.as_str())
            .or_default()
            .push(record.filename.as_str());
    }

    let total: usize = records.len();
    let progress = crate::ui::progress_bar(total as u64, "sorting");
    let mut report = SortReport::default();

    for (label, filenames) in by_label {
        let label_dir = output_dir.join(label);
        fs::create_dir_all(&label_dir)
            .with_context(|| format!("failed to create {}", label_dir.display()))?;

        for filename in &filenames {
            let source = source_dir.join(filename);
            let destination = label_dir.join(filename);
            fs::copy(&source, &destination).with_context(|| {
                format!(
                    "failed to copy {} to {}",
                    source.display(),
                    destination.display()
                )
            })?;
            progress.inc(1);
        }

        tracing::debug!(label, count = filenames.len(), "label sorted");
        report.per_label.insert(label.to_string(), filenames.len());
        report.label_dirs.push(label_dir);
    }
    progress.finish_and_clear();

    Ok(report)
}
