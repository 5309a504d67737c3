//! # Label store
//!
//! Labels live in a two column CSV (`filename,label`) so they stay readable
//! by spreadsheet tools and dataframe libraries. `filename` is the bare file
//! name of the image, never a path.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

pub const FILENAME_COLUMN: &str = "filename";
pub const LABEL_COLUMN: &str = "label";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LabelRecord {
    pub filename: String,
    pub label: String,
}

impl LabelRecord {
    pub fn new(filename: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            label: label.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LabelStore {
    path: PathBuf,
}

impl LabelStore {
    /// Opens (not creates) the CSV at `path`, creating its parent directory.
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Reads every record. A missing file reads as empty.
    pub fn read_all(&self) -> anyhow::Result<Vec<LabelRecord>> {
        if !self.exists() {
            return Ok(Vec::new());
        }
        read_label_csv(&self.path)
    }

    /// File names that already carry a label.
    ///
    /// An unreadable CSV is logged and treated as empty so a labeling
    /// session can still start fresh.
    pub fn labeled_filenames(&self) -> HashSet<String> {
        match self.read_all() {
            Ok(records) => records.into_iter().map(|r| r.filename).collect(),
            Err(e) => {
                tracing::warn!(error = %e, path = %self.path.display(), "failed to read labels, starting fresh");
                HashSet::new()
            }
        }
    }

    /// Appends `records` after the rows already on disk.
    pub fn append(&self, records: &[LabelRecord]) -> anyhow::Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        let mut all = self.read_all()?;
        all.extend_from_slice(records);
        self.write_all(&all)
    }

    /// Replaces the file contents with `records`. The header is always
    /// written, even for an empty set.
    pub fn write_all(&self, records: &[LabelRecord]) -> anyhow::Result<()> {
        let tmp_path = self.path.with_extension("csv.tmp");
        {
            let mut writer = csv::Writer::from_path(&tmp_path)
                .with_context(|| format!("failed to write {}", tmp_path.display()))?;
            writer.write_record([FILENAME_COLUMN, LABEL_COLUMN])?;
            for record in records {
                writer.write_record([record.filename.as_str(), record.label.as_str()])?;
            }
            writer.flush()?;
        }
        fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("failed to replace {}", self.path.display()))?;
        tracing::debug!(rows = records.len(), path = %self.path.display(), "labels written");
        Ok(())
    }
}

/// Reads a label CSV, requiring both the `filename` and `label` columns.
/// Extra columns are ignored.
pub fn read_label_csv(path: &Path) -> anyhow::Result<Vec<LabelRecord>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;

    let headers = reader.headers()?.clone();
    let has = |name: &str| headers.iter().any(|h| h == name);
    if !has(FILENAME_COLUMN) || !has(LABEL_COLUMN) {
        anyhow::bail!(
            "{} must contain '{}' and '{}' columns",
            path.display(),
            FILENAME_COLUMN,
            LABEL_COLUMN
        );
    }

    let mut records = Vec::new();
    for row in reader.deserialize() {
        let record: LabelRecord =
            row.with_context(|| format!("malformed row in {}", path.display()))?;
        records.push(record);
    }
    Ok(records)
}

/// Number of images per label, in label order.
pub fn distribution(records: &[LabelRecord]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for record in records {
        *counts.entry(record.label.clone()).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_reads_empty() {
        let tmp = TempDir::new().unwrap();
        let store = LabelStore::open(&tmp.path().join("deep/dir/labels.csv")).unwrap();
        assert!(tmp.path().join("deep/dir").is_dir(), "parent directory is created");
        assert!(store.read_all().unwrap().is_empty());
        assert!(store.labeled_filenames().is_empty());
    }

    #[test]
    fn test_append_keeps_existing_rows() {
        let tmp = TempDir::new().unwrap();
        let store = LabelStore::open(&tmp.path().join("labels.csv")).unwrap();
        store.append(&[LabelRecord::new("a.png", "dog")]).unwrap();
        store
            .append(&[LabelRecord::new("b.png", "cat"), LabelRecord::new("c.png", "dog")])
            .unwrap();

        let rows = store.read_all().unwrap();
        assert_eq!(
            rows,
            vec![
                LabelRecord::new("a.png", "dog"),
                LabelRecord::new("b.png", "cat"),
                LabelRecord::new("c.png", "dog"),
            ]
        );
        let content = std::fs::read_to_string(store.path()).unwrap();
        assert!(content.starts_with("filename,label\n"));
    }

    #[test]
    fn test_write_all_empty_keeps_header() {
        let tmp = TempDir::new().unwrap();
        let store = LabelStore::open(&tmp.path().join("labels.csv")).unwrap();
        store.write_all(&[]).unwrap();
        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), "filename,label\n");
        assert!(store.read_all().unwrap().is_empty());
    }

    #[test]
    fn test_names_with_commas_round_trip() {
        let tmp = TempDir::new().unwrap();
        let store = LabelStore::open(&tmp.path().join("labels.csv")).unwrap();
        store
            .write_all(&[LabelRecord::new("shot, 1.png", "big dog")])
            .unwrap();
        assert_eq!(store.read_all().unwrap()[0].filename, "shot, 1.png");
    }

    #[test]
    fn test_missing_columns_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("labels.csv");
        std::fs::write(&path, "file,category\na.png,dog\n").unwrap();
        assert!(read_label_csv(&path).is_err());

        let store = LabelStore::open(&path).unwrap();
        assert!(store.labeled_filenames().is_empty(), "unreadable CSV starts fresh");
    }

    #[test]
    fn test_extra_columns_ignored() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("labels.csv");
        std::fs::write(&path, "label,notes,filename\ncat,blurry,b.png\n").unwrap();
        assert_eq!(read_label_csv(&path).unwrap(), vec![LabelRecord::new("b.png", "cat")]);
    }

    #[test]
    fn test_distribution_counts_per_label() {
        let rows = vec![
            LabelRecord::new("a.png", "dog"),
            LabelRecord::new("b.png", "cat"),
            LabelRecord::new("c.png", "dog"),
        ];
        let counts = distribution(&rows);
        assert_eq!(counts.get("dog"), Some(&2));
        assert_eq!(counts.get("cat"), Some(&1));
        assert_eq!(counts.keys().collect::<Vec<_>>(), vec!["cat", "dog"]);
    }
}
