use super::{Key, category_index, validate_categories};
use crate::labels::{LabelRecord, LabelStore};
use colored::*;

/// Result of feeding one key to a [`ReviewSession`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewStep {
    Moved,
    Relabeled { filename: String, from: String, to: String },
    Unchanged { filename: String, label: String },
    Deleted { filename: String },
    Ignored(Key),
    Quit,
    /// Nothing left to review.
    Finished,
}

impl ReviewStep {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ReviewStep::Quit | ReviewStep::Finished)
    }
}

/// Steps through saved labels, allowing relabel and delete.
///
/// Every change is written back to the CSV immediately.
pub struct ReviewSession {
    categories: Vec<String>,
    store: LabelStore,
    records: Vec<LabelRecord>,
    index: usize,
}

impl ReviewSession {
    /// Returns `Ok(None)` when there is nothing to review.
    pub fn open(store: LabelStore, categories: Vec<String>) -> anyhow::Result<Option<Self>> {
        validate_categories(&categories)?;

        if !store.exists() {
            println!(
                "{}",
                format!("   ⚠️  No labels found at {}.", store.path().display()).yellow()
            );
            return Ok(None);
        }
        let records = store.read_all()?;
        if records.is_empty() {
            println!("{}", "   ⚠️  No labeled images in CSV.".yellow());
            return Ok(None);
        }

        Ok(Some(Self {
            categories,
            store,
            records,
            index: 0,
        }))
    }

    pub fn records(&self) -> &[LabelRecord] {
        &self.records
    }

    pub fn current(&self) -> Option<&LabelRecord> {
        self.records.get(self.index)
    }

    pub fn position(&self) -> usize {
        self.index
    }

    /// Three prompt lines for the current record. Relabel options leave
    /// out the label the image already has.
    pub fn prompt(&self) -> Option<[String; 3]> {
        let record = self.current()?;
        let mut options: Vec<String> = self
            .categories
            .iter()
            .enumerate()
            .filter(|(_, c)| **c != record.label)
            .map(|(i, c)| format!("Change to: {} = {}", i + 1, c))
            .collect();
        options.push("d = delete".to_string());

        Some([
            format!(
                "({}) Labeled {} ({}/{})",
                record.filename,
                record.label,
                self.index + 1,
                self.records.len()
            ),
            options.join(" | "),
            "left/right = navigate | q = quit".to_string(),
        ])
    }

    pub fn handle_key(&mut self, key: Key) -> anyhow::Result<ReviewStep> {
        if self.records.is_empty() {
            return Ok(ReviewStep::Finished);
        }

        match key {
            Key::Char('q') => Ok(ReviewStep::Quit),
            Key::Right => {
                self.index = (self.index + 1).min(self.records.len() - 1);
                Ok(ReviewStep::Moved)
            }
            Key::Left => {
                self.index = self.index.saturating_sub(1);
                Ok(ReviewStep::Moved)
            }
            Key::Char('d') => self.delete_current(),
            Key::Char(c) => match category_index(c, &self.categories) {
                Some(i) => self.relabel_current(i),
                None => Ok(ReviewStep::Ignored(key)),
            },
            Key::Other => Ok(ReviewStep::Ignored(key)),
        }
    }

    fn relabel_current(&mut self, category: usize) -> anyhow::Result<ReviewStep> {
        let new_label = self.categories[category].clone();
        let record = &self.records[self.index];
        let filename = record.filename.clone();
        let from = record.label.clone();

        if new_label == from {
            return Ok(ReviewStep::Unchanged {
                filename,
                label: from,
            });
        }

        self.records[self.index].label = new_label.clone();
        self.store.write_all(&self.records)?;
        tracing::info!(%filename, %from, to = %new_label, "relabeled");
        Ok(ReviewStep::Relabeled {
            filename,
            from,
            to: new_label,
        })
    }

    fn delete_current(&mut self) -> anyhow::Result<ReviewStep> {
        let removed = self.records.remove(self.index);
        self.store.write_all(&self.records)?;
        tracing::info!(filename = %removed.filename, "label removed");

        if self.records.is_empty() {
            return Ok(ReviewStep::Finished);
        }
        if self.index >= self.records.len() {
            self.index = self.records.len() - 1;
        }
        Ok(ReviewStep::Deleted {
            filename: removed.filename,
        })
    }

    /// Moves past a record whose image could not be shown. Returns false
    /// when the end is reached.
    pub fn skip_unreadable(&mut self) -> bool {
        self.index += 1;
        self.index < self.records.len()
    }
}
