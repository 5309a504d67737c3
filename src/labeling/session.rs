use super::{Key, category_index, category_legend, validate_categories};
use crate::files;
use crate::labels::{LabelRecord, LabelStore};
use colored::*;
use std::path::{Path, PathBuf};

/// Result of feeding one key to a [`LabelSession`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelStep {
    Labeled { filename: String, label: String },
    Skipped { filename: String },
    Ignored(Key),
    /// User quit; buffered labels were flushed.
    Quit,
    /// Every pending image was handled; buffered labels were flushed.
    Finished,
}

impl LabelStep {
    pub fn is_terminal(&self) -> bool {
        matches!(self, LabelStep::Quit | LabelStep::Finished)
    }
}

/// Walks the unlabeled images of a directory one by one.
///
/// Labels are buffered and written to the CSV in batches, on quit, and
/// when the last image is done. Images already present in the CSV are
/// left out, which is what makes an interrupted session resumable.
pub struct LabelSession {
    categories: Vec<String>,
    store: LabelStore,
    batch_size: usize,
    pending: Vec<PathBuf>,
    index: usize,
    buffer: Vec<LabelRecord>,
    labeled: usize,
}

impl LabelSession {
    pub fn new(
        image_dir: &Path,
        categories: Vec<String>,
        store: LabelStore,
        batch_size: usize,
    ) -> anyhow::Result<Self> {
        validate_categories(&categories)?;

        let already = store.labeled_filenames();
        if !already.is_empty() {
            println!(
                "   🔄 Resuming: found {} labeled images.",
                already.len().to_string().cyan()
            );
        }
        let pending = files::list_images(image_dir)?
            .into_iter()
            .filter(|p| !already.contains(&files::file_name_of(p)))
            .collect();

        Ok(Self {
            categories,
            store,
            batch_size: batch_size.max(1),
            pending,
            index: 0,
            buffer: Vec::new(),
            labeled: 0,
        })
    }

    pub fn total(&self) -> usize {
        self.pending.len()
    }

    /// Labels assigned during this session, saved or not.
    pub fn labeled_count(&self) -> usize {
        self.labeled
    }

    pub fn buffered(&self) -> &[LabelRecord] {
        &self.buffer
    }

    pub fn current(&self) -> Option<&Path> {
        self.pending.get(self.index).map(|p| p.as_path())
    }

    /// Three prompt lines for the current image.
    pub fn prompt(&self) -> Option<[String; 3]> {
        let path = self.current()?;
        Some([
            format!(
                "{} ({}/{})",
                files::file_name_of(path),
                self.index + 1,
                self.pending.len()
            ),
            category_legend(&self.categories),
            "n = next | q = quit".to_string(),
        ])
    }

    pub fn handle_key(&mut self, key: Key) -> LabelStep {
        let Some(current) = self.current() else {
            self.flush(true);
            return LabelStep::Finished;
        };
        let filename = files::file_name_of(current);

        let step = match key {
            Key::Char('q') => {
                println!("   💾 Quitting. Saving labels...");
                self.flush(true);
                return LabelStep::Quit;
            }
            Key::Char('n') => {
                self.index += 1;
                LabelStep::Skipped { filename }
            }
            Key::Char(c) => match category_index(c, &self.categories) {
                Some(i) => {
                    let label = self.categories[i].clone();
                    self.buffer.push(LabelRecord::new(filename.clone(), label.clone()));
                    self.labeled += 1;
                    tracing::debug!(%filename, %label, "labeled");
                    self.flush(false);
                    self.index += 1;
                    LabelStep::Labeled { filename, label }
                }
                None => return LabelStep::Ignored(key),
            },
            other => return LabelStep::Ignored(other),
        };

        if self.current().is_none() {
            self.flush(true);
            return LabelStep::Finished;
        }
        step
    }

    /// Moves past an image that could not be shown. Returns false once
    /// nothing is left, after flushing.
    pub fn skip_unreadable(&mut self) -> bool {
        if let Some(path) = self.current() {
            tracing::warn!(path = %path.display(), "skipping unreadable image");
        }
        self.index += 1;
        if self.current().is_none() {
            self.flush(true);
            return false;
        }
        true
    }

    /// Writes buffered labels when the batch is full or `force` is set.
    /// A failed write keeps the labels in memory for the next attempt.
    pub fn flush(&mut self, force: bool) -> usize {
        if self.buffer.is_empty() || (!force && self.buffer.len() < self.batch_size) {
            return 0;
        }
        match self.store.append(&self.buffer) {
            Ok(()) => {
                let saved = self.buffer.len();
                println!(
                    "   💾 Saved {} labels to {}",
                    saved,
                    self.store.path().display()
                );
                self.buffer.clear();
                saved
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to save labels");
                println!(
                    "{}",
                    format!("   ❌ Failed to save CSV. Labels kept in memory. Error: {e}").red()
                );
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn cats() -> Vec<String> {
        vec!["dog".to_string(), "cat".to_string()]
    }

    fn dataset(n: usize) -> TempDir {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("images")).unwrap();
        for i in 0..n {
            std::fs::write(tmp.path().join(format!("images/img_{i:02}.png")), "").unwrap();
        }
        tmp
    }

    fn session(tmp: &TempDir, batch: usize) -> LabelSession {
        let store = LabelStore::open(&tmp.path().join("labels.csv")).unwrap();
        LabelSession::new(&tmp.path().join("images"), cats(), store, batch).unwrap()
    }

    fn saved(tmp: &TempDir) -> Vec<LabelRecord> {
        LabelStore::open(&tmp.path().join("labels.csv")).unwrap().read_all().unwrap()
    }

    #[test]
    fn test_rejects_more_than_five_categories() {
        let tmp = dataset(1);
        let store = LabelStore::open(&tmp.path().join("labels.csv")).unwrap();
        let six = (0..6).map(|i| format!("c{i}")).collect();
        assert!(LabelSession::new(&tmp.path().join("images"), six, store, 10).is_err());
    }

    #[test]
    fn test_prompt_lines() {
        let tmp = dataset(2);
        let s = session(&tmp, 10);
        let [title, legend, help] = s.prompt().unwrap();
        assert_eq!(title, "img_00.png (1/2)");
        assert_eq!(legend, "1 = dog | 2 = cat");
        assert_eq!(help, "n = next | q = quit");
    }

    #[test]
    fn test_labels_are_batched() {
        let tmp = dataset(5);
        let mut s = session(&tmp, 2);

        assert_eq!(
            s.handle_key(Key::Char('1')),
            LabelStep::Labeled { filename: "img_00.png".into(), label: "dog".into() }
        );
        assert!(saved(&tmp).is_empty(), "first label is only buffered");

        s.handle_key(Key::Char('2'));
        assert_eq!(saved(&tmp).len(), 2, "batch of two is flushed");
        assert!(s.buffered().is_empty());

        s.handle_key(Key::Char('1'));
        assert_eq!(s.buffered().len(), 1);
        assert_eq!(s.handle_key(Key::Char('q')), LabelStep::Quit);
        assert_eq!(
            saved(&tmp),
            vec![
                LabelRecord::new("img_00.png", "dog"),
                LabelRecord::new("img_01.png", "cat"),
                LabelRecord::new("img_02.png", "dog"),
            ]
        );
    }

    #[test]
    fn test_skip_and_ignored_keys() {
        let tmp = dataset(3);
        let mut s = session(&tmp, 10);

        assert_eq!(s.handle_key(Key::Char('x')), LabelStep::Ignored(Key::Char('x')));
        assert_eq!(s.handle_key(Key::Char('3')), LabelStep::Ignored(Key::Char('3')));
        assert_eq!(s.handle_key(Key::Left), LabelStep::Ignored(Key::Left));
        assert_eq!(s.current().map(files::file_name_of), Some("img_00.png".to_string()));

        assert_eq!(
            s.handle_key(Key::Char('n')),
            LabelStep::Skipped { filename: "img_00.png".into() }
        );
        assert_eq!(s.current().map(files::file_name_of), Some("img_01.png".to_string()));
    }

    #[test]
    fn test_finishing_flushes_everything() {
        let tmp = dataset(2);
        let mut s = session(&tmp, 10);
        s.handle_key(Key::Char('2'));
        assert_eq!(s.handle_key(Key::Char('n')), LabelStep::Finished);
        assert_eq!(saved(&tmp), vec![LabelRecord::new("img_00.png", "cat")]);
        assert_eq!(s.labeled_count(), 1);
    }

    #[test]
    fn test_resume_skips_labeled_images() {
        let tmp = dataset(3);
        LabelStore::open(&tmp.path().join("labels.csv"))
            .unwrap()
            .write_all(&[LabelRecord::new("img_01.png", "dog")])
            .unwrap();

        let mut s = session(&tmp, 10);
        assert_eq!(s.total(), 2);
        s.handle_key(Key::Char('1'));
        assert_eq!(s.current().map(files::file_name_of), Some("img_02.png".to_string()));
        assert_eq!(s.handle_key(Key::Char('2')), LabelStep::Finished);

        let filenames: Vec<String> = saved(&tmp).into_iter().map(|r| r.filename).collect();
        assert_eq!(filenames, vec!["img_01.png", "img_00.png", "img_02.png"]);
    }

    #[test]
    fn test_skip_unreadable_reaches_end() {
        let tmp = dataset(2);
        let mut s = session(&tmp, 10);
        s.handle_key(Key::Char('1'));
        assert!(!s.skip_unreadable());
        assert_eq!(saved(&tmp).len(), 1, "ending by skipping still flushes");
    }

    #[test]
    fn test_failed_flush_keeps_buffer_for_retry() {
        let tmp = dataset(2);
        let csv = tmp.path().join("labels.csv");
        std::fs::create_dir_all(&csv).unwrap();

        let mut s = session(&tmp, 10);
        s.handle_key(Key::Char('1'));
        assert_eq!(s.handle_key(Key::Char('q')), LabelStep::Quit);
        assert_eq!(s.buffered(), &[LabelRecord::new("img_00.png", "dog")]);

        std::fs::remove_dir(&csv).unwrap();
        assert_eq!(s.flush(true), 1);
        assert!(s.buffered().is_empty());
        assert_eq!(saved(&tmp), vec![LabelRecord::new("img_00.png", "dog")]);
    }

    #[test]
    fn test_empty_directory_has_nothing_to_do() {
        let tmp = dataset(0);
        let mut s = session(&tmp, 10);
        assert!(s.prompt().is_none());
        assert_eq!(s.handle_key(Key::Char('1')), LabelStep::Finished);
        assert!(!tmp.path().join("labels.csv").exists());
    }
}
