//! # Labeling
//!
//! Keyboard driven labeling and review sessions. Both sessions are plain
//! state machines fed with [`Key`]s; the terminal front-end in
//! `commands::label` reads keys and renders their prompts.

pub mod review;
pub mod session;

pub use review::{ReviewSession, ReviewStep};
pub use session::{LabelSession, LabelStep};

use crate::config::MAX_CATEGORIES;

/// Keys the sessions react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Left,
    Right,
    Other,
}

/// Maps a number key to a category index (`'1'` is the first category).
pub(crate) fn category_index(key: char, categories: &[String]) -> Option<usize> {
    let digit = key.to_digit(10)? as usize;
    (1..=categories.len()).contains(&digit).then(|| digit - 1)
}

pub(crate) fn validate_categories(categories: &[String]) -> anyhow::Result<()> {
    if categories.len() > MAX_CATEGORIES {
        anyhow::bail!(
            "This tool only supports up to {} categories, got {}.",
            MAX_CATEGORIES,
            categories.len()
        );
    }
    if categories.is_empty() {
        anyhow::bail!("No categories given. Pass --categories or set labeling.categories in the config.");
    }
    Ok(())
}

/// `1 = dog | 2 = cat`
pub fn category_legend(categories: &[String]) -> String {
    categories
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{} = {}", i + 1, c))
        .collect::<Vec<_>>()
        .join(" | ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cats(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_category_index_bounds() {
        let c = cats(&["dog", "cat"]);
        assert_eq!(category_index('1', &c), Some(0));
        assert_eq!(category_index('2', &c), Some(1));
        assert_eq!(category_index('3', &c), None);
        assert_eq!(category_index('0', &c), None);
        assert_eq!(category_index('x', &c), None);
    }

    #[test]
    fn test_validate_categories_limits() {
        assert!(validate_categories(&cats(&["a", "b", "c", "d", "e"])).is_ok());
        assert!(validate_categories(&cats(&["a", "b", "c", "d", "e", "f"])).is_err());
        assert!(validate_categories(&[]).is_err());
    }

    #[test]
    fn test_category_legend() {
        assert_eq!(category_legend(&cats(&["dog", "cat"])), "1 = dog | 2 = cat");
    }
}
