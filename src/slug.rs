//! Slugs for corpus and component names.
use std::collections::HashSet;

use unicode_normalization::UnicodeNormalization;

/// Reduce `name` to lowercase ASCII alphanumerics, `_` and `-`.
///
/// Letters are decomposed first so that accented letters keep their base (`Č` becomes `c`).
/// Runs of whitespace and `-` become a single `-`, other characters are dropped,
/// and leading/trailing separators are trimmed.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut in_separator = false;
    for c in name.nfkd().filter(char::is_ascii) {
        let c = c.to_ascii_lowercase();
        if c == '-' || c.is_ascii_whitespace() {
            in_separator = true;
        } else if c.is_ascii_alphanumeric() || c == '_' {
            if in_separator {
                slug.push('-');
                in_separator = false;
            }
            slug.push(c);
        }
    }

    slug.trim_matches(|c| c == '-' || c == '_').to_string()
}

/// Slugs handed out within one corpus.
///
/// Sentence ids and document-set names are built from component slugs,
/// so two components never share one.
#[derive(Debug, Default)]
pub struct SlugSet {
    taken: HashSet<String>,
}

impl SlugSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a slug for `name`.
    ///
    /// A name with nothing left after [slugify] becomes `component-{fallback_idx}`.
    /// A slug already handed out gets a `-2`, `-3`, ... suffix.
    pub fn insert(&mut self, name: &str, fallback_idx: usize) -> String {
        let mut base = slugify(name);
        if base.is_empty() {
            base = format!("component-{}", fallback_idx);
        }

        let mut slug = base.clone();
        let mut n = 2;
        while self.taken.contains(&slug) {
            slug = format!("{}-{}", base, n);
            n += 1;
        }
        self.taken.insert(slug.clone());
        slug
    }
}
