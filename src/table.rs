use std::collections::{BTreeMap, HashMap, HashSet};

/// Pseudo-key whose row holds the language list instead of translations
pub const LANGUAGE_KEY: &str = "language";

pub fn is_reserved_key(key: &str) -> bool {
    key == LANGUAGE_KEY
}

/// Key → per-language translations, one column per entry of `languages`.
///
/// Rows are kept in a `BTreeMap` so iteration is already in persisted order.
/// A row may be shorter or longer than the language list when it came from a
/// hand-edited file; that is reported by the checker, not rejected here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationTable {
    languages: Vec<String>,
    rows: BTreeMap<String, Vec<String>>,
}

impl TranslationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_languages(languages: Vec<String>) -> Self {
        Self {
            languages,
            rows: BTreeMap::new(),
        }
    }

    pub fn languages(&self) -> &[String] {
        &self.languages
    }

    pub fn language_index(&self, language: &str) -> Option<usize> {
        self.languages.iter().position(|l| l == language)
    }

    /// Number of translatable keys (the language row is not counted)
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.rows.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.rows.get(key).map(|row| row.as_slice())
    }

    /// Translatable keys with their rows, in ascending key order
    pub fn rows(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.rows.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Insert `key` with an empty cell per language unless it already exists.
    ///
    /// Returns `true` when the key was new. The reserved key is never inserted.
    pub fn insert_key(&mut self, key: &str) -> bool {
        if is_reserved_key(key) || self.rows.contains_key(key) {
            return false;
        }
        self.rows
            .insert(key.to_string(), vec![String::new(); self.languages.len()]);
        true
    }

    /// Store a row verbatim, replacing any previous row for `key`.
    ///
    /// Returns the replaced row. Used when loading a persisted table.
    pub fn insert_row(&mut self, key: String, values: Vec<String>) -> Option<Vec<String>> {
        self.rows.insert(key, values)
    }

    /// Write `value` into the column at `index`, creating the row if needed.
    ///
    /// Short legacy rows are padded so the column exists.
    pub fn set_translation(&mut self, key: &str, index: usize, value: &str) {
        let width = self.languages.len().max(index + 1);
        let row = self
            .rows
            .entry(key.to_string())
            .or_insert_with(|| vec![String::new(); width]);
        if row.len() <= index {
            row.resize(index + 1, String::new());
        }
        row[index] = value.to_string();
    }

    /// Replace the language list, moving every row's cells to the column of
    /// the same language. Cells of dropped languages are discarded, new
    /// languages start empty, and cells past the old list are kept at the end.
    pub fn set_languages(&mut self, languages: Vec<String>) {
        if languages == self.languages {
            return;
        }
        let old_index: HashMap<&str, usize> = self
            .languages
            .iter()
            .enumerate()
            .map(|(i, l)| (l.as_str(), i))
            .collect();
        let old_len = self.languages.len();

        for row in self.rows.values_mut() {
            let mut remapped = Vec::with_capacity(languages.len());
            for language in &languages {
                let cell = match old_index.get(language.as_str()) {
                    Some(&i) if i < row.len() => std::mem::take(&mut row[i]),
                    _ => String::new(),
                };
                remapped.push(cell);
            }
            if row.len() > old_len {
                remapped.extend(row.drain(old_len..));
            }
            *row = remapped;
        }
        self.languages = languages;
    }

    /// Append languages that are not yet columns, keeping existing order.
    ///
    /// Returns the languages that were added.
    pub fn add_languages<I, S>(&mut self, languages: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut next = self.languages.clone();
        let mut added = Vec::new();
        for language in languages {
            let language = language.into();
            if !next.contains(&language) {
                next.push(language.clone());
                added.push(language);
            }
        }
        if !added.is_empty() {
            self.set_languages(next);
        }
        added
    }

    /// Remove every key not in `observed`. Returns the removed keys, ascending.
    pub fn retain_keys(&mut self, observed: &HashSet<String>) -> Vec<String> {
        let removed: Vec<String> = self
            .rows
            .keys()
            .filter(|key| !observed.contains(*key))
            .cloned()
            .collect();
        for key in &removed {
            self.rows.remove(key);
        }
        removed
    }
}
