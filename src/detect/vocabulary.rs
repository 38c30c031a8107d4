//! Vocabulary loading
//!
//! The vocabularies are data, kept out of the matching code: an embedded
//! TOML artifact by default, or a user-supplied file with the same shape.

use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

/// Vocabulary shipped with the binary
const EMBEDDED_VOCABULARY: &str = include_str!("../../data/vocabulary.toml");

/// Errors raised while loading or compiling a vocabulary
#[derive(Debug, Error)]
pub enum VocabularyError {
    #[error("Failed to read vocabulary file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse vocabulary TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to compile pattern for '{term}': {source}")]
    Pattern {
        term: String,
        #[source]
        source: regex::Error,
    },

    #[error("Vocabulary contains no terms at all")]
    Empty,
}

/// The four term lists consumed by the detector
///
/// `terms` is matched by containment; `brands`, `plastics` and `metals` are
/// matched as whole words.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Vocabulary {
    pub terms: Vec<String>,
    pub brands: Vec<String>,
    pub plastics: Vec<String>,
    pub metals: Vec<String>,
}

impl Vocabulary {
    /// Builds a vocabulary from in-memory lists, normalizing every entry
    pub fn new(
        terms: &[&str],
        brands: &[&str],
        plastics: &[&str],
        metals: &[&str],
    ) -> Self {
        let owned = |list: &[&str]| list.iter().map(|s| s.to_string()).collect();
        Self {
            terms: owned(terms),
            brands: owned(brands),
            plastics: owned(plastics),
            metals: owned(metals),
        }
        .normalized()
    }

    /// The vocabulary embedded at build time
    pub fn embedded() -> Result<Self, VocabularyError> {
        Self::from_toml_str(EMBEDDED_VOCABULARY)
    }

    /// Loads a vocabulary from a TOML file
    pub fn from_path(path: &Path) -> Result<Self, VocabularyError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Loads from `path` when given, otherwise the embedded vocabulary
    pub fn load(path: Option<&Path>) -> Result<Self, VocabularyError> {
        match path {
            Some(path) => Self::from_path(path),
            None => Self::embedded(),
        }
    }

    /// Parses a vocabulary from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, VocabularyError> {
        let vocabulary: Vocabulary = toml::from_str(content)?;
        let vocabulary = vocabulary.normalized();
        if vocabulary.is_empty() {
            return Err(VocabularyError::Empty);
        }
        Ok(vocabulary)
    }

    /// Total number of entries across all lists
    pub fn len(&self) -> usize {
        self.terms.len() + self.brands.len() + self.plastics.len() + self.metals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lower-cases and trims every entry, drops blanks and duplicates
    fn normalized(self) -> Self {
        Self {
            terms: normalize_list(self.terms),
            brands: normalize_list(self.brands),
            plastics: normalize_list(self.plastics),
            metals: normalize_list(self.metals),
        }
    }
}

fn normalize_list(list: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    list.into_iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .filter(|t| seen.insert(t.clone()))
        .collect()
}
