//! Vocabulary-based detection of manufacturing signals
//!
//! A [`Detector`] is compiled once from a [`Vocabulary`] and shared by every
//! worker. Per-page results are [`DetectionSet`]s, which a domain crawl
//! folds together by set union.

mod matcher;
mod text;
mod vocabulary;

pub use matcher::Detector;
pub use text::page_text;
pub use vocabulary::{Vocabulary, VocabularyError};

use serde::Serialize;
use std::collections::BTreeSet;

/// Matched entries per vocabulary
///
/// Sets are ordered so serialized outcomes are stable across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DetectionSet {
    pub terms: BTreeSet<String>,
    pub brands: BTreeSet<String>,
    pub plastics: BTreeSet<String>,
    pub metals: BTreeSet<String>,
}

impl DetectionSet {
    /// Unions another page's detections into this one
    pub fn merge(&mut self, other: DetectionSet) {
        self.terms.extend(other.terms);
        self.brands.extend(other.brands);
        self.plastics.extend(other.plastics);
        self.metals.extend(other.metals);
    }

    /// True if any of the four sets is non-empty
    pub fn has_signal(&self) -> bool {
        !(self.terms.is_empty()
            && self.brands.is_empty()
            && self.plastics.is_empty()
            && self.metals.is_empty())
    }

    pub fn total_matches(&self) -> usize {
        self.terms.len() + self.brands.len() + self.plastics.len() + self.metals.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_merge_is_union() {
        let mut a = DetectionSet {
            terms: set(&["cnc machining"]),
            brands: set(&["haas"]),
            ..Default::default()
        };
        let b = DetectionSet {
            terms: set(&["cnc machining", "injection molding"]),
            metals: set(&["6061"]),
            ..Default::default()
        };

        a.merge(b);

        assert_eq!(a.terms, set(&["cnc machining", "injection molding"]));
        assert_eq!(a.brands, set(&["haas"]));
        assert_eq!(a.metals, set(&["6061"]));
        assert_eq!(a.total_matches(), 4);
    }

    #[test]
    fn test_empty_set_has_no_signal() {
        assert!(!DetectionSet::default().has_signal());
        let only_metal = DetectionSet {
            metals: set(&["brass"]),
            ..Default::default()
        };
        assert!(only_metal.has_signal());
    }
}
