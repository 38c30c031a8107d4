//! Term matching engine
//!
//! Two matching disciplines, chosen per vocabulary:
//!
//! | Vocabulary | Discipline |
//! |------------|------------|
//! | capability terms | containment: literal substring, no word boundaries |
//! | brands, plastics, metals | whole word/phrase, case-insensitive |
//!
//! Containment is deliberate: the term list already enumerates inflected and
//! multi-word forms, and boundaries would reject matches inside compound
//! words. Short tokens such as "mig" can therefore match inside unrelated
//! words; that trade-off belongs to the vocabulary, not to this engine.

use crate::detect::vocabulary::{Vocabulary, VocabularyError};
use crate::detect::DetectionSet;
use regex::{Regex, RegexBuilder};
use std::collections::BTreeSet;

/// File extensions that look like e-mail domains in asset names (`logo@2x.png`)
const ASSET_SUFFIXES: &[&str] = &[".png", ".jpg", ".jpeg", ".gif", ".svg", ".webp"];

/// A vocabulary entry compiled into a whole-word pattern
#[derive(Debug, Clone)]
struct BoundaryTerm {
    term: String,
    pattern: Regex,
}

impl BoundaryTerm {
    fn compile(term: &str) -> Result<Self, VocabularyError> {
        let pattern = RegexBuilder::new(&format!(r"\b{}\b", regex::escape(term)))
            .case_insensitive(true)
            .build()
            .map_err(|source| VocabularyError::Pattern {
                term: term.to_string(),
                source,
            })?;
        Ok(Self {
            term: term.to_string(),
            pattern,
        })
    }
}

fn compile_all(terms: &[String]) -> Result<Vec<BoundaryTerm>, VocabularyError> {
    terms.iter().map(|t| BoundaryTerm::compile(t)).collect()
}

fn boundary_matches(terms: &[BoundaryTerm], haystack: &str) -> BTreeSet<String> {
    terms
        .iter()
        .filter(|t| t.pattern.is_match(haystack))
        .map(|t| t.term.clone())
        .collect()
}

/// Compiled, immutable detector shared by all crawl workers
///
/// Detection is pure: the same `(text, url)` always yields the same
/// [`DetectionSet`].
#[derive(Debug, Clone)]
pub struct Detector {
    terms: Vec<String>,
    brands: Vec<BoundaryTerm>,
    plastics: Vec<BoundaryTerm>,
    metals: Vec<BoundaryTerm>,
    email: Regex,
}

impl Detector {
    /// Compiles every word-boundary pattern of the vocabulary up front
    pub fn new(vocabulary: &Vocabulary) -> Result<Self, VocabularyError> {
        let email = Regex::new(r"[a-z0-9._%+\-]+@[a-z0-9.\-]+\.[a-z]{2,}").map_err(|source| {
            VocabularyError::Pattern {
                term: "<email>".to_string(),
                source,
            }
        })?;

        Ok(Self {
            terms: vocabulary.terms.clone(),
            brands: compile_all(&vocabulary.brands)?,
            plastics: compile_all(&vocabulary.plastics)?,
            metals: compile_all(&vocabulary.metals)?,
            email,
        })
    }

    /// Detects vocabulary matches in page text plus its URL
    ///
    /// # Arguments
    ///
    /// * `text` - Rendered page text (script/style stripped)
    /// * `url` - The page URL, which is scanned together with the text
    pub fn detect(&self, text: &str, url: &str) -> DetectionSet {
        let combined = format!("{} {}", text.to_lowercase(), url.to_lowercase());

        let terms = self
            .terms
            .iter()
            .filter(|term| combined.contains(term.as_str()))
            .cloned()
            .collect();

        DetectionSet {
            terms,
            brands: boundary_matches(&self.brands, &combined),
            plastics: boundary_matches(&self.plastics, &combined),
            metals: boundary_matches(&self.metals, &combined),
        }
    }

    /// Extracts contact e-mail addresses from raw page content
    ///
    /// `mailto:` targets are covered because the scan runs over the markup.
    pub fn emails(&self, content: &str) -> BTreeSet<String> {
        let lowered = content.to_lowercase();
        self.email
            .find_iter(&lowered)
            .map(|m| m.as_str().trim_end_matches('.').to_string())
            .filter(|address| !ASSET_SUFFIXES.iter().any(|s| address.ends_with(s)))
            .collect()
    }
}
