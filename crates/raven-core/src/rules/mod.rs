//! Declarative keyword tables.
//!
//! Both the trigger engine and the fact extractor work the same way: lower-case
//! the incoming text and test substring membership against a fixed keyword
//! set per category.

mod extraction;
mod triggers;

pub use extraction::*;
pub use triggers::*;

/// A lower-cased set of keywords matched by substring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordSet {
    keywords: Vec<String>,
}

impl KeywordSet {
    /// Build a set; keywords are lower-cased once here.
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    /// First keyword contained in `lowered`, if any.
    ///
    /// `lowered` must already be lower-cased.
    pub fn first_match(&self, lowered: &str) -> Option<&str> {
        self.keywords
            .iter()
            .find(|k| lowered.contains(k.as_str()))
            .map(String::as_str)
    }

    pub fn matches(&self, lowered: &str) -> bool {
        self.first_match(lowered).is_some()
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }
}
