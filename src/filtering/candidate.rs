//! Metadata-level filtering.
use crate::locator::Metadata;

use super::Filter;

/// Outcome of [CandidateFilter::verdict].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    /// `languages` is missing or does not contain the target language.
    NotEnglish,
    /// `status` is missing or is not the target status.
    NotOk,
}

/// Keeps records that are in English and have been captured with a `200` status.
///
/// The language check is done on the comma-separated `languages` field: one of the (whitespace-trimmed) entries
/// has to be exactly the target code. Matching is case-sensitive.
#[derive(Debug, Clone)]
pub struct CandidateFilter {
    language: String,
    status: String,
}

impl CandidateFilter {
    /// Filter on a custom language code and status.
    pub fn new(language: &str, status: &str) -> Self {
        Self {
            language: language.to_string(),
            status: status.to_string(),
        }
    }

    /// Tell whether a record is kept, and if not, why.
    ///
    /// Language is checked first.
    pub fn verdict(&self, metadata: &Metadata) -> Verdict {
        let has_language = metadata
            .languages()
            .map(|langs| langs.split(',').any(|lang| lang.trim() == self.language))
            .unwrap_or(false);

        if !has_language {
            return Verdict::NotEnglish;
        }

        if metadata.status() != Some(self.status.as_str()) {
            return Verdict::NotOk;
        }

        Verdict::Accept
    }

    pub fn accept(&self, metadata: &Metadata) -> bool {
        self.verdict(metadata) == Verdict::Accept
    }
}

impl Default for CandidateFilter {
    /// `eng` and `200`.
    fn default() -> Self {
        Self::new("eng", "200")
    }
}

impl Filter<&Metadata> for CandidateFilter {
    fn detect(&self, metadata: &Metadata) -> bool {
        self.accept(metadata)
    }
}
