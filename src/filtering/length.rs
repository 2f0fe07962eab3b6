//! Extracted text filtering.
use super::Filter;

/// Simple length filter.
/// Returns `true` if the text has between `min` and `max` unicode codepoints (inclusive).
///
/// Unset bounds are not checked.
#[derive(Debug, Clone, Default)]
pub struct Length {
    min: Option<usize>,
    max: Option<usize>,
}

impl Length {
    pub fn new(min: Option<usize>, max: Option<usize>) -> Self {
        Self { min, max }
    }
}

impl Filter<&str> for Length {
    fn detect(&self, text: &str) -> bool {
        let count = text.chars().count();
        self.min.map_or(true, |min| count >= min) && self.max.map_or(true, |max| count <= max)
    }
}
