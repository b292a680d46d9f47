//! Word-count size buckets.
//!
//! | words                               | class  | default size |
//! |-------------------------------------|--------|--------------|
//! | `< medium_min_words` (30)           | small  | 8.0          |
//! | `< large_min_words` (150)           | medium | 12.0         |
//! | otherwise                           | large  | 16.0         |
//!
//! Some galaxy builds used 80 as the large threshold;
//! [`LARGE_MIN_WORDS_ALTERNATE`] keeps that value at hand.

use serde::{Deserialize, Serialize};

use crate::AttributionError;

pub const MEDIUM_MIN_WORDS_DEFAULT: usize = 30;
pub const LARGE_MIN_WORDS_DEFAULT: usize = 150;
pub const LARGE_MIN_WORDS_ALTERNATE: usize = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeClass {
    Small,
    Medium,
    Large,
}

/// Whitespace-separated token count.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SizeBuckets {
    pub medium_min_words: usize,
    pub large_min_words: usize,
    pub small: f64,
    pub medium: f64,
    pub large: f64,
}

impl SizeBuckets {
    pub fn with_large_min_words(mut self, large_min_words: usize) -> Self {
        self.large_min_words = large_min_words;
        self
    }

    pub fn validate(&self) -> Result<(), AttributionError> {
        if self.medium_min_words >= self.large_min_words {
            return Err(AttributionError::InvalidSizeThresholds {
                medium: self.medium_min_words,
                large: self.large_min_words,
            });
        }
        if [self.small, self.medium, self.large]
            .iter()
            .any(|s| !s.is_finite() || *s <= 0.0)
        {
            return Err(AttributionError::InvalidPointSize);
        }
        Ok(())
    }

    pub fn classify(&self, words: usize) -> SizeClass {
        if words < self.medium_min_words {
            SizeClass::Small
        } else if words < self.large_min_words {
            SizeClass::Medium
        } else {
            SizeClass::Large
        }
    }

    pub fn size_of(&self, class: SizeClass) -> f64 {
        match class {
            SizeClass::Small => self.small,
            SizeClass::Medium => self.medium,
            SizeClass::Large => self.large,
        }
    }

    /// Display size for `text`. Callers pass the already length-capped text.
    pub fn size_for(&self, text: &str) -> f64 {
        self.size_of(self.classify(word_count(text)))
    }
}

impl Default for SizeBuckets {
    fn default() -> Self {
        Self {
            medium_min_words: MEDIUM_MIN_WORDS_DEFAULT,
            large_min_words: LARGE_MIN_WORDS_DEFAULT,
            small: 8.0,
            medium: 12.0,
            large: 16.0,
        }
    }
}
