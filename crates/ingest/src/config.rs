//! Loader configuration.
//!
//! ```rust
//! use ingest::LoaderConfig;
//!
//! let lenient = LoaderConfig::default().with_strict(false);
//! assert!(!lenient.strict);
//! assert_eq!(lenient.default_title, "Untitled");
//! ```
use serde::{Deserialize, Serialize};

/// Title given to records whose conversation has none.
pub const DEFAULT_TITLE: &str = "Untitled";

/// Controls how the loader treats incomplete records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Strict mode fails the whole load on the first record missing an `id`
    /// or `text`, with blank text, or with a duplicate id. Lenient mode drops
    /// such records (generating ids where only the id is missing) and reports
    /// the counts.
    #[serde(default = "default_strict")]
    pub strict: bool,
    /// Title used when a record carries no conversation title.
    #[serde(default = "default_title")]
    pub default_title: String,
}

impl LoaderConfig {
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_default_title(mut self, title: impl Into<String>) -> Self {
        self.default_title = title.into();
        self
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            strict: default_strict(),
            default_title: default_title(),
        }
    }
}

fn default_strict() -> bool {
    true
}

fn default_title() -> String {
    DEFAULT_TITLE.to_string()
}
