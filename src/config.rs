//! Builder-style configuration structs (§10.3), mirroring the teacher's
//! `QueryExpander::with_*` pattern.

use std::collections::HashSet;

use crate::filter::Filter;

/// Configuration for [`crate::handle::Index::build`].
#[derive(Debug, Clone)]
pub struct BuildConfig {
    pub index_fields: Vec<String>,
    pub stop_words: Option<HashSet<String>>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            index_fields: vec!["filePath".to_string()],
            stop_words: None,
        }
    }
}

impl BuildConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_index_fields(mut self, fields: impl IntoIterator<Item = String>) -> Self {
        self.index_fields = fields.into_iter().collect();
        self
    }

    pub fn with_stop_words(mut self, stop_words: HashSet<String>) -> Self {
        self.stop_words = Some(stop_words);
        self
    }
}

/// Configuration for [`crate::handle::Index::search`].
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub limit: usize,
    pub filter: Option<Filter>,
    pub stop_words: Option<HashSet<String>>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            limit: 10,
            filter: None,
            stop_words: None,
        }
    }
}

impl SearchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_stop_words(mut self, stop_words: HashSet<String>) -> Self {
        self.stop_words = Some(stop_words);
        self
    }
}

pub use crate::feedback::FeedbackConfig;
