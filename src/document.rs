//! Document records and build-time input (C2).

use std::collections::HashMap;

use crate::meta::MetaValue;

/// A single indexed document. `terms` holds the stop-word-filtered token
/// list used for term statistics and for relevance feedback; it is computed
/// during build, never supplied by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: u32,
    pub text: String,
    pub terms: Vec<String>,
    pub meta: HashMap<String, MetaValue>,
}

/// Heterogeneous build input: either plain text, or text with metadata.
///
/// This tagged union is the Rust-native replacement for the dynamically
/// typed "string or record" input the source system accepts; the
/// `InvalidDocument` error kind exists for API completeness but is
/// unreachable through this type, since the compiler rules out any third
/// shape of input.
#[derive(Debug, Clone, PartialEq)]
pub enum DocInput {
    Text(String),
    WithMeta {
        text: String,
        meta: HashMap<String, MetaValue>,
    },
}

impl From<String> for DocInput {
    fn from(text: String) -> Self {
        DocInput::Text(text)
    }
}

impl From<&str> for DocInput {
    fn from(text: &str) -> Self {
        DocInput::Text(text.to_string())
    }
}

impl DocInput {
    pub fn with_meta(text: impl Into<String>, meta: HashMap<String, MetaValue>) -> Self {
        DocInput::WithMeta {
            text: text.into(),
            meta,
        }
    }

    pub(crate) fn into_parts(self) -> (String, HashMap<String, MetaValue>) {
        match self {
            DocInput::Text(text) => (text, HashMap::new()),
            DocInput::WithMeta { text, meta } => (text, meta),
        }
    }
}
