//! BM25 scoring pipeline (C4).
//!
//! Same formula and constants as the teacher's `InvertedIndex::score`, but
//! walking packed gap-encoded postings instead of a `HashMap<u32, u32>`, and
//! restricted to an optional allowed-doc-id set produced by [`crate::filter`].

use std::collections::HashSet;

use crate::error::SearchError;
use crate::filter::Filter;
use crate::index::postings::TermInfo;
use crate::index::{IndexState, K1};
use crate::tokenizer::tokenize;
use crate::topk::{top_k, SearchHit};

/// Run one scoring query against `state`.
///
/// `limit` must be `>= 1`. An empty or whitespace-only query, an
/// out-of-vocabulary query, or a filter matching no documents all return an
/// empty result list rather than an error.
pub fn search(
    state: &IndexState,
    query: &str,
    limit: usize,
    filter: Option<&Filter>,
    stop_words: Option<&HashSet<String>>,
) -> Result<Vec<SearchHit>, SearchError> {
    if limit < 1 {
        return Err(SearchError::InvalidLimit);
    }

    let allowed = match filter {
        Some(f) => crate::filter::resolve(state, f)?,
        None => None,
    };
    if allowed.as_ref().is_some_and(|s| s.is_empty()) {
        return Ok(Vec::new());
    }

    let query_terms = tokenize(query, stop_words);
    if query_terms.is_empty() {
        return Ok(Vec::new());
    }

    let num_docs = state.num_docs();
    let mut scores = vec![0.0f64; num_docs];
    let mut touched: Vec<u32> = Vec::new();

    for term in &query_terms {
        let Some(info) = state.dictionary.get(term) else {
            continue;
        };
        accumulate_term(state, info, allowed.as_ref(), &mut scores, &mut touched);
    }

    if touched.is_empty() {
        return Ok(Vec::new());
    }

    Ok(top_k(&scores, &touched, limit))
}

fn accumulate_term(
    state: &IndexState,
    info: &TermInfo,
    allowed: Option<&HashSet<u32>>,
    scores: &mut [f64],
    touched: &mut Vec<u32>,
) {
    for (doc, tf) in state.postings.entries(info) {
        if let Some(allowed) = allowed {
            if !allowed.contains(&doc) {
                continue;
            }
        }
        let norm = state.norms[doc as usize];
        let tf = tf as f64;
        let contribution = info.idf * (tf * (K1 + 1.0)) / (tf + K1 * norm);

        let slot = &mut scores[doc as usize];
        if *slot == 0.0 {
            touched.push(doc);
        }
        *slot += contribution;
    }
}
