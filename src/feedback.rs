//! Rocchio-style relevance feedback / query expansion (C7).
//!
//! Preserves the source system's particular (non-canonical) re-expansion
//! strategy per spec §4.6 and §9 open question 3: feedback weights are
//! folded into a bag-of-words query by repeating terms, rather than by
//! adjusting the scorer's term weights directly.

use std::collections::{HashMap, HashSet};

use crate::error::SearchError;
use crate::filter::Filter;
use crate::index::IndexState;
use crate::scorer;
use crate::topk::SearchHit;

const MAX_MERGED_TERMS: usize = 30;
const MAX_TERM_REPEATS: i32 = 8;

/// Tunables for [`search_with_feedback`].
#[derive(Debug, Clone, Copy)]
pub struct FeedbackConfig {
    pub alpha: f64,
    pub beta: f64,
    pub limit: usize,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            beta: 0.75,
            limit: 10,
        }
    }
}

/// Expand `query` using the terms of `relevant_doc_ids` and delegate to the
/// ordinary scorer. Falls back to a plain [`scorer::search`] whenever no
/// relevant documents were supplied, none of them resolve to real doc ids,
/// or the expansion collapses to nothing.
pub fn search_with_feedback(
    state: &IndexState,
    query: &str,
    relevant_doc_ids: &[u32],
    config: FeedbackConfig,
    filter: Option<&Filter>,
    stop_words: Option<&HashSet<String>>,
) -> Result<Vec<SearchHit>, SearchError> {
    if relevant_doc_ids.is_empty() {
        return scorer::search(state, query, config.limit, filter, stop_words);
    }

    let found: Vec<&crate::document::Document> = relevant_doc_ids
        .iter()
        .filter_map(|id| state.document(*id))
        .collect();
    if found.is_empty() {
        return scorer::search(state, query, config.limit, filter, stop_words);
    }

    let feedback_weights = accumulate_feedback_weights(&found);
    let query_terms = crate::tokenizer::tokenize(query, None);

    let mut merged: HashMap<String, f64> = HashMap::new();
    for term in &query_terms {
        merged.insert(term.clone(), config.alpha);
    }
    let num_found = found.len() as f64;
    for (term, weight) in feedback_weights {
        *merged.entry(term).or_insert(0.0) += config.beta * weight * (1.0 / num_found);
    }

    let mut ranked: Vec<(String, f64)> = merged.into_iter().collect();
    ranked.sort_unstable_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    ranked.truncate(MAX_MERGED_TERMS);

    let mut selected: HashSet<String> = HashSet::new();
    let mut expanded: Vec<String> = Vec::new();
    for (term, weight) in &ranked {
        let repeats = repeat_count(*weight);
        for _ in 0..repeats {
            expanded.push(term.clone());
        }
        selected.insert(term.clone());
    }
    for term in &query_terms {
        if !selected.contains(term) {
            expanded.push(term.clone());
        }
    }

    if expanded.is_empty() {
        return scorer::search(state, query, config.limit, filter, stop_words);
    }

    let expanded_query = expanded.join(" ");
    scorer::search(state, &expanded_query, config.limit, filter, stop_words)
}

/// For each relevant document, spread weight `1 / |d.terms|` over its
/// terms, then sum across documents.
fn accumulate_feedback_weights(docs: &[&crate::document::Document]) -> HashMap<String, f64> {
    let mut weights: HashMap<String, f64> = HashMap::new();
    for doc in docs {
        if doc.terms.is_empty() {
            continue;
        }
        let per_term = 1.0 / doc.terms.len() as f64;
        for term in &doc.terms {
            *weights.entry(term.clone()).or_insert(0.0) += per_term;
        }
    }
    weights
}

/// `clamp(round(1 + ln(weight)), 1, 8)` for `weight > 1` and finite,
/// otherwise a single occurrence.
fn repeat_count(weight: f64) -> i32 {
    if weight > 1.0 && weight.is_finite() {
        let raw = (1.0 + weight.ln()).round() as i32;
        raw.clamp(1, MAX_TERM_REPEATS)
    } else {
        1
    }
}
