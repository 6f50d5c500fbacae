//! Two-pass index build (C3).

use std::collections::{HashMap, HashSet};

use crate::document::{DocInput, Document};
use crate::error::SearchError;
use crate::tokenizer::tokenize;

use super::postings::{PostingsStore, TermInfo};
use super::{IndexState, B};

/// Build an immutable [`super::IndexState`] from `docs` (C3). Exposed at
/// crate level (not just `pub(crate)`) since it is the synchronous
/// lower-level entry point the async [`crate::handle::Index::build`] wraps
/// with `spawn_blocking`; callers who don't need the worker runtime (e.g.
/// benchmarks) can use it directly.
pub fn build(
    docs: Vec<DocInput>,
    indexed_fields: &[String],
    stop_words: Option<&HashSet<String>>,
) -> Result<IndexState, SearchError> {
    if docs.is_empty() {
        return Err(SearchError::InvalidCorpus);
    }

    let mut documents: Vec<Document> = Vec::with_capacity(docs.len());
    let mut doc_lengths: Vec<u32> = Vec::with_capacity(docs.len());
    // term -> [(doc_id, count), ...]; doc ids land in ascending order for
    // free because documents are processed in id order.
    let mut inverted: HashMap<String, Vec<(u32, u32)>> = HashMap::new();
    // field -> stringified value -> doc ids
    let mut field_buckets: HashMap<String, HashMap<String, Vec<u32>>> = HashMap::new();

    for (idx, input) in docs.into_iter().enumerate() {
        let doc_id = idx as u32;
        let (text, meta) = input.into_parts();

        // Pass one: raw length (pre-stopword) for the length norm, filtered
        // tokens for term statistics.
        let raw_tokens = tokenize(&text, None);
        doc_lengths.push(raw_tokens.len() as u32);

        let filtered_tokens: Vec<String> = match stop_words {
            Some(stops) => raw_tokens.into_iter().filter(|t| !stops.contains(t)).collect(),
            None => raw_tokens,
        };

        let mut term_counts: HashMap<String, u32> = HashMap::new();
        for term in &filtered_tokens {
            *term_counts.entry(term.clone()).or_insert(0) += 1;
        }
        for (term, count) in term_counts {
            inverted.entry(term).or_default().push((doc_id, count));
        }

        for field in indexed_fields {
            if let Some(value) = meta.get(field) {
                for s in value.canonical_strings() {
                    field_buckets
                        .entry(field.clone())
                        .or_default()
                        .entry(s)
                        .or_default()
                        .push(doc_id);
                }
            }
        }

        documents.push(Document {
            id: doc_id,
            text,
            terms: filtered_tokens,
            meta,
        });
    }

    let num_docs = documents.len() as u32;
    let total_len: u64 = doc_lengths.iter().map(|&l| l as u64).sum();
    let avg_doc_len = total_len as f64 / num_docs as f64;

    let norms: Vec<f64> = doc_lengths
        .iter()
        .map(|&l| {
            if avg_doc_len > 0.0 {
                (1.0 - B) + B * (l as f64 / avg_doc_len)
            } else {
                1.0 - B
            }
        })
        .collect();

    // Pass two: sort terms lexicographically, sort each term's postings by
    // doc id, delta-encode into the shared packed array.
    let mut terms_sorted: Vec<String> = inverted.keys().cloned().collect();
    terms_sorted.sort_unstable();

    let mut postings_data: Vec<u32> = Vec::new();
    let mut dictionary: HashMap<String, TermInfo> = HashMap::with_capacity(terms_sorted.len());

    for term in terms_sorted {
        let mut entries = inverted.remove(&term).expect("key came from this map");
        entries.sort_unstable_by_key(|(doc, _)| *doc);

        let df = entries.len() as f64;
        let idf = (((num_docs as f64) - df + 0.5) / (df + 0.5) + 1.0).ln();

        let off = postings_data.len() as u32;
        let mut prev = 0u32;
        for (doc, tf) in &entries {
            postings_data.push(doc - prev);
            postings_data.push(*tf);
            prev = *doc;
        }
        dictionary.insert(
            term,
            TermInfo {
                off,
                len: entries.len() as u32,
                idf,
            },
        );
    }

    let mut field_index: HashMap<String, HashMap<String, Vec<u32>>> = HashMap::new();
    for (field, mut value_map) in field_buckets {
        for ids in value_map.values_mut() {
            ids.sort_unstable();
            ids.dedup();
        }
        field_index.insert(field, value_map);
    }

    Ok(IndexState {
        documents,
        dictionary,
        postings: PostingsStore::new(postings_data),
        norms,
        avg_doc_len,
        field_index,
        indexed_fields: indexed_fields.iter().cloned().collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs(texts: &[&str]) -> Vec<DocInput> {
        texts.iter().map(|t| DocInput::Text(t.to_string())).collect()
    }

    #[test]
    fn rejects_empty_corpus() {
        let result = build(Vec::new(), &[], None);
        assert_eq!(result.unwrap_err(), SearchError::InvalidCorpus);
    }

    #[test]
    fn doc_ids_are_contiguous_from_zero() {
        let state = build(docs(&["a b", "c d", "e f"]), &[], None).unwrap();
        assert_eq!(state.num_docs(), 3);
        for (i, doc) in state.documents.iter().enumerate() {
            assert_eq!(doc.id, i as u32);
        }
    }

    #[test]
    fn postings_are_gap_encoded_and_ascending() {
        let state = build(docs(&["apple", "banana apple", "apple apple"]), &[], None).unwrap();
        let info = state.dictionary.get("apple").unwrap();
        let decoded: Vec<(u32, u32)> = state.postings.entries(info).collect();
        assert_eq!(decoded, vec![(0, 1), (1, 1), (2, 2)]);
    }

    #[test]
    fn length_norm_uses_raw_token_count_not_filtered_count() {
        let stops: HashSet<String> = ["the"].iter().map(|s| s.to_string()).collect();
        let state = build(docs(&["the the the cat"]), &[], Some(&stops)).unwrap();
        // raw length is 4 ("the","the","the","cat"); avg == 4 so norm == 1.0
        assert_eq!(state.avg_doc_len, 4.0);
        assert_eq!(state.norms[0], 1.0);
        // but only "cat" survives into term statistics
        assert_eq!(state.documents[0].terms, vec!["cat".to_string()]);
    }
}
