//! Bounded top-k selection over a dense score accumulator (C9).

use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// One scored document. Ordering is inverted relative to score (and, among
/// ties, ascending on doc id) so that `BinaryHeap` — a max-heap — surfaces
/// the entry we least want to keep at its peek: the lowest score, and among
/// equal scores the largest doc id, both of which lose under the "ascending
/// doc id wins ties" rule.
#[derive(Debug, Clone, Copy, PartialEq)]
struct HeapKey {
    score: f64,
    doc_id: u32,
}

impl Eq for HeapKey {}

impl PartialOrd for HeapKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match other.score.partial_cmp(&self.score).unwrap_or(Ordering::Equal) {
            Ordering::Equal => self.doc_id.cmp(&other.doc_id),
            ord => ord,
        }
    }
}

/// One ranked search result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchHit {
    pub doc_id: u32,
    pub score: f64,
}

fn cmp_hit_desc(a: &SearchHit, b: &SearchHit) -> Ordering {
    match b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal) {
        Ordering::Equal => a.doc_id.cmp(&b.doc_id),
        ord => ord,
    }
}

/// Select the top `k` `(doc_id, score)` pairs out of `touched`, reading
/// scores from `scores[doc_id]`. Deterministic: ties favor the smaller doc
/// id. If `k >= touched.len()`, every touched doc is returned (a plain sort
/// is cheaper than maintaining a heap of the same size as the input).
pub fn top_k(scores: &[f64], touched: &[u32], k: usize) -> Vec<SearchHit> {
    if k >= touched.len() {
        let mut hits: Vec<SearchHit> = touched
            .iter()
            .map(|&doc_id| SearchHit {
                doc_id,
                score: scores[doc_id as usize],
            })
            .collect();
        hits.sort_unstable_by(cmp_hit_desc);
        return hits;
    }

    let mut heap: BinaryHeap<HeapKey> = BinaryHeap::with_capacity(k + 1);
    for &doc_id in touched {
        let score = scores[doc_id as usize];
        let candidate = HeapKey { score, doc_id };
        if heap.len() < k {
            heap.push(candidate);
        } else if let Some(worst) = heap.peek() {
            // `worst` (the heap's max under this inverted order) is the
            // weakest-surviving key; a candidate that is strictly *less*
            // than it — a higher score, or an equal score with a smaller
            // doc id — displaces it.
            if candidate < *worst {
                heap.pop();
                heap.push(candidate);
            }
        }
    }

    let mut hits: Vec<SearchHit> = heap
        .into_iter()
        .map(|k| SearchHit {
            doc_id: k.doc_id,
            score: k.score,
        })
        .collect();
    hits.sort_unstable_by(cmp_hit_desc);
    hits
}
