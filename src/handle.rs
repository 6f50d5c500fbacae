//! The public `Index` handle: composes the frozen [`IndexState`] with its
//! [`Worker`], the way the teacher's top-level `retrieve_bm25`-style
//! functions are folded here into methods on one owning type.

use std::sync::Arc;

use crate::config::{BuildConfig, FeedbackConfig, SearchConfig};
use crate::document::{DocInput, Document};
use crate::error::SearchError;
use crate::index::{self, IndexState};
use crate::topk::SearchHit;
use crate::worker::Worker;

/// An immutable, queryable BM25 index over a fixed document set.
///
/// Construction is asynchronous ([`Index::build`]); once built, `search`
/// dispatches to a single lazily-spawned background worker ([`Worker`]) that
/// serializes scoring requests. Call [`Index::dispose`] to release it.
pub struct Index {
    state: Arc<IndexState>,
    worker: Worker,
}

impl Index {
    /// Tokenize, invert, and freeze `docs` into a new index. Runs the build
    /// on a blocking thread so the two-pass construction of C3 never
    /// occupies an async worker thread.
    pub async fn build(docs: Vec<DocInput>, config: BuildConfig) -> Result<Self, SearchError> {
        tracing::info!(num_docs = docs.len(), "building index");
        let BuildConfig {
            index_fields,
            stop_words,
        } = config;

        let state = tokio::task::spawn_blocking(move || {
            index::build(docs, &index_fields, stop_words.as_ref())
        })
        .await
        .map_err(|e| SearchError::Internal(format!("build task panicked: {e}")))??;

        tracing::info!(num_docs = state.num_docs(), "index build complete");
        let state = Arc::new(state);
        Ok(Self {
            worker: Worker::new(Arc::clone(&state)),
            state,
        })
    }

    /// Run a ranked top-k query.
    pub async fn search(
        &self,
        query: &str,
        config: SearchConfig,
    ) -> Result<Vec<SearchHit>, SearchError> {
        let SearchConfig {
            limit,
            filter,
            stop_words,
        } = config;
        self.worker
            .search(query.to_string(), limit, filter, stop_words)
            .await
    }

    /// Rocchio-style query expansion layered over `search` (C7).
    ///
    /// Routed through the same `Worker` request channel as `search` (rather
    /// than computed inline against `self.state`) so it participates in
    /// `Worker`'s `Inflight` count: a `dispose` that starts while this call
    /// is in flight drains it before tearing the worker down instead of
    /// racing it from outside the worker's bookkeeping.
    pub async fn search_with_feedback(
        &self,
        query: &str,
        relevant_doc_ids: &[u32],
        config: FeedbackConfig,
    ) -> Result<Vec<SearchHit>, SearchError> {
        self.worker
            .search_with_feedback(
                query.to_string(),
                relevant_doc_ids.to_vec(),
                config,
                None,
                None,
            )
            .await
    }

    /// Idempotent teardown of the background worker.
    pub async fn dispose(&self) {
        self.worker.dispose().await;
    }

    pub fn num_docs(&self) -> usize {
        self.state.num_docs()
    }

    pub fn document(&self, id: u32) -> Option<&Document> {
        self.state.document(id)
    }
}
