//! Partitioned facade (C8): one independent sub-index per shard key, each
//! with its own IDF. Generalizes the teacher's sequential `batch.rs` loop
//! into real concurrent dispatch, since `searchMany` and shard disposal both
//! require it.

use std::collections::HashMap;

use futures::future::join_all;

use crate::config::{BuildConfig, SearchConfig};
use crate::document::DocInput;
use crate::error::SearchError;
use crate::handle::Index;
use crate::topk::SearchHit;

/// A corpus bucketed by a caller-supplied shard key, with one [`Index`] per
/// bucket built from the shared configuration.
pub struct Partitioned {
    shards: HashMap<String, Index>,
}

impl Partitioned {
    /// Bucket `docs` by `partition_by`, then build each shard's index
    /// concurrently.
    pub async fn build<F>(
        docs: Vec<DocInput>,
        partition_by: F,
        config: BuildConfig,
    ) -> Result<Self, SearchError>
    where
        F: Fn(&DocInput) -> String,
    {
        let mut buckets: HashMap<String, Vec<DocInput>> = HashMap::new();
        for doc in docs {
            let key = partition_by(&doc);
            buckets.entry(key).or_default().push(doc);
        }

        let builds = buckets.into_iter().map(|(key, bucket_docs)| {
            let config = config.clone();
            async move {
                tracing::debug!(shard = %key, num_docs = bucket_docs.len(), "building shard");
                let index = Index::build(bucket_docs, config).await?;
                tracing::debug!(shard = %key, "shard build complete");
                Ok::<_, SearchError>((key, index))
            }
        });

        let mut shards = HashMap::new();
        for result in join_all(builds).await {
            let (key, index) = result?;
            shards.insert(key, index);
        }

        Ok(Self { shards })
    }

    /// Dispatch to the single shard for `key`; an absent shard yields an
    /// empty result rather than an error.
    pub async fn search_in(
        &self,
        key: &str,
        query: &str,
        config: SearchConfig,
    ) -> Result<Vec<SearchHit>, SearchError> {
        match self.shards.get(key) {
            Some(index) => index.search(query, config).await,
            None => Ok(Vec::new()),
        }
    }

    /// Dispatch concurrently to every present shard among `keys`, each with
    /// its own `config.limit` (not reduced per shard), then concatenate and
    /// re-sort the merged results down to `config.limit`.
    pub async fn search_many(
        &self,
        keys: &[String],
        query: &str,
        config: SearchConfig,
    ) -> Result<Vec<SearchHit>, SearchError> {
        let limit = config.limit;
        let searches = keys.iter().filter_map(|key| {
            let index = self.shards.get(key)?;
            let config = config.clone();
            Some(async move { index.search(query, config).await })
        });

        let mut merged: Vec<SearchHit> = Vec::new();
        for result in join_all(searches).await {
            merged.extend(result?);
        }

        merged.sort_unstable_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.doc_id.cmp(&b.doc_id))
        });
        merged.truncate(limit);
        Ok(merged)
    }

    /// Dispose every shard concurrently.
    pub async fn dispose(&self) {
        join_all(self.shards.values().map(|index| index.dispose())).await;
    }
}
