//! In-memory full-text search over a fixed document set, ranked with Okapi
//! BM25.
//!
//! # Design philosophy
//!
//! This crate indexes a corpus once and answers ranked top-k queries many
//! times. It focuses on the scoring core: gap-encoded postings packed into
//! one array, a per-term dictionary with pre-computed IDF, per-document
//! length normalizers, and an optional per-field value index for filtering.
//!
//! **Key characteristics:**
//! - In-memory only, immutable once built (no incremental add/remove, no
//!   persistence, no distributed operation — see each module's doc comment
//!   for its own non-goals).
//! - One lazily-spawned background worker per index handle serializes
//!   scoring requests off the caller's async loop.
//! - Optional Rocchio-style relevance feedback and optional partitioning
//!   for per-shard IDF sit on top of the same scorer.
//!
//! # Quick start
//!
//! ```
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), okapi_search::SearchError> {
//! use okapi_search::prelude::*;
//!
//! let docs = vec![
//!     DocInput::from("the quick brown fox jumps over the lazy dog"),
//!     DocInput::from("the lazy dog sleeps all day"),
//! ];
//! let index = Index::build(docs, BuildConfig::default()).await?;
//! let hits = index.search("fox", SearchConfig::default()).await?;
//! assert_eq!(hits[0].doc_id, 0);
//! index.dispose().await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod document;
pub mod error;
pub mod feedback;
pub mod filter;
pub mod handle;
pub mod index;
pub mod meta;
pub mod partition;
pub mod scorer;
pub mod tokenizer;
pub mod topk;
mod worker;

pub use config::{BuildConfig, FeedbackConfig, SearchConfig};
pub use document::{DocInput, Document};
pub use error::SearchError;
pub use filter::Filter;
pub use handle::Index;
pub use index::IndexState;
pub use meta::{MetaPrimitive, MetaValue};
pub use partition::Partitioned;
pub use topk::SearchHit;

/// Re-exports the common set of types a caller needs to build and query an
/// index.
pub mod prelude {
    pub use crate::config::{BuildConfig, FeedbackConfig, SearchConfig};
    pub use crate::document::{DocInput, Document};
    pub use crate::error::SearchError;
    pub use crate::filter::Filter;
    pub use crate::handle::Index;
    pub use crate::meta::{MetaPrimitive, MetaValue};
    pub use crate::partition::Partitioned;
    pub use crate::topk::SearchHit;
}
