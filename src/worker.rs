//! Background worker runtime (C6).
//!
//! Each index handle lazily spawns exactly one `tokio` task that owns the
//! frozen [`IndexState`] and serializes scoring requests from an `mpsc`
//! channel. The handle communicates lifecycle and cancellation through a
//! `Notify`-based dispose signal that every suspension point races against,
//! following the `select`-over-`Notify` pattern the rest of the async
//! example corpus uses for cooperative cancellation.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::{mpsc, oneshot, Mutex, Notify};
use tokio::time::timeout;

use crate::error::SearchError;
use crate::feedback::{self, FeedbackConfig};
use crate::filter::Filter;
use crate::index::IndexState;
use crate::scorer;
use crate::topk::SearchHit;

const SPAWN_TIMEOUT: Duration = Duration::from_secs(10);
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);
const REPLY_TIMEOUT: Duration = Duration::from_secs(30);
const SHUTDOWN_ACK_TIMEOUT: Duration = Duration::from_secs(5);
const REQUEST_CHANNEL_CAPACITY: usize = 64;

type Reply = oneshot::Sender<Result<Vec<SearchHit>, SearchError>>;

pub(crate) struct ScoreRequest {
    query: String,
    limit: usize,
    filter: Option<Filter>,
    stop_words: Option<HashSet<String>>,
    reply: Reply,
}

pub(crate) struct FeedbackRequest {
    query: String,
    relevant_doc_ids: Vec<u32>,
    config: FeedbackConfig,
    filter: Option<Filter>,
    stop_words: Option<HashSet<String>>,
    reply: Reply,
}

enum Command {
    Score(ScoreRequest),
    Feedback(FeedbackRequest),
    Shutdown(oneshot::Sender<()>),
}

type SpawnResult = Result<mpsc::Sender<Command>, SearchError>;
type SpawnFuture = Shared<BoxFuture<'static, SpawnResult>>;

enum Lifecycle {
    NotSpawned,
    Spawning(SpawnFuture),
    Running(mpsc::Sender<Command>),
    Disposing,
    Disposed,
}

/// Tracks in-flight requests so `dispose` can drain them before tearing
/// the worker down.
struct Inflight {
    count: AtomicUsize,
    drained: Notify,
}

impl Inflight {
    fn new() -> Self {
        Self {
            count: AtomicUsize::new(0),
            drained: Notify::new(),
        }
    }

    fn enter(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }

    fn exit(&self) {
        if self.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.drained.notify_waiters();
        }
    }

    async fn wait_drained(&self) {
        loop {
            let notified = self.drained.notified();
            tokio::pin!(notified);
            if self.count.load(Ordering::SeqCst) == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// One background execution context per index handle.
pub(crate) struct Worker {
    state: Arc<IndexState>,
    lifecycle: Mutex<Lifecycle>,
    dispose_signal: Notify,
    dispose_started: AtomicBool,
    inflight: Inflight,
}

impl Worker {
    pub(crate) fn new(state: Arc<IndexState>) -> Self {
        Self {
            state,
            lifecycle: Mutex::new(Lifecycle::NotSpawned),
            dispose_signal: Notify::new(),
            dispose_started: AtomicBool::new(false),
            inflight: Inflight::new(),
        }
    }

    /// Submit one scoring request, spawning the worker on first use.
    pub(crate) async fn search(
        &self,
        query: String,
        limit: usize,
        filter: Option<Filter>,
        stop_words: Option<HashSet<String>>,
    ) -> Result<Vec<SearchHit>, SearchError> {
        self.submit(|reply| {
            Command::Score(ScoreRequest {
                query,
                limit,
                filter,
                stop_words,
                reply,
            })
        })
        .await
    }

    /// Submit one relevance-feedback request. Routed through the same
    /// request channel and `Inflight` bracketing as [`Worker::search`] so
    /// that `dispose` waits for it like any other submitted query, even
    /// though the expansion itself (C7) is computed inline in the worker
    /// loop rather than delegated further.
    pub(crate) async fn search_with_feedback(
        &self,
        query: String,
        relevant_doc_ids: Vec<u32>,
        config: FeedbackConfig,
        filter: Option<Filter>,
        stop_words: Option<HashSet<String>>,
    ) -> Result<Vec<SearchHit>, SearchError> {
        self.submit(|reply| {
            Command::Feedback(FeedbackRequest {
                query,
                relevant_doc_ids,
                config,
                filter,
                stop_words,
                reply,
            })
        })
        .await
    }

    /// Shared submission path: brackets the request with `Inflight`
    /// tracking, lazily spawns the worker, sends `make(reply)` over its
    /// request channel, and races the reply against both the dispose
    /// signal and the per-request timeout.
    async fn submit(
        &self,
        make: impl FnOnce(Reply) -> Command,
    ) -> Result<Vec<SearchHit>, SearchError> {
        if self.dispose_started.load(Ordering::SeqCst) {
            return Err(SearchError::Disposed);
        }

        self.inflight.enter();
        let result = self.submit_inner(make).await;
        self.inflight.exit();
        result
    }

    async fn submit_inner(
        &self,
        make: impl FnOnce(Reply) -> Command,
    ) -> Result<Vec<SearchHit>, SearchError> {
        let tx = self.ensure_spawned().await?;

        let (reply_tx, reply_rx) = oneshot::channel();
        if tx.send(make(reply_tx)).await.is_err() {
            return Err(SearchError::Disposed);
        }

        let dispose_notified = self.dispose_signal.notified();
        tokio::pin!(dispose_notified);
        if self.dispose_started.load(Ordering::SeqCst) {
            return Err(SearchError::Cancelled);
        }

        tokio::select! {
            reply = reply_rx => match reply {
                Ok(inner) => inner,
                Err(_) => Err(SearchError::Internal("worker reply channel closed without a reply".to_string())),
            },
            _ = &mut dispose_notified => Err(SearchError::Cancelled),
            _ = tokio::time::sleep(REPLY_TIMEOUT) => Err(SearchError::WorkerTimeout("reply".to_string())),
        }
        // `reply_rx` is dropped here, closing the reply channel on the
        // caller side whether or not the worker's send arrived first.
    }

    /// Lazily spawn the worker, or return the handle to the one already
    /// running. Concurrent callers share a single spawn future.
    async fn ensure_spawned(&self) -> Result<mpsc::Sender<Command>, SearchError> {
        let mut lifecycle = self.lifecycle.lock().await;
        match &*lifecycle {
            Lifecycle::Disposing | Lifecycle::Disposed => return Err(SearchError::Disposed),
            Lifecycle::Running(tx) => return Ok(tx.clone()),
            Lifecycle::Spawning(fut) => {
                let fut = fut.clone();
                drop(lifecycle);
                return self.race_dispose(fut).await;
            }
            Lifecycle::NotSpawned => {}
        }

        let state = Arc::clone(&self.state);
        let fut: SpawnFuture = spawn_with_budget(state).boxed().shared();
        *lifecycle = Lifecycle::Spawning(fut.clone());
        drop(lifecycle);

        let result = self.race_dispose(fut).await;

        let mut lifecycle = self.lifecycle.lock().await;
        if matches!(&*lifecycle, Lifecycle::Spawning(_)) {
            *lifecycle = match &result {
                Ok(tx) => Lifecycle::Running(tx.clone()),
                Err(_) => Lifecycle::NotSpawned,
            };
        }
        result
    }

    async fn race_dispose(&self, fut: SpawnFuture) -> Result<mpsc::Sender<Command>, SearchError> {
        let dispose_notified = self.dispose_signal.notified();
        tokio::pin!(dispose_notified);
        if self.dispose_started.load(Ordering::SeqCst) {
            return Err(SearchError::Cancelled);
        }
        tokio::select! {
            res = fut => res,
            _ = &mut dispose_notified => Err(SearchError::Cancelled),
        }
    }

    /// Idempotent: a second call observes `dispose_started` already set and
    /// returns immediately without waiting on the first call's teardown.
    pub(crate) async fn dispose(&self) {
        if self.dispose_started.swap(true, Ordering::SeqCst) {
            return;
        }
        tracing::debug!("dispose: signalling cancellation to in-flight operations");
        self.dispose_signal.notify_waiters();

        self.inflight.wait_drained().await;
        tracing::debug!("dispose: all submitted requests drained");

        let mut lifecycle = self.lifecycle.lock().await;
        let prior = std::mem::replace(&mut *lifecycle, Lifecycle::Disposing);
        drop(lifecycle);

        if let Lifecycle::Running(tx) = prior {
            let (ack_tx, ack_rx) = oneshot::channel();
            if tx.send(Command::Shutdown(ack_tx)).await.is_ok() {
                if timeout(SHUTDOWN_ACK_TIMEOUT, ack_rx).await.is_err() {
                    tracing::debug!("dispose: shutdown ack timed out");
                }
            }
        }

        *self.lifecycle.lock().await = Lifecycle::Disposed;
        tracing::info!("dispose: worker torn down");
    }
}

async fn spawn_with_budget(state: Arc<IndexState>) -> SpawnResult {
    match timeout(SPAWN_TIMEOUT, spawn_and_handshake(state)).await {
        Ok(inner) => inner,
        Err(_) => Err(SearchError::WorkerTimeout("spawn".to_string())),
    }
}

async fn spawn_and_handshake(state: Arc<IndexState>) -> SpawnResult {
    let (init_tx, init_rx) = oneshot::channel();
    tokio::spawn(async move {
        let (tx, rx) = mpsc::channel::<Command>(REQUEST_CHANNEL_CAPACITY);
        if init_tx.send(tx).is_err() {
            return;
        }
        tracing::debug!("worker: handshake complete, entering request loop");
        run(state, rx).await;
    });

    match timeout(HANDSHAKE_TIMEOUT, init_rx).await {
        Ok(Ok(tx)) => Ok(tx),
        Ok(Err(_)) => Err(SearchError::WorkerTimeout("handshake".to_string())),
        Err(_) => Err(SearchError::WorkerTimeout("handshake".to_string())),
    }
}

async fn run(state: Arc<IndexState>, mut rx: mpsc::Receiver<Command>) {
    while let Some(cmd) = rx.recv().await {
        match cmd {
            Command::Score(req) => {
                let result = scorer::search(
                    &state,
                    &req.query,
                    req.limit,
                    req.filter.as_ref(),
                    req.stop_words.as_ref(),
                );
                let _ = req.reply.send(result);
            }
            Command::Feedback(req) => {
                let result = feedback::search_with_feedback(
                    &state,
                    &req.query,
                    &req.relevant_doc_ids,
                    req.config,
                    req.filter.as_ref(),
                    req.stop_words.as_ref(),
                );
                let _ = req.reply.send(result);
            }
            Command::Shutdown(ack) => {
                let _ = ack.send(());
                break;
            }
        }
    }
    tracing::debug!("worker: request loop exited");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocInput;
    use crate::index::build;

    fn sample_state() -> Arc<IndexState> {
        let docs = vec![
            DocInput::Text("the quick brown fox".to_string()),
            DocInput::Text("the lazy dog sleeps".to_string()),
        ];
        Arc::new(build(docs, &[], None).unwrap())
    }

    #[tokio::test]
    async fn search_spawns_lazily_and_returns_results() {
        let worker = Worker::new(sample_state());
        let hits = worker
            .search("fox".to_string(), 10, None, None)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].doc_id, 0);
    }

    #[tokio::test]
    async fn concurrent_searches_share_one_spawn() {
        let worker = Arc::new(Worker::new(sample_state()));
        let mut handles = Vec::new();
        for _ in 0..8 {
            let worker = Arc::clone(&worker);
            handles.push(tokio::spawn(async move {
                worker.search("dog".to_string(), 10, None, None).await
            }));
        }
        for h in handles {
            let hits = h.await.unwrap().unwrap();
            assert_eq!(hits.len(), 1);
            assert_eq!(hits[0].doc_id, 1);
        }
    }

    #[tokio::test]
    async fn dispose_is_idempotent() {
        let worker = Worker::new(sample_state());
        worker.dispose().await;
        worker.dispose().await;
    }

    #[tokio::test]
    async fn search_after_dispose_fails() {
        let worker = Worker::new(sample_state());
        worker.dispose().await;
        let err = worker
            .search("fox".to_string(), 10, None, None)
            .await
            .unwrap_err();
        assert_eq!(err, SearchError::Disposed);
    }

    #[tokio::test]
    async fn dispose_drains_in_flight_requests() {
        let worker = Arc::new(Worker::new(sample_state()));
        let mut handles = Vec::new();
        for _ in 0..50 {
            let worker = Arc::clone(&worker);
            handles.push(tokio::spawn(async move {
                worker.search("fox".to_string(), 10, None, None).await
            }));
        }
        worker.dispose().await;
        for h in handles {
            // Every future completes: either with a result or Cancelled.
            let outcome = h.await.unwrap();
            match outcome {
                Ok(_) => {}
                Err(SearchError::Cancelled) | Err(SearchError::Disposed) => {}
                Err(other) => panic!("unexpected error after dispose: {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn search_with_feedback_is_routed_through_the_same_channel() {
        let worker = Worker::new(sample_state());
        let hits = worker
            .search_with_feedback("fox".to_string(), Vec::new(), FeedbackConfig::default(), None, None)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].doc_id, 0);
    }

    /// `dispose` must wait for a `search_with_feedback` call the same way it
    /// waits for a plain `search`, since both are bracketed by `Inflight`.
    #[tokio::test]
    async fn dispose_drains_in_flight_feedback_requests() {
        let worker = Arc::new(Worker::new(sample_state()));
        let mut handles = Vec::new();
        for _ in 0..50 {
            let worker = Arc::clone(&worker);
            handles.push(tokio::spawn(async move {
                worker
                    .search_with_feedback(
                        "fox".to_string(),
                        Vec::new(),
                        FeedbackConfig::default(),
                        None,
                        None,
                    )
                    .await
            }));
        }
        worker.dispose().await;
        for h in handles {
            let outcome = h.await.unwrap();
            match outcome {
                Ok(_) => {}
                Err(SearchError::Cancelled) | Err(SearchError::Disposed) => {}
                Err(other) => panic!("unexpected error after dispose: {other:?}"),
            }
        }
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::document::DocInput;
    use crate::index::build;
    use proptest::prelude::*;

    fn sample_state() -> Arc<IndexState> {
        let docs = vec![DocInput::Text("the quick brown fox".to_string())];
        Arc::new(build(docs, &[], None).unwrap())
    }

    proptest! {
        /// `dispose` is idempotent for any number of repeated calls: every
        /// call returns, and every call after the first observes the same
        /// already-disposed state rather than re-running teardown.
        #[test]
        fn dispose_is_idempotent_for_any_call_count(calls in 1usize..6) {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            let err = rt.block_on(async {
                let worker = Worker::new(sample_state());
                for _ in 0..calls {
                    worker.dispose().await;
                }
                worker.search("fox".to_string(), 10, None, None).await.unwrap_err()
            });
            prop_assert_eq!(err, SearchError::Disposed);
        }
    }
}
