use crate::{
    error::RuntimeError,
    execution::{StreamSummary, spawn_streaming},
    node::{IndexScan, Node},
};
use engine_config::settings::StreamSettings;
use engine_core::future::{CoreFuture, Lifecycle, RiakFuture};
use engine_processing::{
    error::StreamError,
    stream::{ChunkedResponseIterator, Fetch},
};
use futures::Stream;
use model::{
    core::{location::Namespace, object::IndexTerm},
    pagination::continuation::Continuation,
    query::index::{IndexQueryInfo, IndexRange},
    records::chunk::{IndexChunk, IndexEntry},
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Secondary index query over one bucket, optionally paginated.
#[derive(Debug, Clone)]
pub struct IndexQuery {
    info: IndexQueryInfo,
    continuation: Option<Continuation>,
    max_results: Option<usize>,
    return_terms: bool,
}

impl IndexQuery {
    pub fn match_term(
        namespace: Namespace,
        index: impl Into<String>,
        term: impl Into<IndexTerm>,
    ) -> Self {
        Self::new(namespace, index, IndexRange::Match(term.into()))
    }

    pub fn range(
        namespace: Namespace,
        index: impl Into<String>,
        start: impl Into<IndexTerm>,
        end: impl Into<IndexTerm>,
    ) -> Self {
        Self::new(
            namespace,
            index,
            IndexRange::Range {
                start: start.into(),
                end: end.into(),
            },
        )
    }

    pub fn new(namespace: Namespace, index: impl Into<String>, range: IndexRange) -> Self {
        Self {
            info: IndexQueryInfo {
                namespace,
                index: index.into(),
                range,
            },
            continuation: None,
            max_results: None,
            return_terms: false,
        }
    }

    /// Resumes after the page that returned `continuation`.
    pub fn with_continuation(mut self, continuation: Option<Continuation>) -> Self {
        self.continuation = continuation;
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = Some(max_results);
        self
    }

    pub fn with_return_terms(mut self, return_terms: bool) -> Self {
        self.return_terms = return_terms;
        self
    }

    pub fn info(&self) -> &IndexQueryInfo {
        &self.info
    }

    pub async fn execute(
        &self,
        node: &Arc<dyn Node>,
        settings: &StreamSettings,
    ) -> Result<IndexQueryResponse, RuntimeError> {
        self.execute_interruptible(node, settings, CancellationToken::new())
            .await
    }

    /// Starts the query and waits for its first page. Waits on the
    /// result stream give up once `interrupt` is cancelled.
    pub async fn execute_interruptible(
        &self,
        node: &Arc<dyn Node>,
        settings: &StreamSettings,
        interrupt: CancellationToken,
    ) -> Result<IndexQueryResponse, RuntimeError> {
        let scan = IndexScan {
            query: self.info.clone(),
            continuation: self.continuation.clone(),
            max_results: self.max_results.or(settings.max_results()),
            return_terms: self.return_terms,
            page_size: settings.page_size(),
        };
        debug!(query = %self.info, node = node.name(), max_results = ?scan.max_results, "Starting index query");

        let operation = spawn_streaming(node.index_scan(scan), settings, self.info.clone());
        let handle = operation.future;

        let entries = ChunkedResponseIterator::new_interruptible(
            handle.lifecycle(),
            operation.chunks,
            settings.poll_timeout(),
            |entry: IndexEntry| entry,
            |chunk: &IndexChunk| chunk.continuation().cloned(),
            interrupt,
        )
        .await;

        match entries {
            Ok(entries) => Ok(IndexQueryResponse { handle, entries }),
            Err(err) => {
                handle.cancel();
                Err(err.into())
            }
        }
    }
}

/// Streamed result of an [`IndexQuery`].
pub struct IndexQueryResponse {
    handle: CoreFuture<StreamSummary, IndexQueryInfo>,
    entries: ChunkedResponseIterator<IndexChunk, IndexEntry>,
}

impl IndexQueryResponse {
    /// The query's own future; it settles once the last chunk is queued.
    pub fn handle(&self) -> Arc<dyn RiakFuture<StreamSummary, IndexQueryInfo>> {
        self.handle.clone().into_shared()
    }

    pub fn query_info(&self) -> IndexQueryInfo {
        self.handle.query_info()
    }

    /// Stops the query. Entries already queued are still returned.
    pub fn cancel(&self) -> bool {
        self.handle.cancel()
    }

    pub fn has_next(&mut self) -> bool {
        self.entries.has_next()
    }

    pub async fn next(&mut self) -> Result<Option<IndexEntry>, StreamError> {
        self.entries.next().await
    }

    pub async fn try_next(&mut self) -> Result<Fetch<IndexEntry>, StreamError> {
        self.entries.try_next().await
    }

    pub fn has_continuation(&self) -> bool {
        self.entries.has_continuation()
    }

    pub fn continuation(&self) -> Option<&Continuation> {
        self.entries.continuation()
    }

    pub fn into_stream(self) -> impl Stream<Item = Result<IndexEntry, StreamError>> + Send {
        self.entries.into_stream()
    }
}
