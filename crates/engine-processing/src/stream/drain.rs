use super::{Convert, ExtractContinuation, Fetch};
use crate::error::StreamError;
use engine_core::future::Lifecycle;
use model::pagination::continuation::Continuation;
use std::{iter::Peekable, sync::Arc, time::Duration};
use tokio::{sync::mpsc, time::timeout};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

enum Load<C> {
    Chunk(C),
    Pending,
    Exhausted,
}

/// Shared machinery behind the chunked iterators: the queue, the
/// operation that feeds it, the chunk currently being handed out and the
/// latched continuation.
pub(crate) struct ChunkDrain<C, T>
where
    C: IntoIterator,
{
    chunks: mpsc::Receiver<C>,
    operation: Arc<dyn Lifecycle>,
    poll_timeout: Duration,
    interrupt: CancellationToken,
    convert: Convert<C::Item, T>,
    current: Option<Peekable<C::IntoIter>>,
    extract: Option<ExtractContinuation<C>>,
    continuation: Option<Continuation>,
    closed: bool,
    chunks_loaded: u64,
}

impl<C, T> ChunkDrain<C, T>
where
    C: IntoIterator,
{
    pub(crate) fn new(
        operation: Arc<dyn Lifecycle>,
        chunks: mpsc::Receiver<C>,
        poll_timeout: Duration,
        convert: Convert<C::Item, T>,
    ) -> Self {
        Self {
            chunks,
            operation,
            poll_timeout,
            interrupt: CancellationToken::new(),
            convert,
            current: None,
            extract: None,
            continuation: None,
            closed: false,
            chunks_loaded: 0,
        }
    }

    pub(crate) fn with_interrupt(mut self, interrupt: CancellationToken) -> Self {
        self.interrupt = interrupt;
        self
    }

    pub(crate) fn with_continuation(mut self, extract: ExtractContinuation<C>) -> Self {
        self.extract = Some(extract);
        self
    }

    pub(crate) fn continuation(&self) -> Option<&Continuation> {
        self.continuation.as_ref()
    }

    /// True while the producer may still enqueue chunks or some are
    /// still buffered. A cancelled or failed operation counts as done.
    pub(crate) fn possible_chunks_remaining(&self) -> bool {
        // `is_done` must be read before `is_empty`: the producer enqueues
        // its last chunk before settling.
        !self.closed && (!self.operation.is_done() || !self.chunks.is_empty())
    }

    pub(crate) fn has_next(&mut self) -> bool {
        self.has_buffered() || self.possible_chunks_remaining()
    }

    /// Polls until an element is buffered. Returns `false` once the
    /// operation is done and the queue is drained.
    pub(crate) async fn fill(&mut self) -> Result<bool, StreamError> {
        while !self.has_buffered() {
            match self.poll_once().await? {
                Load::Chunk(chunk) => {
                    self.install(chunk);
                }
                Load::Pending => {}
                Load::Exhausted => return Ok(false),
            }
        }
        Ok(true)
    }

    pub(crate) async fn next(&mut self) -> Result<Option<T>, StreamError> {
        if self.fill().await? {
            return Ok(self.take_buffered());
        }
        self.settled_outcome()?;
        Ok(None)
    }

    /// Like `next`, but polls the queue at most once.
    pub(crate) async fn try_next(&mut self) -> Result<Fetch<T>, StreamError> {
        if !self.has_buffered() {
            match self.poll_once().await? {
                Load::Chunk(chunk) => {
                    if !self.install(chunk) {
                        return Ok(Fetch::Pending);
                    }
                }
                Load::Pending => return Ok(Fetch::Pending),
                Load::Exhausted => {
                    self.settled_outcome()?;
                    return Ok(Fetch::Exhausted);
                }
            }
        }

        Ok(self.take_buffered().map_or(Fetch::Pending, Fetch::Item))
    }

    fn has_buffered(&mut self) -> bool {
        self.current
            .as_mut()
            .is_some_and(|elements| elements.peek().is_some())
    }

    fn take_buffered(&mut self) -> Option<T> {
        let raw = self.current.as_mut()?.next()?;
        Some((self.convert)(raw))
    }

    /// Makes `chunk` the current chunk. Returns whether it has elements.
    fn install(&mut self, chunk: C) -> bool {
        self.latch_continuation(&chunk);

        let mut elements = chunk.into_iter().peekable();
        let populated = elements.peek().is_some();
        self.current = Some(elements);
        self.chunks_loaded += 1;

        debug!(chunk_no = self.chunks_loaded, populated, "Loaded chunk");
        populated
    }

    fn latch_continuation(&mut self, chunk: &C) {
        if self.continuation.is_some() {
            return;
        }
        if let Some(found) = self.extract.as_ref().and_then(|extract| extract(chunk)) {
            debug!(continuation = %found, chunk_no = self.chunks_loaded + 1, "Latched continuation");
            self.continuation = Some(found);
        }
    }

    async fn poll_once(&mut self) -> Result<Load<C>, StreamError> {
        if !self.possible_chunks_remaining() {
            return Ok(Load::Exhausted);
        }

        let polled = tokio::select! {
            biased;
            _ = self.interrupt.cancelled() => {
                debug!("Chunk poll interrupted");
                return Err(StreamError::Interrupted);
            }
            polled = timeout(self.poll_timeout, self.chunks.recv()) => polled,
        };

        match polled {
            Ok(Some(chunk)) => Ok(Load::Chunk(chunk)),
            Ok(None) => {
                debug!(chunks = self.chunks_loaded, "Chunk queue closed by producer");
                self.closed = true;
                Ok(Load::Exhausted)
            }
            Err(_) => {
                trace!(
                    timeout_ms = self.poll_timeout.as_millis() as u64,
                    "No chunk within poll interval"
                );
                Ok(Load::Pending)
            }
        }
    }

    fn settled_outcome(&self) -> Result<(), StreamError> {
        match self.operation.cause() {
            Some(cause) => {
                warn!(chunks = self.chunks_loaded, error = %cause, "Streaming operation failed");
                Err(StreamError::Operation(cause))
            }
            None => Ok(()),
        }
    }
}
