use super::{drain::ChunkDrain, Fetch};
use crate::error::StreamError;
use engine_core::future::Lifecycle;
use futures::{stream, Stream};
use std::{sync::Arc, time::Duration};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Iterates the elements of every chunk a streaming operation pushes into
/// its queue, in arrival order.
///
/// Chunks are loaded lazily: nothing is read from the queue until the
/// first call to [`next`](Self::next) or [`try_next`](Self::try_next).
/// Empty chunks are skipped.
pub struct ChunkedQueueIterator<C, T>
where
    C: IntoIterator,
{
    drain: ChunkDrain<C, T>,
}

impl<C, T> ChunkedQueueIterator<C, T>
where
    C: IntoIterator + Send + 'static,
    C::IntoIter: Send,
    C::Item: Send,
    T: Send + 'static,
{
    pub fn new(
        operation: Arc<dyn Lifecycle>,
        chunks: mpsc::Receiver<C>,
        poll_timeout: Duration,
        convert: impl Fn(C::Item) -> T + Send + Sync + 'static,
    ) -> Self {
        Self {
            drain: ChunkDrain::new(operation, chunks, poll_timeout, Box::new(convert)),
        }
    }

    /// Aborts blocked polls with [`StreamError::Interrupted`] once `interrupt`
    /// is cancelled.
    pub fn with_interrupt(mut self, interrupt: CancellationToken) -> Self {
        self.drain = self.drain.with_interrupt(interrupt);
        self
    }

    /// Non-blocking: true while an element is buffered or the operation may
    /// still deliver chunks.
    pub fn has_next(&mut self) -> bool {
        self.drain.has_next()
    }

    /// Returns the next element, waiting for chunks as needed.
    ///
    /// `Ok(None)` once the operation is done and the queue is drained. If
    /// the operation failed, the failure is returned after the last
    /// buffered element instead of `Ok(None)`.
    pub async fn next(&mut self) -> Result<Option<T>, StreamError> {
        self.drain.next().await
    }

    pub async fn try_next(&mut self) -> Result<Fetch<T>, StreamError> {
        self.drain.try_next().await
    }

    pub fn into_stream(self) -> impl Stream<Item = Result<T, StreamError>> + Send {
        stream::unfold(Some(self), |state| async move {
            let mut iter = state?;
            match iter.next().await {
                Ok(Some(item)) => Some((Ok(item), Some(iter))),
                Ok(None) => None,
                Err(err) => Some((Err(err), None)),
            }
        })
    }
}
