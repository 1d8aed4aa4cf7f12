use async_trait::async_trait;
use engine_core::error::OperationError;
use futures::future::BoxFuture;
use std::{collections::VecDeque, future::Future, time::Duration};

/// Produces the chunks of one streaming operation, in order.
#[async_trait]
pub trait ChunkSource<C>: Send {
    /// The next chunk, or `None` once the source is exhausted.
    async fn next_chunk(&mut self) -> Result<Option<C>, OperationError>;
}

/// Source whose chunks are computed in one go on the first pull and then
/// handed out one at a time, optionally paced.
pub struct LazySource<C> {
    load: Option<BoxFuture<'static, Result<Vec<C>, OperationError>>>,
    ready: VecDeque<C>,
    pace: Option<Duration>,
}

impl<C: Send + 'static> LazySource<C> {
    pub fn new(load: impl Future<Output = Result<Vec<C>, OperationError>> + Send + 'static) -> Self {
        Self {
            load: Some(Box::pin(load)),
            ready: VecDeque::new(),
            pace: None,
        }
    }

    pub fn ready(chunks: Vec<C>) -> Self {
        Self {
            load: None,
            ready: chunks.into(),
            pace: None,
        }
    }

    /// Sleeps for `pace` before handing out each chunk.
    pub fn with_pace(mut self, pace: Duration) -> Self {
        self.pace = Some(pace);
        self
    }
}

#[async_trait]
impl<C: Send + 'static> ChunkSource<C> for LazySource<C> {
    async fn next_chunk(&mut self) -> Result<Option<C>, OperationError> {
        if let Some(load) = self.load.take() {
            self.ready = load.await?.into();
        }

        if self.ready.is_empty() {
            return Ok(None);
        }
        if let Some(pace) = self.pace {
            tokio::time::sleep(pace).await;
        }
        Ok(self.ready.pop_front())
    }
}
