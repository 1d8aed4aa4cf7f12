use crate::{
    execution::{StreamSummary, spawn_streaming},
    node::Node,
};
use engine_config::settings::StreamSettings;
use engine_core::future::{CoreFuture, Lifecycle, RiakFuture};
use engine_processing::{
    error::StreamError,
    stream::{ChunkedQueueIterator, Fetch},
};
use futures::Stream;
use model::{core::location::Namespace, records::chunk::KeyChunk};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Lists every key in a bucket. Expensive on a real cluster: it reads
/// the whole bucket.
#[derive(Debug, Clone)]
pub struct ListKeys {
    namespace: Namespace,
}

impl ListKeys {
    pub fn new(namespace: Namespace) -> Self {
        Self { namespace }
    }

    pub fn execute(&self, node: &Arc<dyn Node>, settings: &StreamSettings) -> ListKeysResponse {
        self.execute_interruptible(node, settings, CancellationToken::new())
    }

    pub fn execute_interruptible(
        &self,
        node: &Arc<dyn Node>,
        settings: &StreamSettings,
        interrupt: CancellationToken,
    ) -> ListKeysResponse {
        debug!(namespace = %self.namespace, node = node.name(), "Starting key listing");
        let source = node.list_keys(self.namespace.clone(), settings.page_size());
        let operation = spawn_streaming(source, settings, self.namespace.clone());

        let keys = ChunkedQueueIterator::new(
            operation.future.lifecycle(),
            operation.chunks,
            settings.poll_timeout(),
            |key: String| key,
        )
        .with_interrupt(interrupt);

        ListKeysResponse {
            handle: operation.future,
            keys,
        }
    }
}

pub struct ListKeysResponse {
    handle: CoreFuture<StreamSummary, Namespace>,
    keys: ChunkedQueueIterator<KeyChunk, String>,
}

impl ListKeysResponse {
    pub fn handle(&self) -> Arc<dyn RiakFuture<StreamSummary, Namespace>> {
        self.handle.clone().into_shared()
    }

    pub fn cancel(&self) -> bool {
        self.handle.cancel()
    }

    pub fn has_next(&mut self) -> bool {
        self.keys.has_next()
    }

    pub async fn next(&mut self) -> Result<Option<String>, StreamError> {
        self.keys.next().await
    }

    pub async fn try_next(&mut self) -> Result<Fetch<String>, StreamError> {
        self.keys.try_next().await
    }

    pub fn into_stream(self) -> impl Stream<Item = Result<String, StreamError>> + Send {
        self.keys.into_stream()
    }
}
