use super::source::ChunkSource;
use engine_config::settings::StreamSettings;
use engine_core::future::{CoreFuture, Lifecycle, Payload};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, info, warn};

/// Settled value of a streaming operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamSummary {
    pub chunks: u64,
}

/// A running streaming operation: its future, the consumer end of its
/// chunk queue and the producer task.
pub struct StreamingOperation<C, Q: Payload> {
    pub future: CoreFuture<StreamSummary, Q>,
    pub chunks: mpsc::Receiver<C>,
    pub task: JoinHandle<()>,
}

/// Spawns the producer side of a streaming operation.
///
/// The producer sends every chunk from `source` into a queue bounded by
/// `settings.queue_capacity()` and settles the future only after the last
/// send, so a consumer that sees the future done and the queue empty has
/// seen every chunk. Cancelling the future stops production.
pub fn spawn_streaming<C, Q>(
    mut source: Box<dyn ChunkSource<C>>,
    settings: &StreamSettings,
    query_info: Q,
) -> StreamingOperation<C, Q>
where
    C: Send + 'static,
    Q: Payload,
{
    let future = CoreFuture::new(query_info);
    let (tx, rx) = mpsc::channel(settings.queue_capacity());

    let handle = future.clone();
    let token = future.cancellation_token();
    let task = tokio::spawn(async move {
        let operation = handle.id();
        let mut sent = 0u64;

        loop {
            let next = tokio::select! {
                biased;
                _ = token.cancelled() => {
                    debug!(%operation, chunks = sent, "Streaming cancelled, producer stopping");
                    return;
                }
                next = source.next_chunk() => next,
            };

            match next {
                Ok(Some(chunk)) => {
                    let delivered = tokio::select! {
                        biased;
                        _ = token.cancelled() => {
                            debug!(%operation, chunks = sent, "Streaming cancelled, producer stopping");
                            return;
                        }
                        delivered = tx.send(chunk) => delivered,
                    };
                    if delivered.is_err() {
                        debug!(%operation, chunks = sent, "Chunk consumer went away");
                        handle.cancel();
                        return;
                    }
                    sent += 1;
                }
                Ok(None) => {
                    info!(%operation, chunks = sent, "Streaming operation complete");
                    handle.set_success(Some(StreamSummary { chunks: sent }));
                    return;
                }
                Err(cause) => {
                    warn!(%operation, chunks = sent, error = %cause, "Streaming operation failed");
                    handle.set_failure(cause);
                    return;
                }
            }
        }
    });

    StreamingOperation {
        future,
        chunks: rx,
        task,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::source::LazySource;
    use engine_core::{error::OperationError, future::RiakFuture};
    use std::time::Duration;

    fn settings(capacity: usize) -> StreamSettings {
        StreamSettings::builder()
            .queue_capacity(capacity)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_settles_after_last_chunk() {
        let source = LazySource::ready(vec!["a", "b", "c"]);
        let mut op = spawn_streaming(Box::new(source), &settings(4), "q");

        op.task.await.unwrap();
        assert!(op.future.is_success());
        assert_eq!(
            op.future.get().await.unwrap(),
            Some(StreamSummary { chunks: 3 })
        );

        let mut received = Vec::new();
        while let Ok(chunk) = op.chunks.try_recv() {
            received.push(chunk);
        }
        assert_eq!(received, ["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_failure_settles_after_delivered_chunks() {
        struct Failing(u8);

        #[async_trait::async_trait]
        impl ChunkSource<u8> for Failing {
            async fn next_chunk(&mut self) -> Result<Option<u8>, OperationError> {
                if self.0 == 2 {
                    return Err(OperationError::Node {
                        node: "n1".into(),
                        message: "timeout".into(),
                    });
                }
                self.0 += 1;
                Ok(Some(self.0))
            }
        }

        let mut op = spawn_streaming(Box::new(Failing(0)), &settings(4), ());
        op.task.await.unwrap();

        assert!(op.future.is_done());
        assert!(!op.future.is_success());
        assert_eq!(op.chunks.recv().await, Some(1));
        assert_eq!(op.chunks.recv().await, Some(2));
        assert_eq!(op.chunks.recv().await, None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_cancel_stops_production() {
        let source = LazySource::ready((0..100).collect::<Vec<u32>>())
            .with_pace(Duration::from_millis(5));
        let mut op = spawn_streaming(Box::new(source), &settings(1), ());

        assert_eq!(op.chunks.recv().await, Some(0));
        assert!(op.future.cancel());
        op.task.await.unwrap();

        let mut rest = 0;
        while op.chunks.recv().await.is_some() {
            rest += 1;
        }
        assert!(rest < 99);
        assert!(op.future.is_cancelled());
    }

    #[tokio::test]
    async fn test_dropped_consumer_cancels_operation() {
        let source = LazySource::ready(vec![1u8, 2, 3]);
        let op = spawn_streaming(Box::new(source), &settings(1), ());
        let StreamingOperation { future, chunks, task } = op;
        drop(chunks);

        task.await.unwrap();
        assert!(future.is_cancelled());
    }
}
