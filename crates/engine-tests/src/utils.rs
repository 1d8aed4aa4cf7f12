use async_trait::async_trait;
use engine_core::error::OperationError;
use engine_runtime::execution::ChunkSource;
use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

/// Emits `chunks` numbered chunks of `chunk_len` consecutive integers, then
/// fails if `fail_after` is set. Counts how many chunks were produced.
pub struct NumberSource {
    pub chunk_len: usize,
    pub chunks: usize,
    pub fail_after: Option<usize>,
    pub pace: Option<Duration>,
    pub produced: Arc<AtomicUsize>,
}

impl NumberSource {
    pub fn new(chunks: usize, chunk_len: usize) -> Self {
        Self {
            chunk_len,
            chunks,
            fail_after: None,
            pace: None,
            produced: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing_after(mut self, chunks: usize) -> Self {
        self.fail_after = Some(chunks);
        self
    }

    pub fn paced(mut self, pace: Duration) -> Self {
        self.pace = Some(pace);
        self
    }
}

#[async_trait]
impl ChunkSource<Vec<u64>> for NumberSource {
    async fn next_chunk(&mut self) -> Result<Option<Vec<u64>>, OperationError> {
        let n = self.produced.load(Ordering::SeqCst);
        if self.fail_after == Some(n) {
            return Err(OperationError::Node {
                node: "riak@test".into(),
                message: format!("connection reset after {n} chunks"),
            });
        }
        if n == self.chunks {
            return Ok(None);
        }
        if let Some(pace) = self.pace {
            tokio::time::sleep(pace).await;
        }

        let start = (n * self.chunk_len) as u64;
        let chunk = (start..start + self.chunk_len as u64).collect();
        self.produced.fetch_add(1, Ordering::SeqCst);
        Ok(Some(chunk))
    }
}
