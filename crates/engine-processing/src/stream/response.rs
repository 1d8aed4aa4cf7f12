use super::{drain::ChunkDrain, Fetch};
use crate::error::StreamError;
use engine_core::future::Lifecycle;
use futures::{stream, Stream};
use model::pagination::continuation::Continuation;
use std::{sync::Arc, time::Duration};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Chunked iterator for paginated queries.
///
/// Construction eagerly waits for the first populated chunk so that the
/// first page is in hand by the time the caller sees the response. The
/// first non-empty continuation seen on any chunk is latched; later ones
/// are ignored.
pub struct ChunkedResponseIterator<C, T>
where
    C: IntoIterator,
{
    drain: ChunkDrain<C, T>,
}

impl<C, T> ChunkedResponseIterator<C, T>
where
    C: IntoIterator + Send + 'static,
    C::IntoIter: Send,
    C::Item: Send,
    T: Send + 'static,
{
    pub async fn new(
        operation: Arc<dyn Lifecycle>,
        chunks: mpsc::Receiver<C>,
        poll_timeout: Duration,
        convert: impl Fn(C::Item) -> T + Send + Sync + 'static,
        extract: impl Fn(&C) -> Option<Continuation> + Send + Sync + 'static,
    ) -> Result<Self, StreamError> {
        Self::new_interruptible(
            operation,
            chunks,
            poll_timeout,
            convert,
            extract,
            CancellationToken::new(),
        )
        .await
    }

    /// Same as [`new`](Self::new), but the eager first load and every later
    /// poll give up with [`StreamError::Interrupted`] once `interrupt` fires.
    pub async fn new_interruptible(
        operation: Arc<dyn Lifecycle>,
        chunks: mpsc::Receiver<C>,
        poll_timeout: Duration,
        convert: impl Fn(C::Item) -> T + Send + Sync + 'static,
        extract: impl Fn(&C) -> Option<Continuation> + Send + Sync + 'static,
        interrupt: CancellationToken,
    ) -> Result<Self, StreamError> {
        let mut drain = ChunkDrain::new(operation, chunks, poll_timeout, Box::new(convert))
            .with_interrupt(interrupt)
            .with_continuation(Box::new(extract));

        drain.fill().await?;
        Ok(Self { drain })
    }

    pub fn has_next(&mut self) -> bool {
        self.drain.has_next()
    }

    pub async fn next(&mut self) -> Result<Option<T>, StreamError> {
        self.drain.next().await
    }

    pub async fn try_next(&mut self) -> Result<Fetch<T>, StreamError> {
        self.drain.try_next().await
    }

    /// True if a continuation was latched, or may still arrive on a chunk
    /// that has not been read yet.
    pub fn has_continuation(&self) -> bool {
        self.drain.continuation().is_some() || self.drain.possible_chunks_remaining()
    }

    /// The latched continuation. Only final once `has_next` is false.
    pub fn continuation(&self) -> Option<&Continuation> {
        self.drain.continuation()
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

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::future::CoreFuture;

    const POLL: Duration = Duration::from_millis(20);

    #[derive(Debug, Clone)]
    struct Page {
        keys: Vec<&'static str>,
        token: Option<&'static str>,
    }

    impl Page {
        fn new(keys: &[&'static str], token: Option<&'static str>) -> Self {
            Self {
                keys: keys.to_vec(),
                token,
            }
        }
    }

    impl IntoIterator for Page {
        type Item = &'static str;
        type IntoIter = std::vec::IntoIter<&'static str>;

        fn into_iter(self) -> Self::IntoIter {
            self.keys.into_iter()
        }
    }

    async fn build(
        op: &CoreFuture<(), ()>,
        rx: mpsc::Receiver<Page>,
        interrupt: CancellationToken,
    ) -> Result<ChunkedResponseIterator<Page, String>, StreamError> {
        ChunkedResponseIterator::new_interruptible(
            op.lifecycle(),
            rx,
            POLL,
            |key: &str| key.to_uppercase(),
            |page: &Page| page.token.map(Continuation::from),
            interrupt,
        )
        .await
    }

    #[tokio::test]
    async fn test_first_continuation_wins() {
        let op = CoreFuture::new(());
        let (tx, rx) = mpsc::channel(4);
        tx.send(Page::new(&["k1"], None)).await.unwrap();
        tx.send(Page::new(&["k2"], Some("tokA"))).await.unwrap();
        tx.send(Page::new(&["k3"], Some("tokB"))).await.unwrap();
        op.set_success(None);

        let mut iter = build(&op, rx, CancellationToken::new()).await.unwrap();
        let mut keys = Vec::new();
        while let Some(key) = iter.next().await.unwrap() {
            keys.push(key);
        }

        assert_eq!(keys, ["K1", "K2", "K3"]);
        assert_eq!(iter.continuation(), Some(&Continuation::from("tokA")));
        assert!(iter.has_continuation());
    }

    #[tokio::test]
    async fn test_construction_loads_first_populated_chunk() {
        let op = CoreFuture::new(());
        let (tx, rx) = mpsc::channel(4);
        tx.send(Page::new(&[], Some("skip-token"))).await.unwrap();
        tx.send(Page::new(&["k1", "k2"], None)).await.unwrap();

        let mut iter = build(&op, rx, CancellationToken::new()).await.unwrap();

        // The empty page was consumed during construction, token included.
        assert_eq!(iter.continuation(), Some(&Continuation::from("skip-token")));
        assert_eq!(iter.try_next().await.unwrap(), Fetch::Item("K1".to_string()));
        assert_eq!(iter.try_next().await.unwrap(), Fetch::Item("K2".to_string()));
        assert!(iter.has_next());
    }

    #[tokio::test]
    async fn test_no_continuation_after_completion() {
        let op = CoreFuture::new(());
        let (tx, rx) = mpsc::channel(4);
        tx.send(Page::new(&["k1"], None)).await.unwrap();

        let mut iter = build(&op, rx, CancellationToken::new()).await.unwrap();
        assert!(iter.has_continuation());

        op.set_success(None);
        assert_eq!(iter.next().await.unwrap().as_deref(), Some("K1"));
        assert_eq!(iter.next().await.unwrap(), None);
        assert!(!iter.has_continuation());
        assert_eq!(iter.continuation(), None);
    }

    #[tokio::test]
    async fn test_empty_result_constructs() {
        let op = CoreFuture::new(());
        let (tx, rx) = mpsc::channel(1);
        drop(tx);
        op.set_success(None);

        let mut iter = build(&op, rx, CancellationToken::new()).await.unwrap();
        assert!(!iter.has_next());
        assert_eq!(iter.next().await.unwrap(), None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_interrupted_construction() {
        let op = CoreFuture::new(());
        let (_tx, rx) = mpsc::channel::<Page>(1);
        let interrupt = CancellationToken::new();

        let trigger = interrupt.clone();
        tokio::spawn(async move {
            tokio::time::sleep(POLL * 3).await;
            trigger.cancel();
        });

        let result = build(&op, rx, interrupt).await;
        assert!(matches!(result, Err(StreamError::Interrupted)));
    }
}
