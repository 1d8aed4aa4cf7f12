use super::QueryInfoConverter;
use async_trait::async_trait;
use engine_core::{
    error::{FutureError, OperationError},
    future::{Lifecycle, Payload, RiakFuture},
    listener::{Listener, ListenerId, ListenerRegistry},
};
use std::{
    sync::{Arc, OnceLock},
    time::Duration,
};

/// Adapter for operations whose user-facing result is known up front.
///
/// `get` returns the supplied value right away. The wrapped future still
/// drives completion status, cancellation and listener notification.
pub struct ImmediateCoreFutureAdapter<S, T, SQ, TQ, C>
where
    S: Payload,
    T: Payload,
    SQ: Payload,
    TQ: Payload,
    C: QueryInfoConverter<SQ, TQ>,
{
    raw: Arc<dyn RiakFuture<S, SQ>>,
    value: T,
    converter: C,
    query_info: OnceLock<TQ>,
    listeners: ListenerRegistry<T, TQ>,
}

/// Query-context converter for adapters that keep the wrapped future's
/// context as is.
#[derive(Debug, Clone, Copy, Default)]
pub struct SameQueryInfo;

impl<Q: Payload> QueryInfoConverter<Q, Q> for SameQueryInfo {
    fn convert_query_info(&self, raw: Q) -> Q {
        raw
    }
}

pub type SameQueryInfoAdapter<S, T, Q> = ImmediateCoreFutureAdapter<S, T, Q, Q, SameQueryInfo>;

impl<S, T, SQ, TQ, C> ImmediateCoreFutureAdapter<S, T, SQ, TQ, C>
where
    S: Payload,
    T: Payload,
    SQ: Payload,
    TQ: Payload,
    C: QueryInfoConverter<SQ, TQ>,
{
    pub fn new(raw: Arc<dyn RiakFuture<S, SQ>>, value: T, converter: C) -> Arc<Self> {
        let adapter = Arc::new(Self {
            raw,
            value,
            converter,
            query_info: OnceLock::new(),
            listeners: ListenerRegistry::new(),
        });

        let relay = Arc::downgrade(&adapter);
        adapter.raw.add_listener(Box::new(move |_| {
            if let Some(adapter) = relay.upgrade() {
                adapter.listeners.fire(&*adapter);
            }
        }));

        adapter
    }

    pub fn raw(&self) -> &Arc<dyn RiakFuture<S, SQ>> {
        &self.raw
    }
}

impl<S, T, Q> ImmediateCoreFutureAdapter<S, T, Q, Q, SameQueryInfo>
where
    S: Payload,
    T: Payload,
    Q: Payload,
{
    pub fn same_query_info(raw: Arc<dyn RiakFuture<S, Q>>, value: T) -> Arc<Self> {
        Self::new(raw, value, SameQueryInfo)
    }
}

#[async_trait]
impl<S, T, SQ, TQ, C> Lifecycle for ImmediateCoreFutureAdapter<S, T, SQ, TQ, C>
where
    S: Payload,
    T: Payload,
    SQ: Payload,
    TQ: Payload,
    C: QueryInfoConverter<SQ, TQ>,
{
    fn cancel(&self) -> bool {
        self.raw.cancel()
    }

    fn is_done(&self) -> bool {
        self.raw.is_done()
    }

    fn is_cancelled(&self) -> bool {
        self.raw.is_cancelled()
    }

    fn is_success(&self) -> bool {
        self.raw.is_success()
    }

    fn cause(&self) -> Option<Arc<OperationError>> {
        self.raw.cause()
    }

    async fn wait(&self) {
        self.raw.wait().await
    }

    async fn wait_timeout(&self, timeout: Duration) -> bool {
        self.raw.wait_timeout(timeout).await
    }
}

#[async_trait]
impl<S, T, SQ, TQ, C> RiakFuture<T, TQ> for ImmediateCoreFutureAdapter<S, T, SQ, TQ, C>
where
    S: Payload,
    T: Payload,
    SQ: Payload,
    TQ: Payload,
    C: QueryInfoConverter<SQ, TQ>,
{
    fn query_info(&self) -> TQ {
        self.query_info
            .get_or_init(|| self.converter.convert_query_info(self.raw.query_info()))
            .clone()
    }

    fn try_get(&self) -> Option<Result<Option<T>, FutureError>> {
        Some(Ok(Some(self.value.clone())))
    }

    async fn get(&self) -> Result<Option<T>, FutureError> {
        Ok(Some(self.value.clone()))
    }

    async fn get_timeout(&self, _timeout: Duration) -> Result<Option<T>, FutureError> {
        Ok(Some(self.value.clone()))
    }

    fn add_listener(&self, listener: Listener<T, TQ>) -> ListenerId {
        self.listeners.add(listener, self)
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::future::CoreFuture;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Label;

    impl QueryInfoConverter<u32, String> for Label {
        fn convert_query_info(&self, raw: u32) -> String {
            format!("#{raw}")
        }
    }

    #[tokio::test]
    async fn test_value_is_available_before_raw_settles() {
        let raw = CoreFuture::<(), u32>::new(4);
        let adapter = ImmediateCoreFutureAdapter::new(raw.clone().into_shared(), "done", Label);

        assert!(!adapter.is_done());
        assert_eq!(adapter.get().await.unwrap(), Some("done"));
        assert_eq!(
            adapter.get_timeout(Duration::from_millis(1)).await.unwrap(),
            Some("done")
        );
        assert_eq!(adapter.query_info(), "#4");
    }

    #[tokio::test]
    async fn test_lifecycle_follows_raw_future() {
        let raw = CoreFuture::<(), u32>::new(4);
        let adapter = SameQueryInfoAdapter::same_query_info(raw.clone().into_shared(), 10u8);
        let fired = Arc::new(AtomicUsize::new(0));

        let f = fired.clone();
        adapter.add_listener(Box::new(move |settled| {
            assert!(settled.is_done());
            f.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert_eq!(adapter.query_info(), 4);

        raw.set_success(None);

        assert!(adapter.is_done());
        assert!(adapter.is_success());
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(adapter.wait_timeout(Duration::from_millis(10)).await);
    }

    #[tokio::test]
    async fn test_cancel_is_delegated() {
        let raw = CoreFuture::<(), u32>::new(1);
        let adapter = SameQueryInfoAdapter::same_query_info(raw.clone().into_shared(), ());

        assert!(adapter.cancel());
        assert!(raw.is_cancelled());
        assert!(adapter.is_cancelled());
        assert_eq!(adapter.get().await.unwrap(), Some(()));
    }
}
