use super::ResponseConverter;
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
use tracing::trace;

/// Presents a `RiakFuture<S, SQ>` as a `RiakFuture<T, TQ>`.
///
/// The adapter registers itself as a listener on the wrapped future. When
/// that future settles the payload is converted (once) and the adapter's
/// own listeners are notified, so an adapter can stand in wherever a
/// future is expected, including under another adapter.
pub struct CoreFutureAdapter<S, T, SQ, TQ, C>
where
    S: Payload,
    T: Payload,
    SQ: Payload,
    TQ: Payload,
    C: ResponseConverter<S, T, SQ, TQ>,
{
    raw: Arc<dyn RiakFuture<S, SQ>>,
    converter: C,
    response: OnceLock<Option<T>>,
    query_info: OnceLock<TQ>,
    listeners: ListenerRegistry<T, TQ>,
}

impl<S, T, SQ, TQ, C> CoreFutureAdapter<S, T, SQ, TQ, C>
where
    S: Payload,
    T: Payload,
    SQ: Payload,
    TQ: Payload,
    C: ResponseConverter<S, T, SQ, TQ>,
{
    pub fn new(raw: Arc<dyn RiakFuture<S, SQ>>, converter: C) -> Arc<Self> {
        let adapter = Arc::new(Self {
            raw,
            converter,
            response: OnceLock::new(),
            query_info: OnceLock::new(),
            listeners: ListenerRegistry::new(),
        });

        let relay = Arc::downgrade(&adapter);
        adapter.raw.add_listener(Box::new(move |raw| {
            if let Some(adapter) = relay.upgrade() {
                adapter.on_raw_settled(raw);
            }
        }));

        adapter
    }

    /// The wrapped future.
    pub fn raw(&self) -> &Arc<dyn RiakFuture<S, SQ>> {
        &self.raw
    }

    fn on_raw_settled(&self, raw: &dyn RiakFuture<S, SQ>) {
        if let Some(Ok(value)) = raw.try_get() {
            self.convert_once(value);
        }
        let notified = self.listeners.fire(self);
        trace!(listeners = notified, "Adapter relayed completion");
    }

    fn convert_once(&self, raw: Option<S>) -> Option<T> {
        self.response
            .get_or_init(|| raw.map(|value| self.converter.convert_response(value)))
            .clone()
    }
}

#[async_trait]
impl<S, T, SQ, TQ, C> Lifecycle for CoreFutureAdapter<S, T, SQ, TQ, C>
where
    S: Payload,
    T: Payload,
    SQ: Payload,
    TQ: Payload,
    C: ResponseConverter<S, T, SQ, TQ>,
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
impl<S, T, SQ, TQ, C> RiakFuture<T, TQ> for CoreFutureAdapter<S, T, SQ, TQ, C>
where
    S: Payload,
    T: Payload,
    SQ: Payload,
    TQ: Payload,
    C: ResponseConverter<S, T, SQ, TQ>,
{
    fn query_info(&self) -> TQ {
        self.query_info
            .get_or_init(|| self.converter.convert_query_info(self.raw.query_info()))
            .clone()
    }

    fn try_get(&self) -> Option<Result<Option<T>, FutureError>> {
        if let Some(converted) = self.response.get() {
            return Some(Ok(converted.clone()));
        }

        match self.raw.try_get()? {
            Ok(value) => Some(Ok(self.convert_once(value))),
            Err(e) => Some(Err(e)),
        }
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
    use crate::adapter::QueryInfoConverter;
    use engine_core::future::CoreFuture;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct SpyConverter {
        responses: Arc<AtomicUsize>,
        query_infos: Arc<AtomicUsize>,
    }

    impl QueryInfoConverter<u32, String> for SpyConverter {
        fn convert_query_info(&self, raw: u32) -> String {
            self.query_infos.fetch_add(1, Ordering::SeqCst);
            format!("query-{raw}")
        }
    }

    impl ResponseConverter<u64, String, u32, String> for SpyConverter {
        fn convert_response(&self, raw: u64) -> String {
            self.responses.fetch_add(1, Ordering::SeqCst);
            format!("value-{raw}")
        }
    }

    fn adapter_over(
        raw: &CoreFuture<u64, u32>,
    ) -> (
        Arc<CoreFutureAdapter<u64, String, u32, String, SpyConverter>>,
        Arc<AtomicUsize>,
    ) {
        let spy = SpyConverter::default();
        let calls = spy.responses.clone();
        (CoreFutureAdapter::new(raw.clone().into_shared(), spy), calls)
    }

    #[tokio::test]
    async fn test_converts_payload_once() {
        let raw = CoreFuture::<u64, u32>::new(5);
        let (adapter, calls) = adapter_over(&raw);

        raw.set_success(Some(42));

        assert_eq!(adapter.get().await.unwrap(), Some("value-42".to_string()));
        assert_eq!(adapter.get().await.unwrap(), Some("value-42".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_null_payload_skips_conversion() {
        let raw = CoreFuture::<u64, u32>::new(5);
        let (adapter, calls) = adapter_over(&raw);

        raw.set_success(None);

        assert!(adapter.is_success());
        assert_eq!(adapter.get().await.unwrap(), None);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failure_passes_through_untouched() {
        let raw = CoreFuture::<u64, u32>::new(9);
        let (adapter, calls) = adapter_over(&raw);

        raw.set_failure(OperationError::NotFound("k".into()));

        assert!(adapter.is_done());
        assert!(!adapter.is_success());
        assert_eq!(adapter.cause(), raw.cause());
        assert!(matches!(adapter.get().await, Err(FutureError::Failed(_))));
        assert_eq!(adapter.query_info(), "query-9");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_lifecycle_mirrors_raw_future() {
        let raw = CoreFuture::<u64, u32>::new(1);
        let (adapter, _) = adapter_over(&raw);

        assert!(!adapter.is_done());
        assert!(!adapter.is_cancelled());
        assert!(!adapter.is_success());
        assert!(adapter.cause().is_none());
        assert!(!adapter.wait_timeout(Duration::from_millis(10)).await);

        assert!(adapter.cancel());
        assert!(raw.is_cancelled());
        assert!(adapter.is_done());
        assert!(adapter.is_cancelled());
        assert!(!adapter.cancel());
        assert!(adapter.wait_timeout(Duration::from_millis(10)).await);
        assert!(matches!(adapter.get().await, Err(FutureError::Cancelled)));
    }

    #[tokio::test]
    async fn test_listeners_fire_after_raw_settles() {
        let raw = CoreFuture::<u64, u32>::new(3);
        let (adapter, _) = adapter_over(&raw);
        let fired = Arc::new(AtomicUsize::new(0));

        let f = fired.clone();
        adapter.add_listener(Box::new(move |settled| {
            let value = settled.try_get().and_then(Result::ok).flatten();
            assert_eq!(value.as_deref(), Some("value-8"));
            f.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        raw.set_success(Some(8));
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        let f = fired.clone();
        adapter.add_listener(Box::new(move |_| {
            f.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(fired.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_wrapping_settled_future() {
        let raw = CoreFuture::<u64, u32>::new(3);
        raw.set_success(Some(1));

        let (adapter, calls) = adapter_over(&raw);
        assert_eq!(calls.load(Ordering::SeqCst), 1, "converted during relay");
        assert_eq!(adapter.try_get().unwrap().unwrap(), Some("value-1".into()));
    }

    #[tokio::test]
    async fn test_adapters_compose() {
        struct Shout;

        impl QueryInfoConverter<String, usize> for Shout {
            fn convert_query_info(&self, raw: String) -> usize {
                raw.len()
            }
        }

        impl ResponseConverter<String, String, String, usize> for Shout {
            fn convert_response(&self, raw: String) -> String {
                raw.to_uppercase()
            }
        }

        let raw = CoreFuture::<u64, u32>::new(12);
        let (inner, _) = adapter_over(&raw);
        let inner: Arc<dyn RiakFuture<String, String>> = inner;
        let outer = CoreFutureAdapter::new(inner, Shout);

        let producer = raw.clone();
        tokio::spawn(async move { producer.set_success(Some(2)) });

        assert_eq!(outer.get().await.unwrap(), Some("VALUE-2".to_string()));
        assert_eq!(outer.query_info(), "query-12".len());
    }
}
