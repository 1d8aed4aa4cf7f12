use crate::{
    error::{FutureError, OperationError},
    listener::{Listener, ListenerId, ListenerRegistry},
};
use async_trait::async_trait;
use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

/// Anything that can be handed out by a future. Values are cloned to
/// every caller of `get`.
pub trait Payload: Clone + Send + Sync + 'static {}

impl<T: Clone + Send + Sync + 'static> Payload for T {}

/// Completion state of an operation, independent of its value type.
#[async_trait]
pub trait Lifecycle: Send + Sync {
    /// Requests cancellation of the underlying work. Returns whether the
    /// request took effect; always `false` once the operation has settled.
    fn cancel(&self) -> bool;

    fn is_done(&self) -> bool;

    fn is_cancelled(&self) -> bool;

    fn is_success(&self) -> bool;

    /// The failure cause, if the operation failed.
    fn cause(&self) -> Option<Arc<OperationError>>;

    /// Waits until the operation settles.
    async fn wait(&self);

    /// Waits at most `timeout`. Returns `true` if the operation settled.
    async fn wait_timeout(&self, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, self.wait()).await.is_ok()
    }
}

/// A pending, possibly streaming, operation producing a `T` and tagged
/// with query context `Q`.
#[async_trait]
pub trait RiakFuture<T: Payload, Q: Payload>: Lifecycle {
    /// Command-specific context describing what produced this future.
    /// Available whether the operation succeeded or not.
    fn query_info(&self) -> Q;

    /// Non-blocking read of the outcome; `None` while pending.
    fn try_get(&self) -> Option<Result<Option<T>, FutureError>>;

    /// Waits for settlement and returns the value. `Ok(None)` means the
    /// operation succeeded without a payload.
    async fn get(&self) -> Result<Option<T>, FutureError> {
        loop {
            if let Some(outcome) = self.try_get() {
                return outcome;
            }
            self.wait().await;
        }
    }

    async fn get_timeout(&self, timeout: Duration) -> Result<Option<T>, FutureError> {
        if !self.wait_timeout(timeout).await {
            return Err(FutureError::Timeout(timeout));
        }
        self.get().await
    }

    /// Registers a completion callback. If the future has already settled
    /// the callback runs before this call returns.
    fn add_listener(&self, listener: Listener<T, Q>) -> ListenerId;

    fn remove_listener(&self, id: ListenerId) -> bool;
}

enum Settlement<T> {
    Pending,
    Succeeded(Option<T>),
    Failed(Arc<OperationError>),
    Cancelled,
}

impl<T> Settlement<T> {
    fn label(&self) -> &'static str {
        match self {
            Settlement::Pending => "pending",
            Settlement::Succeeded(_) => "succeeded",
            Settlement::Failed(_) => "failed",
            Settlement::Cancelled => "cancelled",
        }
    }
}

struct Shared<T: Payload, Q: Payload> {
    id: Uuid,
    query_info: Q,
    settlement: Mutex<Settlement<T>>,
    done: watch::Sender<bool>,
    cancel_token: CancellationToken,
    listeners: ListenerRegistry<T, Q>,
}

/// The engine-side future. The execution engine settles it exactly once
/// with `set_success`, `set_failure` or through `cancel`; callers observe
/// it through [`RiakFuture`].
pub struct CoreFuture<T: Payload, Q: Payload> {
    shared: Arc<Shared<T, Q>>,
}

impl<T: Payload, Q: Payload> Clone for CoreFuture<T, Q> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T: Payload, Q: Payload> CoreFuture<T, Q> {
    pub fn new(query_info: Q) -> Self {
        let (done, _) = watch::channel(false);
        Self {
            shared: Arc::new(Shared {
                id: Uuid::new_v4(),
                query_info,
                settlement: Mutex::new(Settlement::Pending),
                done,
                cancel_token: CancellationToken::new(),
                listeners: ListenerRegistry::new(),
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.shared.id
    }

    /// Token cancelled when `cancel` takes effect. Producers watch it to
    /// stop generating work.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.shared.cancel_token.clone()
    }

    pub fn set_success(&self, value: Option<T>) -> bool {
        self.settle(Settlement::Succeeded(value))
    }

    pub fn set_failure(&self, cause: OperationError) -> bool {
        self.settle(Settlement::Failed(Arc::new(cause)))
    }

    pub fn into_shared(self) -> Arc<dyn RiakFuture<T, Q>> {
        Arc::new(self)
    }

    pub fn lifecycle(&self) -> Arc<dyn Lifecycle> {
        Arc::new(self.clone())
    }

    fn settle(&self, outcome: Settlement<T>) -> bool {
        let label = outcome.label();
        {
            let mut settlement = self.settlement();
            if !matches!(*settlement, Settlement::Pending) {
                return false;
            }
            *settlement = outcome;
        }

        debug!(op_id = %self.shared.id, outcome = label, "Operation settled");
        self.shared.done.send_replace(true);
        self.shared.listeners.fire(self);
        true
    }

    fn settlement(&self) -> MutexGuard<'_, Settlement<T>> {
        self.shared
            .settlement
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl<T: Payload, Q: Payload> Lifecycle for CoreFuture<T, Q> {
    fn cancel(&self) -> bool {
        if self.settle(Settlement::Cancelled) {
            self.shared.cancel_token.cancel();
            true
        } else {
            false
        }
    }

    fn is_done(&self) -> bool {
        !matches!(*self.settlement(), Settlement::Pending)
    }

    fn is_cancelled(&self) -> bool {
        matches!(*self.settlement(), Settlement::Cancelled)
    }

    fn is_success(&self) -> bool {
        matches!(*self.settlement(), Settlement::Succeeded(_))
    }

    fn cause(&self) -> Option<Arc<OperationError>> {
        match &*self.settlement() {
            Settlement::Failed(cause) => Some(cause.clone()),
            _ => None,
        }
    }

    async fn wait(&self) {
        let mut done = self.shared.done.subscribe();
        // The sender lives in `shared`, so the channel cannot close under us.
        let _ = done.wait_for(|settled| *settled).await;
    }
}

#[async_trait]
impl<T: Payload, Q: Payload> RiakFuture<T, Q> for CoreFuture<T, Q> {
    fn query_info(&self) -> Q {
        self.shared.query_info.clone()
    }

    fn try_get(&self) -> Option<Result<Option<T>, FutureError>> {
        match &*self.settlement() {
            Settlement::Pending => None,
            Settlement::Succeeded(value) => Some(Ok(value.clone())),
            Settlement::Failed(cause) => Some(Err(FutureError::Failed(cause.clone()))),
            Settlement::Cancelled => Some(Err(FutureError::Cancelled)),
        }
    }

    fn add_listener(&self, listener: Listener<T, Q>) -> ListenerId {
        self.shared.listeners.add(listener, self)
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        self.shared.listeners.remove(id)
    }
}

impl<T: Payload, Q: Payload> fmt::Debug for CoreFuture<T, Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoreFuture")
            .field("id", &self.shared.id)
            .field("state", &self.settlement().label())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Clone, Debug, PartialEq)]
    struct Query(&'static str);

    #[test]
    fn test_settles_only_once() {
        let fut = CoreFuture::<u32, Query>::new(Query("q"));
        assert!(!fut.is_done());
        assert!(fut.try_get().is_none());

        assert!(fut.set_success(Some(7)));
        assert!(!fut.set_failure(OperationError::Unexpected("late".into())));
        assert!(!fut.cancel());

        assert!(fut.is_done());
        assert!(fut.is_success());
        assert!(fut.cause().is_none());
        assert_eq!(fut.try_get().unwrap().unwrap(), Some(7));
    }

    #[tokio::test]
    async fn test_success_without_payload_is_not_a_failure() {
        let fut = CoreFuture::<u32, Query>::new(Query("empty"));
        fut.set_success(None);

        assert!(fut.is_success());
        assert_eq!(fut.get().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_failure_is_observable_without_get() {
        let fut = CoreFuture::<u32, Query>::new(Query("broken"));
        fut.set_failure(OperationError::Node {
            node: "riak@127.0.0.1".into(),
            message: "timeout".into(),
        });

        assert!(fut.is_done());
        assert!(!fut.is_success());
        assert!(matches!(
            fut.cause().as_deref(),
            Some(OperationError::Node { .. })
        ));
        assert_eq!(fut.query_info(), Query("broken"));

        match fut.get().await {
            Err(FutureError::Failed(cause)) => {
                assert_eq!(cause, fut.cause().unwrap());
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_cancel_settles_and_trips_token() {
        let fut = CoreFuture::<u32, Query>::new(Query("c"));
        let token = fut.cancellation_token();

        assert!(fut.cancel());
        assert!(!fut.cancel());
        assert!(fut.is_done());
        assert!(fut.is_cancelled());
        assert!(token.is_cancelled());
        assert!(matches!(fut.get().await, Err(FutureError::Cancelled)));
        assert!(!fut.set_success(Some(1)));
    }

    #[tokio::test]
    async fn test_wait_timeout_and_get_timeout() {
        let fut = CoreFuture::<u32, Query>::new(Query("slow"));

        assert!(!fut.wait_timeout(Duration::from_millis(20)).await);
        assert!(matches!(
            fut.get_timeout(Duration::from_millis(20)).await,
            Err(FutureError::Timeout(_))
        ));

        let producer = fut.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            producer.set_success(Some(3));
        });

        assert!(fut.wait_timeout(Duration::from_secs(5)).await);
        assert_eq!(fut.get_timeout(Duration::from_secs(5)).await.unwrap(), Some(3));
    }

    #[test]
    fn test_listener_before_completion_fires_once() {
        let fut = CoreFuture::<u32, Query>::new(Query("l"));
        let counter = Arc::new(AtomicUsize::new(0));

        let c = counter.clone();
        fut.add_listener(Box::new(move |f| {
            assert!(f.is_done());
            c.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        fut.set_success(Some(1));
        fut.set_success(Some(2));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_listener_after_completion_fires_inline() {
        let fut = CoreFuture::<u32, Query>::new(Query("late"));
        fut.set_success(Some(9));

        let seen = Arc::new(Mutex::new(None));
        let s = seen.clone();
        fut.add_listener(Box::new(move |f| {
            *s.lock().unwrap() = f.try_get().and_then(Result::ok).flatten();
        }));

        assert_eq!(*seen.lock().unwrap(), Some(9));
    }

    #[test]
    fn test_removed_listener_is_skipped() {
        let fut = CoreFuture::<u32, Query>::new(Query("r"));
        let counter = Arc::new(AtomicUsize::new(0));

        let c = counter.clone();
        let id = fut.add_listener(Box::new(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        }));
        assert!(fut.remove_listener(id));
        fut.set_success(None);

        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert!(!fut.remove_listener(id));
    }

    #[test]
    fn test_concurrent_registration_never_misses_or_doubles() {
        const THREADS: usize = 8;
        const PER_THREAD: usize = 200;

        let fut = CoreFuture::<u32, Query>::new(Query("race"));
        let counter = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let fut = fut.clone();
                let counter = counter.clone();
                std::thread::spawn(move || {
                    for _ in 0..PER_THREAD {
                        let c = counter.clone();
                        fut.add_listener(Box::new(move |_| {
                            c.fetch_add(1, Ordering::SeqCst);
                        }));
                    }
                })
            })
            .collect();

        fut.set_success(Some(1));
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(counter.load(Ordering::SeqCst), THREADS * PER_THREAD);
    }
}
