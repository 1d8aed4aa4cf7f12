use engine_core::{
    error::OperationError,
    future::{CoreFuture, Payload},
};
use std::future::Future;
use tracing::{debug, warn};

/// Runs a one-shot node call on a spawned task and settles the returned
/// future with its outcome. Must be called from within a Tokio runtime.
pub fn spawn_single<T, Q, F>(query_info: Q, call: F) -> CoreFuture<T, Q>
where
    T: Payload,
    Q: Payload,
    F: Future<Output = Result<Option<T>, OperationError>> + Send + 'static,
{
    let future = CoreFuture::new(query_info);
    let handle = future.clone();
    let token = future.cancellation_token();

    tokio::spawn(async move {
        let operation = handle.id();
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                debug!(%operation, "Operation cancelled before the node answered");
            }
            outcome = call => match outcome {
                Ok(value) => {
                    handle.set_success(value);
                }
                Err(cause) => {
                    warn!(%operation, error = %cause, "Operation failed");
                    handle.set_failure(cause);
                }
            },
        }
    });

    future
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::{
        error::FutureError,
        future::{Lifecycle, RiakFuture},
    };
    use std::time::Duration;

    #[tokio::test]
    async fn test_success() {
        let future = spawn_single("q", async { Ok(Some(5u32)) });
        assert_eq!(future.get().await.unwrap(), Some(5));
        assert_eq!(future.query_info(), "q");
    }

    #[tokio::test]
    async fn test_failure() {
        let future: CoreFuture<u32, ()> =
            spawn_single((), async { Err(OperationError::NotFound("k".into())) });
        assert!(matches!(future.get().await, Err(FutureError::Failed(_))));
        assert_eq!(
            future.cause().as_deref(),
            Some(&OperationError::NotFound("k".into()))
        );
    }

    #[tokio::test]
    async fn test_cancel_before_answer() {
        let future: CoreFuture<u32, ()> = spawn_single((), async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(Some(1))
        });

        assert!(future.cancel());
        assert!(matches!(future.get().await, Err(FutureError::Cancelled)));
    }
}
