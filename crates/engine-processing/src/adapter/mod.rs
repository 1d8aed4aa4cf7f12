//! Futures that wrap a core future and present its result under a
//! different value type and query context.
//!
//! Adapters never own the lifecycle: cancellation, completion status,
//! failure cause and waiting are all delegated to the wrapped future.
//! Only the value and the query context are converted.

pub mod converting;
pub mod immediate;

pub use converting::CoreFutureAdapter;
pub use immediate::{ImmediateCoreFutureAdapter, SameQueryInfo, SameQueryInfoAdapter};

/// Maps the wrapped future's query context to the adapter's.
pub trait QueryInfoConverter<SQ, TQ>: Send + Sync + 'static {
    fn convert_query_info(&self, raw: SQ) -> TQ;
}

/// Maps the wrapped future's payload to the adapter's. Only called after
/// the wrapped future succeeded with a payload, and never with `None`.
pub trait ResponseConverter<S, T, SQ, TQ>: QueryInfoConverter<SQ, TQ> {
    fn convert_response(&self, raw: S) -> T;
}
