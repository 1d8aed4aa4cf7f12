//! Pull-based iteration over results that a streaming operation delivers
//! in chunks through a shared queue.
//!
//! The producer side (the execution engine) pushes chunks into a bounded
//! `mpsc` channel and settles the operation's future only after the last
//! chunk has been sent. The consumer drains chunks at its own pace; the
//! chunk boundaries are invisible to it.

mod drain;
pub mod queue;
pub mod response;

pub use queue::ChunkedQueueIterator;
pub use response::ChunkedResponseIterator;

/// Outcome of a single bounded attempt to produce the next element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetch<T> {
    Item(T),
    /// Nothing arrived within one poll interval; more may still come.
    Pending,
    /// The operation is done and every buffered element was returned.
    Exhausted,
}

impl<T> Fetch<T> {
    pub fn into_item(self) -> Option<T> {
        match self {
            Fetch::Item(item) => Some(item),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Fetch::Pending)
    }
}

/// Element conversion applied to every raw element before it is returned.
pub type Convert<R, T> = Box<dyn Fn(R) -> T + Send + Sync>;

/// Pulls a continuation out of a chunk, if the chunk carries one.
pub type ExtractContinuation<C> =
    Box<dyn Fn(&C) -> Option<model::pagination::continuation::Continuation> + Send + Sync>;
