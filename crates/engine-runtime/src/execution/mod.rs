//! Stand-in for the cluster-facing execution engine: runs node calls on
//! spawned tasks and settles their futures.

pub mod single;
pub mod source;
pub mod streaming;

pub use single::spawn_single;
pub use source::{ChunkSource, LazySource};
pub use streaming::{StreamSummary, StreamingOperation, spawn_streaming};
