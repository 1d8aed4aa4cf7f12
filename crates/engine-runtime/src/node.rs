use crate::execution::source::ChunkSource;
use async_trait::async_trait;
use engine_core::error::OperationError;
use model::{
    core::{
        location::{Location, Namespace},
        object::RiakObject,
    },
    pagination::continuation::Continuation,
    query::index::IndexQueryInfo,
    records::chunk::{IndexChunk, KeyChunk},
};

/// Secondary index holding every object's key as a binary term.
pub const KEY_INDEX: &str = "$key";
/// Secondary index matching every object in a bucket by bucket name.
pub const BUCKET_INDEX: &str = "$bucket";

/// Parameters of one paginated index scan.
#[derive(Debug, Clone)]
pub struct IndexScan {
    pub query: IndexQueryInfo,
    pub continuation: Option<Continuation>,
    pub max_results: Option<usize>,
    pub return_terms: bool,
    pub page_size: usize,
}

/// A storage node that commands run against.
///
/// Streaming calls return a [`ChunkSource`] right away; failures such as an
/// unreadable continuation surface when the source is first pulled.
#[async_trait]
pub trait Node: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch(&self, location: &Location) -> Result<Option<RiakObject>, OperationError>;

    async fn store(&self, location: &Location, object: RiakObject) -> Result<(), OperationError>;

    /// Returns whether the object existed.
    async fn delete(&self, location: &Location) -> Result<bool, OperationError>;

    fn index_scan(&self, scan: IndexScan) -> Box<dyn ChunkSource<IndexChunk>>;

    fn list_keys(&self, namespace: Namespace, page_size: usize) -> Box<dyn ChunkSource<KeyChunk>>;
}
