//! In-memory node used by tests and the command line tool.

mod scan;
pub mod seed;

use crate::{
    error::RuntimeError,
    execution::source::{ChunkSource, LazySource},
    node::{IndexScan, Node},
};
use async_trait::async_trait;
use engine_core::error::OperationError;
use model::{
    core::{
        location::{Location, Namespace},
        object::RiakObject,
    },
    records::chunk::{IndexChunk, KeyChunk},
};
use seed::Seed;
use std::{collections::BTreeMap, sync::Arc, time::Duration};
use tokio::sync::RwLock;
use tracing::{debug, info};

pub(crate) type Buckets = BTreeMap<Namespace, BTreeMap<String, RiakObject>>;

pub const DEFAULT_NODE_NAME: &str = "riak@127.0.0.1";

#[derive(Clone)]
pub struct MemoryNode {
    name: Arc<str>,
    buckets: Arc<RwLock<Buckets>>,
    pace: Option<Duration>,
}

impl MemoryNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_buckets(name, Buckets::new())
    }

    fn with_buckets(name: impl Into<String>, buckets: Buckets) -> Self {
        Self {
            name: Arc::from(name.into()),
            buckets: Arc::new(RwLock::new(buckets)),
            pace: None,
        }
    }

    /// Delays every streamed chunk by `pace`.
    pub fn with_pace(mut self, pace: Duration) -> Self {
        self.pace = Some(pace);
        self
    }

    pub fn from_seed(seed: Seed) -> Result<Self, RuntimeError> {
        let name = seed
            .node
            .clone()
            .unwrap_or_else(|| DEFAULT_NODE_NAME.to_string());
        let buckets = seed.into_buckets()?;
        let objects: usize = buckets.values().map(BTreeMap::len).sum();
        info!(node = %name, buckets = buckets.len(), objects, "Seeded in-memory node");

        Ok(Self::with_buckets(name, buckets))
    }

    pub fn from_seed_json(json: &str) -> Result<Self, RuntimeError> {
        let seed: Seed = serde_json::from_str(json)?;
        Self::from_seed(seed)
    }

    pub async fn insert(&self, location: Location, object: RiakObject) {
        let mut buckets = self.buckets.write().await;
        buckets
            .entry(location.namespace().clone())
            .or_default()
            .insert(location.key().to_string(), object);
    }

    pub async fn object_count(&self, namespace: &Namespace) -> usize {
        self.buckets
            .read()
            .await
            .get(namespace)
            .map_or(0, BTreeMap::len)
    }

    fn paced<C: Send + 'static>(&self, source: LazySource<C>) -> Box<dyn ChunkSource<C>> {
        match self.pace {
            Some(pace) => Box::new(source.with_pace(pace)),
            None => Box::new(source),
        }
    }
}

#[async_trait]
impl Node for MemoryNode {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, location: &Location) -> Result<Option<RiakObject>, OperationError> {
        let buckets = self.buckets.read().await;
        let object = buckets
            .get(location.namespace())
            .and_then(|objects| objects.get(location.key()))
            .cloned();
        debug!(%location, found = object.is_some(), "Fetch");
        Ok(object)
    }

    async fn store(&self, location: &Location, object: RiakObject) -> Result<(), OperationError> {
        debug!(%location, bytes = object.size_bytes(), "Store");
        self.insert(location.clone(), object).await;
        Ok(())
    }

    async fn delete(&self, location: &Location) -> Result<bool, OperationError> {
        let mut buckets = self.buckets.write().await;
        let Some(objects) = buckets.get_mut(location.namespace()) else {
            return Ok(false);
        };

        let existed = objects.remove(location.key()).is_some();
        if objects.is_empty() {
            buckets.remove(location.namespace());
        }
        debug!(%location, existed, "Delete");
        Ok(existed)
    }

    fn index_scan(&self, scan: IndexScan) -> Box<dyn ChunkSource<IndexChunk>> {
        let buckets = self.buckets.clone();
        self.paced(LazySource::new(async move {
            let buckets = buckets.read().await;
            scan::index_chunks(&buckets, &scan)
        }))
    }

    fn list_keys(&self, namespace: Namespace, page_size: usize) -> Box<dyn ChunkSource<KeyChunk>> {
        let buckets = self.buckets.clone();
        self.paced(LazySource::new(async move {
            let buckets = buckets.read().await;
            Ok(scan::key_chunks(&buckets, &namespace, page_size))
        }))
    }
}
