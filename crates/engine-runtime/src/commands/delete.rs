use crate::{execution::spawn_single, node::Node};
use engine_core::future::RiakFuture;
use engine_processing::adapter::SameQueryInfoAdapter;
use model::core::location::Location;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteValueResponse {
    pub location: Location,
}

/// Removes one object. The response is known up front; the returned
/// future still tracks the node call.
#[derive(Debug, Clone)]
pub struct DeleteValue {
    location: Location,
}

impl DeleteValue {
    pub fn new(location: Location) -> Self {
        Self { location }
    }

    pub fn execute(&self, node: &Arc<dyn Node>) -> Arc<dyn RiakFuture<DeleteValueResponse, Location>> {
        let node = node.clone();
        let location = self.location.clone();
        let raw = spawn_single(self.location.clone(), async move {
            node.delete(&location).await.map(Some)
        });

        SameQueryInfoAdapter::same_query_info(
            raw.into_shared(),
            DeleteValueResponse {
                location: self.location.clone(),
            },
        )
    }
}
