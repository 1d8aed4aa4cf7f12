use crate::{execution::spawn_single, node::Node};
use engine_core::future::RiakFuture;
use engine_processing::adapter::{CoreFutureAdapter, QueryInfoConverter, ResponseConverter};
use model::core::{location::Location, object::RiakObject};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub struct StoreValueResponse {
    pub location: Location,
    /// The stored object as read back, when the body was requested.
    pub object: Option<RiakObject>,
}

struct StoreConverter {
    location: Location,
}

impl QueryInfoConverter<Location, Location> for StoreConverter {
    fn convert_query_info(&self, raw: Location) -> Location {
        raw
    }
}

impl ResponseConverter<Option<RiakObject>, StoreValueResponse, Location, Location>
    for StoreConverter
{
    fn convert_response(&self, raw: Option<RiakObject>) -> StoreValueResponse {
        StoreValueResponse {
            location: self.location.clone(),
            object: raw,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StoreValue {
    location: Location,
    object: RiakObject,
    return_body: bool,
}

impl StoreValue {
    pub fn new(location: Location, object: RiakObject) -> Self {
        Self {
            location,
            object,
            return_body: false,
        }
    }

    pub fn with_return_body(mut self, return_body: bool) -> Self {
        self.return_body = return_body;
        self
    }

    pub fn execute(&self, node: &Arc<dyn Node>) -> Arc<dyn RiakFuture<StoreValueResponse, Location>> {
        let node = node.clone();
        let location = self.location.clone();
        let object = self.object.clone();
        let return_body = self.return_body;

        let raw = spawn_single(self.location.clone(), async move {
            node.store(&location, object).await?;
            if return_body {
                node.fetch(&location).await.map(Some)
            } else {
                Ok(Some(None))
            }
        });

        CoreFutureAdapter::<_, StoreValueResponse, _, Location, _>::new(
            raw.into_shared(),
            StoreConverter {
                location: self.location.clone(),
            },
        )
    }
}
