use crate::{execution::spawn_single, node::Node};
use engine_core::future::RiakFuture;
use engine_processing::adapter::{CoreFutureAdapter, QueryInfoConverter, ResponseConverter};
use model::core::{location::Location, object::RiakObject};
use serde::de::DeserializeOwned;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub struct FetchValueResponse {
    pub location: Location,
    pub object: RiakObject,
}

impl FetchValueResponse {
    pub fn value<V: DeserializeOwned>(&self) -> Result<V, serde_json::Error> {
        self.object.decode()
    }
}

struct FetchConverter {
    location: Location,
}

impl QueryInfoConverter<Location, Location> for FetchConverter {
    fn convert_query_info(&self, raw: Location) -> Location {
        raw
    }
}

impl ResponseConverter<RiakObject, FetchValueResponse, Location, Location> for FetchConverter {
    fn convert_response(&self, raw: RiakObject) -> FetchValueResponse {
        FetchValueResponse {
            location: self.location.clone(),
            object: raw,
        }
    }
}

/// Reads one object. A missing key settles successfully with no value.
#[derive(Debug, Clone)]
pub struct FetchValue {
    location: Location,
}

impl FetchValue {
    pub fn new(location: Location) -> Self {
        Self { location }
    }

    pub fn execute(&self, node: &Arc<dyn Node>) -> Arc<dyn RiakFuture<FetchValueResponse, Location>> {
        let node = node.clone();
        let location = self.location.clone();
        let raw = spawn_single(self.location.clone(), async move {
            node.fetch(&location).await
        });

        CoreFutureAdapter::<_, FetchValueResponse, _, Location, _>::new(
            raw.into_shared(),
            FetchConverter {
                location: self.location.clone(),
            },
        )
    }
}
