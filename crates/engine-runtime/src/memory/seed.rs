use super::Buckets;
use crate::error::RuntimeError;
use model::core::{
    location::{DEFAULT_BUCKET_TYPE, Namespace},
    object::{IndexTerm, RiakObject},
};
use serde::Deserialize;
use std::collections::BTreeMap;

/// Initial contents of an in-memory node, usually read from a JSON file.
///
/// ```json
/// {
///   "node": "riak@127.0.0.1",
///   "buckets": [{
///     "bucket": "users",
///     "objects": {
///       "alice": { "value": { "age": 31 }, "indexes": { "age_int": [31] } }
///     }
///   }]
/// }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Seed {
    #[serde(default)]
    pub node: Option<String>,
    #[serde(default)]
    pub buckets: Vec<SeedBucket>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedBucket {
    #[serde(default)]
    pub bucket_type: Option<String>,
    pub bucket: String,
    #[serde(default)]
    pub objects: BTreeMap<String, SeedObject>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedObject {
    pub value: serde_json::Value,
    #[serde(default)]
    pub indexes: BTreeMap<String, Vec<IndexTerm>>,
}

impl Seed {
    pub(super) fn into_buckets(self) -> Result<Buckets, RuntimeError> {
        let mut buckets = Buckets::new();
        for bucket in self.buckets {
            let namespace = Namespace::new(
                bucket
                    .bucket_type
                    .unwrap_or_else(|| DEFAULT_BUCKET_TYPE.to_string()),
                bucket.bucket,
            );
            let objects = buckets.entry(namespace).or_default();

            for (key, seeded) in bucket.objects {
                let mut object = RiakObject::json(&seeded.value)?;
                for (index, terms) in seeded.indexes {
                    for term in terms {
                        object = object.with_index(index.clone(), term);
                    }
                }
                objects.insert(key, object);
            }
        }
        Ok(buckets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryNode;
    use crate::node::Node;

    const SEED: &str = r#"{
        "buckets": [
            {
                "bucket": "users",
                "objects": {
                    "alice": { "value": { "age": 31 }, "indexes": { "age_int": [31], "city_bin": ["paris"] } },
                    "bob": { "value": "plain" }
                }
            },
            { "bucket_type": "maps", "bucket": "carts" }
        ]
    }"#;

    #[tokio::test]
    async fn test_seed_loads_objects_and_indexes() {
        let node = MemoryNode::from_seed_json(SEED).unwrap();
        assert_eq!(node.name(), "riak@127.0.0.1");

        let users = Namespace::bucket("users");
        assert_eq!(node.object_count(&users).await, 2);
        assert_eq!(node.object_count(&Namespace::new("maps", "carts")).await, 0);

        let alice = node.fetch(&users.location("alice")).await.unwrap().unwrap();
        let terms: Vec<_> = alice.index_terms("city_bin").cloned().collect();
        assert_eq!(terms, [IndexTerm::Bin("paris".into())]);

        let value: serde_json::Value = alice.decode().unwrap();
        assert_eq!(value["age"], 31);
    }

    #[test]
    fn test_malformed_seed_is_rejected() {
        assert!(matches!(
            MemoryNode::from_seed_json(r#"{"buckets": [{"objects": {}}]}"#),
            Err(RuntimeError::Seed(_))
        ));
    }
}
