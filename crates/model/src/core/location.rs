use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};

/// Bucket type used when none is given explicitly.
pub const DEFAULT_BUCKET_TYPE: &str = "default";

/// A bucket within a bucket type.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Namespace {
    bucket_type: Arc<str>,
    bucket: Arc<str>,
}

impl Namespace {
    pub fn new(bucket_type: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            bucket_type: Arc::from(bucket_type.into()),
            bucket: Arc::from(bucket.into()),
        }
    }

    /// Namespace in the default bucket type.
    pub fn bucket(bucket: impl Into<String>) -> Self {
        Self::new(DEFAULT_BUCKET_TYPE, bucket)
    }

    pub fn bucket_type(&self) -> &str {
        &self.bucket_type
    }

    pub fn bucket_name(&self) -> &str {
        &self.bucket
    }

    pub fn location(&self, key: impl Into<String>) -> Location {
        Location::new(self.clone(), key)
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket_type, self.bucket)
    }
}

/// Address of a single object: namespace plus key.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Location {
    namespace: Namespace,
    key: Arc<str>,
}

impl Location {
    pub fn new(namespace: Namespace, key: impl Into<String>) -> Self {
        Self {
            namespace,
            key: Arc::from(key.into()),
        }
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.key)
    }
}
