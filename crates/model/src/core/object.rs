use bytes::Bytes;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
};

pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_OCTETS: &str = "application/octet-stream";

/// A single secondary index term. Integer indexes end in `_int`,
/// binary indexes in `_bin`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IndexTerm {
    Int(i64),
    Bin(String),
}

impl fmt::Display for IndexTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexTerm::Int(v) => write!(f, "{v}"),
            IndexTerm::Bin(v) => write!(f, "{v}"),
        }
    }
}

impl From<i64> for IndexTerm {
    fn from(v: i64) -> Self {
        IndexTerm::Int(v)
    }
}

impl From<&str> for IndexTerm {
    fn from(v: &str) -> Self {
        IndexTerm::Bin(v.to_string())
    }
}

impl From<String> for IndexTerm {
    fn from(v: String) -> Self {
        IndexTerm::Bin(v)
    }
}

/// A stored value together with its metadata and index entries.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RiakObject {
    pub value: Bytes,
    pub content_type: String,
    #[serde(default)]
    pub indexes: BTreeMap<String, BTreeSet<IndexTerm>>,
}

impl RiakObject {
    pub fn new(value: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            content_type: content_type.into(),
            indexes: BTreeMap::new(),
        }
    }

    pub fn json<V: Serialize>(value: &V) -> Result<Self, serde_json::Error> {
        let bytes = serde_json::to_vec(value)?;
        Ok(Self::new(bytes, CONTENT_TYPE_JSON))
    }

    pub fn with_index(mut self, index: impl Into<String>, term: impl Into<IndexTerm>) -> Self {
        self.indexes
            .entry(index.into())
            .or_default()
            .insert(term.into());
        self
    }

    pub fn index_terms(&self, index: &str) -> impl Iterator<Item = &IndexTerm> {
        self.indexes.get(index).into_iter().flatten()
    }

    pub fn decode<V: DeserializeOwned>(&self) -> Result<V, serde_json::Error> {
        serde_json::from_slice(&self.value)
    }

    pub fn size_bytes(&self) -> usize {
        self.value.len()
    }
}
