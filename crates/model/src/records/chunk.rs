use crate::{core::object::IndexTerm, pagination::continuation::Continuation};
use serde::{Deserialize, Serialize};

/// One result of a secondary index query: the matching object's key and,
/// when terms were requested, the index term that matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub object_key: String,
    pub term: Option<IndexTerm>,
}

/// A batch of index entries as delivered by a streaming index query.
/// The final chunk of a truncated result carries the continuation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexChunk {
    pub entries: Vec<IndexEntry>,
    pub continuation: Option<Continuation>,
}

impl IndexChunk {
    pub fn new(entries: Vec<IndexEntry>) -> Self {
        Self {
            entries,
            continuation: None,
        }
    }

    pub fn with_continuation(mut self, continuation: Option<Continuation>) -> Self {
        self.continuation = continuation;
        self
    }

    pub fn continuation(&self) -> Option<&Continuation> {
        self.continuation.as_ref()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for IndexChunk {
    type Item = IndexEntry;
    type IntoIter = std::vec::IntoIter<IndexEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// A batch of keys from a full-bucket key listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyChunk {
    pub keys: Vec<String>,
}

impl KeyChunk {
    pub fn new(keys: Vec<String>) -> Self {
        Self { keys }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl IntoIterator for KeyChunk {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.keys.into_iter()
    }
}
