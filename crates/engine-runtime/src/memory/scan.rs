use super::Buckets;
use crate::node::{BUCKET_INDEX, IndexScan, KEY_INDEX};
use engine_core::error::OperationError;
use model::{
    core::{
        location::Namespace,
        object::{IndexTerm, RiakObject},
    },
    pagination::continuation::Continuation,
    records::chunk::{IndexChunk, IndexEntry, KeyChunk},
};
use serde::{Deserialize, Serialize};

/// Position after which a resumed index scan continues: the last
/// `(term, key)` pair the previous page returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ScanCursor {
    term: IndexTerm,
    key: String,
}

impl ScanCursor {
    fn encode(&self) -> Result<Continuation, OperationError> {
        serde_json::to_vec(self)
            .map(Continuation::new)
            .map_err(|e| OperationError::Encoding(e.to_string()))
    }

    fn decode(continuation: &Continuation) -> Result<Self, OperationError> {
        serde_json::from_slice(continuation.as_bytes())
            .map_err(|e| OperationError::Encoding(format!("unreadable continuation: {e}")))
    }
}

fn terms_for(index: &str, namespace: &Namespace, key: &str, object: &RiakObject) -> Vec<IndexTerm> {
    match index {
        KEY_INDEX => vec![IndexTerm::Bin(key.to_string())],
        BUCKET_INDEX => vec![IndexTerm::Bin(namespace.bucket_name().to_string())],
        _ => object.index_terms(index).cloned().collect(),
    }
}

/// Runs `scan` over a snapshot of the node's data and splits the result
/// into pages. The last page carries a continuation when `max_results`
/// cut the result short.
pub(super) fn index_chunks(
    buckets: &Buckets,
    scan: &IndexScan,
) -> Result<Vec<IndexChunk>, OperationError> {
    let resume = scan
        .continuation
        .as_ref()
        .map(ScanCursor::decode)
        .transpose()?;

    let namespace = &scan.query.namespace;
    let Some(objects) = buckets.get(namespace) else {
        return Ok(Vec::new());
    };

    let mut matches: Vec<(IndexTerm, &str)> = objects
        .iter()
        .flat_map(|(key, object)| {
            terms_for(&scan.query.index, namespace, key, object)
                .into_iter()
                .filter(|term| scan.query.range.contains(term))
                .map(move |term| (term, key.as_str()))
        })
        .collect();
    matches.sort();

    if let Some(resume) = &resume {
        matches.retain(|(term, key)| (term, *key) > (&resume.term, resume.key.as_str()));
    }

    let limit = scan.max_results.unwrap_or(usize::MAX);
    let truncated = matches.len() > limit;
    matches.truncate(limit);

    let continuation = match matches.last() {
        Some((term, key)) if truncated => Some(
            ScanCursor {
                term: term.clone(),
                key: key.to_string(),
            }
            .encode()?,
        ),
        _ => None,
    };

    let entries: Vec<IndexEntry> = matches
        .into_iter()
        .map(|(term, key)| IndexEntry {
            object_key: key.to_string(),
            term: scan.return_terms.then_some(term),
        })
        .collect();

    let mut chunks: Vec<IndexChunk> = entries
        .chunks(scan.page_size.max(1))
        .map(|page| IndexChunk::new(page.to_vec()))
        .collect();

    if let Some(last) = chunks.last_mut() {
        last.continuation = continuation;
    }

    Ok(chunks)
}

pub(super) fn key_chunks(buckets: &Buckets, namespace: &Namespace, page_size: usize) -> Vec<KeyChunk> {
    let Some(objects) = buckets.get(namespace) else {
        return Vec::new();
    };

    let keys: Vec<String> = objects.keys().cloned().collect();
    keys.chunks(page_size.max(1))
        .map(|page| KeyChunk::new(page.to_vec()))
        .collect()
}
