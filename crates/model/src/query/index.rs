use crate::core::{location::Namespace, object::IndexTerm};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which index terms a query selects. Both range bounds are inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexRange {
    Match(IndexTerm),
    Range { start: IndexTerm, end: IndexTerm },
}

impl IndexRange {
    pub fn contains(&self, term: &IndexTerm) -> bool {
        match self {
            IndexRange::Match(m) => m == term,
            IndexRange::Range { start, end } => start <= term && term <= end,
        }
    }
}

impl fmt::Display for IndexRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexRange::Match(m) => write!(f, "= {m}"),
            IndexRange::Range { start, end } => write!(f, "[{start}, {end}]"),
        }
    }
}

/// Describes which index query produced a result. Echoed back on the
/// query's future so that failures can be traced to their query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexQueryInfo {
    pub namespace: Namespace,
    pub index: String,
    pub range: IndexRange,
}

impl fmt::Display for IndexQueryInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.namespace, self.index, self.range)
    }
}
