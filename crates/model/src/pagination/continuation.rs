use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContinuationError {
    #[error("Continuation has an odd number of hex digits ({0})")]
    OddLength(usize),

    #[error("Invalid hex digit {digit:?} at position {position}")]
    InvalidDigit { digit: char, position: usize },
}

/// Opaque, server-issued pagination token. Resuming a query with it
/// continues right after the last result of the previous page.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Continuation(Bytes);

impl Continuation {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Bytes {
        self.0
    }

    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }

    pub fn from_hex(s: &str) -> Result<Self, ContinuationError> {
        if s.len() % 2 != 0 {
            return Err(ContinuationError::OddLength(s.len()));
        }

        let mut out = Vec::with_capacity(s.len() / 2);
        for (i, pair) in s.as_bytes().chunks_exact(2).enumerate() {
            let hi = hex_value(pair[0], i * 2)?;
            let lo = hex_value(pair[1], i * 2 + 1)?;
            out.push((hi << 4) | lo);
        }

        Ok(Self(Bytes::from(out)))
    }
}

fn hex_value(byte: u8, position: usize) -> Result<u8, ContinuationError> {
    let digit = char::from(byte);
    digit
        .to_digit(16)
        .map(|d| d as u8)
        .ok_or(ContinuationError::InvalidDigit { digit, position })
}

impl fmt::Display for Continuation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl From<Bytes> for Continuation {
    fn from(bytes: Bytes) -> Self {
        Self(bytes)
    }
}

impl From<&'static str> for Continuation {
    fn from(s: &'static str) -> Self {
        Self(Bytes::from_static(s.as_bytes()))
    }
}
