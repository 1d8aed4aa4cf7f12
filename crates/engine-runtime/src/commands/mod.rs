//! Client-facing operations. Each command builds its future (or result
//! stream) on top of the execution engine and the processing adapters.

pub mod delete;
pub mod fetch;
pub mod index;
pub mod list_keys;
pub mod store;

pub use delete::{DeleteValue, DeleteValueResponse};
pub use fetch::{FetchValue, FetchValueResponse};
pub use index::{IndexQuery, IndexQueryResponse};
pub use list_keys::{ListKeys, ListKeysResponse};
pub use store::{StoreValue, StoreValueResponse};
