pub mod error;
pub mod future;
pub mod listener;
