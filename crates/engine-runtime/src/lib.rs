pub mod commands;
pub mod error;
pub mod execution;
pub mod memory;
pub mod node;
