//! Storage abstractions for the service layer
//!
//! Process-local stores shared by every domain service. Nothing here persists.

pub mod memory_store;

pub use memory_store::MemoryStore;
