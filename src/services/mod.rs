//! Pipeline stages and the storage gateway they run against.

pub mod codec;
pub mod decoder;
pub mod disk_store;
#[cfg(test)]
pub mod memory_store;
pub mod mime_gate;
pub mod pipeline;
pub mod storage;
