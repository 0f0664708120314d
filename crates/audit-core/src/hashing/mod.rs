//! Hashing determinista para particionado.

pub mod partition;

pub use partition::PartitionAssigner;
