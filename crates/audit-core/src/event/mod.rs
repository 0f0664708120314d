//! Eventos de auditoría y buffer del productor.

mod buffer;
mod types;

pub use buffer::EventBuffer;
pub use types::{AuditEvent, PartitionedRecord};
