//! audit-core: modelo de eventos, particionado, inferencia de esquema y
//! contrato de almacenamiento.
//!
//! Flujo:
//! productor → `EventBuffer::append` → (umbral) → `flush` →
//! `StorageBackend::load_batch` → log crudo. Aparte, un operador invoca
//! `StorageBackend::update_projections`, que reconstruye la tabla
//! particionada (`PartitionAssigner`), elige una muestra por tipo
//! (`SchemaInferencer`) y crea las vistas faltantes (`ViewDefinition`).
pub mod backend;
pub mod constants;
pub mod errors;
pub mod event;
pub mod hashing;
pub mod schema;

pub use backend::{JsonRow, PartitionMode, ProjectionReport, SessionState, StorageBackend, TableState};
pub use errors::{BufferError, CoreError};
pub use event::{AuditEvent, EventBuffer, PartitionedRecord};
pub use hashing::PartitionAssigner;
pub use schema::{IdentityColumns, SchemaInferencer, SchemaSample, SqlIdent, ViewDefinition};
