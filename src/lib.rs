//! AuditFlow
//!
//! Librería de ingesta de eventos de auditoría:
//! - `audit_core`: modelo, buffer, particionado e inferencia de esquema.
//! - `audit_persistence`: backends warehouse / row store y motor en memoria.
//! - `audit_redact`: seudonimización de campos personales.
//! - `audit_reporter`: reporte de estado opcional a un plano de control.
//!
//! `pipeline` arma buffers listos para usar a partir de la configuración.

pub mod errors;
pub mod pipeline;

pub use audit_core;
pub use audit_persistence;
pub use audit_redact;
pub use audit_reporter;

pub use audit_core::{AuditEvent, EventBuffer, ProjectionReport, StorageBackend};
pub use errors::AuditError;
pub use pipeline::{rowstore_buffer, rowstore_buffer_from_env, warehouse_buffer, warehouse_buffer_from_env};
