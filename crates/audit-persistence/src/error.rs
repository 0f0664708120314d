//! Errores de persistencia.
//! Agrupa las fallas del motor (warehouse / row store) en variantes
//! semánticas, igual para ambos backends.

use audit_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("already exists: {0}")]
    AlreadyExists(String),
    /// DDL o DML que el motor rechaza (p. ej. particionado por rango o INSERT
    /// en un proyecto sandbox).
    #[error("unsupported by engine: {0}")]
    Unsupported(String),
    #[error("transient IO / connection error: {0}")]
    TransientIo(String),
    #[error("invalid schema sample for '{entity_type}': {reason}")]
    InvalidSample { entity_type: String, reason: String },
    #[error("invalid identifier: {0:?}")]
    InvalidIdentifier(String),
    #[error("configuration: {0}")]
    Config(String),
    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("unknown engine error: {0}")]
    Unknown(String),
}

impl From<CoreError> for PersistenceError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidSample { entity_type, reason } => Self::InvalidSample { entity_type, reason },
            CoreError::InvalidIdentifier(id) => Self::InvalidIdentifier(id),
            CoreError::Payload(e) => Self::Serialization(e),
        }
    }
}
