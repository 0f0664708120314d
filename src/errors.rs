use audit_core::{BufferError, CoreError};
use audit_persistence::PersistenceError;
use thiserror::Error;

/// Error unificado para quien usa la librería a través de la fachada.
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Error de evento: {0}")]
    Core(#[from] CoreError),
    #[error("Error de persistencia: {0}")]
    Persistence(#[from] PersistenceError),
}

impl From<BufferError<PersistenceError>> for AuditError {
    fn from(err: BufferError<PersistenceError>) -> Self {
        match err {
            BufferError::Core(e) => Self::Core(e),
            BufferError::Backend(e) => Self::Persistence(e),
        }
    }
}
