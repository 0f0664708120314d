//! Errores del core (modelo, muestreo de esquema y buffer).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("payload no serializable a JSON: {0}")]
    Payload(#[from] serde_json::Error),
    #[error("identificador inválido para SQL: {0:?}")]
    InvalidIdentifier(String),
    #[error("muestra de esquema inválida para '{entity_type}': {reason}")]
    InvalidSample { entity_type: String, reason: String },
}

/// Error del `EventBuffer`: o falla la validación del payload, o falla el
/// backend al recibir el batch.
#[derive(Debug, Error)]
pub enum BufferError<E: std::error::Error + 'static> {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("backend load_batch: {0}")]
    Backend(#[source] E),
}
