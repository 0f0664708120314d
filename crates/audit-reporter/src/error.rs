use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReporterError {
    #[error("configuración incompleta: falta {0}")]
    MissingConfig(&'static str),
    #[error("transporte: {0}")]
    Transport(String),
    #[error("respuesta HTTP {code}: {body}")]
    Status { code: u16, body: String },
    #[error("respuesta no decodificable: {0}")]
    Decode(String),
}
