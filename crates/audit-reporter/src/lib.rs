//! audit-reporter
//!
//! Canal lateral opcional que informa el estado de la carga a un plano de
//! control externo. Nunca devuelve `Err`: toda falla (configuración
//! incompleta, red, respuesta no JSON) se convierte en un
//! `ReportResult` con `result = "error"`.

pub mod config;
pub mod error;
pub mod reporter;
pub mod status;
pub mod transport;

pub use config::ReporterConfig;
pub use error::ReporterError;
pub use reporter::IntegrationReporter;
pub use status::{ReportResult, StatusUpdate};
pub use transport::{StatusTransport, UreqTransport};
