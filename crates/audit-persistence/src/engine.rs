//! Frontera con el motor de almacenamiento.
//!
//! El transporte y la autenticación de cada motor son externos: un cliente
//! sólo necesita ejecutar sentencias y cargar filas. Cada sentencia viaja
//! preparada con su forma tipada (`Statement`) y el SQL ya renderizado por
//! el dialecto del backend; un transporte de red envía `sql`, el motor en
//! memoria interpreta `statement`.

use audit_core::{AuditEvent, JsonRow, ViewDefinition};
use chrono::{DateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::PersistenceError;

/// Tabla física o vista; los motores no aceptan `DROP TABLE` sobre una vista.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Table,
    View,
}

impl TableKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TableKind::Table => "TABLE",
            TableKind::View => "VIEW",
        }
    }

    pub fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("VIEW") {
            TableKind::View
        } else {
            TableKind::Table
        }
    }
}

/// Sentencias que los backends emiten.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// Log append-only (crudo o staging), sin particionar.
    CreateLogTable { table: String },
    /// Tabla con `partition_key` particionada físicamente.
    CreatePartitionTable { table: String },
    /// INSERT ... SELECT calculando `partition_key` en el motor.
    FillPartition { source: String, target: String },
    /// Vista sin particionar con `partition_key` calculada en línea.
    CreatePartitionView { source: String, target: String },
    /// Una fila `(entity_type, entity_data)` por tipo con la muestra más rica.
    SelectSchemaSamples { table: String, window: u32 },
    CreateView { view: ViewDefinition, source: String },
    Drop { name: String, kind: TableKind },
    /// Fila `(table_name, table_type)` si el objeto existe.
    TableExists { name: String },
    /// Filas `(table_name, table_type)` del dataset / base.
    ListTables,
    Raw(String),
}

impl Statement {
    /// Nombre legible para logging/diagnóstico.
    pub fn label(&self) -> &'static str {
        match self {
            Statement::CreateLogTable { .. } => "CreateLogTable",
            Statement::CreatePartitionTable { .. } => "CreatePartitionTable",
            Statement::FillPartition { .. } => "FillPartition",
            Statement::CreatePartitionView { .. } => "CreatePartitionView",
            Statement::SelectSchemaSamples { .. } => "SelectSchemaSamples",
            Statement::CreateView { .. } => "CreateView",
            Statement::Drop { .. } => "Drop",
            Statement::TableExists { .. } => "TableExists",
            Statement::ListTables => "ListTables",
            Statement::Raw(_) => "Raw",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PreparedStatement {
    pub statement: Statement,
    pub sql: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutput {
    Done,
    Rows(Vec<JsonRow>),
}

impl QueryOutput {
    pub fn into_rows(self) -> Vec<JsonRow> {
        match self {
            QueryOutput::Done => Vec::new(),
            QueryOutput::Rows(rows) => rows,
        }
    }
}

/// Fila del log tal como se carga (JSON por fila).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRow {
    pub entity_href: Option<String>,
    pub entity_id: String,
    pub entity_type: String,
    pub entity_data: String,
    pub event_type: Option<String>,
    pub event_moment: DateTime<Utc>,
}

impl From<&AuditEvent> for LogRow {
    fn from(ev: &AuditEvent) -> Self {
        Self { entity_href: ev.entity_href().map(str::to_string),
               entity_id: ev.entity_id().to_string(),
               entity_type: ev.entity_type().to_string(),
               entity_data: ev.entity_data_text(),
               event_type: ev.event_type().map(str::to_string),
               event_moment: ev.event_moment() }
    }
}

impl LogRow {
    pub fn to_event(&self) -> Result<AuditEvent, PersistenceError> {
        let data = serde_json::from_str(&self.entity_data)?;
        let mut ev = AuditEvent::new(self.entity_id.clone(), self.entity_type.clone(), data, self.event_moment);
        if let Some(href) = &self.entity_href {
            ev = ev.with_href(href.clone());
        }
        if let Some(t) = &self.event_type {
            ev = ev.with_event_type(t.clone());
        }
        Ok(ev)
    }
}

/// Cliente de un motor concreto (warehouse o row store).
///
/// Contrato:
/// - `execute` ejecuta una sentencia y devuelve filas JSON o `Done`.
/// - `load_rows` agrega filas a una tabla existente.
/// - Las fallas se devuelven clasificadas en `PersistenceError`
///   (`TransientIo` para las reintentables).
pub trait EngineClient: Send + Sync + 'static {
    fn execute(&self, statement: &PreparedStatement) -> Result<QueryOutput, PersistenceError>;
    fn load_rows(&self, table: &str, rows: &[LogRow]) -> Result<(), PersistenceError>;
}

/// Fragmentos de mensaje con que cada motor reporta fallas pasajeras cuando
/// el transporte no las clasifica: cuotas y errores de backend del
/// warehouse, saturación y red del row store.
const TRANSIENT_MARKERS: &[&str] = &["ratelimitexceeded",
                                     "backenderror",
                                     "internalerror",
                                     "too_many_simultaneous_queries",
                                     "network_error",
                                     "socket_timeout",
                                     "connection reset",
                                     "timed out"];

/// Cantidad máxima de reintentos de una carga.
pub(crate) const RETRY_LIMIT: u32 = 3;
/// Espera antes del primer reintento; se duplica en cada uno.
pub(crate) const RETRY_BASE_MS: u64 = 20;

fn is_retryable(e: &PersistenceError) -> bool {
    match e {
        PersistenceError::TransientIo(_) => true,
        PersistenceError::Unknown(msg) => {
            let msg = msg.to_lowercase();
            TRANSIENT_MARKERS.iter().any(|marker| msg.contains(marker))
        }
        _ => false,
    }
}

/// Ejecuta `op` reintentando las fallas pasajeras del motor con backoff
/// exponencial (20, 40 y 80 ms). Las demás fallas vuelven al primer intento.
pub(crate) fn with_retry<F, T>(mut op: F) -> Result<T, PersistenceError>
    where F: FnMut() -> Result<T, PersistenceError>
{
    let mut retries = 0;
    loop {
        match op() {
            Err(e) if retries < RETRY_LIMIT && is_retryable(&e) => {
                let wait = std::time::Duration::from_millis(RETRY_BASE_MS << retries);
                retries += 1;
                warn!("load:retry n={retries}/{RETRY_LIMIT} wait_ms={} err={e}", wait.as_millis());
                std::thread::sleep(wait);
            }
            outcome => return outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn retries_transient_then_gives_up() {
        let calls = Cell::new(0);
        let r: Result<(), _> = with_retry(|| {
            calls.set(calls.get() + 1);
            Err(PersistenceError::TransientIo("socket".into()))
        });
        assert!(r.is_err());
        assert_eq!(calls.get(), 1 + RETRY_LIMIT);
    }

    #[test]
    fn permanent_errors_are_not_retried() {
        let calls = Cell::new(0);
        let r: Result<(), _> = with_retry(|| {
            calls.set(calls.get() + 1);
            Err(PersistenceError::Unsupported("DML".into()))
        });
        assert!(r.is_err());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn engine_texts_mark_unknown_errors_as_transient() {
        assert!(is_retryable(&PersistenceError::Unknown("Exceeded rate limits: rateLimitExceeded".into())));
        assert!(is_retryable(&PersistenceError::Unknown("Code: 202. DB::Exception: TOO_MANY_SIMULTANEOUS_QUERIES".into())));
        assert!(!is_retryable(&PersistenceError::Unknown("Syntax error: failed at position 7".into())));
        assert!(!is_retryable(&PersistenceError::NotFound("brs_audit".into())));
    }

    #[test]
    fn recovers_when_a_retry_succeeds() {
        let calls = Cell::new(0);
        let r = with_retry(|| {
            calls.set(calls.get() + 1);
            if calls.get() < 3 { Err(PersistenceError::Unknown("connection reset by peer".into())) } else { Ok(calls.get()) }
        });
        assert_eq!(r.unwrap(), 3);
    }

    #[test]
    fn log_row_round_trips_optional_fields() {
        let ev = AuditEvent::new("1", "T", serde_json::json!({"a": [1, 2]}), Utc::now()).with_href("h/1")
                                                                                        .with_event_type("updated");
        let row = LogRow::from(&ev);
        assert_eq!(row.entity_data, r#"{"a":[1,2]}"#);
        assert_eq!(row.to_event().unwrap(), ev);
    }
}
