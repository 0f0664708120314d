//! `AuditEvent` y su variante particionada.
//!
//! Rol en el flujo:
//! - Un productor crea eventos ("quién cambió qué y cuándo") y los entrega al
//!   `EventBuffer`.
//! - El buffer los vuelca por lotes al `StorageBackend`, que los escribe en
//!   el log append-only y en la tabla particionada.
//! - Ningún componente muta un evento después de creado: el buffer guarda
//!   copias y el backend sólo los serializa.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::CoreError;
use crate::hashing::PartitionAssigner;

/// Cambio registrado sobre una entidad.
///
/// `entity_data` es un documento JSON opaco; es lo único que evoluciona
/// entre eventos de un mismo `entity_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    entity_href: Option<String>,
    entity_id: String,
    entity_type: String,
    entity_data: Value,
    event_type: Option<String>,
    event_moment: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(entity_id: impl Into<String>,
               entity_type: impl Into<String>,
               entity_data: Value,
               event_moment: DateTime<Utc>)
               -> Self {
        Self { entity_href: None,
               entity_id: entity_id.into(),
               entity_type: entity_type.into(),
               entity_data,
               event_type: None,
               event_moment }
    }

    /// Construye el evento serializando un payload arbitrario. Falla si el
    /// payload no se puede representar como documento JSON (p. ej. mapas con
    /// claves no textuales).
    pub fn from_serializable<T: Serialize + ?Sized>(entity_id: impl Into<String>,
                                                    entity_type: impl Into<String>,
                                                    entity_data: &T,
                                                    event_moment: DateTime<Utc>)
                                                    -> Result<Self, CoreError> {
        let data = serde_json::to_value(entity_data)?;
        Ok(Self::new(entity_id, entity_type, data, event_moment))
    }

    pub fn with_href(mut self, href: impl Into<String>) -> Self {
        self.entity_href = Some(href.into());
        self
    }

    pub fn with_event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = Some(event_type.into());
        self
    }

    pub fn entity_href(&self) -> Option<&str> {
        self.entity_href.as_deref()
    }
    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }
    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }
    pub fn entity_data(&self) -> &Value {
        &self.entity_data
    }
    pub fn event_type(&self) -> Option<&str> {
        self.event_type.as_deref()
    }
    pub fn event_moment(&self) -> DateTime<Utc> {
        self.event_moment
    }

    /// Texto JSON del payload tal como se guarda en la columna `entity_data`.
    pub fn entity_data_text(&self) -> String {
        self.entity_data.to_string()
    }

    /// Identificador estable para deduplicar: `entity_href` si existe y no
    /// está vacío, si no `entity_id`.
    pub fn identity_key(&self) -> &str {
        match self.entity_href.as_deref() {
            Some(href) if !href.is_empty() => href,
            _ => &self.entity_id,
        }
    }
}

/// Evento más su bucket de partición.
///
/// Invariante: `partition_key` depende sólo de `entity_type`.
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionedRecord {
    pub event: AuditEvent,
    pub partition_key: u64,
}

impl PartitionedRecord {
    pub fn from_event(event: AuditEvent) -> Self {
        let partition_key = PartitionAssigner::bucket(event.entity_type());
        Self { event, partition_key }
    }
}
