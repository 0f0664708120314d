//! Forma de la vista "estado actual" de un `entity_type`.
//!
//! Una `ViewDefinition` es independiente del motor: cada dialecto la traduce a
//! su SQL y el motor en memoria la evalúa con `ViewDefinition::evaluate`.
//! Contenido:
//! - columnas identificadoras (`entity_id`, y `entity_href` si el backend la
//!   modela como clave estable) más `event_moment`;
//! - una columna por clave de primer nivel de la muestra, con el escalar en
//!   `$.clave` de `entity_data`;
//! - deduplicación por identidad (`entity_href` no vacío, si no `entity_id`)
//!   quedándose con el `event_moment` más reciente, restringida al bucket del
//!   tipo y al propio tipo.

use std::collections::{BTreeMap, HashSet};

use log::warn;
use serde_json::{Map, Value};

use crate::constants::{COLLISION_PREFIX, RESERVED_COLUMNS, VIEW_PREFIX};
use crate::errors::CoreError;
use crate::event::PartitionedRecord;
use crate::hashing::PartitionAssigner;
use crate::schema::ident::{is_safe_ident, SqlIdent};
use crate::schema::sample::SchemaSample;

/// Columnas identificadoras que proyecta cada backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityColumns {
    /// Sólo `entity_id` (warehouse).
    EntityId,
    /// `entity_href` y `entity_id` (row store).
    HrefAndId,
}

impl IdentityColumns {
    pub fn names(self) -> &'static [&'static str] {
        match self {
            IdentityColumns::EntityId => &["entity_id"],
            IdentityColumns::HrefAndId => &["entity_href", "entity_id"],
        }
    }
}

/// Clave JSON proyectada y el nombre de columna con que aparece.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectedField {
    pub key: SqlIdent,
    pub column: SqlIdent,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewDefinition {
    pub name: SqlIdent,
    pub entity_type: SqlIdent,
    pub bucket: u64,
    pub identity: IdentityColumns,
    pub fields: Vec<ProjectedField>,
}

impl ViewDefinition {
    /// Nombre de la vista para un tipo, o error si el tipo no es un
    /// identificador seguro.
    pub fn view_name(entity_type: &str) -> Result<SqlIdent, CoreError> {
        SqlIdent::parse(entity_type)?;
        SqlIdent::parse(&format!("{VIEW_PREFIX}{entity_type}"))
    }

    /// Construye la definición a partir de la muestra. Claves que no son
    /// identificadores seguros se omiten (con `warn!`); las que chocan con
    /// columnas reservadas se renombran con `COLLISION_PREFIX`.
    pub fn build(sample: &SchemaSample, identity: IdentityColumns) -> Result<Self, CoreError> {
        let entity_type = SqlIdent::parse(sample.entity_type())?;
        let name = Self::view_name(sample.entity_type())?;

        let mut used: HashSet<String> = identity.names().iter().map(|s| s.to_string()).collect();
        used.insert("event_moment".to_string());

        let mut fields = Vec::new();
        for key in sample.field_names() {
            if !is_safe_ident(key) {
                warn!("view_build:skip_field entity_type={entity_type} key={key:?}");
                continue;
            }
            let mut column = key.to_string();
            while RESERVED_COLUMNS.contains(&column.as_str()) || used.contains(&column) {
                column = format!("{COLLISION_PREFIX}{column}");
            }
            used.insert(column.clone());
            fields.push(ProjectedField { key: SqlIdent::parse(key)?, column: SqlIdent::parse(&column)? });
        }

        Ok(Self { name,
                  bucket: PartitionAssigner::bucket(entity_type.as_str()),
                  entity_type,
                  identity,
                  fields })
    }

    /// Columnas de salida en orden.
    pub fn columns(&self) -> Vec<String> {
        let mut cols: Vec<String> = self.identity.names().iter().map(|s| s.to_string()).collect();
        cols.push("event_moment".to_string());
        cols.extend(self.fields.iter().map(|f| f.column.to_string()));
        cols
    }

    /// Evalúa la vista sobre filas de la tabla particionada. Filas ordenadas
    /// por clave de identidad; a igual `event_moment` gana la primera en
    /// orden de tabla. Se descartan las filas sin identidad (href e id vacíos).
    pub fn evaluate<'a, I>(&self, rows: I) -> Vec<Map<String, Value>>
        where I: IntoIterator<Item = &'a PartitionedRecord>
    {
        let mut latest: BTreeMap<&str, &PartitionedRecord> = BTreeMap::new();
        for rec in rows {
            let ev = &rec.event;
            if rec.partition_key != self.bucket || ev.entity_type() != self.entity_type.as_str() || ev.identity_key().is_empty() {
                continue;
            }
            let newer = latest.get(ev.identity_key())
                              .map_or(true, |cur| ev.event_moment() > cur.event.event_moment());
            if newer {
                latest.insert(ev.identity_key(), rec);
            }
        }

        latest.into_values().map(|rec| self.project(rec)).collect()
    }

    fn project(&self, rec: &PartitionedRecord) -> Map<String, Value> {
        let ev = &rec.event;
        let mut row = Map::new();
        for name in self.identity.names() {
            let v = match *name {
                "entity_href" => ev.entity_href().map_or(Value::Null, |h| Value::String(h.to_string())),
                _ => Value::String(ev.entity_id().to_string()),
            };
            row.insert(name.to_string(), v);
        }
        row.insert("event_moment".into(), Value::String(ev.event_moment().to_rfc3339()));
        for f in &self.fields {
            row.insert(f.column.to_string(), extract_scalar(ev.entity_data(), f.key.as_str()));
        }
        row
    }
}

/// Semántica de `JSON_EXTRACT_SCALAR(data, '$.key')`: texto para escalares,
/// NULL para objetos, arrays, null o clave ausente.
pub fn extract_scalar(data: &Value, key: &str) -> Value {
    match data.get(key) {
        Some(Value::String(s)) => Value::String(s.clone()),
        Some(Value::Number(n)) => Value::String(n.to_string()),
        Some(Value::Bool(b)) => Value::String(b.to_string()),
        _ => Value::Null,
    }
}
