//! Selección de la muestra de esquema por `entity_type`.
//!
//! Regla: de las `SAMPLE_WINDOW` filas más recientes de cada tipo se elige el
//! único documento con más claves de primer nivel. Empates: gana la fila más
//! reciente y, a igual `event_moment`, la primera en orden de tabla. Sólo las
//! claves de primer nivel del documento elegido se proyectan; no hay unión de
//! campos ni tipado recursivo.
//!
//! Los backends ejecutan esta misma regla como SQL sobre la tabla
//! particionada; `SchemaInferencer::select` es la versión en memoria que usa
//! el motor de pruebas y que define la semántica de referencia.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::constants::SAMPLE_WINDOW;
use crate::errors::CoreError;

/// Fila candidata tal como la devuelve la tabla particionada.
#[derive(Debug, Clone)]
pub struct SampleCandidate {
    pub entity_type: String,
    pub entity_data: String,
    pub event_moment: DateTime<Utc>,
}

/// Documento representativo de un `entity_type`.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaSample {
    entity_type: String,
    document: Map<String, Value>,
}

impl SchemaSample {
    /// Interpreta el texto elegido por la consulta de selección. Un texto que
    /// no es un objeto JSON es un error duro: la vista no puede construirse.
    pub fn parse(entity_type: &str, raw: Option<&str>) -> Result<Self, CoreError> {
        let invalid = |reason: String| CoreError::InvalidSample { entity_type: entity_type.to_string(), reason };
        let raw = raw.ok_or_else(|| invalid("entity_data ausente".into()))?;
        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(document)) => Ok(Self { entity_type: entity_type.to_string(), document }),
            Ok(other) => Err(invalid(format!("se esperaba un objeto JSON, llegó {}", json_kind(&other)))),
            Err(e) => Err(invalid(format!("JSON inválido: {e}"))),
        }
    }

    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    /// Claves de primer nivel, en el orden del documento original.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.document.keys().map(String::as_str)
    }

    pub fn document(&self) -> &Map<String, Value> {
        &self.document
    }
}

/// Cantidad de claves de primer nivel; `None` si el texto no es un objeto.
pub fn top_level_key_count(raw: &str) -> Option<usize> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Some(map.len()),
        _ => None,
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

pub struct SchemaInferencer;

impl SchemaInferencer {
    /// Devuelve, por `entity_type` (orden alfabético), el texto de
    /// `entity_data` más rico dentro de la ventana de recencia.
    pub fn select<I>(rows: I) -> BTreeMap<String, String>
        where I: IntoIterator<Item = SampleCandidate>
    {
        Self::select_within(rows, SAMPLE_WINDOW)
    }

    pub fn select_within<I>(rows: I, window: u32) -> BTreeMap<String, String>
        where I: IntoIterator<Item = SampleCandidate>
    {
        let mut by_type: BTreeMap<String, Vec<SampleCandidate>> = BTreeMap::new();
        for row in rows {
            by_type.entry(row.entity_type.clone()).or_default().push(row);
        }

        by_type.into_iter()
               .filter_map(|(entity_type, mut rows)| {
                   // sort_by es estable: a igual event_moment se conserva el orden de tabla
                   rows.sort_by(|a, b| b.event_moment.cmp(&a.event_moment));
                   rows.truncate(window as usize);
                   let mut best: Option<(Option<usize>, String)> = None;
                   for row in rows {
                       let richness = top_level_key_count(&row.entity_data);
                       // Option<usize>: None (no parseable) queda por debajo de Some(0)
                       if best.as_ref().map_or(true, |(r, _)| richness > *r) {
                           best = Some((richness, row.entity_data));
                       }
                   }
                   best.map(|(_, data)| (entity_type, data))
               })
               .collect()
    }
}
