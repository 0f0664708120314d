//! Motor en memoria con paridad de semántica respecto a los motores reales.
//!
//! Interpreta la forma tipada de cada sentencia (nunca el texto SQL) y
//! reproduce las restricciones que importan a los backends:
//! - sin DML (`EngineProfile::dml = false`) el INSERT ... SELECT falla, como
//!   en un proyecto sandbox del warehouse;
//! - sin particionado por rango el DDL de la partición falla;
//! - `DROP TABLE` sobre una vista falla;
//! - las vistas se evalúan al consultarlas, sobre el estado actual de su
//!   tabla fuente.
//!
//! Además registra cada llamada para que los tests verifiquen el orden de
//! operaciones.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use audit_core::schema::SampleCandidate;
use audit_core::{JsonRow, PartitionedRecord, SchemaInferencer, ViewDefinition};
use serde_json::Value;

use crate::engine::{EngineClient, LogRow, PreparedStatement, QueryOutput, Statement, TableKind};
use crate::error::PersistenceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineProfile {
    pub dml: bool,
    pub range_partitioning: bool,
}

impl Default for EngineProfile {
    fn default() -> Self {
        Self { dml: true, range_partitioning: true }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Execute(PreparedStatement),
    Load { table: String, rows: usize },
}

#[derive(Debug, Clone)]
enum Object {
    Table { partitioned: bool, rows: Vec<PartitionedRecord> },
    PartitionView { source: String },
    View { view: ViewDefinition, source: String },
}

impl Object {
    fn kind(&self) -> TableKind {
        match self {
            Object::Table { .. } => TableKind::Table,
            _ => TableKind::View,
        }
    }
}

#[derive(Debug, Default)]
struct State {
    objects: BTreeMap<String, Object>,
    history: Vec<EngineCall>,
    pending_load_failures: u32,
}

impl State {
    fn scan(&self, name: &str) -> Result<Vec<PartitionedRecord>, PersistenceError> {
        match self.objects.get(name) {
            Some(Object::Table { rows, .. }) => Ok(rows.clone()),
            Some(Object::PartitionView { source }) => {
                Ok(self.scan(source)?.into_iter().map(|r| PartitionedRecord::from_event(r.event)).collect())
            }
            Some(Object::View { .. }) => Err(PersistenceError::Unsupported(format!("{name}: sólo se leen vistas con view_rows"))),
            None => Err(PersistenceError::NotFound(name.to_string())),
        }
    }

    fn create_table(&mut self, table: &str, partitioned: bool) -> Result<QueryOutput, PersistenceError> {
        match self.objects.get(table) {
            Some(Object::Table { .. }) => Ok(QueryOutput::Done),
            Some(_) => Err(PersistenceError::AlreadyExists(format!("{table} existe como vista"))),
            None => {
                self.objects.insert(table.to_string(), Object::Table { partitioned, rows: Vec::new() });
                Ok(QueryOutput::Done)
            }
        }
    }

    fn create_view_object(&mut self, name: &str, source: &str, object: Object) -> Result<QueryOutput, PersistenceError> {
        if !self.objects.contains_key(source) {
            return Err(PersistenceError::NotFound(source.to_string()));
        }
        self.objects.entry(name.to_string()).or_insert(object);
        Ok(QueryOutput::Done)
    }

    fn insert(&mut self, table: &str, rows: Vec<PartitionedRecord>) -> Result<(), PersistenceError> {
        match self.objects.get_mut(table) {
            Some(Object::Table { rows: existing, .. }) => {
                existing.extend(rows);
                Ok(())
            }
            Some(_) => Err(PersistenceError::Unsupported(format!("{table} es una vista"))),
            None => Err(PersistenceError::NotFound(table.to_string())),
        }
    }
}

fn row(pairs: &[(&str, &str)]) -> JsonRow {
    pairs.iter().map(|(k, v)| (k.to_string(), Value::String(v.to_string()))).collect()
}

/// Motor compartible: los clones ven el mismo estado.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEngine {
    profile: EngineProfile,
    state: Arc<Mutex<State>>,
}

impl InMemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(profile: EngineProfile) -> Self {
        Self { profile, state: Arc::default() }
    }

    /// Proyecto sin DML (el INSERT ... SELECT de la partición falla).
    pub fn sandboxed() -> Self {
        Self::with_profile(EngineProfile { dml: false, ..EngineProfile::default() })
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn profile(&self) -> EngineProfile {
        self.profile
    }

    /// Las próximas `n` cargas fallan con un error transitorio.
    pub fn fail_next_loads(&self, n: u32) {
        self.lock().pending_load_failures = n;
    }

    pub fn history(&self) -> Vec<EngineCall> {
        self.lock().history.clone()
    }

    pub fn clear_history(&self) {
        self.lock().history.clear();
    }

    /// Sentencias ejecutadas, en orden.
    pub fn statements(&self) -> Vec<Statement> {
        self.lock()
            .history
            .iter()
            .filter_map(|c| match c {
                EngineCall::Execute(p) => Some(p.statement.clone()),
                EngineCall::Load { .. } => None,
            })
            .collect()
    }

    /// Tablas destino de cada carga, en orden.
    pub fn loaded_tables(&self) -> Vec<String> {
        self.lock()
            .history
            .iter()
            .filter_map(|c| match c {
                EngineCall::Load { table, .. } => Some(table.clone()),
                EngineCall::Execute(_) => None,
            })
            .collect()
    }

    pub fn object_names(&self) -> Vec<String> {
        self.lock().objects.keys().cloned().collect()
    }

    pub fn kind_of(&self, name: &str) -> Option<TableKind> {
        self.lock().objects.get(name).map(Object::kind)
    }

    pub fn is_partitioned(&self, name: &str) -> bool {
        matches!(self.lock().objects.get(name), Some(Object::Table { partitioned: true, .. }))
    }

    pub fn row_count(&self, name: &str) -> Result<usize, PersistenceError> {
        Ok(self.lock().scan(name)?.len())
    }

    pub fn view_columns(&self, name: &str) -> Option<Vec<String>> {
        match self.lock().objects.get(name) {
            Some(Object::View { view, .. }) => Some(view.columns()),
            _ => None,
        }
    }

    /// Evalúa la vista contra el estado actual de su fuente.
    pub fn view_rows(&self, name: &str) -> Result<Vec<JsonRow>, PersistenceError> {
        let st = self.lock();
        match st.objects.get(name) {
            Some(Object::View { view, source }) => Ok(view.evaluate(st.scan(source)?.iter())),
            Some(_) => Err(PersistenceError::Unsupported(format!("{name} no es una vista por tipo"))),
            None => Err(PersistenceError::NotFound(name.to_string())),
        }
    }

    fn apply(&self, st: &mut State, statement: &Statement) -> Result<QueryOutput, PersistenceError> {
        match statement {
            Statement::CreateLogTable { table } => st.create_table(table, false),
            Statement::CreatePartitionTable { table } => {
                if !self.profile.range_partitioning {
                    return Err(PersistenceError::Unsupported("range partitioning not available".into()));
                }
                st.create_table(table, true)
            }
            Statement::FillPartition { source, target } => {
                if !self.profile.dml {
                    return Err(PersistenceError::Unsupported("DML queries are not allowed in this project".into()));
                }
                let rows = st.scan(source)?.into_iter().map(|r| PartitionedRecord::from_event(r.event)).collect();
                st.insert(target, rows)?;
                Ok(QueryOutput::Done)
            }
            Statement::CreatePartitionView { source, target } => {
                st.create_view_object(target, source, Object::PartitionView { source: source.clone() })
            }
            Statement::SelectSchemaSamples { table, window } => {
                let candidates = st.scan(table)?.into_iter().map(|r| SampleCandidate { entity_type: r.event.entity_type().to_string(),
                                                                                       entity_data: r.event.entity_data_text(),
                                                                                       event_moment: r.event.event_moment() });
                let rows = SchemaInferencer::select_within(candidates, *window).into_iter()
                                                                               .map(|(t, data)| row(&[("entity_type", t.as_str()), ("entity_data", data.as_str())]))
                                                                               .collect();
                Ok(QueryOutput::Rows(rows))
            }
            Statement::CreateView { view, source } => {
                st.create_view_object(view.name.as_str(), source, Object::View { view: view.clone(), source: source.clone() })
            }
            Statement::Drop { name, kind } => match st.objects.get(name).map(Object::kind) {
                None => Ok(QueryOutput::Done),
                Some(actual) if actual != *kind => {
                    Err(PersistenceError::Unsupported(format!("DROP {} sobre {name}, que es {}", kind.as_str(), actual.as_str())))
                }
                Some(_) => {
                    st.objects.remove(name);
                    Ok(QueryOutput::Done)
                }
            },
            Statement::TableExists { name } => {
                let rows = st.objects
                             .get(name)
                             .map(|obj| row(&[("table_name", name.as_str()), ("table_type", obj.kind().as_str())]))
                             .into_iter()
                             .collect();
                Ok(QueryOutput::Rows(rows))
            }
            Statement::ListTables => {
                let rows = st.objects
                             .iter()
                             .map(|(name, obj)| row(&[("table_name", name.as_str()), ("table_type", obj.kind().as_str())]))
                             .collect();
                Ok(QueryOutput::Rows(rows))
            }
            Statement::Raw(_) => Ok(QueryOutput::Done),
        }
    }
}

impl EngineClient for InMemoryEngine {
    fn execute(&self, statement: &PreparedStatement) -> Result<QueryOutput, PersistenceError> {
        let mut st = self.lock();
        st.history.push(EngineCall::Execute(statement.clone()));
        self.apply(&mut st, &statement.statement)
    }

    fn load_rows(&self, table: &str, rows: &[LogRow]) -> Result<(), PersistenceError> {
        let mut st = self.lock();
        st.history.push(EngineCall::Load { table: table.to_string(), rows: rows.len() });
        if st.pending_load_failures > 0 {
            st.pending_load_failures -= 1;
            return Err(PersistenceError::TransientIo("connection reset by peer".into()));
        }
        let records = rows.iter()
                          .map(|r| r.to_event().map(PartitionedRecord::from_event))
                          .collect::<Result<Vec<_>, _>>()?;
        st.insert(table, records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WarehouseConfig;
    use crate::sql::{SqlDialect, WarehouseDialect};

    fn engine_with_dialect() -> (InMemoryEngine, WarehouseDialect) {
        let cfg = WarehouseConfig::new("p", "d", "/dev/null").unwrap();
        (InMemoryEngine::new(), WarehouseDialect::new(&cfg))
    }

    #[test]
    fn drop_table_on_a_view_fails() {
        let (engine, d) = engine_with_dialect();
        engine.execute(&d.prepare(Statement::CreateLogTable { table: "brs_audit".into() })).unwrap();
        engine.execute(&d.prepare(Statement::CreatePartitionView { source: "brs_audit".into(), target: "p".into() }))
              .unwrap();
        let err = engine.execute(&d.prepare(Statement::Drop { name: "p".into(), kind: TableKind::Table }));
        assert!(matches!(err, Err(PersistenceError::Unsupported(_))));
        engine.execute(&d.prepare(Statement::Drop { name: "p".into(), kind: TableKind::View })).unwrap();
        assert_eq!(engine.kind_of("p"), None);
    }

    #[test]
    fn profile_gates_dml_and_partitioning() {
        let cfg = WarehouseConfig::new("p", "d", "/dev/null").unwrap();
        let d = WarehouseDialect::new(&cfg);
        let engine = InMemoryEngine::with_profile(EngineProfile { dml: false, range_partitioning: false });
        let ddl = engine.execute(&d.prepare(Statement::CreatePartitionTable { table: "t".into() }));
        assert!(matches!(ddl, Err(PersistenceError::Unsupported(_))));
        let dml = engine.execute(&d.prepare(Statement::FillPartition { source: "a".into(), target: "b".into() }));
        assert!(matches!(dml, Err(PersistenceError::Unsupported(_))));
    }

    #[test]
    fn loads_into_missing_table_fail() {
        let engine = InMemoryEngine::new();
        assert!(matches!(engine.load_rows("nope", &[]), Err(PersistenceError::NotFound(_))));
    }
}
