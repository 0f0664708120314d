use audit_core::constants::{PARTITION_TABLE, RAW_TABLE, TEMP_TABLE};
use audit_core::{StorageBackend, TableState};
use audit_persistence::{EngineClient, EngineProfile, InMemoryEngine, PersistenceError, PreparedStatement, QueryOutput,
                        LogRow, Statement, TableKind};
use serde_json::json;
mod test_support;
use test_support::{event, rowstore, warehouse};

#[test]
fn empty_batch_touches_nothing() {
    let engine = InMemoryEngine::new();
    let mut backend = warehouse(&engine);
    backend.load_batch(&[]).unwrap();
    assert!(engine.history().is_empty());
    assert_eq!(backend.session().tables, TableState::Uninitialized);
}

#[test]
fn first_batch_sets_up_and_stages_through_temp() {
    let engine = InMemoryEngine::new();
    let mut backend = warehouse(&engine);
    backend.load_batch(&[event("1", "A", json!({"a": 1}), 0), event("2", "B", json!({"b": 1}), 0)]).unwrap();

    let statements = engine.statements();
    // sin temp previa no hay DROP, sólo la sonda
    assert_eq!(statements[..4],
               [Statement::TableExists { name: TEMP_TABLE.into() },
                Statement::CreateLogTable { table: RAW_TABLE.into() },
                Statement::TableExists { name: PARTITION_TABLE.into() },
                Statement::CreatePartitionTable { table: PARTITION_TABLE.into() }]);
    assert!(statements.contains(&Statement::FillPartition { source: TEMP_TABLE.into(), target: PARTITION_TABLE.into() }));
    assert_eq!(engine.loaded_tables(), vec![RAW_TABLE.to_string(), TEMP_TABLE.to_string()]);

    assert_eq!(engine.kind_of(TEMP_TABLE), None);
    assert_eq!(engine.row_count(RAW_TABLE).unwrap(), 2);
    assert_eq!(engine.row_count(PARTITION_TABLE).unwrap(), 2);
    assert_eq!(backend.session().tables, TableState::Ready);
}

#[test]
fn setup_runs_once_per_instance() {
    let engine = InMemoryEngine::new();
    let mut backend = rowstore(&engine);
    backend.load_batch(&[event("1", "A", json!({}), 0)]).unwrap();
    engine.clear_history();
    backend.load_batch(&[event("2", "A", json!({}), 1)]).unwrap();
    assert!(!engine.statements().contains(&Statement::CreatePartitionTable { table: PARTITION_TABLE.into() }));
    assert_eq!(engine.row_count(PARTITION_TABLE).unwrap(), 2);
}

#[test]
fn transient_load_errors_are_retried() {
    let engine = InMemoryEngine::new();
    let mut backend = warehouse(&engine);
    engine.fail_next_loads(2);
    backend.load_batch(&[event("1", "A", json!({"a": 1}), 0)]).unwrap();
    assert_eq!(engine.loaded_tables(), vec![RAW_TABLE, RAW_TABLE, RAW_TABLE, TEMP_TABLE]);
    assert_eq!(engine.row_count(RAW_TABLE).unwrap(), 1);
}

#[test]
fn retries_give_up_after_the_limit() {
    let engine = InMemoryEngine::new();
    let mut backend = warehouse(&engine);
    engine.fail_next_loads(10);
    let err = backend.load_batch(&[event("1", "A", json!({"a": 1}), 0)]).unwrap_err();
    assert!(matches!(err, PersistenceError::TransientIo(_)));
    assert_eq!(engine.loaded_tables().len(), 4);
}

#[test]
fn rowstore_propagates_partition_failures() {
    let engine = InMemoryEngine::with_profile(EngineProfile { dml: false, ..EngineProfile::default() });
    let mut backend = rowstore(&engine);
    let err = backend.load_batch(&[event("1", "A", json!({"a": 1}), 0)]).unwrap_err();
    assert!(matches!(err, PersistenceError::Unsupported(_)));
    assert!(!backend.session().sandbox_mode());
    // el log crudo ya recibió el batch
    assert_eq!(engine.row_count(RAW_TABLE).unwrap(), 1);
    assert!(engine.is_partitioned(PARTITION_TABLE));
}

#[test]
fn rowstore_propagates_partition_ddl_failures() {
    let engine = InMemoryEngine::with_profile(EngineProfile { range_partitioning: false, ..EngineProfile::default() });
    let mut backend = rowstore(&engine);
    assert!(backend.load_batch(&[event("1", "A", json!({}), 0)]).is_err());
    assert_eq!(backend.session().tables, TableState::Uninitialized);
}

/// Motor cuya sonda de existencia siempre falla.
struct BrokenProbe(InMemoryEngine);

impl EngineClient for BrokenProbe {
    fn execute(&self, statement: &PreparedStatement) -> Result<QueryOutput, PersistenceError> {
        match statement.statement {
            Statement::TableExists { .. } => Err(PersistenceError::TransientIo("timeout".into())),
            _ => self.0.execute(statement),
        }
    }

    fn load_rows(&self, table: &str, rows: &[LogRow]) -> Result<(), PersistenceError> {
        self.0.load_rows(table, rows)
    }
}

#[test]
fn table_exists_swallows_probe_errors() {
    let engine = InMemoryEngine::new();
    let cfg = audit_persistence::WarehouseConfig::new("p", "d", "/k.json").unwrap();
    let mut backend = audit_persistence::WarehouseBackend::new(BrokenProbe(engine.clone()), &cfg);
    backend.ensure_raw_table().unwrap();
    assert_eq!(engine.kind_of(RAW_TABLE), Some(TableKind::Table));
    assert!(!backend.table_exists(RAW_TABLE));
}

#[test]
fn run_raw_passes_text_through() {
    let engine = InMemoryEngine::new();
    let mut backend = rowstore(&engine);
    let rows = backend.run_raw("SELECT 1").unwrap();
    assert!(rows.is_empty());
    assert_eq!(engine.statements(), vec![Statement::Raw("SELECT 1".into())]);
}
