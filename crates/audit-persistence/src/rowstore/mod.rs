//! Backend sobre el row store merge-tree.
//!
//! El motor particiona en la inserción directa, pero se replica el mismo
//! staging que el warehouse (log crudo → temp → partición) para que ambos
//! backends se comporten igual frente al log. A diferencia del warehouse no
//! hay modo sandbox: una falla del DDL o del INSERT de la partición se
//! propaga al llamador tal cual.

use audit_core::constants::{PARTITION_TABLE, RAW_TABLE, SAMPLE_WINDOW, TEMP_TABLE};
use audit_core::{AuditEvent, IdentityColumns, JsonRow, ProjectionReport, SessionState, StorageBackend, TableState};
use log::{debug, error, info};

use crate::config::RowStoreConfig;
use crate::engine::{with_retry, EngineClient, LogRow, QueryOutput, Statement, TableKind};
use crate::error::PersistenceError;
use crate::projection::{materialize_views, probe_exists, purge_objects, run};
use crate::sql::RowStoreDialect;

pub struct RowStoreBackend<C: EngineClient> {
    client: C,
    dialect: RowStoreDialect,
    session: SessionState,
}

impl<C: EngineClient> RowStoreBackend<C> {
    pub fn new(client: C, config: &RowStoreConfig) -> Self {
        Self { client, dialect: RowStoreDialect::new(config), session: SessionState::default() }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn dialect(&self) -> &RowStoreDialect {
        &self.dialect
    }

    fn exec(&self, statement: Statement) -> Result<QueryOutput, PersistenceError> {
        run(&self.client, &self.dialect, statement)
    }

    fn drop_table(&self, name: &str) -> Result<(), PersistenceError> {
        self.exec(Statement::Drop { name: name.to_string(), kind: TableKind::Table }).map(|_| ())
    }

    fn ensure_partition_table(&self) -> Result<(), PersistenceError> {
        self.exec(Statement::CreatePartitionTable { table: PARTITION_TABLE.to_string() }).map(|_| ())
    }

    fn setup_tables(&mut self) -> Result<(), PersistenceError> {
        debug!("setup_tables:start");
        self.drop_table(TEMP_TABLE)?;
        self.ensure_raw_table()?;
        self.ensure_partition_table()?;
        self.session.tables = TableState::Ready;
        debug!("setup_tables:done");
        Ok(())
    }

    fn load(&self, table: &str, rows: &[LogRow]) -> Result<(), PersistenceError> {
        with_retry(|| self.client.load_rows(table, rows))
    }
}

impl<C: EngineClient> StorageBackend for RowStoreBackend<C> {
    type Error = PersistenceError;

    fn ensure_raw_table(&mut self) -> Result<(), PersistenceError> {
        self.exec(Statement::CreateLogTable { table: RAW_TABLE.to_string() }).map(|_| ())
    }

    fn load_batch(&mut self, records: &[AuditEvent]) -> Result<(), PersistenceError> {
        if records.is_empty() {
            return Ok(());
        }
        debug!("load_batch:start count={}", records.len());
        if self.session.tables == TableState::Uninitialized {
            self.setup_tables()?;
        }
        let rows: Vec<LogRow> = records.iter().map(LogRow::from).collect();
        self.load(RAW_TABLE, &rows)?;
        self.exec(Statement::CreateLogTable { table: TEMP_TABLE.to_string() })?;
        self.load(TEMP_TABLE, &rows)?;
        self.fill_partition(TEMP_TABLE)?;
        self.drop_table(TEMP_TABLE)?;
        debug!("load_batch:done count={}", rows.len());
        Ok(())
    }

    fn fill_partition(&mut self, source_table: &str) -> Result<(), PersistenceError> {
        self.exec(Statement::FillPartition { source: source_table.to_string(), target: PARTITION_TABLE.to_string() })
            .map(|_| ())
            .map_err(|e| {
                error!("fill_partition:error source={source_table} err={e}");
                e
            })
    }

    fn update_projections(&mut self) -> Result<ProjectionReport, PersistenceError> {
        debug!("update_projections:start");
        self.ensure_raw_table()?;
        self.drop_table(PARTITION_TABLE)?;
        self.ensure_partition_table()?;
        self.fill_partition(RAW_TABLE)?;

        let samples = self.exec(Statement::SelectSchemaSamples { table: PARTITION_TABLE.to_string(), window: SAMPLE_WINDOW })?
                          .into_rows();
        let report = materialize_views(&self.client, &self.dialect, IdentityColumns::HrefAndId, samples)?;
        info!("update_projections:done created={} existing={} skipped={}",
              report.created.len(),
              report.existing.len(),
              report.skipped.len());
        Ok(report)
    }

    fn table_exists(&self, name: &str) -> bool {
        probe_exists(&self.client, &self.dialect, name)
    }

    fn purge(&mut self, full_delete: bool) -> Result<(), PersistenceError> {
        purge_objects(&self.client, &self.dialect, full_delete).map(|_| ())
    }

    fn run_raw(&mut self, query: &str) -> Result<Vec<JsonRow>, PersistenceError> {
        Ok(self.exec(Statement::Raw(query.to_string()))?.into_rows())
    }

    fn session(&self) -> SessionState {
        self.session
    }
}
