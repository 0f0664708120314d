//! Backend sobre el warehouse columnar particionado por rango.
//!
//! Particularidades del motor:
//! - No se puede anexar barato a una tabla particionada por rango: cada batch
//!   se carga en el log crudo, se copia a `brs_audit_temp` y se vuelca a la
//!   partición con un INSERT ... SELECT.
//! - Hay proyectos (sandbox) sin DML ni particionado por rango. La primera
//!   falla al crear o llenar la partición pasa el backend a modo sandbox
//!   para siempre: la partición se reemplaza por una vista sin particionar
//!   sobre el log crudo y el staging deja de ejecutarse. No se reintenta y la
//!   falla no llega al llamador.
//! - La vista queda en el dataset: una instancia nueva que la encuentra en
//!   lugar de la partición arranca directamente en modo sandbox.

use audit_core::constants::{PARTITION_TABLE, RAW_TABLE, SAMPLE_WINDOW, TEMP_TABLE};
use audit_core::{AuditEvent, IdentityColumns, JsonRow, PartitionMode, ProjectionReport, SessionState, StorageBackend, TableState};
use log::{debug, info, warn};

use crate::config::WarehouseConfig;
use crate::engine::{with_retry, EngineClient, LogRow, QueryOutput, Statement, TableKind};
use crate::error::PersistenceError;
use crate::projection::{drop_existing, materialize_views, probe_exists, probe_kind, purge_objects, run};
use crate::sql::WarehouseDialect;

pub struct WarehouseBackend<C: EngineClient> {
    client: C,
    dialect: WarehouseDialect,
    session: SessionState,
}

impl<C: EngineClient> WarehouseBackend<C> {
    pub fn new(client: C, config: &WarehouseConfig) -> Self {
        Self { client, dialect: WarehouseDialect::new(config), session: SessionState::default() }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn dialect(&self) -> &WarehouseDialect {
        &self.dialect
    }

    fn exec(&self, statement: Statement) -> Result<QueryOutput, PersistenceError> {
        run(&self.client, &self.dialect, statement)
    }

    /// Borra tabla o vista según lo que haya en el dataset.
    fn drop_object(&self, name: &str) -> Result<(), PersistenceError> {
        drop_existing(&self.client, &self.dialect, name)
    }

    /// Si otra instancia ya degradó el dataset, la partición es una vista:
    /// se adopta el modo sandbox sin volver a intentar el DDL.
    fn adopt_existing_sandbox(&mut self) {
        if !self.session.sandbox_mode() && probe_kind(&self.client, &self.dialect, PARTITION_TABLE) == Some(TableKind::View) {
            info!("sandbox:adopt {PARTITION_TABLE} ya es una vista");
            self.session.partitioning = PartitionMode::Sandboxed;
        }
    }

    /// Setup de una sola vez por instancia (primer `load_batch`).
    fn setup_tables(&mut self) -> Result<(), PersistenceError> {
        debug!("setup_tables:start");
        self.drop_object(TEMP_TABLE)?;
        self.ensure_raw_table()?;
        self.adopt_existing_sandbox();
        self.ensure_partition_table()?;
        self.session.tables = TableState::Ready;
        debug!("setup_tables:done sandbox={}", self.session.sandbox_mode());
        Ok(())
    }

    /// Crea la tabla particionada; si el motor rechaza el DDL entra en sandbox.
    fn ensure_partition_table(&mut self) -> Result<(), PersistenceError> {
        if self.session.sandbox_mode() {
            return Ok(());
        }
        match self.exec(Statement::CreatePartitionTable { table: PARTITION_TABLE.to_string() }) {
            Ok(_) => Ok(()),
            Err(e) => self.enter_sandbox(&e),
        }
    }

    /// Transición `Partitioned -> Sandboxed` (una sola vía).
    fn enter_sandbox(&mut self, cause: &PersistenceError) -> Result<(), PersistenceError> {
        warn!("sandbox:enter cause={cause}");
        self.session.partitioning = PartitionMode::Sandboxed;
        self.drop_object(PARTITION_TABLE)?;
        self.drop_object(TEMP_TABLE)?;
        self.create_partition_view()
    }

    fn create_partition_view(&self) -> Result<(), PersistenceError> {
        if probe_exists(&self.client, &self.dialect, RAW_TABLE) {
            self.exec(Statement::CreatePartitionView { source: RAW_TABLE.to_string(), target: PARTITION_TABLE.to_string() })?;
            info!("sandbox:partition_view created over {RAW_TABLE}");
        } else {
            debug!("sandbox:partition_view skipped (no {RAW_TABLE})");
        }
        Ok(())
    }

    fn load(&self, table: &str, rows: &[LogRow]) -> Result<(), PersistenceError> {
        with_retry(|| self.client.load_rows(table, rows))
    }
}

impl<C: EngineClient> StorageBackend for WarehouseBackend<C> {
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

        if !self.session.sandbox_mode() {
            self.exec(Statement::CreateLogTable { table: TEMP_TABLE.to_string() })?;
            self.load(TEMP_TABLE, &rows)?;
            self.fill_partition(TEMP_TABLE)?;
            // fill_partition puede haber entrado en sandbox y borrado la temp ya
            if !self.session.sandbox_mode() {
                self.drop_object(TEMP_TABLE)?;
            }
        }
        debug!("load_batch:done count={} sandbox={}", rows.len(), self.session.sandbox_mode());
        Ok(())
    }

    fn fill_partition(&mut self, source_table: &str) -> Result<(), PersistenceError> {
        if self.session.sandbox_mode() {
            debug!("fill_partition:skip sandbox source={source_table}");
            return Ok(());
        }
        match self.exec(Statement::FillPartition { source: source_table.to_string(), target: PARTITION_TABLE.to_string() }) {
            Ok(_) => Ok(()),
            Err(e) => self.enter_sandbox(&e),
        }
    }

    fn update_projections(&mut self) -> Result<ProjectionReport, PersistenceError> {
        debug!("update_projections:start sandbox={}", self.session.sandbox_mode());
        self.ensure_raw_table()?;
        self.adopt_existing_sandbox();
        if self.session.sandbox_mode() {
            // La vista siempre refleja el log; sólo se recrea si falta.
            if !probe_exists(&self.client, &self.dialect, PARTITION_TABLE) {
                self.create_partition_view()?;
            }
        } else {
            self.drop_object(PARTITION_TABLE)?;
            self.ensure_partition_table()?;
            self.fill_partition(RAW_TABLE)?;
        }

        let samples = self.exec(Statement::SelectSchemaSamples { table: PARTITION_TABLE.to_string(), window: SAMPLE_WINDOW })?
                          .into_rows();
        let report = materialize_views(&self.client, &self.dialect, IdentityColumns::EntityId, samples)?;
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
