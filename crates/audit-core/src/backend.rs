//! Contrato de almacenamiento y estado de sesión de un backend.
//!
//! Hay dos implementaciones (warehouse y row store) con modos de falla
//! distintos; ver `audit-persistence`. El estado de sesión es propiedad
//! exclusiva de cada instancia:
//!
//! ```text
//! tablas:        Uninitialized --(primer load_batch)--> Ready
//! particionado:  Partitioned   --(falla DDL/DML, sólo warehouse)--> Sandboxed
//! ```
//!
//! Ambas transiciones son de una sola vía; sólo se "resetean" construyendo
//! un backend nuevo.

use serde_json::{Map, Value};

use crate::event::AuditEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TableState {
    #[default]
    Uninitialized,
    Ready,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PartitionMode {
    #[default]
    Partitioned,
    /// La tabla particionada fue reemplazada por una vista sin particionar
    /// sobre el log crudo.
    Sandboxed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionState {
    pub tables: TableState,
    pub partitioning: PartitionMode,
}

impl SessionState {
    pub fn tables_created(&self) -> bool {
        self.tables == TableState::Ready
    }
    pub fn sandbox_mode(&self) -> bool {
        self.partitioning == PartitionMode::Sandboxed
    }
}

/// Resultado de una corrida de `update_projections`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectionReport {
    /// Vistas creadas en esta corrida.
    pub created: Vec<String>,
    /// Tipos cuya vista ya existía (primer esquema gana).
    pub existing: Vec<String>,
    /// Tipos cuyo nombre no es un identificador seguro.
    pub skipped: Vec<String>,
}

pub type JsonRow = Map<String, Value>;

/// Almacenamiento del log de auditoría y de sus proyecciones.
pub trait StorageBackend {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Crea el log append-only si no existe.
    fn ensure_raw_table(&mut self) -> Result<(), Self::Error>;
    /// Escribe un batch en el log (y en la tabla particionada salvo sandbox).
    fn load_batch(&mut self, records: &[AuditEvent]) -> Result<(), Self::Error>;
    /// Inserta en la tabla particionada todas las filas de `source_table`
    /// con su `partition_key`.
    fn fill_partition(&mut self, source_table: &str) -> Result<(), Self::Error>;
    /// Reconstruye la tabla particionada y crea las vistas faltantes.
    fn update_projections(&mut self) -> Result<ProjectionReport, Self::Error>;
    /// Sonda de existencia; cualquier error cuenta como "no existe".
    fn table_exists(&self, name: &str) -> bool;
    /// Borra las vistas y, con `full_delete`, también las tablas internas.
    fn purge(&mut self, full_delete: bool) -> Result<(), Self::Error>;
    /// Sentencia arbitraria del operador, sin validar.
    fn run_raw(&mut self, query: &str) -> Result<Vec<JsonRow>, Self::Error>;
    fn session(&self) -> SessionState;
}

impl<B: StorageBackend + ?Sized> StorageBackend for &mut B {
    type Error = B::Error;

    fn ensure_raw_table(&mut self) -> Result<(), Self::Error> {
        (**self).ensure_raw_table()
    }
    fn load_batch(&mut self, records: &[AuditEvent]) -> Result<(), Self::Error> {
        (**self).load_batch(records)
    }
    fn fill_partition(&mut self, source_table: &str) -> Result<(), Self::Error> {
        (**self).fill_partition(source_table)
    }
    fn update_projections(&mut self) -> Result<ProjectionReport, Self::Error> {
        (**self).update_projections()
    }
    fn table_exists(&self, name: &str) -> bool {
        (**self).table_exists(name)
    }
    fn purge(&mut self, full_delete: bool) -> Result<(), Self::Error> {
        (**self).purge(full_delete)
    }
    fn run_raw(&mut self, query: &str) -> Result<Vec<JsonRow>, Self::Error> {
        (**self).run_raw(query)
    }
    fn session(&self) -> SessionState {
        (**self).session()
    }
}
