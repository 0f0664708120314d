//! audit-persistence
//!
//! Implementaciones de `StorageBackend` sobre dos motores con estructura
//! distinta, más la frontera con sus transportes.
//!
//! Módulos:
//! - `engine`: trait `EngineClient`, sentencias tipadas y política de retry.
//! - `sql`: dialectos (warehouse por rango, row store merge-tree).
//! - `warehouse`: backend con staging y degradación a modo sandbox.
//! - `rowstore`: backend con staging y fallas propagadas.
//! - `memory`: motor en memoria con paridad de semántica (tests / desarrollo).
//! - `config`: carga de configuración desde .env.

pub mod config;
pub mod engine;
pub mod error;
pub mod memory;
mod projection;
pub mod rowstore;
pub mod sql;
pub mod warehouse;

pub use config::{init_dotenv, BufferConfig, RowStoreConfig, WarehouseConfig};
pub use engine::{EngineClient, LogRow, PreparedStatement, QueryOutput, Statement, TableKind};
pub use error::PersistenceError;
pub use memory::{EngineCall, EngineProfile, InMemoryEngine};
pub use rowstore::RowStoreBackend;
pub use sql::{RowStoreDialect, SqlDialect, WarehouseDialect};
pub use warehouse::WarehouseBackend;
