//! Construcción de `EventBuffer` sobre cada backend.
//!
//! El transporte del motor (`EngineClient`) lo provee quien llama; acá sólo
//! se combinan configuración, dialecto y tamaño de buffer.

use audit_core::EventBuffer;
use audit_persistence::{BufferConfig, EngineClient, RowStoreBackend, RowStoreConfig, WarehouseBackend, WarehouseConfig};
use log::info;

use crate::errors::AuditError;

pub fn warehouse_buffer<C: EngineClient>(client: C,
                                         config: &WarehouseConfig,
                                         buffer: BufferConfig)
                                         -> EventBuffer<WarehouseBackend<C>> {
    info!("pipeline:warehouse project={} dataset={} buffer_size={}",
          config.project,
          config.dataset,
          buffer.buffer_size);
    EventBuffer::with_buffer_size(WarehouseBackend::new(client, config), buffer.buffer_size)
}

pub fn rowstore_buffer<C: EngineClient>(client: C, config: &RowStoreConfig, buffer: BufferConfig) -> EventBuffer<RowStoreBackend<C>> {
    info!("pipeline:rowstore host={} database={} buffer_size={}",
          config.host,
          config.database,
          buffer.buffer_size);
    EventBuffer::with_buffer_size(RowStoreBackend::new(client, config), buffer.buffer_size)
}

/// Igual que `warehouse_buffer`, leyendo `AUDIT_WAREHOUSE_*` y `AUDIT_BUFFER_SIZE`.
pub fn warehouse_buffer_from_env<C: EngineClient>(client: C) -> Result<EventBuffer<WarehouseBackend<C>>, AuditError> {
    let config = WarehouseConfig::from_env()?;
    Ok(warehouse_buffer(client, &config, BufferConfig::from_env()))
}

pub fn rowstore_buffer_from_env<C: EngineClient>(client: C) -> Result<EventBuffer<RowStoreBackend<C>>, AuditError> {
    let config = RowStoreConfig::from_env()?;
    Ok(rowstore_buffer(client, &config, BufferConfig::from_env()))
}
