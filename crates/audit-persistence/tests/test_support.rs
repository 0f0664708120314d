#![allow(dead_code)]

use audit_core::AuditEvent;
use audit_persistence::{InMemoryEngine, RowStoreBackend, RowStoreConfig, WarehouseBackend, WarehouseConfig};
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;

pub fn moment(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2015, 9, 8, 0, 0, 0).unwrap() + Duration::minutes(minutes)
}

pub fn event(id: &str, entity_type: &str, data: Value, minutes: i64) -> AuditEvent {
    AuditEvent::new(id, entity_type, data, moment(minutes))
}

pub fn warehouse(engine: &InMemoryEngine) -> WarehouseBackend<InMemoryEngine> {
    let cfg = WarehouseConfig::new("my-project", "audit", "/secrets/key.json").expect("config");
    WarehouseBackend::new(engine.clone(), &cfg)
}

pub fn rowstore(engine: &InMemoryEngine) -> RowStoreBackend<InMemoryEngine> {
    let cfg = RowStoreConfig::new("localhost", "audit", "default", "secret").expect("config");
    RowStoreBackend::new(engine.clone(), &cfg)
}
