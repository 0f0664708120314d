use auditflow::audit_core::constants::RAW_TABLE;
use auditflow::audit_core::PartitionAssigner;
use auditflow::audit_persistence::InMemoryEngine;
use auditflow::audit_redact::{redact, sha256_hex};
use auditflow::{rowstore_buffer, warehouse_buffer, AuditError, StorageBackend};
use serde::Serialize;
use serde_json::{json, Value};
use test_support::{moment, rowstore_config, small_buffer, warehouse_config};

#[derive(Serialize)]
struct Asteroid {
    name: String,
    hazardous: bool,
    miss_km: f64,
}

#[test]
fn buffered_ingest_to_current_state_view() -> Result<(), AuditError> {
    let engine = InMemoryEngine::new();
    let mut buffer = warehouse_buffer(engine.clone(), &warehouse_config(), small_buffer(2));

    buffer.record("2000433", "NeoWs", &Asteroid { name: "Eros".into(), hazardous: false, miss_km: 2.2e7 }, moment(0))?;
    buffer.record("2000719", "NeoWs", &Asteroid { name: "Albert".into(), hazardous: false, miss_km: 3.1e7 }, moment(1))?;
    assert_eq!(engine.row_count(RAW_TABLE).unwrap_or(0), 0);
    // el tercero supera el umbral
    buffer.record("2000433", "NeoWs", &Asteroid { name: "Eros".into(), hazardous: true, miss_km: 1.0e6 }, moment(2))?;
    assert!(buffer.is_empty());
    assert_eq!(engine.row_count(RAW_TABLE)?, 3);

    buffer.record("FLR-1", "DONKI", &json!({"class": "X1"}), moment(3))?;
    let mut backend = buffer.finish()?;
    assert_eq!(engine.row_count(RAW_TABLE)?, 4);

    let report = backend.update_projections()?;
    assert_eq!(report.created, vec!["brv_DONKI".to_string(), "brv_NeoWs".to_string()]);

    let rows = engine.view_rows("brv_NeoWs")?;
    assert_eq!(rows.len(), 2);
    let eros = rows.iter().find(|r| r["entity_id"] == json!("2000433")).expect("fila de Eros");
    assert_eq!(eros["hazardous"], json!("true"));
    assert_eq!(engine.view_rows("brv_DONKI")?[0]["class"], json!("X1"));
    Ok(())
}

#[test]
fn unflushed_events_stay_in_the_buffer() -> Result<(), AuditError> {
    let engine = InMemoryEngine::new();
    let mut buffer = rowstore_buffer(engine.clone(), &rowstore_config(), small_buffer(10));
    buffer.record("1", "A", &json!({"x": 1}), moment(0))?;
    assert_eq!(buffer.len(), 1);
    assert!(engine.history().is_empty());
    drop(buffer);
    assert!(engine.history().is_empty());
    Ok(())
}

#[test]
fn both_backends_agree_on_current_state() -> Result<(), AuditError> {
    let events = [("e1", json!({"x": 1}), 0), ("e1", json!({"x": 1, "y": 2}), 1), ("e2", json!({"x": 5}), 2)];

    let wh_engine = InMemoryEngine::new();
    let mut wh = warehouse_buffer(wh_engine.clone(), &warehouse_config(), small_buffer(100));
    let rs_engine = InMemoryEngine::new();
    let mut rs = rowstore_buffer(rs_engine.clone(), &rowstore_config(), small_buffer(100));
    for (id, data, m) in &events {
        wh.record(*id, "A", data, moment(*m))?;
        rs.record(*id, "A", data, moment(*m))?;
    }
    wh.finish()?.update_projections()?;
    rs.finish()?.update_projections()?;

    let project = |rows: Vec<serde_json::Map<String, Value>>| -> Vec<(Value, Value, Value)> {
        rows.into_iter().map(|r| (r["entity_id"].clone(), r["x"].clone(), r["y"].clone())).collect()
    };
    let wh_rows = project(wh_engine.view_rows("brv_A")?);
    assert_eq!(wh_rows, project(rs_engine.view_rows("brv_A")?));
    assert_eq!(wh_rows, vec![(json!("e1"), json!("1"), json!("2")), (json!("e2"), json!("5"), Value::Null)]);
    Ok(())
}

#[test]
fn redacted_payloads_flow_through_unchanged() -> Result<(), AuditError> {
    let engine = InMemoryEngine::new();
    let mut buffer = warehouse_buffer(engine.clone(), &warehouse_config(), small_buffer(100));
    let payload = match json!({"email": "ana@example.org", "phone": 5551234, "plan": "pro"}) {
        Value::Object(m) => redact(m, &["email", "phone"]),
        _ => unreachable!(),
    };
    buffer.record("u1", "Customer", &payload, moment(0))?;
    let mut backend = buffer.finish()?;
    backend.update_projections()?;

    let row = &engine.view_rows("brv_Customer")?[0];
    assert_eq!(row["email"], json!(sha256_hex("ana@example.org")));
    assert_eq!(row["phone"], json!(""));
    assert_eq!(row["plan"], json!("pro"));
    Ok(())
}

#[test]
fn view_bucket_matches_assigner() {
    let engine = InMemoryEngine::new();
    let mut buffer = warehouse_buffer(engine.clone(), &warehouse_config(), small_buffer(100));
    buffer.record("1", "GST", &json!({"kp": 7}), moment(0)).unwrap();
    let mut backend = buffer.finish().unwrap();
    backend.update_projections().unwrap();

    let create = engine.history()
                       .into_iter()
                       .filter_map(|c| match c {
                           auditflow::audit_persistence::EngineCall::Execute(p) if p.statement.label() == "CreateView" => Some(p.sql),
                           _ => None,
                       })
                       .next()
                       .expect("CREATE VIEW emitido");
    assert!(create.contains(&format!("partition_key = {}", PartitionAssigner::bucket("GST"))));
}
