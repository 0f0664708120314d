use audit_reporter::{IntegrationReporter, ReportResult, ReporterConfig, ReporterError, StatusUpdate};
use serde_json::json;
use test_support::{Call, FakeTransport};

fn configured() -> ReporterConfig {
    ReporterConfig::new("https://control.example/api/", "tok", "integ-42")
}

#[test]
fn missing_config_is_a_soft_error_without_network() {
    let cfg = ReporterConfig { endpoint: Some("https://control.example".into()), token: None, integration_id: Some("i".into()) };
    let reporter = IntegrationReporter::with_transport(cfg, FakeTransport::default());

    let got = reporter.get_status();
    assert_eq!(got.result, "error");
    assert!(got.info.as_str().unwrap_or_default().contains("token"));
    assert!(!reporter.set_status(&StatusUpdate::default().load_rows(1)).is_ok());
    assert!(reporter.transport().calls.borrow().is_empty());
}

#[test]
fn get_status_wraps_the_response() {
    let reporter = IntegrationReporter::with_transport(configured(), FakeTransport::replying(vec![Ok(json!({"state": "idle"}))]));
    assert_eq!(reporter.get_status(), ReportResult::ok(json!({"state": "idle"})));
    assert_eq!(reporter.transport().calls.borrow()[0],
               Call::Get { url: "https://control.example/api/integrations/integ-42/status".into(), token: "tok".into() });
}

#[test]
fn set_status_sends_only_well_typed_fields() {
    let reporter = IntegrationReporter::with_transport(configured(), FakeTransport::default());
    let update = StatusUpdate::default().load_date("2024-03-01T10:00:00+00:00")
                                        .load_rows("many")
                                        .load_percent(50)
                                        .tables_count(json!(null));
    assert!(reporter.set_status(&update).is_ok());

    let calls = reporter.transport().calls.borrow();
    match &calls[0] {
        Call::Post { body, .. } => assert_eq!(body, &json!({"load_date": "2024-03-01T10:00:00+00:00", "load_percent": 50})),
        other => panic!("se esperaba POST, llegó {other:?}"),
    }
}

#[test]
fn transport_failures_become_error_results() {
    let reporter = IntegrationReporter::with_transport(configured(),
                                                       FakeTransport::replying(vec![Err(ReporterError::Status { code: 503,
                                                                                                                body: "down".into() }),
                                                                                    Err(ReporterError::Transport("dns".into()))]));
    let first = reporter.get_status();
    assert_eq!(first.result, "error");
    assert!(first.info.as_str().unwrap_or_default().contains("503"));
    assert_eq!(reporter.set_status(&StatusUpdate::default()).result, "error");
}
