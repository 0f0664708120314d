//! Resultado estructurado y payload de `set_status`.

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `{result, info}` tal como lo ve el llamador.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportResult {
    pub result: String,
    pub info: Value,
}

impl ReportResult {
    pub const OK: &'static str = "ok";
    pub const ERROR: &'static str = "error";

    pub fn ok(info: Value) -> Self {
        Self { result: Self::OK.to_string(), info }
    }

    pub fn error(reason: impl Into<String>) -> Self {
        Self { result: Self::ERROR.to_string(), info: Value::String(reason.into()) }
    }

    pub fn is_ok(&self) -> bool {
        self.result == Self::OK
    }
}

/// Campos de estado sin tipar; los que no tengan la forma esperada se
/// descartan al armar el payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusUpdate {
    pub load_date: Option<Value>,
    pub load_rows: Option<Value>,
    pub load_percent: Option<Value>,
    pub tables_count: Option<Value>,
}

fn timestamp_like(v: &Value) -> bool {
    v.as_str().is_some_and(|s| DateTime::parse_from_rfc3339(s).is_ok())
}

fn integer(v: &Value) -> bool {
    v.is_i64() || v.is_u64()
}

impl StatusUpdate {
    pub fn load_date(mut self, v: impl Into<Value>) -> Self {
        self.load_date = Some(v.into());
        self
    }

    pub fn load_rows(mut self, v: impl Into<Value>) -> Self {
        self.load_rows = Some(v.into());
        self
    }

    pub fn load_percent(mut self, v: impl Into<Value>) -> Self {
        self.load_percent = Some(v.into());
        self
    }

    pub fn tables_count(mut self, v: impl Into<Value>) -> Self {
        self.tables_count = Some(v.into());
        self
    }

    /// Sólo los campos presentes y bien tipados: `load_date` como texto
    /// RFC 3339, los contadores como enteros.
    pub fn payload(&self) -> Map<String, Value> {
        let checks: [(&str, &Option<Value>, fn(&Value) -> bool); 4] = [("load_date", &self.load_date, timestamp_like),
                                                                       ("load_rows", &self.load_rows, integer),
                                                                       ("load_percent", &self.load_percent, integer),
                                                                       ("tables_count", &self.tables_count, integer)];
        checks.into_iter()
              .filter_map(|(name, value, valid)| value.as_ref().filter(|v| valid(v)).map(|v| (name.to_string(), v.clone())))
              .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn malformed_fields_are_dropped() {
        let update = StatusUpdate::default().load_date("ayer")
                                            .load_rows(json!("12"))
                                            .load_percent(1.5)
                                            .tables_count(4);
        assert_eq!(Value::Object(update.payload()), json!({"tables_count": 4}));
    }

    #[test]
    fn well_formed_fields_are_kept() {
        let update = StatusUpdate::default().load_date("2024-03-01T10:00:00Z")
                                            .load_rows(1200)
                                            .load_percent(100);
        assert_eq!(Value::Object(update.payload()),
                   json!({"load_date": "2024-03-01T10:00:00Z", "load_rows": 1200, "load_percent": 100}));
    }

    #[test]
    fn empty_update_has_empty_payload() {
        assert!(StatusUpdate::default().payload().is_empty());
    }
}
