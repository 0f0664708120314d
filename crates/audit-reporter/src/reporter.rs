//! Operaciones `get_status` / `set_status` sobre
//! `{endpoint}/integrations/{integration_id}/status`.

use log::{debug, warn};
use serde_json::Value;

use crate::config::ReporterConfig;
use crate::error::ReporterError;
use crate::status::{ReportResult, StatusUpdate};
use crate::transport::{StatusTransport, UreqTransport};

pub struct IntegrationReporter<T: StatusTransport = UreqTransport> {
    config: ReporterConfig,
    transport: T,
}

impl IntegrationReporter<UreqTransport> {
    pub fn new(config: ReporterConfig) -> Self {
        Self::with_transport(config, UreqTransport::default())
    }

    pub fn from_env() -> Self {
        Self::new(ReporterConfig::from_env())
    }
}

impl<T: StatusTransport> IntegrationReporter<T> {
    pub fn with_transport(config: ReporterConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &ReporterConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn get_status(&self) -> ReportResult {
        settle("get_status", self.try_get_status())
    }

    pub fn set_status(&self, update: &StatusUpdate) -> ReportResult {
        settle("set_status", self.try_set_status(update))
    }

    fn status_url(&self) -> Result<(String, &str), ReporterError> {
        let cfg = self.config.resolve()?;
        Ok((format!("{}/integrations/{}/status", cfg.endpoint.trim_end_matches('/'), cfg.integration_id), cfg.token))
    }

    fn try_get_status(&self) -> Result<Value, ReporterError> {
        let (url, token) = self.status_url()?;
        self.transport.get(&url, token)
    }

    fn try_set_status(&self, update: &StatusUpdate) -> Result<Value, ReporterError> {
        let (url, token) = self.status_url()?;
        let payload = update.payload();
        debug!("set_status:start fields={:?}", payload.keys().collect::<Vec<_>>());
        self.transport.post(&url, token, &Value::Object(payload))
    }
}

fn settle(op: &str, outcome: Result<Value, ReporterError>) -> ReportResult {
    match outcome {
        Ok(info) => ReportResult::ok(info),
        Err(e) => {
            warn!("{op}:error {e}");
            ReportResult::error(e.to_string())
        }
    }
}
