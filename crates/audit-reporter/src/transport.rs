//! Frontera HTTP del reporter.

use std::time::Duration;

use log::debug;
use serde_json::Value;

use crate::error::ReporterError;

pub trait StatusTransport {
    fn get(&self, url: &str, token: &str) -> Result<Value, ReporterError>;
    fn post(&self, url: &str, token: &str, body: &Value) -> Result<Value, ReporterError>;
}

/// Transporte bloqueante con `ureq`; autentica con `Bearer <token>`.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(timeout: Duration) -> Self {
        Self { agent: ureq::AgentBuilder::new().timeout(timeout).build() }
    }

    fn finish(result: Result<ureq::Response, ureq::Error>) -> Result<Value, ReporterError> {
        match result {
            Ok(resp) => resp.into_json::<Value>().map_err(|e| ReporterError::Decode(e.to_string())),
            Err(ureq::Error::Status(code, resp)) => {
                let body = resp.into_string().unwrap_or_default();
                Err(ReporterError::Status { code, body })
            }
            Err(ureq::Error::Transport(t)) => Err(ReporterError::Transport(t.to_string())),
        }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

impl StatusTransport for UreqTransport {
    fn get(&self, url: &str, token: &str) -> Result<Value, ReporterError> {
        debug!("reporter:get url={url}");
        Self::finish(self.agent.get(url).set("Authorization", &format!("Bearer {token}")).call())
    }

    fn post(&self, url: &str, token: &str, body: &Value) -> Result<Value, ReporterError> {
        debug!("reporter:post url={url}");
        Self::finish(self.agent.post(url).set("Authorization", &format!("Bearer {token}")).send_json(body))
    }
}
