//! Configuración del reporter. Los tres valores son opcionales al cargar;
//! la ausencia de cualquiera se informa recién al invocar una operación.

use std::env;

use dotenvy::dotenv;
use once_cell::sync::Lazy;

use crate::error::ReporterError;

static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenv();
});

#[derive(Debug, Clone, Default)]
pub struct ReporterConfig {
    pub endpoint: Option<String>,
    pub token: Option<String>,
    pub integration_id: Option<String>,
}

/// Valores ya verificados, prestados de `ReporterConfig`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Resolved<'a> {
    pub endpoint: &'a str,
    pub token: &'a str,
    pub integration_id: &'a str,
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl ReporterConfig {
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>, integration_id: impl Into<String>) -> Self {
        Self { endpoint: Some(endpoint.into()), token: Some(token.into()), integration_id: Some(integration_id.into()) }
    }

    /// Lee `AUDIT_REPORTER_ENDPOINT`, `AUDIT_REPORTER_TOKEN` y
    /// `AUDIT_REPORTER_INTEGRATION_ID` (tras cargar `.env`).
    pub fn from_env() -> Self {
        Lazy::force(&DOTENV_LOADED);
        Self { endpoint: optional("AUDIT_REPORTER_ENDPOINT"),
               token: optional("AUDIT_REPORTER_TOKEN"),
               integration_id: optional("AUDIT_REPORTER_INTEGRATION_ID") }
    }

    pub fn is_complete(&self) -> bool {
        self.resolve().is_ok()
    }

    pub(crate) fn resolve(&self) -> Result<Resolved<'_>, ReporterError> {
        fn present<'a>(v: &'a Option<String>, name: &'static str) -> Result<&'a str, ReporterError> {
            v.as_deref().filter(|s| !s.trim().is_empty()).ok_or(ReporterError::MissingConfig(name))
        }
        Ok(Resolved { endpoint: present(&self.endpoint, "endpoint")?,
                      token: present(&self.token, "token")?,
                      integration_id: present(&self.integration_id, "integration_id")? })
    }
}
