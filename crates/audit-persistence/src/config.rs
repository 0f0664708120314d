//! Carga de configuración de conexión desde variables de entorno.
//! Los valores de credenciales son opacos: se entregan al transporte del
//! motor, el backend sólo usa los nombres que califican tablas.

use std::env;
use std::fmt;
use std::path::{Path, PathBuf};

use audit_core::constants::DEFAULT_BUFFER_SIZE;
use audit_core::schema::is_safe_ident;
use dotenvy::dotenv;
use log::debug;
use once_cell::sync::Lazy;

use crate::error::PersistenceError;

/// Ruta del `.env` efectivamente cargado, resuelta una sola vez por proceso.
static ENV_FILE: Lazy<Option<PathBuf>> = Lazy::new(|| match dotenv() {
    Ok(path) => {
        debug!("config:dotenv path={}", path.display());
        Some(path)
    }
    Err(_) => None,
});

/// Carga `.env` (si existe) antes de leer variables; devuelve la ruta usada.
pub fn init_dotenv() -> Option<&'static Path> {
    ENV_FILE.as_deref()
}

fn required(key: &str) -> Result<String, PersistenceError> {
    match env::var(key) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(PersistenceError::Config(format!("{key} no definido"))),
    }
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Warehouse columnar: `project.dataset` califica todas las tablas.
#[derive(Debug, Clone)]
pub struct WarehouseConfig {
    pub project: String,
    pub dataset: String,
    pub credentials_path: PathBuf,
}

impl WarehouseConfig {
    pub fn new(project: impl Into<String>,
               dataset: impl Into<String>,
               credentials_path: impl Into<PathBuf>)
               -> Result<Self, PersistenceError> {
        let cfg = Self { project: project.into(), dataset: dataset.into(), credentials_path: credentials_path.into() };
        // Los project ids admiten guiones; nada que rompa el quoting con backticks.
        if cfg.project.is_empty() || !cfg.project.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
            return Err(PersistenceError::Config(format!("project inválido: {:?}", cfg.project)));
        }
        if !is_safe_ident(&cfg.dataset) {
            return Err(PersistenceError::Config(format!("dataset inválido: {:?}", cfg.dataset)));
        }
        Ok(cfg)
    }

    /// Lee `AUDIT_WAREHOUSE_PROJECT`, `AUDIT_WAREHOUSE_DATASET` y
    /// `AUDIT_WAREHOUSE_CREDENTIALS`.
    pub fn from_env() -> Result<Self, PersistenceError> {
        init_dotenv();
        Self::new(required("AUDIT_WAREHOUSE_PROJECT")?,
                  required("AUDIT_WAREHOUSE_DATASET")?,
                  required("AUDIT_WAREHOUSE_CREDENTIALS")?)
    }
}

/// Row store merge-tree: `database` califica todas las tablas.
#[derive(Clone)]
pub struct RowStoreConfig {
    pub host: String,
    pub database: String,
    pub user: String,
    pub password: String,
    pub certificate_path: Option<PathBuf>,
}

impl RowStoreConfig {
    pub fn new(host: impl Into<String>,
               database: impl Into<String>,
               user: impl Into<String>,
               password: impl Into<String>)
               -> Result<Self, PersistenceError> {
        let cfg = Self { host: host.into(),
                         database: database.into(),
                         user: user.into(),
                         password: password.into(),
                         certificate_path: None };
        if !is_safe_ident(&cfg.database) {
            return Err(PersistenceError::Config(format!("database inválida: {:?}", cfg.database)));
        }
        Ok(cfg)
    }

    pub fn with_certificate(mut self, path: impl Into<PathBuf>) -> Self {
        self.certificate_path = Some(path.into());
        self
    }

    /// Lee `AUDIT_ROWSTORE_{HOST,DATABASE,USER,PASSWORD}` y opcionalmente
    /// `AUDIT_ROWSTORE_CERTIFICATE`.
    pub fn from_env() -> Result<Self, PersistenceError> {
        init_dotenv();
        let cfg = Self::new(required("AUDIT_ROWSTORE_HOST")?,
                            required("AUDIT_ROWSTORE_DATABASE")?,
                            required("AUDIT_ROWSTORE_USER")?,
                            required("AUDIT_ROWSTORE_PASSWORD")?)?;
        Ok(match optional("AUDIT_ROWSTORE_CERTIFICATE") {
            Some(cert) => cfg.with_certificate(cert),
            None => cfg,
        })
    }
}

impl fmt::Debug for RowStoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowStoreConfig")
         .field("host", &self.host)
         .field("database", &self.database)
         .field("user", &self.user)
         .field("password", &"***")
         .field("certificate_path", &self.certificate_path)
         .finish()
    }
}

/// Tamaño del buffer del productor (`AUDIT_BUFFER_SIZE`, default 3000).
#[derive(Debug, Clone, Copy)]
pub struct BufferConfig {
    pub buffer_size: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self { buffer_size: DEFAULT_BUFFER_SIZE }
    }
}

impl BufferConfig {
    pub fn from_env() -> Self {
        init_dotenv();
        let buffer_size = optional("AUDIT_BUFFER_SIZE").and_then(|v| v.parse().ok()).unwrap_or(DEFAULT_BUFFER_SIZE);
        Self { buffer_size }
    }
}
