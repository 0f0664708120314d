//! Constantes compartidas por el buffer, el particionado y los backends.
//!
//! Los nombres de tablas y el prefijo de vistas forman parte del contrato
//! observable: cambiar cualquiera de ellos deja huérfanas las vistas ya
//! creadas en un dataset existente.

/// Cantidad fija de buckets del particionado por `entity_type`.
pub const BUCKET_COUNT: u64 = 4000;

/// Tamaño por defecto del buffer del cliente antes de disparar `flush`.
pub const DEFAULT_BUFFER_SIZE: usize = 3000;

/// Ventana de muestreo por tipo (filas más recientes, rank <= 999).
pub const SAMPLE_WINDOW: u32 = 999;

/// Log append-only con los eventos tal como llegan.
pub const RAW_TABLE: &str = "brs_audit";
/// Tabla (o vista en sandbox) con `partition_key` calculada.
pub const PARTITION_TABLE: &str = "brs_audit_partition";
/// Tabla de staging de cada batch antes de volcarlo a la partición.
pub const TEMP_TABLE: &str = "brs_audit_temp";

/// Prefijo de las tablas internas (`purge` completo).
pub const TABLE_PREFIX: &str = "brs";
/// Prefijo de las vistas materializadas por tipo.
pub const VIEW_PREFIX: &str = "brv_";

/// Columnas del log; una clave del payload con alguno de estos nombres se
/// renombra en la vista.
pub const RESERVED_COLUMNS: &[&str] = &["entity_id", "entity_href", "entity_type", "event_moment", "partition_key"];

/// Prefijo aplicado a claves del payload que colisionan con columnas reservadas.
pub const COLLISION_PREFIX: &str = "data_";
