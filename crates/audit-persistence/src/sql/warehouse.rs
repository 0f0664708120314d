//! Dialecto del warehouse columnar (particionado por rango de enteros).

use audit_core::constants::BUCKET_COUNT;

use super::{quote_literal, SqlDialect};
use crate::config::WarehouseConfig;

#[derive(Debug, Clone)]
pub struct WarehouseDialect {
    project: String,
    dataset: String,
}

impl WarehouseDialect {
    pub fn new(config: &WarehouseConfig) -> Self {
        Self { project: config.project.clone(), dataset: config.dataset.clone() }
    }

    fn columns(&self) -> &'static str {
        "    entity_href STRING,\n    \
             entity_id STRING,\n    \
             entity_type STRING,\n    \
             entity_data STRING,\n    \
             event_type STRING,\n    \
             event_moment TIMESTAMP"
    }
}

impl SqlDialect for WarehouseDialect {
    fn qualify(&self, table: &str) -> String {
        format!("`{}.{}.{}`", self.project, self.dataset, table.replace('`', ""))
    }

    fn partition_key_expr(&self) -> String {
        format!("ABS(MOD(FARM_FINGERPRINT(entity_type), {BUCKET_COUNT}))")
    }

    fn create_log_table(&self, table: &str) -> String {
        format!("CREATE TABLE IF NOT EXISTS {} (\n{})", self.qualify(table), self.columns())
    }

    fn create_partition_table(&self, table: &str) -> String {
        format!("CREATE TABLE IF NOT EXISTS {} (\n{},\n    partition_key INT64)\n\
                 PARTITION BY RANGE_BUCKET(partition_key, GENERATE_ARRAY(0, {BUCKET_COUNT}, 1))",
                self.qualify(table),
                self.columns())
    }

    fn select_schema_samples(&self, table: &str, window: u32) -> String {
        format!("SELECT entity_type, entity_data\n\
                 FROM (\n    \
                     SELECT entity_type, entity_data,\n        \
                         ROW_NUMBER() OVER (PARTITION BY entity_type ORDER BY richness DESC, event_moment DESC) AS pick\n    \
                     FROM (\n        \
                         SELECT entity_type, entity_data, event_moment,\n            \
                             IF(JSON_TYPE(SAFE.PARSE_JSON(entity_data)) = 'object',\n               \
                                ARRAY_LENGTH(JSON_KEYS(SAFE.PARSE_JSON(entity_data), 1)), NULL) AS richness,\n            \
                             ROW_NUMBER() OVER (PARTITION BY entity_type ORDER BY event_moment DESC) AS rn\n        \
                         FROM {table}\n    \
                     ) recent\n    \
                     WHERE recent.rn <= {window}\n\
                 ) ranked\n\
                 WHERE ranked.pick = 1\n\
                 ORDER BY entity_type",
                table = self.qualify(table))
    }

    fn json_scalar(&self, key: &str) -> String {
        format!("JSON_EXTRACT_SCALAR(entity_data, '$.{key}')")
    }

    fn table_exists(&self, name: &str) -> String {
        format!("SELECT table_name, IF(table_type = 'VIEW', 'VIEW', 'TABLE') AS table_type FROM {} WHERE table_name = {}",
                self.qualify("INFORMATION_SCHEMA.TABLES"),
                quote_literal(name))
    }

    fn list_tables(&self) -> String {
        format!("SELECT table_name, IF(table_type = 'VIEW', 'VIEW', 'TABLE') AS table_type FROM {}",
                self.qualify("INFORMATION_SCHEMA.TABLES"))
    }
}
