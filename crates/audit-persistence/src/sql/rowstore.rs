//! Dialecto del row store merge-tree.

use audit_core::constants::BUCKET_COUNT;

use super::{quote_ident, quote_literal, SqlDialect};
use crate::config::RowStoreConfig;

#[derive(Debug, Clone)]
pub struct RowStoreDialect {
    database: String,
}

impl RowStoreDialect {
    pub fn new(config: &RowStoreConfig) -> Self {
        Self { database: config.database.clone() }
    }

    fn columns(&self) -> &'static str {
        "    entity_href Nullable(String),\n    \
             entity_id String,\n    \
             entity_type String,\n    \
             entity_data String,\n    \
             event_type Nullable(String),\n    \
             event_moment DateTime64(3, 'UTC')"
    }
}

impl SqlDialect for RowStoreDialect {
    fn qualify(&self, table: &str) -> String {
        format!("{}.{}", quote_ident(&self.database), quote_ident(table))
    }

    // Módulo sobre el valor con signo, igual que el warehouse.
    fn partition_key_expr(&self) -> String {
        format!("toUInt16(abs(toInt64(farmFingerprint64(entity_type)) % {BUCKET_COUNT}))")
    }

    fn create_log_table(&self, table: &str) -> String {
        format!("CREATE TABLE IF NOT EXISTS {} (\n{}\n) ENGINE = MergeTree\nORDER BY (entity_type, event_moment)",
                self.qualify(table),
                self.columns())
    }

    fn create_partition_table(&self, table: &str) -> String {
        format!("CREATE TABLE IF NOT EXISTS {} (\n{},\n    partition_key UInt16\n) ENGINE = MergeTree\n\
                 PARTITION BY partition_key\n\
                 ORDER BY (entity_type, entity_id, event_moment)",
                self.qualify(table),
                self.columns())
    }

    fn select_schema_samples(&self, table: &str, window: u32) -> String {
        format!("SELECT entity_type, entity_data\n\
                 FROM (\n    \
                     SELECT entity_type, entity_data,\n        \
                         row_number() OVER (PARTITION BY entity_type ORDER BY richness DESC NULLS LAST, event_moment DESC) AS pick\n    \
                     FROM (\n        \
                         SELECT entity_type, entity_data, event_moment,\n            \
                             if(isValidJSON(entity_data) AND JSONType(entity_data) = 'Object',\n               \
                                toNullable(length(JSONExtractKeys(entity_data))), NULL) AS richness,\n            \
                             row_number() OVER (PARTITION BY entity_type ORDER BY event_moment DESC) AS rn\n        \
                         FROM {table}\n    \
                     ) AS recent\n    \
                     WHERE recent.rn <= {window}\n\
                 ) AS ranked\n\
                 WHERE ranked.pick = 1\n\
                 ORDER BY entity_type",
                table = self.qualify(table))
    }

    fn json_scalar(&self, key: &str) -> String {
        format!("nullIf(JSON_VALUE(entity_data, '$.{key}'), '')")
    }

    fn table_exists(&self, name: &str) -> String {
        format!("SELECT name AS table_name, if(engine = 'View', 'VIEW', 'TABLE') AS table_type \
                 FROM system.tables WHERE database = {} AND name = {}",
                quote_literal(&self.database),
                quote_literal(name))
    }

    fn list_tables(&self) -> String {
        format!("SELECT name AS table_name, if(engine = 'View', 'VIEW', 'TABLE') AS table_type \
                 FROM system.tables WHERE database = {}",
                quote_literal(&self.database))
    }
}
