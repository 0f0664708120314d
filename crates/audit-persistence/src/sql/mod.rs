//! Renderizado de sentencias a SQL por dialecto.
//!
//! Todo identificador que llega acá es una constante interna o un
//! `SqlIdent` validado; los nombres arbitrarios (sondas de existencia,
//! drops de objetos listados) pasan por `quote_ident` / `quote_literal`.

mod rowstore;
mod warehouse;

pub use rowstore::RowStoreDialect;
pub use warehouse::WarehouseDialect;

use audit_core::ViewDefinition;

use crate::engine::{PreparedStatement, Statement, TableKind};

/// Columnas del log en el orden en que se crean y se copian.
pub(crate) const LOG_COLUMNS: &[&str] = &["entity_href", "entity_id", "entity_type", "entity_data", "event_type", "event_moment"];

/// Clave de deduplicación común a ambos motores.
pub(crate) const IDENTITY_EXPR: &str = "COALESCE(NULLIF(entity_href, ''), entity_id)";

pub trait SqlDialect {
    /// Nombre completamente calificado y entrecomillado.
    fn qualify(&self, table: &str) -> String;
    /// Expresión de `partition_key` a partir de `entity_type`.
    fn partition_key_expr(&self) -> String;
    fn create_log_table(&self, table: &str) -> String;
    fn create_partition_table(&self, table: &str) -> String;
    fn select_schema_samples(&self, table: &str, window: u32) -> String;
    /// Escalar en `$.key` de `entity_data` como texto.
    fn json_scalar(&self, key: &str) -> String;
    fn table_exists(&self, name: &str) -> String;
    fn list_tables(&self) -> String;

    fn fill_partition(&self, source: &str, target: &str) -> String {
        let cols = LOG_COLUMNS.join(", ");
        format!("INSERT INTO {target} ({cols}, partition_key)\nSELECT {cols},\n    {key}\nFROM {source}",
                target = self.qualify(target),
                key = self.partition_key_expr(),
                source = self.qualify(source))
    }

    fn create_partition_view(&self, source: &str, target: &str) -> String {
        format!("CREATE VIEW IF NOT EXISTS {target} AS\nSELECT {cols},\n    {key} AS partition_key\nFROM {source}",
                target = self.qualify(target),
                cols = LOG_COLUMNS.join(", "),
                key = self.partition_key_expr(),
                source = self.qualify(source))
    }

    fn create_view(&self, view: &ViewDefinition, source: &str) -> String {
        let mut select: Vec<String> = view.identity.names().iter().map(|c| c.to_string()).collect();
        select.push("event_moment".to_string());
        for f in &view.fields {
            select.push(format!("{} AS {}", self.json_scalar(f.key.as_str()), quote_ident(f.column.as_str())));
        }
        format!("CREATE VIEW IF NOT EXISTS {name} AS\n\
                 -- Vista generada: estado actual de '{t}' (bucket {bucket}).\n\
                 SELECT\n    {select}\n\
                 FROM (\n    \
                     SELECT entity_href, entity_id, entity_data, event_moment,\n        \
                         ROW_NUMBER() OVER (PARTITION BY {identity} ORDER BY event_moment DESC) AS rn\n    \
                     FROM {source}\n    \
                     WHERE partition_key = {bucket}\n        \
                         AND entity_type = '{t}'\n        \
                         AND {identity} != ''\n\
                 ) latest\n\
                 WHERE latest.rn = 1",
                name = self.qualify(view.name.as_str()),
                t = view.entity_type,
                bucket = view.bucket,
                select = select.join(",\n    "),
                identity = IDENTITY_EXPR,
                source = self.qualify(source))
    }

    fn drop(&self, name: &str, kind: TableKind) -> String {
        format!("DROP {} IF EXISTS {}", kind.as_str(), self.qualify(name))
    }

    fn render(&self, statement: &Statement) -> String {
        match statement {
            Statement::CreateLogTable { table } => self.create_log_table(table),
            Statement::CreatePartitionTable { table } => self.create_partition_table(table),
            Statement::FillPartition { source, target } => self.fill_partition(source, target),
            Statement::CreatePartitionView { source, target } => self.create_partition_view(source, target),
            Statement::SelectSchemaSamples { table, window } => self.select_schema_samples(table, *window),
            Statement::CreateView { view, source } => self.create_view(view, source),
            Statement::Drop { name, kind } => self.drop(name, *kind),
            Statement::TableExists { name } => self.table_exists(name),
            Statement::ListTables => self.list_tables(),
            Statement::Raw(sql) => sql.clone(),
        }
    }

    fn prepare(&self, statement: Statement) -> PreparedStatement {
        let sql = self.render(&statement);
        PreparedStatement { statement, sql }
    }
}

/// Identificador entre backticks (ambos motores), duplicando backticks internos.
pub fn quote_ident(raw: &str) -> String {
    format!("`{}`", raw.replace('`', "``"))
}

/// Literal de texto entre comillas simples con escape de `\` y `'`.
pub fn quote_literal(raw: &str) -> String {
    format!("'{}'", raw.replace('\\', "\\\\").replace('\'', "\\'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoting_escapes_delimiters() {
        assert_eq!(quote_ident("a`b"), "`a``b`");
        assert_eq!(quote_literal(r"it's\"), r"'it\'s\\'");
    }
}
