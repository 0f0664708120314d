//! Pasos comunes a ambos backends: ejecución con logging, sondas de
//! existencia, creación de vistas y purga por prefijo. Lo que diverge entre
//! motores (staging, particionado, modo sandbox) vive en cada backend.

use audit_core::constants::{PARTITION_TABLE, TABLE_PREFIX, VIEW_PREFIX};
use audit_core::{IdentityColumns, JsonRow, ProjectionReport, SchemaSample, ViewDefinition};
use log::{debug, info, warn};

use crate::engine::{EngineClient, QueryOutput, Statement, TableKind};
use crate::error::PersistenceError;
use crate::sql::SqlDialect;

pub(crate) fn run<C, D>(client: &C, dialect: &D, statement: Statement) -> Result<QueryOutput, PersistenceError>
    where C: EngineClient,
          D: SqlDialect
{
    let label = statement.label();
    let prepared = dialect.prepare(statement);
    debug!("execute:start kind={label}");
    let out = client.execute(&prepared);
    match &out {
        Ok(_) => debug!("execute:done kind={label}"),
        Err(e) => debug!("execute:error kind={label} err={e}"),
    }
    out
}

/// Tipo del objeto `name`, o `None` si no existe. Cualquier error de la
/// sonda cuenta como "no existe".
pub(crate) fn probe_kind<C, D>(client: &C, dialect: &D, name: &str) -> Option<TableKind>
    where C: EngineClient,
          D: SqlDialect
{
    match run(client, dialect, Statement::TableExists { name: name.to_string() }) {
        Ok(out) => out.into_rows()
                      .first()
                      .map(|row| TableKind::parse(text(row, "table_type").unwrap_or("TABLE"))),
        Err(e) => {
            debug!("table_exists:error name={name} err={e} -> false");
            None
        }
    }
}

pub(crate) fn probe_exists<C, D>(client: &C, dialect: &D, name: &str) -> bool
    where C: EngineClient,
          D: SqlDialect
{
    probe_kind(client, dialect, name).is_some()
}

/// Borra `name` con el `DROP` que corresponde a su tipo actual (tabla o
/// vista). Si no existe no emite nada.
pub(crate) fn drop_existing<C, D>(client: &C, dialect: &D, name: &str) -> Result<(), PersistenceError>
    where C: EngineClient,
          D: SqlDialect
{
    match probe_kind(client, dialect, name) {
        Some(kind) => run(client, dialect, Statement::Drop { name: name.to_string(), kind }).map(|_| ()),
        None => Ok(()),
    }
}

fn text<'a>(row: &'a JsonRow, column: &str) -> Option<&'a str> {
    row.get(column).and_then(|v| v.as_str())
}

/// Crea la vista de cada tipo muestreado que todavía no la tenga.
///
/// Una muestra inválida corta la corrida en ese tipo: las vistas de tipos
/// posteriores no se crean.
pub(crate) fn materialize_views<C, D>(client: &C,
                                      dialect: &D,
                                      identity: IdentityColumns,
                                      samples: Vec<JsonRow>)
                                      -> Result<ProjectionReport, PersistenceError>
    where C: EngineClient,
          D: SqlDialect
{
    let mut report = ProjectionReport::default();
    for row in samples {
        let entity_type = text(&row, "entity_type").ok_or_else(|| PersistenceError::Unknown("sample row without entity_type".into()))?;
        let name = match ViewDefinition::view_name(entity_type) {
            Ok(name) => name,
            Err(_) => {
                warn!("update_projections:skip entity_type={entity_type:?} (identificador inseguro)");
                report.skipped.push(entity_type.to_string());
                continue;
            }
        };
        if probe_exists(client, dialect, name.as_str()) {
            debug!("update_projections:exists view={name}");
            report.existing.push(name.to_string());
            continue;
        }
        let sample = SchemaSample::parse(entity_type, text(&row, "entity_data"))?;
        let view = ViewDefinition::build(&sample, identity)?;
        info!("update_projections:create view={name} columns={}", view.columns().len());
        run(client, dialect, Statement::CreateView { view, source: PARTITION_TABLE.to_string() })?;
        report.created.push(name.to_string());
    }
    Ok(report)
}

/// Borra vistas `brv_*` y, con `full_delete`, todo objeto `brs*`.
pub(crate) fn purge_objects<C, D>(client: &C, dialect: &D, full_delete: bool) -> Result<Vec<String>, PersistenceError>
    where C: EngineClient,
          D: SqlDialect
{
    let listed = run(client, dialect, Statement::ListTables)?.into_rows();
    let mut dropped = Vec::new();
    for row in &listed {
        let Some(name) = text(row, "table_name") else { continue };
        let kind = TableKind::parse(text(row, "table_type").unwrap_or("TABLE"));
        if name.starts_with(VIEW_PREFIX) || (full_delete && name.starts_with(TABLE_PREFIX)) {
            run(client, dialect, Statement::Drop { name: name.to_string(), kind })?;
            dropped.push(name.to_string());
        }
    }
    info!("purge:done full_delete={full_delete} dropped={}", dropped.len());
    Ok(dropped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RowStoreConfig;
    use crate::memory::InMemoryEngine;
    use crate::sql::RowStoreDialect;

    #[test]
    fn drop_matches_the_kind_found_in_the_engine() {
        let engine = InMemoryEngine::new();
        let d = RowStoreDialect::new(&RowStoreConfig::new("h", "db", "u", "p").unwrap());
        run(&engine, &d, Statement::CreateLogTable { table: "raw".into() }).unwrap();
        run(&engine, &d, Statement::CreatePartitionView { source: "raw".into(), target: "part".into() }).unwrap();

        assert_eq!(probe_kind(&engine, &d, "raw"), Some(TableKind::Table));
        assert_eq!(probe_kind(&engine, &d, "part"), Some(TableKind::View));
        assert_eq!(probe_kind(&engine, &d, "missing"), None);

        drop_existing(&engine, &d, "part").unwrap();
        drop_existing(&engine, &d, "missing").unwrap();
        assert_eq!(engine.kind_of("part"), None);
        assert!(engine.statements().contains(&Statement::Drop { name: "part".into(), kind: TableKind::View }));
    }
}
