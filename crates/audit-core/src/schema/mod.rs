//! Inferencia de esquema y forma de las vistas por tipo.

pub mod ident;
pub mod sample;
pub mod view;

pub use ident::{is_safe_ident, SqlIdent};
pub use sample::{top_level_key_count, SampleCandidate, SchemaInferencer, SchemaSample};
pub use view::{extract_scalar, IdentityColumns, ProjectedField, ViewDefinition};
