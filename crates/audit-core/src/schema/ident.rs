//! Identificadores seguros para embeber en texto SQL.
//!
//! Los nombres de vistas y columnas generadas no pueden viajar como
//! parámetros, así que sólo se aceptan `[A-Za-z_][A-Za-z0-9_]*` con un
//! máximo de 128 caracteres. Con ese alfabeto el valor tampoco necesita
//! escape cuando aparece como literal de texto.

use std::fmt;

use crate::errors::CoreError;

const MAX_IDENT_LEN: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SqlIdent(String);

impl SqlIdent {
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        if is_safe_ident(raw) {
            Ok(Self(raw.to_string()))
        } else {
            Err(CoreError::InvalidIdentifier(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SqlIdent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SqlIdent {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

pub fn is_safe_ident(raw: &str) -> bool {
    let mut chars = raw.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    raw.len() <= MAX_IDENT_LEN && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
