//! audit-redact
//!
//! Seudonimización de datos personales a nivel de campo, sin efectos
//! laterales. Pensada para aplicarse al payload antes de construir el
//! `AuditEvent`.

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Digest SHA-256 en hex (minúsculas) del texto en UTF-8.
pub fn sha256_hex(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Reemplaza cada campo de `fields` presente en `record`:
/// - texto: por su digest SHA-256;
/// - cualquier otro valor (null, número, bool, objeto, array): por `""`.
///
/// Los campos ausentes no se agregan.
pub fn redact<S: AsRef<str>>(mut record: Map<String, Value>, fields: &[S]) -> Map<String, Value> {
    for field in fields {
        if let Some(value) = record.get_mut(field.as_ref()) {
            let replacement = match &*value {
                Value::String(text) => sha256_hex(text),
                _ => String::new(),
            };
            *value = Value::String(replacement);
        }
    }
    record
}

/// Variante para un documento arbitrario: sólo los objetos tienen campos.
pub fn redact_value<S: AsRef<str>>(value: Value, fields: &[S]) -> Value {
    match value {
        Value::Object(map) => Value::Object(redact(map, fields)),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => panic!("se esperaba un objeto"),
        }
    }

    #[test]
    fn known_digest() {
        assert_eq!(sha256_hex("abc"), "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad");
        assert_eq!(sha256_hex(""), "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855");
    }

    #[test]
    fn text_is_hashed_and_the_rest_blanked() {
        let out = redact(obj(json!({"name": "Alice", "age": 30})), &["name", "age"]);
        assert_eq!(Value::Object(out), json!({"name": sha256_hex("Alice"), "age": ""}));
    }

    #[test]
    fn absent_fields_are_left_alone() {
        assert!(redact(Map::new(), &["name"]).is_empty());
        let out = redact(obj(json!({"city": "Quito"})), &["name"]);
        assert_eq!(Value::Object(out), json!({"city": "Quito"}));
    }

    #[test]
    fn null_and_structured_values_become_empty() {
        let out = redact(obj(json!({"a": null, "b": {"x": 1}, "c": [1], "d": false})), &["a", "b", "c", "d"]);
        assert_eq!(Value::Object(out), json!({"a": "", "b": "", "c": "", "d": ""}));
    }

    #[test]
    fn non_objects_pass_through() {
        assert_eq!(redact_value(json!([1, 2]), &["name"]), json!([1, 2]));
    }
}
