use audit_redact::{redact, sha256_hex};
use proptest::prelude::*;
use serde_json::{json, Map, Value};

proptest! {
    #[test]
    fn equal_text_gives_equal_digest(text in ".*") {
        let a = redact(Map::from_iter([("email".to_string(), Value::String(text.clone()))]), &["email"]);
        let b = redact(Map::from_iter([("email".to_string(), Value::String(text.clone()))]), &["email"]);
        prop_assert_eq!(&a, &b);
        let digest = a["email"].as_str().unwrap_or_default();
        prop_assert_eq!(digest.len(), 64);
        prop_assert!(digest.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }
}

#[test]
fn untouched_fields_keep_order_and_value() {
    let record = match json!({"id": 7, "email": "a@b.c", "plan": "pro"}) {
        Value::Object(m) => m,
        _ => unreachable!(),
    };
    let out = redact(record, &["email"]);
    assert_eq!(out.keys().collect::<Vec<_>>(), vec!["id", "email", "plan"]);
    assert_eq!(out["id"], json!(7));
    assert_eq!(out["email"], json!(sha256_hex("a@b.c")));
    assert_eq!(out["plan"], json!("pro"));
}

#[test]
fn redaction_is_not_applied_twice_implicitly() {
    let once = redact(Map::from_iter([("n".to_string(), json!("x"))]), &["n"]);
    let twice = redact(once.clone(), &["n"]);
    assert_ne!(once, twice);
    assert_eq!(twice["n"], json!(sha256_hex(&sha256_hex("x"))));
}
