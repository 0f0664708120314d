//! Asignación de bucket por `entity_type`.
//!
//! `bucket(t) = abs(fingerprint64(t) como i64 mod 4000)`, con FarmHash
//! Fingerprint64. Es la misma familia que `FARM_FINGERPRINT` del warehouse y
//! `farmFingerprint64` del row store, y el módulo se toma sobre el valor con
//! signo igual que en SQL, así que la clave calculada en Rust coincide con la
//! calculada por cualquiera de los dos motores.

use crate::constants::BUCKET_COUNT;

pub struct PartitionAssigner;

impl PartitionAssigner {
    /// Fingerprint de 64 bits con signo (representación de `FARM_FINGERPRINT`).
    pub fn fingerprint(entity_type: &str) -> i64 {
        farmhash::fingerprint64(entity_type.as_bytes()) as i64
    }

    /// Bucket en `[0, BUCKET_COUNT)`.
    pub fn bucket(entity_type: &str) -> u64 {
        (Self::fingerprint(entity_type) % BUCKET_COUNT as i64).unsigned_abs()
    }
}
