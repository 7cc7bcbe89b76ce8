#![allow(dead_code)]

use wcrypt_subtle::prelude::*;

/// PBKDF2 parameters used across the end-to-end tests: SHA-256, 16 zero bytes of salt,
/// 1000 iterations.
#[must_use]
pub fn pbkdf2_params() -> Algorithm {
    Algorithm::builder().name("PBKDF2").hash("SHA-256").salt(vec![0u8; 16]).iterations(1000).build()
}

/// Initializes a facade over every built-in algorithm.
/// # Panics
/// * If the built-in registry fails to build.
#[must_use]
pub fn setup_subtle() -> SubtleCrypto {
    SubtleCrypto::with_defaults().expect("Default registry failed to build")
}

/// Imports 32 random bytes as a PBKDF2 key with the given usages.
/// # Panics
/// * If the import fails.
pub async fn pbkdf2_key(subtle: &SubtleCrypto, usages: KeyUsages) -> CryptoKey {
    let secret = test_bytes(32);
    subtle
        .import_key(KeyFormat::Raw, secret, "PBKDF2", false, usages)
        .await
        .expect("PBKDF2 import failed")
}

/// Deterministic pseudo-random bytes for test inputs.
#[must_use]
pub fn test_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| u8::try_from((i * 131 + 7) % 251).unwrap_or_default()).collect()
}
