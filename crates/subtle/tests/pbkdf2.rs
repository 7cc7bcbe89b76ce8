pub mod fixtures;

use fixtures::*;
use wcrypt_primitives::{HashFunction, PrimitiveError};
use wcrypt_subtle::CryptoAlgorithm;
use wcrypt_subtle::algorithms::{self, Pbkdf2};
use wcrypt_subtle::prelude::*;

#[tokio::test]
async fn test_end_to_end_derivation_is_deterministic() {
    let subtle = setup_subtle();
    let key = pbkdf2_key(&subtle, KeyUsages::DERIVE_BITS).await;

    let first = subtle.derive_bits(pbkdf2_params(), &key, Some(256)).await.unwrap();
    let second = subtle.derive_bits(pbkdf2_params(), &key, Some(256)).await.unwrap();

    assert_eq!(first.len(), 32);
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_matches_the_primitive_directly() {
    let subtle = setup_subtle();
    let secret = test_bytes(32);
    let key = subtle
        .import_key(KeyFormat::Raw, secret.clone(), "pbkdf2", false, KeyUsages::DERIVE_BITS)
        .await
        .unwrap();

    let bits = subtle.derive_bits(pbkdf2_params(), &key, Some(256)).await.unwrap();
    let expected =
        wcrypt_primitives::kdf::pbkdf2(&secret, &[0u8; 16], 1000, 32, HashFunction::Sha256).unwrap();
    assert_eq!(bits, expected);
}

#[tokio::test]
async fn test_missing_iterations_is_reported_before_the_length() {
    let subtle = setup_subtle();
    let key = pbkdf2_key(&subtle, KeyUsages::DERIVE_BITS).await;

    let mut params = pbkdf2_params();
    params.iterations = None;
    let err = subtle.derive_bits(params, &key, Some(7)).await.unwrap_err();
    assert_eq!(err.exception(), "TypeError");
}

#[tokio::test]
async fn test_invalid_lengths_and_iterations() {
    let subtle = setup_subtle();
    let key = pbkdf2_key(&subtle, KeyUsages::DERIVE_BITS).await;

    for length in [Some(7), Some(0), None] {
        let err = subtle.derive_bits(pbkdf2_params(), &key, length).await.unwrap_err();
        assert_eq!(err.exception(), "OperationError", "{length:?}");
    }

    let mut params = pbkdf2_params();
    params.iterations = Some(0);
    let err = subtle.derive_bits(params, &key, Some(256)).await.unwrap_err();
    assert_eq!(err.exception(), "OperationError");
}

#[tokio::test]
async fn test_import_key_policy() {
    let subtle = setup_subtle();
    let bytes = test_bytes(16);

    let err = subtle
        .import_key(KeyFormat::Raw, bytes.clone(), "PBKDF2", true, KeyUsages::DERIVE_BITS)
        .await
        .unwrap_err();
    assert_eq!(err.exception(), "SyntaxError");

    let err = subtle
        .import_key(KeyFormat::Raw, bytes.clone(), "PBKDF2", false, KeyUsages::ENCRYPT)
        .await
        .unwrap_err();
    assert_eq!(err.exception(), "SyntaxError");

    let err = subtle
        .import_key(KeyFormat::Raw, bytes.clone(), "PBKDF2", false, KeyUsages::empty())
        .await
        .unwrap_err();
    assert_eq!(err.exception(), "SyntaxError");

    let err = subtle
        .import_key(KeyFormat::Pkcs8, bytes.clone(), "PBKDF2", false, KeyUsages::DERIVE_BITS)
        .await
        .unwrap_err();
    assert_eq!(err.exception(), "NotSupportedError");

    let key = subtle
        .import_key(KeyFormat::Raw, bytes, "PBKDF2", false, KeyUsages::DERIVE_BITS)
        .await
        .unwrap();
    assert_eq!(key.key_type(), KeyType::Secret);
    assert!(!key.extractable());
    assert_eq!(key.usages(), KeyUsages::DERIVE_BITS);
    assert_eq!(key.algorithm().name, "PBKDF2");
}

#[tokio::test]
async fn test_usage_is_enforced_before_derivation() {
    let subtle = setup_subtle();
    let key = pbkdf2_key(&subtle, KeyUsages::DERIVE_KEY).await;

    let err = subtle.derive_bits(pbkdf2_params(), &key, Some(256)).await.unwrap_err();
    assert!(matches!(err, CryptoError::InvalidAccess { .. }));

    let err = key.require_usage(KeyUsage::Sign).unwrap_err();
    assert!(matches!(err, CryptoError::InvalidAccess { .. }));
}

#[tokio::test]
async fn test_key_is_never_exportable() {
    let subtle = setup_subtle();
    let key = pbkdf2_key(&subtle, KeyUsages::DERIVE_BITS).await;

    let err = subtle.export_key(KeyFormat::Raw, &key).await.unwrap_err();
    assert_eq!(err.exception(), "NotSupportedError");
    assert!(matches!(err, CryptoError::NotSupported { .. }));
}

#[tokio::test]
async fn test_primitive_failure_propagates_through_the_facade() {
    fn broken(
        _: &[u8],
        _: &[u8],
        _: u32,
        _: usize,
        _: HashFunction,
    ) -> Result<Vec<u8>, PrimitiveError> {
        Err(PrimitiveError::Internal { message: "stretching unavailable".into(), context: None })
    }

    let registry = AlgorithmRegistry::builder()
        .register_all(algorithms::all().into_iter().filter(|p| p.name() != "PBKDF2"))
        .register(Pbkdf2::with_stretch(broken))
        .build()
        .unwrap();
    let subtle = SubtleCrypto::new(registry);
    let key = pbkdf2_key(&subtle, KeyUsages::DERIVE_BITS).await;

    let err = subtle.derive_bits(pbkdf2_params(), &key, Some(256)).await.unwrap_err();
    assert_eq!(err.exception(), "OperationError");
    assert!(matches!(
        err,
        CryptoError::Primitive { source: PrimitiveError::Internal { .. }, context: None }
    ));
}
