//! The key object model.
//!
//! A [`CryptoKey`] is created only by a plugin's import or generate operation and never changes
//! afterwards. Its material is reachable solely through crate-internal accessors that enforce the
//! key's usage set, and is wiped when the last handle is dropped.

use crate::error::CryptoError;
use crate::usage::{KeyType, KeyUsage, KeyUsages};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use zeroize::Zeroizing;

/// The algorithm descriptor a key echoes back, fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyAlgorithm {
    pub name: String,
    /// Canonical name of the inner hash algorithm (`HMAC`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    /// Key length in bits (`HMAC`, `AES-*`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub named_curve: Option<String>,
}

impl KeyAlgorithm {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), hash: None, length: None, named_curve: None }
    }

    #[must_use]
    pub fn with_hash(mut self, hash: impl Into<String>) -> Self {
        self.hash = Some(hash.into());
        self
    }

    #[must_use]
    pub const fn with_length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }

    #[must_use]
    pub fn with_named_curve(mut self, curve: impl Into<String>) -> Self {
        self.named_curve = Some(curve.into());
        self
    }
}

struct KeyInner {
    key_type: KeyType,
    algorithm: KeyAlgorithm,
    extractable: bool,
    usages: KeyUsages,
    material: Zeroizing<Vec<u8>>,
}

/// An immutable handle to key material and its permissions.
///
/// Cloning a `CryptoKey` yields another handle to the same key; equality is handle identity.
#[derive(Clone)]
pub struct CryptoKey {
    inner: Arc<KeyInner>,
}

impl CryptoKey {
    pub(crate) fn new(
        key_type: KeyType,
        algorithm: KeyAlgorithm,
        extractable: bool,
        usages: KeyUsages,
        material: impl Into<Zeroizing<Vec<u8>>>,
    ) -> Self {
        Self {
            inner: Arc::new(KeyInner {
                key_type,
                algorithm,
                extractable,
                usages,
                material: material.into(),
            }),
        }
    }

    #[must_use]
    pub fn key_type(&self) -> KeyType {
        self.inner.key_type
    }

    #[must_use]
    pub fn algorithm(&self) -> &KeyAlgorithm {
        &self.inner.algorithm
    }

    #[must_use]
    pub fn extractable(&self) -> bool {
        self.inner.extractable
    }

    #[must_use]
    pub fn usages(&self) -> KeyUsages {
        self.inner.usages
    }

    /// Fails unless the key grants `usage`.
    ///
    /// # Errors
    /// Returns [`CryptoError::InvalidAccess`] if `usage` is not in [`CryptoKey::usages`].
    pub fn require_usage(&self, usage: KeyUsage) -> Result<(), CryptoError> {
        if self.inner.usages.grants(usage) {
            Ok(())
        } else {
            Err(CryptoError::InvalidAccess {
                message: format!("key usages {} do not include `{usage}`", self.inner.usages)
                    .into(),
                context: Some(self.inner.algorithm.name.clone().into()),
            })
        }
    }

    /// Key material for a consuming operation; the key must grant at least one of `usages`.
    ///
    /// Encryption is also reached through `wrapKey` and derivation through `deriveKey`, hence a
    /// set rather than a single usage.
    pub(crate) fn material_for(&self, usages: KeyUsages) -> Result<&[u8], CryptoError> {
        if self.inner.usages.intersects(usages) {
            Ok(&self.inner.material)
        } else {
            Err(CryptoError::InvalidAccess {
                message: format!("key usages {} do not include any of {usages}", self.inner.usages)
                    .into(),
                context: Some(self.inner.algorithm.name.clone().into()),
            })
        }
    }

    /// Material of an extractable key, for export.
    pub(crate) fn exportable_material(&self) -> Result<&[u8], CryptoError> {
        if self.inner.extractable {
            Ok(&self.inner.material)
        } else {
            Err(CryptoError::invalid_access("key is not extractable"))
        }
    }

    /// Material of a public key. Public keys carry no usages, so no usage check applies.
    pub(crate) fn public_material(&self) -> Result<&[u8], CryptoError> {
        if self.inner.key_type == KeyType::Public {
            Ok(&self.inner.material)
        } else {
            Err(CryptoError::invalid_access(format!(
                "expected a public key, got a {} key",
                self.inner.key_type
            )))
        }
    }
}

impl PartialEq for CryptoKey {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for CryptoKey {}

impl fmt::Debug for CryptoKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CryptoKey")
            .field("type", &self.inner.key_type)
            .field("algorithm", &self.inner.algorithm)
            .field("extractable", &self.inner.extractable)
            .field("usages", &self.inner.usages)
            .finish_non_exhaustive()
    }
}

/// The result of generating an asymmetric key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CryptoKeyPair {
    pub public_key: CryptoKey,
    pub private_key: CryptoKey,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn derive_only_key() -> CryptoKey {
        CryptoKey::new(
            KeyType::Secret,
            KeyAlgorithm::new("PBKDF2"),
            false,
            KeyUsages::DERIVE_BITS,
            b"secret-material".to_vec(),
        )
    }

    #[test]
    fn test_require_usage() {
        let key = derive_only_key();
        assert!(key.require_usage(KeyUsage::DeriveBits).is_ok());

        let err = key.require_usage(KeyUsage::Sign).unwrap_err();
        assert!(matches!(err, CryptoError::InvalidAccess { .. }));
        assert_eq!(err.exception(), "InvalidAccessError");
    }

    #[test]
    fn test_material_accessor_checks_usage() {
        let key = derive_only_key();
        assert_eq!(
            key.material_for(KeyUsages::DERIVE_BITS | KeyUsages::DERIVE_KEY).unwrap(),
            b"secret-material"
        );
        assert!(matches!(
            key.material_for(KeyUsages::ENCRYPT | KeyUsages::WRAP_KEY),
            Err(CryptoError::InvalidAccess { .. })
        ));
    }

    #[test]
    fn test_non_extractable_material_is_not_exportable() {
        let key = derive_only_key();
        assert!(matches!(key.exportable_material(), Err(CryptoError::InvalidAccess { .. })));
        assert!(matches!(key.public_material(), Err(CryptoError::InvalidAccess { .. })));
    }

    #[test]
    fn test_debug_never_prints_material() {
        let rendered = format!("{:?}", derive_only_key());
        assert!(rendered.contains("PBKDF2"));
        assert!(!rendered.contains("secret-material"));
        assert!(!rendered.contains("115, 101, 99"));
    }

    #[test]
    fn test_equality_is_handle_identity() {
        let a = derive_only_key();
        let b = derive_only_key();
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn test_key_algorithm_serializes_camel_case() {
        let alg = KeyAlgorithm::new("ECDH").with_named_curve("P-256");
        let json = serde_json::to_string(&alg).unwrap();
        assert_eq!(json, r#"{"name":"ECDH","namedCurve":"P-256"}"#);
    }
}
