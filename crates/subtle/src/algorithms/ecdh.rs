use super::{ensure_usages, unsupported_format};
use crate::algorithm::Algorithm;
use crate::deferred::Deferred;
use crate::error::CryptoError;
use crate::format::{ExportedKey, KeyData, KeyFormat};
use crate::key::{CryptoKey, CryptoKeyPair, KeyAlgorithm};
use crate::operation::Capabilities;
use crate::plugin::{CryptoAlgorithm, GeneratedKey};
use crate::registry::AlgorithmRegistry;
use crate::usage::{KeyType, KeyUsages};
use wcrypt_primitives::ecdh;

const NAME: &str = "ECDH";
const CURVE: &str = "P-256";
const ALLOWED_USAGES: KeyUsages = KeyUsages::DERIVE_KEY.union(KeyUsages::DERIVE_BITS);
const SECRET_BITS: u32 = 256;

/// Elliptic-curve Diffie-Hellman on P-256.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ecdh;

impl Ecdh {
    fn check_curve(params: &Algorithm) -> Result<KeyAlgorithm, CryptoError> {
        match params.named_curve.as_deref() {
            Some(CURVE) => Ok(KeyAlgorithm::new(NAME).with_named_curve(CURVE)),
            Some(other) => Err(CryptoError::NotSupported {
                message: format!("curve `{other}` is not supported").into(),
                context: Some(NAME.into()),
            }),
            None => Err(CryptoError::type_mismatch("ECDH requires `namedCurve`")),
        }
    }

    fn check_peer(key: &CryptoKey, peer: &CryptoKey) -> Result<(), CryptoError> {
        if key.key_type() != KeyType::Private {
            return Err(CryptoError::invalid_access("ECDH derivation requires a private key"));
        }
        if peer.key_type() != KeyType::Public {
            return Err(CryptoError::invalid_access("`public` must be a public key"));
        }
        if !peer.algorithm().name.eq_ignore_ascii_case(NAME) {
            return Err(CryptoError::invalid_access(format!(
                "`public` is a {} key, expected {NAME}",
                peer.algorithm().name
            )));
        }
        if peer.algorithm().named_curve != key.algorithm().named_curve {
            return Err(CryptoError::invalid_access("`public` key is on a different curve"));
        }
        Ok(())
    }
}

/// Keeps the leading `bits` of `secret`, zeroing the unused low bits of the last byte.
fn truncate_bits(secret: &[u8], bits: u32) -> Vec<u8> {
    let bytes = bits.div_ceil(8) as usize;
    let mut out = secret[..bytes].to_vec();
    let rem = bits % 8;
    if rem != 0
        && let Some(last) = out.last_mut()
    {
        *last &= 0xffu8 << (8 - rem);
    }
    out
}

impl CryptoAlgorithm for Ecdh {
    fn name(&self) -> &'static str {
        NAME
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::DERIVE_BITS
            | Capabilities::GENERATE_KEY
            | Capabilities::IMPORT_KEY
            | Capabilities::EXPORT_KEY
    }

    /// Without a `length` the full 256-bit shared secret is returned.
    fn derive_bits(
        &self,
        _registry: &AlgorithmRegistry,
        params: &Algorithm,
        key: &CryptoKey,
        length: Option<u32>,
    ) -> Result<Deferred<Vec<u8>>, CryptoError> {
        let peer = params
            .public
            .as_ref()
            .ok_or_else(|| CryptoError::type_mismatch("ECDH requires a `public` key"))?;
        Self::check_peer(key, peer)?;

        let bits = length.unwrap_or(SECRET_BITS);
        if bits > SECRET_BITS {
            return Err(CryptoError::operation(format!(
                "requested {bits} bits exceeds the {SECRET_BITS}-bit shared secret"
            )));
        }
        key.material_for(ALLOWED_USAGES)?;

        let key = key.clone();
        let peer = peer.clone();
        Ok(Deferred::spawn("ecdh", move || {
            let secret = key.material_for(ALLOWED_USAGES)?;
            let shared = ecdh::p256_derive(secret, peer.public_material()?)?;
            Ok(truncate_bits(&shared, bits))
        }))
    }

    fn generate_key(
        &self,
        _registry: &AlgorithmRegistry,
        params: &Algorithm,
        extractable: bool,
        usages: KeyUsages,
    ) -> Result<GeneratedKey, CryptoError> {
        let algorithm = Self::check_curve(params)?;
        ensure_usages(usages, ALLOWED_USAGES, NAME)?;

        let pair = ecdh::p256_generate()?;
        Ok(GeneratedKey::Pair(CryptoKeyPair {
            public_key: CryptoKey::new(
                KeyType::Public,
                algorithm.clone(),
                true,
                KeyUsages::empty(),
                pair.public,
            ),
            private_key: CryptoKey::new(
                KeyType::Private,
                algorithm,
                extractable,
                usages,
                pair.secret,
            ),
        }))
    }

    /// Only raw public keys (uncompressed SEC1 points) are importable.
    fn import_key(
        &self,
        _registry: &AlgorithmRegistry,
        format: KeyFormat,
        data: KeyData,
        params: &Algorithm,
        extractable: bool,
        usages: KeyUsages,
    ) -> Result<CryptoKey, CryptoError> {
        let algorithm = Self::check_curve(params)?;
        if format != KeyFormat::Raw {
            return Err(unsupported_format(format, NAME));
        }
        if !usages.is_empty() {
            return Err(CryptoError::syntax("ECDH public keys cannot have usages"));
        }
        let KeyData::Bytes(point) = data else {
            return Err(CryptoError::type_mismatch("raw ECDH key data must be bytes"));
        };

        ecdh::p256_validate_public(&point).map_err(|e| CryptoError::data(e.to_string()))?;
        Ok(CryptoKey::new(KeyType::Public, algorithm, extractable, usages, point))
    }

    fn export_key(&self, format: KeyFormat, key: &CryptoKey) -> Result<ExportedKey, CryptoError> {
        if format != KeyFormat::Raw {
            return Err(unsupported_format(format, NAME));
        }
        let point = key.public_material()?;
        key.exportable_material()?;
        Ok(ExportedKey::Bytes(point.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p256() -> Algorithm {
        Algorithm::builder().name(NAME).named_curve(CURVE).build()
    }

    fn pair(registry: &AlgorithmRegistry) -> CryptoKeyPair {
        Ecdh.generate_key(registry, &p256(), false, KeyUsages::DERIVE_BITS)
            .unwrap()
            .into_pair()
            .unwrap()
    }

    fn derive(registry: &AlgorithmRegistry, private: &CryptoKey, peer: &CryptoKey, length: Option<u32>) -> Vec<u8> {
        let params = Algorithm::builder().name(NAME).public(peer.clone()).build();
        Ecdh.derive_bits(registry, &params, private, length).unwrap().into_ready().unwrap().unwrap()
    }

    #[test]
    fn test_both_sides_agree() {
        let registry = AlgorithmRegistry::with_defaults().unwrap();
        let alice = pair(&registry);
        let bob = pair(&registry);

        assert!(alice.public_key.usages().is_empty());
        assert!(alice.public_key.extractable());
        assert_eq!(alice.private_key.key_type(), KeyType::Private);

        let ab = derive(&registry, &alice.private_key, &bob.public_key, None);
        let ba = derive(&registry, &bob.private_key, &alice.public_key, None);
        assert_eq!(ab.len(), 32);
        assert_eq!(ab, ba);
    }

    #[test]
    fn test_trailing_bits_are_masked() {
        assert_eq!(truncate_bits(&[0xff, 0xff, 0xff], 12), [0xff, 0xf0]);
        assert_eq!(truncate_bits(&[0xab, 0xcd], 16), [0xab, 0xcd]);
    }

    #[test]
    fn test_peer_must_be_public_ecdh_key() {
        let registry = AlgorithmRegistry::with_defaults().unwrap();
        let alice = pair(&registry);

        let params = Algorithm::builder().name(NAME).public(alice.private_key.clone()).build();
        let err = Ecdh.derive_bits(&registry, &params, &alice.private_key, None).unwrap_err();
        assert!(matches!(err, CryptoError::InvalidAccess { .. }));

        let params = Algorithm::named(NAME);
        let err = Ecdh.derive_bits(&registry, &params, &alice.private_key, None).unwrap_err();
        assert!(matches!(err, CryptoError::TypeMismatch { .. }));
    }

    #[test]
    fn test_oversized_length_is_operation_error() {
        let registry = AlgorithmRegistry::with_defaults().unwrap();
        let alice = pair(&registry);
        let bob = pair(&registry);
        let params = Algorithm::builder().name(NAME).public(bob.public_key).build();
        let err = Ecdh.derive_bits(&registry, &params, &alice.private_key, Some(264)).unwrap_err();
        assert!(matches!(err, CryptoError::Operation { .. }));
    }

    #[test]
    fn test_public_key_raw_roundtrip() {
        let registry = AlgorithmRegistry::with_defaults().unwrap();
        let alice = pair(&registry);

        let exported = Ecdh.export_key(KeyFormat::Raw, &alice.public_key).unwrap();
        let raw = exported.as_bytes().unwrap().to_vec();
        assert_eq!(raw.len(), 65);

        let imported = Ecdh
            .import_key(&registry, KeyFormat::Raw, raw.into(), &p256(), true, KeyUsages::empty())
            .unwrap();
        assert_eq!(imported.key_type(), KeyType::Public);

        let err = Ecdh.export_key(KeyFormat::Raw, &alice.private_key).unwrap_err();
        assert!(matches!(err, CryptoError::InvalidAccess { .. }));
    }

    #[test]
    fn test_other_curves_are_not_supported() {
        let registry = AlgorithmRegistry::with_defaults().unwrap();
        let params = Algorithm::builder().name(NAME).named_curve("P-384").build();
        let err = Ecdh.generate_key(&registry, &params, false, KeyUsages::DERIVE_BITS).unwrap_err();
        assert!(matches!(err, CryptoError::NotSupported { .. }));
    }
}
