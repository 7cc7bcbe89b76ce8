use super::{ensure_usages, length_in_bytes, unsupported_format};
use crate::algorithm::Algorithm;
use crate::deferred::Deferred;
use crate::error::CryptoError;
use crate::format::{KeyData, KeyFormat};
use crate::key::{CryptoKey, KeyAlgorithm};
use crate::operation::Capabilities;
use crate::plugin::CryptoAlgorithm;
use crate::registry::AlgorithmRegistry;
use crate::usage::{KeyType, KeyUsages};
use wcrypt_primitives::kdf;

const NAME: &str = "HKDF";
const ALLOWED_USAGES: KeyUsages = KeyUsages::DERIVE_KEY.union(KeyUsages::DERIVE_BITS);

/// HKDF (RFC 5869) extract-and-expand.
#[derive(Debug, Clone, Copy, Default)]
pub struct Hkdf;

impl CryptoAlgorithm for Hkdf {
    fn name(&self) -> &'static str {
        NAME
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::DERIVE_BITS | Capabilities::IMPORT_KEY | Capabilities::GET_KEY_LENGTH
    }

    fn derive_bits(
        &self,
        registry: &AlgorithmRegistry,
        params: &Algorithm,
        key: &CryptoKey,
        length: Option<u32>,
    ) -> Result<Deferred<Vec<u8>>, CryptoError> {
        let output_len = length_in_bytes(length, NAME)?;

        let hash = params
            .hash
            .as_ref()
            .ok_or_else(|| CryptoError::type_mismatch("HKDF requires `hash`"))?;
        let salt =
            params.salt.clone().ok_or_else(|| CryptoError::type_mismatch("HKDF requires `salt`"))?;
        let info =
            params.info.clone().ok_or_else(|| CryptoError::type_mismatch("HKDF requires `info`"))?;
        let hash = registry.hash_function(hash)?;

        key.material_for(ALLOWED_USAGES)?;

        let key = key.clone();
        Ok(Deferred::spawn("hkdf", move || {
            let secret = key.material_for(ALLOWED_USAGES)?;
            kdf::hkdf(secret, &salt, &info, output_len, hash).map_err(CryptoError::from)
        }))
    }

    fn import_key(
        &self,
        _registry: &AlgorithmRegistry,
        format: KeyFormat,
        data: KeyData,
        _params: &Algorithm,
        extractable: bool,
        usages: KeyUsages,
    ) -> Result<CryptoKey, CryptoError> {
        if format != KeyFormat::Raw {
            return Err(unsupported_format(format, NAME));
        }
        ensure_usages(usages, ALLOWED_USAGES, NAME)?;
        if extractable {
            return Err(CryptoError::syntax("HKDF keys cannot be extractable"));
        }

        let KeyData::Bytes(bytes) = data else {
            return Err(CryptoError::type_mismatch("raw HKDF key data must be bytes"));
        };

        Ok(CryptoKey::new(KeyType::Secret, KeyAlgorithm::new(NAME), false, usages, bytes))
    }

    fn key_length(
        &self,
        _registry: &AlgorithmRegistry,
        _params: &Algorithm,
    ) -> Result<Option<u32>, CryptoError> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn test_derive_bits_rfc5869_case1() {
        let registry = AlgorithmRegistry::with_defaults().unwrap();
        let key = Hkdf
            .import_key(
                &registry,
                KeyFormat::Raw,
                vec![0x0b; 22].into(),
                &Algorithm::named(NAME),
                false,
                KeyUsages::DERIVE_BITS,
            )
            .unwrap();

        let params = Algorithm::builder()
            .name(NAME)
            .hash("sha-256")
            .salt(hex!("000102030405060708090a0b0c").to_vec())
            .info(hex!("f0f1f2f3f4f5f6f7f8f9").to_vec())
            .build();

        let okm = Hkdf
            .derive_bits(&registry, &params, &key, Some(336))
            .unwrap()
            .into_ready()
            .unwrap()
            .unwrap();
        assert_eq!(
            okm,
            hex!(
                "3cb25f25faacd57a90434f64d0362f2a2d2d0a90cf1a5a4c5db02d56ecc4c5bf"
                "34007208d5b887185865"
            )
        );
    }

    #[test]
    fn test_missing_info_is_type_error() {
        let registry = AlgorithmRegistry::with_defaults().unwrap();
        let key = Hkdf
            .import_key(
                &registry,
                KeyFormat::Raw,
                vec![1; 16].into(),
                &Algorithm::named(NAME),
                false,
                KeyUsages::DERIVE_BITS,
            )
            .unwrap();
        let params = Algorithm::builder().name(NAME).hash("SHA-256").salt(Vec::new()).build();

        let err = Hkdf.derive_bits(&registry, &params, &key, Some(128)).unwrap_err();
        assert_eq!(err.exception(), "TypeError");
    }

    #[test]
    fn test_import_refuses_extractable() {
        let registry = AlgorithmRegistry::with_defaults().unwrap();
        let err = Hkdf
            .import_key(
                &registry,
                KeyFormat::Raw,
                vec![1; 16].into(),
                &Algorithm::named(NAME),
                true,
                KeyUsages::DERIVE_KEY,
            )
            .unwrap_err();
        assert!(matches!(err, CryptoError::Syntax { .. }));
    }
}
