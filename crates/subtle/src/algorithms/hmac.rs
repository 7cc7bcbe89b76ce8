use super::{ensure_usages, export_secret, import_secret};
use crate::algorithm::{Algorithm, AlgorithmIdentifier};
use crate::deferred::Deferred;
use crate::error::CryptoError;
use crate::format::{ExportedKey, KeyData, KeyFormat};
use crate::key::{CryptoKey, KeyAlgorithm};
use crate::operation::{Capabilities, Operation};
use crate::plugin::{CryptoAlgorithm, GeneratedKey};
use crate::registry::AlgorithmRegistry;
use crate::usage::{KeyType, KeyUsages};
use wcrypt_primitives::{HashFunction, mac, random};

const NAME: &str = "HMAC";

/// HMAC signing keyed by any registered hash algorithm.
#[derive(Debug, Clone, Copy, Default)]
pub struct Hmac;

impl Hmac {
    /// Resolves `params.hash` to its registered name and hash function.
    fn hash(
        registry: &AlgorithmRegistry,
        params: &Algorithm,
    ) -> Result<(&'static str, HashFunction), CryptoError> {
        let hash = params
            .hash
            .as_ref()
            .ok_or_else(|| CryptoError::type_mismatch("HMAC requires `hash`"))?;
        let plugin = registry.resolve(hash, Operation::GetHashFunction)?;
        Ok((plugin.name(), plugin.hash_function()?))
    }

    fn key_hash(registry: &AlgorithmRegistry, key: &CryptoKey) -> Result<HashFunction, CryptoError> {
        let name = key
            .algorithm()
            .hash
            .as_deref()
            .ok_or_else(|| CryptoError::data("HMAC key carries no hash"))?;
        registry.hash_function(&AlgorithmIdentifier::from(name))
    }

    fn jwk_alg(hash_name: &str) -> Result<&'static str, CryptoError> {
        [("SHA-1", "HS1"), ("SHA-256", "HS256"), ("SHA-384", "HS384"), ("SHA-512", "HS512")]
            .into_iter()
            .find(|(hash, _)| hash.eq_ignore_ascii_case(hash_name))
            .map(|(_, alg)| alg)
            .ok_or_else(|| CryptoError::NotSupported {
                message: format!("no JWK algorithm for HMAC with `{hash_name}`").into(),
                context: Some(NAME.into()),
            })
    }
}

impl CryptoAlgorithm for Hmac {
    fn name(&self) -> &'static str {
        NAME
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::SIGN
            | Capabilities::VERIFY
            | Capabilities::GENERATE_KEY
            | Capabilities::IMPORT_KEY
            | Capabilities::EXPORT_KEY
            | Capabilities::GET_KEY_LENGTH
    }

    fn sign(
        &self,
        registry: &AlgorithmRegistry,
        _params: &Algorithm,
        key: &CryptoKey,
        data: &[u8],
    ) -> Result<Deferred<Vec<u8>>, CryptoError> {
        let hash = Self::key_hash(registry, key)?;
        key.material_for(KeyUsages::SIGN)?;

        let key = key.clone();
        let data = data.to_vec();
        Ok(Deferred::spawn("hmac sign", move || {
            let secret = key.material_for(KeyUsages::SIGN)?;
            mac::hmac_sign(hash, secret, &data).map_err(CryptoError::from)
        }))
    }

    fn verify(
        &self,
        registry: &AlgorithmRegistry,
        _params: &Algorithm,
        key: &CryptoKey,
        signature: &[u8],
        data: &[u8],
    ) -> Result<Deferred<bool>, CryptoError> {
        let hash = Self::key_hash(registry, key)?;
        key.material_for(KeyUsages::VERIFY)?;

        let key = key.clone();
        let signature = signature.to_vec();
        let data = data.to_vec();
        Ok(Deferred::spawn("hmac verify", move || {
            let secret = key.material_for(KeyUsages::VERIFY)?;
            mac::hmac_verify(hash, secret, &data, &signature).map_err(CryptoError::from)
        }))
    }

    fn generate_key(
        &self,
        registry: &AlgorithmRegistry,
        params: &Algorithm,
        extractable: bool,
        usages: KeyUsages,
    ) -> Result<GeneratedKey, CryptoError> {
        ensure_usages(usages, KeyUsages::SIGN | KeyUsages::VERIFY, NAME)?;
        let (hash_name, _) = Self::hash(registry, params)?;
        let bits = self.key_length(registry, params)?.unwrap_or_default();

        let material = random::random_bytes(bits as usize / 8)?;
        Ok(GeneratedKey::Secret(CryptoKey::new(
            KeyType::Secret,
            KeyAlgorithm::new(NAME).with_hash(hash_name).with_length(bits),
            extractable,
            usages,
            material,
        )))
    }

    fn import_key(
        &self,
        registry: &AlgorithmRegistry,
        format: KeyFormat,
        data: KeyData,
        params: &Algorithm,
        extractable: bool,
        usages: KeyUsages,
    ) -> Result<CryptoKey, CryptoError> {
        ensure_usages(usages, KeyUsages::SIGN | KeyUsages::VERIFY, NAME)?;
        let (hash_name, _) = Self::hash(registry, params)?;

        let material =
            import_secret(format, data, Self::jwk_alg(hash_name)?, extractable, usages, NAME)?;
        if material.is_empty() {
            return Err(CryptoError::data("HMAC key data must not be empty"));
        }

        let bits = u32::try_from(material.len() * 8)
            .map_err(|_| CryptoError::data("HMAC key data is too long"))?;
        if let Some(length) = params.length
            && (length > bits || length <= bits - 8)
        {
            return Err(CryptoError::data(format!(
                "length {length} does not match {bits} bits of key data"
            )));
        }

        Ok(CryptoKey::new(
            KeyType::Secret,
            KeyAlgorithm::new(NAME).with_hash(hash_name).with_length(bits),
            extractable,
            usages,
            material,
        ))
    }

    fn export_key(&self, format: KeyFormat, key: &CryptoKey) -> Result<ExportedKey, CryptoError> {
        let hash_name = key.algorithm().hash.as_deref().unwrap_or_default();
        let alg = Self::jwk_alg(hash_name)?;
        export_secret(format, key, alg, NAME)
    }

    /// An explicit `length` (a positive multiple of 8), else the hash block size.
    fn key_length(
        &self,
        registry: &AlgorithmRegistry,
        params: &Algorithm,
    ) -> Result<Option<u32>, CryptoError> {
        match params.length {
            Some(bits) if bits == 0 || bits % 8 != 0 => Err(CryptoError::Operation {
                message: format!("length must be a positive multiple of 8, got {bits}").into(),
                context: Some(NAME.into()),
            }),
            Some(bits) => Ok(Some(bits)),
            None => {
                let hash = params
                    .hash
                    .as_ref()
                    .ok_or_else(|| CryptoError::type_mismatch("HMAC requires `hash`"))?;
                let block = registry.hash_block_size(hash)?;
                u32::try_from(block).map(Some).map_err(|_| CryptoError::from("block size overflow"))
            },
        }
    }
}
