//! The `SubtleCrypto` entry point.
//!
//! Every call follows the same shape: resolve the algorithm for the operation, check that the
//! key belongs to that algorithm and grants the usage, let the plugin validate its parameters,
//! then await the deferred primitive work.

use crate::algorithm::{Algorithm, AlgorithmIdentifier};
use crate::error::CryptoError;
use crate::format::{ExportedKey, KeyData, KeyFormat};
use crate::jwk::JsonWebKey;
use crate::key::CryptoKey;
use crate::operation::Operation;
use crate::plugin::{GeneratedKey, Plugin};
use crate::registry::AlgorithmRegistry;
use crate::usage::{KeyType, KeyUsage, KeyUsages};
use tracing::debug;

/// Web Crypto style operations over an [`AlgorithmRegistry`].
///
/// # Example
/// ```rust
/// use wcrypt_subtle::prelude::*;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), CryptoError> {
/// let subtle = SubtleCrypto::with_defaults()?;
///
/// let key = subtle
///     .import_key(KeyFormat::Raw, b"password".to_vec(), "PBKDF2", false, KeyUsages::DERIVE_BITS)
///     .await?;
///
/// let params = Algorithm::builder()
///     .name("PBKDF2")
///     .hash("SHA-256")
///     .salt(vec![0u8; 16])
///     .iterations(1000)
///     .build();
/// let bits = subtle.derive_bits(params, &key, Some(256)).await?;
/// assert_eq!(bits.len(), 32);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct SubtleCrypto {
    registry: AlgorithmRegistry,
}

#[allow(clippy::unused_async)]
impl SubtleCrypto {
    #[must_use]
    pub const fn new(registry: AlgorithmRegistry) -> Self {
        Self { registry }
    }

    /// A facade over every built-in algorithm.
    ///
    /// # Errors
    /// Returns [`CryptoError::InvalidConfiguration`] if the built-in set is inconsistent.
    pub fn with_defaults() -> Result<Self, CryptoError> {
        AlgorithmRegistry::with_defaults().map(Self::new)
    }

    #[must_use]
    pub const fn registry(&self) -> &AlgorithmRegistry {
        &self.registry
    }

    /// Encrypts `data` with `key`.
    ///
    /// # Errors
    /// * [`CryptoError::NotSupported`] if the algorithm does not encrypt.
    /// * [`CryptoError::InvalidAccess`] if the key belongs to another algorithm or lacks `encrypt`.
    /// * Parameter and primitive errors from the plugin.
    pub async fn encrypt(
        &self,
        algorithm: impl Into<AlgorithmIdentifier>,
        key: &CryptoKey,
        data: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        let params = algorithm.into().into_algorithm();
        let plugin = self.keyed_plugin(&params, Operation::Encrypt, key, KeyUsage::Encrypt)?;
        plugin.encrypt(&params, key, data)?.await
    }

    /// Decrypts `data` with `key`.
    ///
    /// # Errors
    /// Same as [`SubtleCrypto::encrypt`], with the `decrypt` usage.
    pub async fn decrypt(
        &self,
        algorithm: impl Into<AlgorithmIdentifier>,
        key: &CryptoKey,
        data: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        let params = algorithm.into().into_algorithm();
        let plugin = self.keyed_plugin(&params, Operation::Decrypt, key, KeyUsage::Decrypt)?;
        plugin.decrypt(&params, key, data)?.await
    }

    /// Signs `data` with `key`.
    ///
    /// # Errors
    /// Same as [`SubtleCrypto::encrypt`], with the `sign` usage.
    pub async fn sign(
        &self,
        algorithm: impl Into<AlgorithmIdentifier>,
        key: &CryptoKey,
        data: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        let params = algorithm.into().into_algorithm();
        let plugin = self.keyed_plugin(&params, Operation::Sign, key, KeyUsage::Sign)?;
        plugin.sign(&self.registry, &params, key, data)?.await
    }

    /// Checks `signature` over `data` with `key`.
    ///
    /// # Errors
    /// Same as [`SubtleCrypto::encrypt`], with the `verify` usage.
    pub async fn verify(
        &self,
        algorithm: impl Into<AlgorithmIdentifier>,
        key: &CryptoKey,
        signature: &[u8],
        data: &[u8],
    ) -> Result<bool, CryptoError> {
        let params = algorithm.into().into_algorithm();
        let plugin = self.keyed_plugin(&params, Operation::Verify, key, KeyUsage::Verify)?;
        plugin.verify(&self.registry, &params, key, signature, data)?.await
    }

    /// Hashes `data`.
    ///
    /// # Errors
    /// Returns [`CryptoError::NotSupported`] if the algorithm is not a digest.
    pub async fn digest(
        &self,
        algorithm: impl Into<AlgorithmIdentifier>,
        data: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        let params = algorithm.into().into_algorithm();
        let plugin = self.registry.resolve_name(&params.name, Operation::Digest)?;
        plugin.digest(&params, data)?.await
    }

    /// Generates a secret key or a key pair.
    ///
    /// # Errors
    /// * [`CryptoError::NotSupported`] if the algorithm cannot generate keys.
    /// * [`CryptoError::Syntax`] if the usages are illegal for the algorithm, or empty for a
    ///   secret or private key.
    pub async fn generate_key(
        &self,
        algorithm: impl Into<AlgorithmIdentifier>,
        extractable: bool,
        usages: KeyUsages,
    ) -> Result<GeneratedKey, CryptoError> {
        let params = algorithm.into().into_algorithm();
        let plugin = self.registry.resolve_name(&params.name, Operation::GenerateKey)?;
        let generated = plugin.generate_key(&self.registry, &params, extractable, usages)?;

        match &generated {
            GeneratedKey::Secret(key) => ensure_usable(key)?,
            GeneratedKey::Pair(pair) => ensure_usable(&pair.private_key)?,
        }
        Ok(generated)
    }

    /// Derives `length` bits from `base_key`.
    ///
    /// # Errors
    /// * [`CryptoError::InvalidAccess`] if `base_key` lacks `deriveBits`.
    /// * Parameter and primitive errors from the plugin.
    pub async fn derive_bits(
        &self,
        algorithm: impl Into<AlgorithmIdentifier>,
        base_key: &CryptoKey,
        length: Option<u32>,
    ) -> Result<Vec<u8>, CryptoError> {
        let params = algorithm.into().into_algorithm();
        let plugin =
            self.keyed_plugin(&params, Operation::DeriveBits, base_key, KeyUsage::DeriveBits)?;
        plugin.derive_bits(&self.registry, &params, base_key, length)?.await
    }

    /// Derives a new key of type `derived_key_type` from `base_key`.
    ///
    /// # Errors
    /// * [`CryptoError::InvalidAccess`] if `base_key` lacks `deriveKey`.
    /// * [`CryptoError::Operation`] if the derived key type has no fixed length.
    /// * Errors from the derivation and the import of the derived bits.
    pub async fn derive_key(
        &self,
        algorithm: impl Into<AlgorithmIdentifier>,
        base_key: &CryptoKey,
        derived_key_type: impl Into<AlgorithmIdentifier>,
        extractable: bool,
        usages: KeyUsages,
    ) -> Result<CryptoKey, CryptoError> {
        let params = algorithm.into().into_algorithm();
        let derived = derived_key_type.into().into_algorithm();

        let plugin =
            self.keyed_plugin(&params, Operation::DeriveBits, base_key, KeyUsage::DeriveKey)?;
        let importer = self.registry.resolve_name(&derived.name, Operation::ImportKey)?;
        let length = self
            .registry
            .resolve_name(&derived.name, Operation::GetKeyLength)?
            .key_length(&self.registry, &derived)?
            .ok_or_else(|| {
                CryptoError::operation(format!("`{}` keys have no fixed length", derived.name))
            })?;

        let bits = plugin.derive_bits(&self.registry, &params, base_key, Some(length))?.await?;
        let key = importer.import_key(
            &self.registry,
            KeyFormat::Raw,
            KeyData::Bytes(bits),
            &derived,
            extractable,
            usages,
        )?;
        ensure_usable(&key)?;
        Ok(key)
    }

    /// Creates a key from external key data.
    ///
    /// # Errors
    /// * [`CryptoError::NotSupported`] for unknown algorithms or unsupported formats.
    /// * [`CryptoError::Syntax`] for illegal usages or extractable flag, or an empty usage set on
    ///   a secret or private key.
    /// * [`CryptoError::Data`] for malformed key data.
    pub async fn import_key(
        &self,
        format: KeyFormat,
        key_data: impl Into<KeyData>,
        algorithm: impl Into<AlgorithmIdentifier>,
        extractable: bool,
        usages: KeyUsages,
    ) -> Result<CryptoKey, CryptoError> {
        let params = algorithm.into().into_algorithm();
        let plugin = self.registry.resolve_name(&params.name, Operation::ImportKey)?;
        let key = plugin.import_key(
            &self.registry,
            format,
            key_data.into(),
            &params,
            extractable,
            usages,
        )?;
        ensure_usable(&key)?;
        Ok(key)
    }

    /// Serializes an extractable key.
    ///
    /// # Errors
    /// * [`CryptoError::InvalidAccess`] if the key is not extractable.
    /// * [`CryptoError::NotSupported`] for unsupported formats.
    pub async fn export_key(
        &self,
        format: KeyFormat,
        key: &CryptoKey,
    ) -> Result<ExportedKey, CryptoError> {
        let plugin = self.registry.resolve_name(&key.algorithm().name, Operation::ExportKey)?;
        if !key.extractable() {
            return Err(CryptoError::invalid_access("key is not extractable"));
        }
        plugin.export_key(format, key)
    }

    /// Exports `key` and encrypts the result with `wrapping_key`.
    ///
    /// Algorithms without a dedicated key-wrap operation fall back to `encrypt`. JWK exports are
    /// wrapped as their JSON serialization.
    ///
    /// # Errors
    /// * [`CryptoError::InvalidAccess`] if `key` is not extractable or `wrapping_key` lacks
    ///   `wrapKey`.
    /// * Errors from export and encryption.
    pub async fn wrap_key(
        &self,
        format: KeyFormat,
        key: &CryptoKey,
        wrapping_key: &CryptoKey,
        wrap_algorithm: impl Into<AlgorithmIdentifier>,
    ) -> Result<Vec<u8>, CryptoError> {
        let params = wrap_algorithm.into().into_algorithm();
        let (plugin, dedicated) = self.wrap_plugin(&params.name, Operation::WrapKey)?;
        check_key(plugin, wrapping_key, KeyUsage::WrapKey)?;

        let payload = match self.export_key(format, key).await? {
            ExportedKey::Bytes(bytes) => bytes,
            ExportedKey::Jwk(jwk) => serde_json::to_vec(&jwk)?,
        };

        let deferred = if dedicated {
            plugin.wrap_key(&params, wrapping_key, &payload)?
        } else {
            plugin.encrypt(&params, wrapping_key, &payload)?
        };
        deferred.await
    }

    /// Decrypts `wrapped_key` with `unwrapping_key` and imports the result.
    ///
    /// # Errors
    /// * [`CryptoError::InvalidAccess`] if `unwrapping_key` lacks `unwrapKey`.
    /// * [`CryptoError::Data`] if a JWK payload does not parse.
    /// * Errors from decryption and import.
    pub async fn unwrap_key(
        &self,
        format: KeyFormat,
        wrapped_key: &[u8],
        unwrapping_key: &CryptoKey,
        unwrap_algorithm: impl Into<AlgorithmIdentifier>,
        unwrapped_key_algorithm: impl Into<AlgorithmIdentifier>,
        extractable: bool,
        usages: KeyUsages,
    ) -> Result<CryptoKey, CryptoError> {
        let params = unwrap_algorithm.into().into_algorithm();
        let unwrapped = unwrapped_key_algorithm.into().into_algorithm();

        let (plugin, dedicated) = self.wrap_plugin(&params.name, Operation::UnwrapKey)?;
        self.registry.resolve_name(&unwrapped.name, Operation::ImportKey)?;
        check_key(plugin, unwrapping_key, KeyUsage::UnwrapKey)?;

        let deferred = if dedicated {
            plugin.unwrap_key(&params, unwrapping_key, wrapped_key)?
        } else {
            plugin.decrypt(&params, unwrapping_key, wrapped_key)?
        };
        let payload = deferred.await?;

        let key_data = match format {
            KeyFormat::Jwk => KeyData::Jwk(
                serde_json::from_slice::<JsonWebKey>(&payload)
                    .map_err(|e| CryptoError::data(format!("unwrapped JWK is malformed: {e}")))?,
            ),
            KeyFormat::Raw | KeyFormat::Pkcs8 | KeyFormat::Spki => KeyData::Bytes(payload),
        };

        self.import_key(format, key_data, unwrapped, extractable, usages).await
    }

    /// Resolves `params` for `operation` and checks `key` against the plugin.
    fn keyed_plugin(
        &self,
        params: &Algorithm,
        operation: Operation,
        key: &CryptoKey,
        usage: KeyUsage,
    ) -> Result<&Plugin, CryptoError> {
        let plugin = self.registry.resolve_name(&params.name, operation)?;
        check_key(plugin, key, usage)?;
        Ok(plugin)
    }

    /// The wrap (or unwrap) plugin for `name`, and whether it implements `operation` itself
    /// rather than through encrypt/decrypt.
    fn wrap_plugin(&self, name: &str, operation: Operation) -> Result<(&Plugin, bool), CryptoError> {
        if let Some(plugin) = self.registry.get(operation, name) {
            return Ok((plugin, true));
        }
        let fallback = match operation {
            Operation::UnwrapKey => Operation::Decrypt,
            _ => Operation::Encrypt,
        };
        debug!(algorithm = name, %operation, %fallback, "No dedicated key wrap, using cipher");
        self.registry.resolve_name(name, fallback).map(|plugin| (plugin, false))
    }
}

/// The key must belong to the plugin's algorithm and grant `usage`.
fn check_key(plugin: &Plugin, key: &CryptoKey, usage: KeyUsage) -> Result<(), CryptoError> {
    if !key.algorithm().name.eq_ignore_ascii_case(plugin.name()) {
        return Err(CryptoError::InvalidAccess {
            message: format!(
                "key algorithm `{}` does not match `{}`",
                key.algorithm().name,
                plugin.name()
            )
            .into(),
            context: Some(usage.to_string().into()),
        });
    }
    key.require_usage(usage)
}

/// Secret and private keys must be created with at least one usage.
fn ensure_usable(key: &CryptoKey) -> Result<(), CryptoError> {
    match key.key_type() {
        KeyType::Secret | KeyType::Private if key.usages().is_empty() => {
            Err(CryptoError::syntax(format!("{} keys require at least one usage", key.key_type())))
        },
        _ => Ok(()),
    }
}
