//! PBKDF2 (RFC 8018) key derivation.
//!
//! The plugin owns validation and key handling; the stretching loop itself is an opaque
//! primitive, swappable through [`Pbkdf2::with_stretch`].

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
use wcrypt_primitives::{HashFunction, PrimitiveError, kdf};

const NAME: &str = "PBKDF2";
const ALLOWED_USAGES: KeyUsages = KeyUsages::DERIVE_KEY.union(KeyUsages::DERIVE_BITS);

/// The stretching primitive: `(secret, salt, iterations, output_len, hash) -> bytes`.
pub type StretchFn =
    fn(&[u8], &[u8], u32, usize, HashFunction) -> Result<Vec<u8>, PrimitiveError>;

/// The PBKDF2 plugin.
#[derive(Debug, Clone, Copy)]
pub struct Pbkdf2 {
    stretch: StretchFn,
}

impl Pbkdf2 {
    /// A plugin backed by the `wcrypt-primitives` PBKDF2 implementation.
    #[must_use]
    pub const fn new() -> Self {
        Self { stretch: kdf::pbkdf2 }
    }

    /// A plugin backed by an alternate stretching function.
    #[must_use]
    pub const fn with_stretch(stretch: StretchFn) -> Self {
        Self { stretch }
    }
}

impl Default for Pbkdf2 {
    fn default() -> Self {
        Self::new()
    }
}

impl CryptoAlgorithm for Pbkdf2 {
    fn name(&self) -> &'static str {
        NAME
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::DERIVE_BITS | Capabilities::IMPORT_KEY | Capabilities::GET_KEY_LENGTH
    }

    /// Checks, in order: `iterations` is present, the length, `hash` resolves, `iterations` is
    /// positive, `salt` is present. Nothing is issued until all of them pass.
    fn derive_bits(
        &self,
        registry: &AlgorithmRegistry,
        params: &Algorithm,
        key: &CryptoKey,
        length: Option<u32>,
    ) -> Result<Deferred<Vec<u8>>, CryptoError> {
        let iterations = params
            .iterations
            .ok_or_else(|| CryptoError::type_mismatch("PBKDF2 requires `iterations`"))?;

        let output_len = length_in_bytes(length, NAME)?;

        let hash = params
            .hash
            .as_ref()
            .ok_or_else(|| CryptoError::type_mismatch("PBKDF2 requires `hash`"))?;
        let hash = registry.hash_function(hash)?;

        if iterations == 0 {
            return Err(CryptoError::operation("PBKDF2 iterations must be positive"));
        }

        let salt = params
            .salt
            .clone()
            .ok_or_else(|| CryptoError::type_mismatch("PBKDF2 requires `salt`"))?;

        key.material_for(ALLOWED_USAGES)?;

        let key = key.clone();
        let stretch = self.stretch;
        Ok(Deferred::spawn("pbkdf2", move || {
            let secret = key.material_for(ALLOWED_USAGES)?;
            stretch(secret, &salt, iterations, output_len, hash).map_err(CryptoError::from)
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
            return Err(CryptoError::syntax("PBKDF2 keys cannot be extractable"));
        }

        let KeyData::Bytes(bytes) = data else {
            return Err(CryptoError::type_mismatch("raw PBKDF2 key data must be bytes"));
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
