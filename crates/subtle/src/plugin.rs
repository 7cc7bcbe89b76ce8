//! The algorithm plugin contract.
//!
//! A plugin declares the operations it implements through [`CryptoAlgorithm::capabilities`];
//! the registry indexes it under exactly those operations. Every operation method defaults to
//! [`CryptoError::NotSupported`], so a plugin overrides only what it declares.
//!
//! Plugins validate parameters synchronously and hand byte-level work to a [`Deferred`].

use crate::algorithm::Algorithm;
use crate::deferred::Deferred;
use crate::error::CryptoError;
use crate::format::{ExportedKey, KeyData, KeyFormat};
use crate::key::{CryptoKey, CryptoKeyPair};
use crate::operation::{Capabilities, Operation};
use crate::registry::AlgorithmRegistry;
use crate::usage::KeyUsages;
use std::fmt;
use std::sync::Arc;
use wcrypt_primitives::HashFunction;

/// A registered plugin, shared by every bucket it is indexed in.
pub type Plugin = Arc<dyn CryptoAlgorithm>;

/// The product of `generateKey`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneratedKey {
    Secret(CryptoKey),
    Pair(CryptoKeyPair),
}

impl GeneratedKey {
    #[must_use]
    pub fn into_secret(self) -> Option<CryptoKey> {
        match self {
            Self::Secret(key) => Some(key),
            Self::Pair(_) => None,
        }
    }

    #[must_use]
    pub fn into_pair(self) -> Option<CryptoKeyPair> {
        match self {
            Self::Secret(_) => None,
            Self::Pair(pair) => Some(pair),
        }
    }
}

/// A named algorithm implementing a declared subset of [`Operation`]s.
///
/// [`CryptoAlgorithm::capabilities`] and the overridden methods must agree: every declared
/// operation has an override, and every undeclared one keeps the default `NotSupportedError`.
/// The registry indexes by the declared set alone, so a declared operation left on its default
/// resolves and then fails as not implemented.
#[allow(unused_variables)]
pub trait CryptoAlgorithm: Send + Sync + fmt::Debug {
    /// Registered name, matched case-insensitively.
    fn name(&self) -> &'static str;

    /// The operations this plugin is indexed under.
    fn capabilities(&self) -> Capabilities;

    fn encrypt(
        &self,
        params: &Algorithm,
        key: &CryptoKey,
        data: &[u8],
    ) -> Result<Deferred<Vec<u8>>, CryptoError> {
        Err(unsupported(self.name(), Operation::Encrypt))
    }

    fn decrypt(
        &self,
        params: &Algorithm,
        key: &CryptoKey,
        data: &[u8],
    ) -> Result<Deferred<Vec<u8>>, CryptoError> {
        Err(unsupported(self.name(), Operation::Decrypt))
    }

    fn sign(
        &self,
        registry: &AlgorithmRegistry,
        params: &Algorithm,
        key: &CryptoKey,
        data: &[u8],
    ) -> Result<Deferred<Vec<u8>>, CryptoError> {
        Err(unsupported(self.name(), Operation::Sign))
    }

    fn verify(
        &self,
        registry: &AlgorithmRegistry,
        params: &Algorithm,
        key: &CryptoKey,
        signature: &[u8],
        data: &[u8],
    ) -> Result<Deferred<bool>, CryptoError> {
        Err(unsupported(self.name(), Operation::Verify))
    }

    /// Derives `length` bits from `key`. `None` asks for the algorithm's natural output length.
    fn derive_bits(
        &self,
        registry: &AlgorithmRegistry,
        params: &Algorithm,
        key: &CryptoKey,
        length: Option<u32>,
    ) -> Result<Deferred<Vec<u8>>, CryptoError> {
        Err(unsupported(self.name(), Operation::DeriveBits))
    }

    fn wrap_key(
        &self,
        params: &Algorithm,
        key: &CryptoKey,
        data: &[u8],
    ) -> Result<Deferred<Vec<u8>>, CryptoError> {
        Err(unsupported(self.name(), Operation::WrapKey))
    }

    fn unwrap_key(
        &self,
        params: &Algorithm,
        key: &CryptoKey,
        data: &[u8],
    ) -> Result<Deferred<Vec<u8>>, CryptoError> {
        Err(unsupported(self.name(), Operation::UnwrapKey))
    }

    fn digest(&self, params: &Algorithm, data: &[u8]) -> Result<Deferred<Vec<u8>>, CryptoError> {
        Err(unsupported(self.name(), Operation::Digest))
    }

    fn generate_key(
        &self,
        registry: &AlgorithmRegistry,
        params: &Algorithm,
        extractable: bool,
        usages: KeyUsages,
    ) -> Result<GeneratedKey, CryptoError> {
        Err(unsupported(self.name(), Operation::GenerateKey))
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
        Err(unsupported(self.name(), Operation::ImportKey))
    }

    fn export_key(&self, format: KeyFormat, key: &CryptoKey) -> Result<ExportedKey, CryptoError> {
        Err(unsupported(self.name(), Operation::ExportKey))
    }

    /// Length in bits of a key described by `params`, or `None` if the algorithm has no fixed
    /// length (key derivation functions).
    fn key_length(
        &self,
        registry: &AlgorithmRegistry,
        params: &Algorithm,
    ) -> Result<Option<u32>, CryptoError> {
        Err(unsupported(self.name(), Operation::GetKeyLength))
    }

    /// The canonical hash function a hash algorithm stands for.
    fn hash_function(&self) -> Result<HashFunction, CryptoError> {
        Err(unsupported(self.name(), Operation::GetHashFunction))
    }

    /// Internal block size of a hash algorithm, in bits.
    fn hash_block_size(&self) -> Result<usize, CryptoError> {
        Err(unsupported(self.name(), Operation::GetHashBlockSize))
    }
}

pub(crate) fn unsupported(algorithm: &str, operation: Operation) -> CryptoError {
    CryptoError::NotSupported {
        message: format!("`{algorithm}` does not implement {operation}").into(),
        context: None,
    }
}
