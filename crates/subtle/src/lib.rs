//! A capability-gated cryptographic algorithm registry with a Web Crypto style surface.
//!
//! Callers request an operation against a named algorithm. The [`AlgorithmRegistry`] resolves the
//! name (case-insensitively) to a plugin that declared that operation, the key's usage set is
//! checked, and the plugin hands the byte-level work to `wcrypt-primitives` inside a
//! [`Deferred`] task.
//!
//! ## Building Blocks
//!
//! * [`AlgorithmRegistry`]: built once, read-only, `operation -> name -> plugin`.
//! * [`CryptoAlgorithm`]: the plugin contract. Undeclared operations are `NotSupportedError`.
//! * [`CryptoKey`]: immutable type, algorithm, extractable flag and usages. Key material is never
//!   reachable from outside the crate and is wiped on drop.
//! * [`SubtleCrypto`]: `encrypt`, `decrypt`, `sign`, `verify`, `digest`, `generate_key`,
//!   `derive_key`, `derive_bits`, `import_key`, `export_key`, `wrap_key`, `unwrap_key`.
//!
//! ## Built-in Algorithms
//!
//! | Algorithm                     | Operations                                          |
//! |-------------------------------|-----------------------------------------------------|
//! | `SHA-1/256/384/512`           | digest                                              |
//! | `HMAC`                        | sign, verify, generateKey, importKey, exportKey     |
//! | `HKDF`, `PBKDF2`              | deriveBits, importKey                               |
//! | `AES-CTR`, `AES-CBC`, `AES-GCM` | encrypt, decrypt, generateKey, importKey, exportKey |
//! | `AES-KW`                      | wrapKey, unwrapKey, generateKey, importKey, exportKey |
//! | `ECDH` (P-256)                | deriveBits, generateKey, importKey, exportKey       |
//!
//! RSA and ECDSA families are not registered and resolve to `NotSupportedError`.
//!
//! ## Errors
//!
//! Every failure is a [`CryptoError`]; [`CryptoError::exception`] names the Web Crypto exception
//! it corresponds to (`NotSupportedError`, `InvalidAccessError`, `OperationError`, ...).
//!
//! ## Example
//! ```rust
//! use wcrypt_subtle::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), CryptoError> {
//! let subtle = SubtleCrypto::with_defaults()?;
//!
//! let key = subtle
//!     .generate_key(
//!         Algorithm::builder().name("HMAC").hash("SHA-256").build(),
//!         false,
//!         KeyUsages::SIGN | KeyUsages::VERIFY,
//!     )
//!     .await?
//!     .into_secret()
//!     .expect("HMAC generates a secret key");
//!
//! let tag = subtle.sign("HMAC", &key, b"payload").await?;
//! assert!(subtle.verify("HMAC", &key, &tag, b"payload").await?);
//! # Ok(())
//! # }
//! ```

mod algorithm;
pub mod algorithms;
pub mod config;
mod deferred;
mod error;
mod format;
mod jwk;
mod key;
mod operation;
mod plugin;
mod registry;
mod subtle;
mod usage;

pub use algorithm::{Algorithm, AlgorithmIdentifier};
pub use deferred::Deferred;
pub use error::{CryptoError, CryptoErrorExt};
pub use format::{ExportedKey, KeyData, KeyFormat};
pub use jwk::JsonWebKey;
pub use key::{CryptoKey, CryptoKeyPair, KeyAlgorithm};
pub use operation::{Capabilities, Operation};
pub use plugin::{CryptoAlgorithm, GeneratedKey, Plugin};
pub use registry::{AlgorithmRegistry, RegistryBuilder};
pub use subtle::SubtleCrypto;
pub use usage::{KeyType, KeyUsage, KeyUsages};
pub use wcrypt_primitives::HashFunction;

pub mod prelude {
    pub use crate::algorithm::{Algorithm, AlgorithmIdentifier};
    pub use crate::error::{CryptoError, CryptoErrorExt};
    pub use crate::format::{ExportedKey, KeyData, KeyFormat};
    pub use crate::key::{CryptoKey, CryptoKeyPair};
    pub use crate::operation::Operation;
    pub use crate::plugin::GeneratedKey;
    pub use crate::registry::AlgorithmRegistry;
    pub use crate::subtle::SubtleCrypto;
    pub use crate::usage::{KeyType, KeyUsage, KeyUsages};
}
