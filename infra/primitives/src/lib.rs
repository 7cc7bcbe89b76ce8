//! # Primitives
//!
//! The byte-level boundary of the wcrypt workspace. Every function here takes bytes and returns
//! bytes (or a verdict), with no knowledge of keys, usages or algorithm names. Algorithm plugins
//! call into this crate after all validation has passed.
//!
//! The actual math is delegated to the RustCrypto crates:
//!
//! | Concern            | Crate                       |
//! |--------------------|-----------------------------|
//! | Hashing            | `sha1`, `sha2`              |
//! | MAC                | `hmac`                      |
//! | Key derivation     | `pbkdf2`, `hkdf`            |
//! | Block cipher modes | `aes`, `ctr`, `cbc`, `aes-gcm`, `aes-kw` |
//! | Key agreement      | `p256`                      |
//! | Randomness         | `getrandom`                 |
//!
//! ## Example
//!
//! ```rust
//! use wcrypt_primitives::{HashFunction, kdf};
//!
//! # fn main() -> Result<(), wcrypt_primitives::PrimitiveError> {
//! let okm = kdf::pbkdf2(b"password", b"salt", 1, 20, HashFunction::Sha1)?;
//! assert_eq!(okm.len(), 20);
//! # Ok(())
//! # }
//! ```

pub mod aes;
pub mod ecdh;
mod error;
pub mod hash;
pub mod kdf;
pub mod mac;
pub mod random;

pub use error::{PrimitiveError, PrimitiveErrorExt};
pub use hash::HashFunction;
