//! Built-in algorithm plugins.

mod aes;
mod ecdh;
mod hkdf;
mod hmac;
mod pbkdf2;
mod sha;

pub use aes::{Aes, AesMode};
pub use ecdh::Ecdh;
pub use hkdf::Hkdf;
pub use hmac::Hmac;
pub use pbkdf2::{Pbkdf2, StretchFn};
pub use sha::Sha;

use crate::error::CryptoError;
use crate::format::{ExportedKey, KeyData, KeyFormat};
use crate::jwk::JsonWebKey;
use crate::key::CryptoKey;
use crate::plugin::Plugin;
use crate::usage::KeyUsages;
use std::sync::Arc;
use zeroize::Zeroizing;

/// Every built-in plugin, in registration order.
#[must_use]
pub fn all() -> Vec<Plugin> {
    vec![
        Arc::new(Sha::SHA1),
        Arc::new(Sha::SHA256),
        Arc::new(Sha::SHA384),
        Arc::new(Sha::SHA512),
        Arc::new(Hmac),
        Arc::new(Hkdf),
        Arc::new(Pbkdf2::new()),
        Arc::new(Aes::CTR),
        Arc::new(Aes::CBC),
        Arc::new(Aes::GCM),
        Arc::new(Aes::KW),
        Arc::new(Ecdh),
    ]
}

/// Converts a derivation length in bits into bytes; it must be a positive multiple of 8.
pub(crate) fn length_in_bytes(length: Option<u32>, algorithm: &'static str) -> Result<usize, CryptoError> {
    match length {
        Some(bits) if bits > 0 && bits % 8 == 0 => Ok(bits as usize / 8),
        Some(bits) => Err(CryptoError::Operation {
            message: format!("length must be a positive multiple of 8, got {bits}").into(),
            context: Some(algorithm.into()),
        }),
        None => Err(CryptoError::Operation {
            message: "length is required".into(),
            context: Some(algorithm.into()),
        }),
    }
}

/// Fails with a syntax error unless `usages` is a subset of `allowed`.
pub(crate) fn ensure_usages(
    usages: KeyUsages,
    allowed: KeyUsages,
    algorithm: &'static str,
) -> Result<(), CryptoError> {
    if allowed.contains(usages) {
        Ok(())
    } else {
        Err(CryptoError::Syntax {
            message: format!("usages {usages} are not allowed, expected a subset of {allowed}")
                .into(),
            context: Some(algorithm.into()),
        })
    }
}

/// Reads raw secret material from `raw` bytes or an `oct` JWK.
pub(crate) fn import_secret(
    format: KeyFormat,
    data: KeyData,
    jwk_alg: &str,
    extractable: bool,
    usages: KeyUsages,
    algorithm: &'static str,
) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    match (format, data) {
        (KeyFormat::Raw, KeyData::Bytes(bytes)) => Ok(Zeroizing::new(bytes)),
        (KeyFormat::Jwk, KeyData::Jwk(jwk)) => jwk.oct_material(jwk_alg, extractable, usages),
        (KeyFormat::Raw | KeyFormat::Jwk, _) => Err(CryptoError::TypeMismatch {
            message: format!("key data does not match the `{format}` format").into(),
            context: Some(algorithm.into()),
        }),
        (KeyFormat::Pkcs8 | KeyFormat::Spki, _) => Err(unsupported_format(format, algorithm)),
    }
}

/// Exports secret material as `raw` bytes or an `oct` JWK.
pub(crate) fn export_secret(
    format: KeyFormat,
    key: &CryptoKey,
    jwk_alg: &str,
    algorithm: &'static str,
) -> Result<ExportedKey, CryptoError> {
    let material = key.exportable_material()?;
    match format {
        KeyFormat::Raw => Ok(ExportedKey::Bytes(material.to_vec())),
        KeyFormat::Jwk => {
            Ok(ExportedKey::Jwk(JsonWebKey::oct(material, jwk_alg, key.extractable(), key.usages())))
        },
        KeyFormat::Pkcs8 | KeyFormat::Spki => Err(unsupported_format(format, algorithm)),
    }
}

pub(crate) fn unsupported_format(format: KeyFormat, algorithm: &'static str) -> CryptoError {
    CryptoError::NotSupported {
        message: format!("key format `{format}` is not supported").into(),
        context: Some(algorithm.into()),
    }
}
