//! Key import/export formats and payloads.

use crate::jwk::JsonWebKey;
use serde::{Deserialize, Serialize};
use std::fmt;
use strum_macros::{Display, EnumString, IntoStaticStr};

/// The serialization a key is imported from or exported to.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    IntoStaticStr,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum KeyFormat {
    Raw,
    Jwk,
    Pkcs8,
    Spki,
}

/// Key data handed to an import: raw bytes, or a parsed JSON Web Key.
#[derive(Clone, PartialEq, Eq)]
pub enum KeyData {
    Bytes(Vec<u8>),
    Jwk(JsonWebKey),
}

/// The product of an export.
#[derive(Clone, PartialEq, Eq)]
pub enum ExportedKey {
    Bytes(Vec<u8>),
    Jwk(JsonWebKey),
}

impl ExportedKey {
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(bytes) => Some(bytes),
            Self::Jwk(_) => None,
        }
    }

    #[must_use]
    pub const fn as_jwk(&self) -> Option<&JsonWebKey> {
        match self {
            Self::Bytes(_) => None,
            Self::Jwk(jwk) => Some(jwk),
        }
    }
}

impl From<Vec<u8>> for KeyData {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<&[u8]> for KeyData {
    fn from(bytes: &[u8]) -> Self {
        Self::Bytes(bytes.to_vec())
    }
}

impl<const N: usize> From<[u8; N]> for KeyData {
    fn from(bytes: [u8; N]) -> Self {
        Self::Bytes(bytes.to_vec())
    }
}

impl From<JsonWebKey> for KeyData {
    fn from(jwk: JsonWebKey) -> Self {
        Self::Jwk(jwk)
    }
}

impl From<ExportedKey> for KeyData {
    fn from(exported: ExportedKey) -> Self {
        match exported {
            ExportedKey::Bytes(bytes) => Self::Bytes(bytes),
            ExportedKey::Jwk(jwk) => Self::Jwk(jwk),
        }
    }
}

impl fmt::Debug for KeyData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bytes(bytes) => write!(f, "KeyData::Bytes(<{} bytes>)", bytes.len()),
            Self::Jwk(jwk) => f.debug_tuple("KeyData::Jwk").field(jwk).finish(),
        }
    }
}

impl fmt::Debug for ExportedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bytes(bytes) => write!(f, "ExportedKey::Bytes(<{} bytes>)", bytes.len()),
            Self::Jwk(jwk) => f.debug_tuple("ExportedKey::Jwk").field(jwk).finish(),
        }
    }
}
