//! Algorithm identifiers and parameter descriptors.
//!
//! Callers name an algorithm either with a bare string (`"SHA-256"`) or with a descriptor
//! carrying its parameters (`{ name: "PBKDF2", hash: "SHA-256", salt, iterations }`). Both forms
//! resolve through the registry by name, case-insensitively.

use crate::error::CryptoError;
use crate::key::CryptoKey;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use typed_builder::TypedBuilder;

/// Algorithm parameters. Only `name` is mandatory; each algorithm reads the members it needs.
///
/// # Example
/// ```rust
/// use wcrypt_subtle::Algorithm;
///
/// let params = Algorithm::builder()
///     .name("PBKDF2")
///     .hash("SHA-256")
///     .salt(vec![0u8; 16])
///     .iterations(1000)
///     .build();
/// assert_eq!(params.iterations, Some(1000));
/// ```
#[derive(Debug, Clone, TypedBuilder, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Algorithm {
    #[builder(setter(into))]
    pub name: String,
    #[builder(default, setter(strip_option, into))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<AlgorithmIdentifier>,
    #[builder(default, setter(strip_option, into))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salt: Option<Vec<u8>>,
    #[builder(default, setter(strip_option, into))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<Vec<u8>>,
    #[builder(default, setter(strip_option))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iterations: Option<u32>,
    /// Key length (`generateKey`, `deriveKey` targets) or counter width (`AES-CTR`), in bits.
    #[builder(default, setter(strip_option))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,
    #[builder(default, setter(strip_option, into))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iv: Option<Vec<u8>>,
    #[builder(default, setter(strip_option, into))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counter: Option<Vec<u8>>,
    #[builder(default, setter(strip_option, into))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_data: Option<Vec<u8>>,
    #[builder(default, setter(strip_option))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_length: Option<u32>,
    #[builder(default, setter(strip_option, into))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub named_curve: Option<String>,
    /// Peer public key for key agreement (`ECDH`).
    #[builder(default, setter(strip_option))]
    #[serde(skip)]
    pub public: Option<CryptoKey>,
}

impl Algorithm {
    /// A descriptor carrying only a name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self::builder().name(name).build()
    }
}

/// A reference to an algorithm: a bare name or a full descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AlgorithmIdentifier {
    Name(String),
    Descriptor(Box<Algorithm>),
}

impl AlgorithmIdentifier {
    /// The name used for resolution.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Name(name) => name,
            Self::Descriptor(descriptor) => &descriptor.name,
        }
    }

    /// Normalizes the identifier into a descriptor.
    #[must_use]
    pub fn into_algorithm(self) -> Algorithm {
        match self {
            Self::Name(name) => Algorithm::named(name),
            Self::Descriptor(descriptor) => *descriptor,
        }
    }

    /// Reads an identifier from untyped JSON.
    ///
    /// Accepts a string, or an object whose `name` member is a string.
    ///
    /// # Errors
    /// * [`CryptoError::TypeMismatch`] for any other JSON shape.
    /// * [`CryptoError::Serialization`] if the object's members do not fit [`Algorithm`].
    pub fn from_json(value: &Value) -> Result<Self, CryptoError> {
        match value {
            Value::String(name) => Ok(Self::Name(name.clone())),
            Value::Object(members) if members.get("name").is_some_and(Value::is_string) => {
                let descriptor = Algorithm::deserialize(value).map_err(|source| {
                    CryptoError::Serialization { source, context: Some("algorithm descriptor".into()) }
                })?;
                Ok(Self::Descriptor(Box::new(descriptor)))
            },
            Value::Object(_) => {
                Err(CryptoError::type_mismatch("algorithm descriptor requires a string `name`"))
            },
            other => Err(CryptoError::type_mismatch(format!(
                "algorithm identifier must be a string or an object, got {other}"
            ))),
        }
    }
}

impl From<&str> for AlgorithmIdentifier {
    fn from(name: &str) -> Self {
        Self::Name(name.to_owned())
    }
}

impl From<String> for AlgorithmIdentifier {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<Algorithm> for AlgorithmIdentifier {
    fn from(descriptor: Algorithm) -> Self {
        Self::Descriptor(Box::new(descriptor))
    }
}
