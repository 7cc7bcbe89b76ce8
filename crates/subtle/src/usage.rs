//! Key usages and key types.
//!
//! [`KeyUsages`] is the immutable permission set carried by every
//! [`CryptoKey`](crate::CryptoKey). Its iteration and serialization order is the canonical Web
//! Crypto order: `encrypt`, `decrypt`, `sign`, `verify`, `deriveKey`, `deriveBits`, `wrapKey`,
//! `unwrapKey`.

use crate::error::CryptoError;
use bitflags::bitflags;
use serde::de::SeqAccess;
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

/// A single permission a key may grant.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub enum KeyUsage {
    Encrypt,
    Decrypt,
    Sign,
    Verify,
    DeriveKey,
    DeriveBits,
    WrapKey,
    UnwrapKey,
}

bitflags! {
    /// A set of [`KeyUsage`]s. Bit order is the canonical reporting order.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct KeyUsages: u8 {
        const ENCRYPT = 1 << 0;
        const DECRYPT = 1 << 1;
        const SIGN = 1 << 2;
        const VERIFY = 1 << 3;
        const DERIVE_KEY = 1 << 4;
        const DERIVE_BITS = 1 << 5;
        const WRAP_KEY = 1 << 6;
        const UNWRAP_KEY = 1 << 7;
    }
}

impl KeyUsage {
    /// The flag representing this usage inside a [`KeyUsages`] set.
    #[must_use]
    pub const fn flag(self) -> KeyUsages {
        match self {
            Self::Encrypt => KeyUsages::ENCRYPT,
            Self::Decrypt => KeyUsages::DECRYPT,
            Self::Sign => KeyUsages::SIGN,
            Self::Verify => KeyUsages::VERIFY,
            Self::DeriveKey => KeyUsages::DERIVE_KEY,
            Self::DeriveBits => KeyUsages::DERIVE_BITS,
            Self::WrapKey => KeyUsages::WRAP_KEY,
            Self::UnwrapKey => KeyUsages::UNWRAP_KEY,
        }
    }
}

impl KeyUsages {
    /// Usages in canonical order.
    pub fn usages(self) -> impl Iterator<Item = KeyUsage> {
        KeyUsage::iter().filter(move |usage| self.contains(usage.flag()))
    }

    /// Returns `true` if `usage` is part of the set.
    #[must_use]
    pub const fn grants(self, usage: KeyUsage) -> bool {
        self.contains(usage.flag())
    }

    /// Parses a list of usage names, e.g. `["deriveBits", "deriveKey"]`.
    ///
    /// # Errors
    /// Returns [`CryptoError::TypeMismatch`] for an unknown usage name.
    pub fn parse<I, S>(names: I) -> Result<Self, CryptoError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names.into_iter().try_fold(Self::empty(), |acc, name| {
            let name = name.as_ref();
            KeyUsage::from_str(name)
                .map(|usage| acc | usage.flag())
                .map_err(|_| CryptoError::type_mismatch(format!("unknown key usage `{name}`")))
        })
    }
}

impl From<KeyUsage> for KeyUsages {
    fn from(usage: KeyUsage) -> Self {
        usage.flag()
    }
}

impl FromIterator<KeyUsage> for KeyUsages {
    fn from_iter<I: IntoIterator<Item = KeyUsage>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), |acc, usage| acc | usage.flag())
    }
}

impl fmt::Display for KeyUsages {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, usage) in self.usages().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{usage}")?;
        }
        f.write_str("]")
    }
}

impl Serialize for KeyUsages {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(self.bits().count_ones() as usize))?;
        for usage in self.usages() {
            seq.serialize_element(&usage)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for KeyUsages {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct UsagesVisitor;

        impl<'de> serde::de::Visitor<'de> for UsagesVisitor {
            type Value = KeyUsages;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a list of key usages")
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let mut usages = KeyUsages::empty();
                while let Some(usage) = seq.next_element::<KeyUsage>()? {
                    usages |= usage.flag();
                }
                Ok(usages)
            }
        }

        deserializer.deserialize_seq(UsagesVisitor)
    }
}

/// The kind of key material a [`CryptoKey`](crate::CryptoKey) holds.
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
pub enum KeyType {
    Secret,
    Public,
    Private,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usages_report_in_canonical_order() {
        let usages = KeyUsages::UNWRAP_KEY | KeyUsages::ENCRYPT | KeyUsages::DERIVE_BITS;
        let names: Vec<String> = usages.usages().map(|u| u.to_string()).collect();
        assert_eq!(names, ["encrypt", "deriveBits", "unwrapKey"]);
        assert_eq!(usages.to_string(), "[encrypt, deriveBits, unwrapKey]");
    }

    #[test]
    fn test_parse_rejects_unknown_names() {
        let usages = KeyUsages::parse(["deriveKey", "deriveBits"]).unwrap();
        assert_eq!(usages, KeyUsages::DERIVE_KEY | KeyUsages::DERIVE_BITS);

        let err = KeyUsages::parse(["derive"]).unwrap_err();
        assert!(matches!(err, CryptoError::TypeMismatch { .. }));
    }

    #[test]
    fn test_serde_uses_usage_names() {
        let usages = KeyUsages::SIGN | KeyUsages::VERIFY;
        let json = serde_json::to_string(&usages).unwrap();
        assert_eq!(json, r#"["sign","verify"]"#);

        let back: KeyUsages = serde_json::from_str(r#"["verify","sign","verify"]"#).unwrap();
        assert_eq!(back, usages);
    }

    #[test]
    fn test_key_type_names() {
        assert_eq!(KeyType::Secret.to_string(), "secret");
        assert_eq!(serde_json::to_string(&KeyType::Private).unwrap(), r#""private""#);
    }
}
