//! The fixed operation set and per-plugin capability flags.

use bitflags::bitflags;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, IntoStaticStr};

/// An operation a plugin may implement.
///
/// The string form matches the Web Crypto operation names; the three `Get*` operations are
/// internal queries used when one algorithm is parameterised by another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, IntoStaticStr)]
pub enum Operation {
    #[strum(serialize = "encrypt")]
    Encrypt,
    #[strum(serialize = "decrypt")]
    Decrypt,
    #[strum(serialize = "sign")]
    Sign,
    #[strum(serialize = "verify")]
    Verify,
    #[strum(serialize = "deriveBits")]
    DeriveBits,
    #[strum(serialize = "wrapKey")]
    WrapKey,
    #[strum(serialize = "unwrapKey")]
    UnwrapKey,
    #[strum(serialize = "digest")]
    Digest,
    #[strum(serialize = "generateKey")]
    GenerateKey,
    #[strum(serialize = "importKey")]
    ImportKey,
    #[strum(serialize = "exportKey")]
    ExportKey,
    #[strum(serialize = "get key length")]
    GetKeyLength,
    #[strum(serialize = "get hash function")]
    GetHashFunction,
    #[strum(serialize = "get hash block size")]
    GetHashBlockSize,
}

bitflags! {
    /// The operations a plugin declares. Checked once, when the registry is built.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Capabilities: u16 {
        const ENCRYPT = 1 << 0;
        const DECRYPT = 1 << 1;
        const SIGN = 1 << 2;
        const VERIFY = 1 << 3;
        const DERIVE_BITS = 1 << 4;
        const WRAP_KEY = 1 << 5;
        const UNWRAP_KEY = 1 << 6;
        const DIGEST = 1 << 7;
        const GENERATE_KEY = 1 << 8;
        const IMPORT_KEY = 1 << 9;
        const EXPORT_KEY = 1 << 10;
        const GET_KEY_LENGTH = 1 << 11;
        const GET_HASH_FUNCTION = 1 << 12;
        const GET_HASH_BLOCK_SIZE = 1 << 13;
    }
}

impl Operation {
    /// The capability flag that declares this operation.
    #[must_use]
    pub const fn capability(self) -> Capabilities {
        match self {
            Self::Encrypt => Capabilities::ENCRYPT,
            Self::Decrypt => Capabilities::DECRYPT,
            Self::Sign => Capabilities::SIGN,
            Self::Verify => Capabilities::VERIFY,
            Self::DeriveBits => Capabilities::DERIVE_BITS,
            Self::WrapKey => Capabilities::WRAP_KEY,
            Self::UnwrapKey => Capabilities::UNWRAP_KEY,
            Self::Digest => Capabilities::DIGEST,
            Self::GenerateKey => Capabilities::GENERATE_KEY,
            Self::ImportKey => Capabilities::IMPORT_KEY,
            Self::ExportKey => Capabilities::EXPORT_KEY,
            Self::GetKeyLength => Capabilities::GET_KEY_LENGTH,
            Self::GetHashFunction => Capabilities::GET_HASH_FUNCTION,
            Self::GetHashBlockSize => Capabilities::GET_HASH_BLOCK_SIZE,
        }
    }
}

impl Capabilities {
    /// Iterates the declared operations in their fixed order.
    pub fn operations(self) -> impl Iterator<Item = Operation> {
        Operation::iter().filter(move |op| self.contains(op.capability()))
    }
}
