//! Hash function selection and one-shot digests.

use sha1::Sha1;
use sha2::{Digest, Sha256, Sha384, Sha512};
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

/// The hash functions the primitives can run.
///
/// The string form (`sha1`, `sha256`, ...) is the canonical hash identifier handed around by the
/// algorithm layer.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, IntoStaticStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum HashFunction {
    Sha1,
    Sha256,
    Sha384,
    Sha512,
}

impl HashFunction {
    /// Internal block size in bits.
    #[must_use]
    pub const fn block_size_bits(self) -> usize {
        match self {
            Self::Sha1 | Self::Sha256 => 512,
            Self::Sha384 | Self::Sha512 => 1024,
        }
    }

    /// Digest output length in bytes.
    #[must_use]
    pub const fn output_len(self) -> usize {
        match self {
            Self::Sha1 => 20,
            Self::Sha256 => 32,
            Self::Sha384 => 48,
            Self::Sha512 => 64,
        }
    }
}

/// Expands `$func::<Concrete>(args..)` for the runtime-selected [`HashFunction`].
macro_rules! dispatch_hash {
    ($hash:expr, $func:ident($($arg:expr),* $(,)?)) => {
        match $hash {
            $crate::hash::HashFunction::Sha1 => $func::<::sha1::Sha1>($($arg),*),
            $crate::hash::HashFunction::Sha256 => $func::<::sha2::Sha256>($($arg),*),
            $crate::hash::HashFunction::Sha384 => $func::<::sha2::Sha384>($($arg),*),
            $crate::hash::HashFunction::Sha512 => $func::<::sha2::Sha512>($($arg),*),
        }
    };
}
pub(crate) use dispatch_hash;

/// Computes the digest of `data`.
#[must_use]
pub fn digest(hash: HashFunction, data: &[u8]) -> Vec<u8> {
    match hash {
        HashFunction::Sha1 => Sha1::digest(data).to_vec(),
        HashFunction::Sha256 => Sha256::digest(data).to_vec(),
        HashFunction::Sha384 => Sha384::digest(data).to_vec(),
        HashFunction::Sha512 => Sha512::digest(data).to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_canonical_names_roundtrip() {
        for hash in HashFunction::iter() {
            let name = hash.to_string();
            assert_eq!(HashFunction::from_str(&name).unwrap(), hash);
        }
        assert_eq!(HashFunction::Sha256.to_string(), "sha256");
    }

    #[test]
    fn test_digest_lengths_match_output_len() {
        for hash in HashFunction::iter() {
            assert_eq!(digest(hash, b"abc").len(), hash.output_len());
        }
    }

    #[test]
    fn test_sha256_known_vector() {
        assert_eq!(
            digest(HashFunction::Sha256, b"abc"),
            hex!("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad")
        );
    }

    #[test]
    fn test_sha1_known_vector() {
        assert_eq!(
            digest(HashFunction::Sha1, b"abc"),
            hex!("a9993e364706816aba3e25717850c26c9cd0d89d")
        );
    }
}
