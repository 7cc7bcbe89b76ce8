use crate::algorithm::Algorithm;
use crate::deferred::Deferred;
use crate::error::CryptoError;
use crate::operation::Capabilities;
use crate::plugin::CryptoAlgorithm;
use wcrypt_primitives::{HashFunction, hash};

/// A SHA family digest. Also answers hash queries for HMAC, HKDF and PBKDF2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sha {
    name: &'static str,
    hash: HashFunction,
}

impl Sha {
    pub const SHA1: Self = Self { name: "SHA-1", hash: HashFunction::Sha1 };
    pub const SHA256: Self = Self { name: "SHA-256", hash: HashFunction::Sha256 };
    pub const SHA384: Self = Self { name: "SHA-384", hash: HashFunction::Sha384 };
    pub const SHA512: Self = Self { name: "SHA-512", hash: HashFunction::Sha512 };
}

impl CryptoAlgorithm for Sha {
    fn name(&self) -> &'static str {
        self.name
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::DIGEST | Capabilities::GET_HASH_FUNCTION | Capabilities::GET_HASH_BLOCK_SIZE
    }

    fn digest(&self, _params: &Algorithm, data: &[u8]) -> Result<Deferred<Vec<u8>>, CryptoError> {
        let hash = self.hash;
        let data = data.to_vec();
        Ok(Deferred::spawn("digest", move || Ok(hash::digest(hash, &data))))
    }

    fn hash_function(&self) -> Result<HashFunction, CryptoError> {
        Ok(self.hash)
    }

    fn hash_block_size(&self) -> Result<usize, CryptoError> {
        Ok(self.hash.block_size_bits())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::KeyFormat;
    use crate::key::{CryptoKey, KeyAlgorithm};
    use crate::usage::{KeyType, KeyUsages};
    use hex_literal::hex;

    #[test]
    fn test_digest_matches_known_vector() {
        let out = Sha::SHA384
            .digest(&Algorithm::named("SHA-384"), b"abc")
            .unwrap()
            .into_ready()
            .unwrap()
            .unwrap();
        assert_eq!(
            out,
            hex!(
                "cb00753f45a35e8bb5a03d699ac65007272c32ab0eded1631a8b605a43ff5bed"
                "8086072ba1e7cc2358baeca134c825a7"
            )
        );
    }

    #[test]
    fn test_hash_queries() {
        assert_eq!(Sha::SHA1.hash_function().unwrap(), HashFunction::Sha1);
        assert_eq!(Sha::SHA256.hash_block_size().unwrap(), 512);
        assert_eq!(Sha::SHA512.hash_block_size().unwrap(), 1024);
    }

    #[test]
    fn test_undeclared_operations_are_not_supported() {
        let key = CryptoKey::new(
            KeyType::Secret,
            KeyAlgorithm::new("SHA-256"),
            true,
            KeyUsages::empty(),
            Vec::new(),
        );
        let err = Sha::SHA256.export_key(KeyFormat::Raw, &key).unwrap_err();
        assert_eq!(err.exception(), "NotSupportedError");
    }
}
