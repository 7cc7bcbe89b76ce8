//! HMAC over the supported hash functions.

use crate::error::PrimitiveError;
use crate::hash::{HashFunction, dispatch_hash};
use hmac::digest::Digest;
use hmac::digest::crypto_common::BlockSizeUser;
use hmac::{Mac, SimpleHmac};

/// Computes `HMAC(key, data)`.
///
/// # Errors
/// Returns [`PrimitiveError::InvalidKey`] if the MAC cannot be keyed.
pub fn hmac_sign(hash: HashFunction, key: &[u8], data: &[u8]) -> Result<Vec<u8>, PrimitiveError> {
    dispatch_hash!(hash, sign_with(key, data))
}

/// Verifies `signature` against `HMAC(key, data)` in constant time.
///
/// # Errors
/// Returns [`PrimitiveError::InvalidKey`] if the MAC cannot be keyed.
pub fn hmac_verify(
    hash: HashFunction,
    key: &[u8],
    data: &[u8],
    signature: &[u8],
) -> Result<bool, PrimitiveError> {
    dispatch_hash!(hash, verify_with(key, data, signature))
}

fn keyed<D>(key: &[u8]) -> Result<SimpleHmac<D>, PrimitiveError>
where
    D: Digest + BlockSizeUser,
{
    <SimpleHmac<D> as Mac>::new_from_slice(key).map_err(|_| PrimitiveError::InvalidKey {
        message: "HMAC rejected the key".into(),
        context: None,
    })
}

fn sign_with<D>(key: &[u8], data: &[u8]) -> Result<Vec<u8>, PrimitiveError>
where
    D: Digest + BlockSizeUser,
{
    let mut mac = keyed::<D>(key)?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn verify_with<D>(key: &[u8], data: &[u8], signature: &[u8]) -> Result<bool, PrimitiveError>
where
    D: Digest + BlockSizeUser,
{
    let mut mac = keyed::<D>(key)?;
    mac.update(data);
    Ok(mac.verify_slice(signature).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    // RFC 4231, test case 2
    const KEY: &[u8] = b"Jefe";
    const DATA: &[u8] = b"what do ya want for nothing?";

    #[test]
    fn test_hmac_sha256_rfc4231() {
        let tag = hmac_sign(HashFunction::Sha256, KEY, DATA).unwrap();
        assert_eq!(tag, hex!("5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"));
    }

    #[test]
    fn test_verify_accepts_own_tag_and_rejects_truncation() {
        let tag = hmac_sign(HashFunction::Sha512, KEY, DATA).unwrap();
        assert!(hmac_verify(HashFunction::Sha512, KEY, DATA, &tag).unwrap());
        assert!(!hmac_verify(HashFunction::Sha512, KEY, DATA, &tag[..32]).unwrap());
        assert!(!hmac_verify(HashFunction::Sha512, b"other", DATA, &tag).unwrap());
    }
}
