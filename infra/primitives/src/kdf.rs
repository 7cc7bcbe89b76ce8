//! Key derivation: the PBKDF2 stretching loop and HKDF extract-and-expand.

use crate::error::PrimitiveError;
use crate::hash::{HashFunction, dispatch_hash};
use hkdf::SimpleHkdf;
use hmac::SimpleHmac;
use hmac::digest::Digest;
use hmac::digest::crypto_common::BlockSizeUser;

/// Stretches `secret` with PBKDF2-HMAC into `output_len` bytes.
///
/// # Errors
/// * [`PrimitiveError::InvalidParameter`] if `iterations` or `output_len` is zero.
/// * [`PrimitiveError::InvalidKey`] if the PRF rejects the secret.
pub fn pbkdf2(
    secret: &[u8],
    salt: &[u8],
    iterations: u32,
    output_len: usize,
    hash: HashFunction,
) -> Result<Vec<u8>, PrimitiveError> {
    if iterations == 0 {
        return Err(PrimitiveError::InvalidParameter {
            message: "iteration count must be positive".into(),
            context: Some("PBKDF2".into()),
        });
    }
    if output_len == 0 {
        return Err(PrimitiveError::InvalidParameter {
            message: "output length must be positive".into(),
            context: Some("PBKDF2".into()),
        });
    }

    let mut out = vec![0u8; output_len];
    dispatch_hash!(hash, pbkdf2_with(secret, salt, iterations, &mut out))?;
    Ok(out)
}

/// Derives `output_len` bytes with HKDF (RFC 5869).
///
/// # Errors
/// Returns [`PrimitiveError::InvalidParameter`] if `output_len` exceeds `255 * HashLen`.
pub fn hkdf(
    secret: &[u8],
    salt: &[u8],
    info: &[u8],
    output_len: usize,
    hash: HashFunction,
) -> Result<Vec<u8>, PrimitiveError> {
    let mut out = vec![0u8; output_len];
    dispatch_hash!(hash, hkdf_with(secret, salt, info, &mut out))?;
    Ok(out)
}

fn pbkdf2_with<D>(
    secret: &[u8],
    salt: &[u8],
    iterations: u32,
    out: &mut [u8],
) -> Result<(), PrimitiveError>
where
    D: Digest + BlockSizeUser + Clone + Sync,
{
    pbkdf2::pbkdf2::<SimpleHmac<D>>(secret, salt, iterations, out).map_err(|_| {
        PrimitiveError::InvalidKey { message: "PRF rejected the secret".into(), context: None }
    })
}

fn hkdf_with<D>(secret: &[u8], salt: &[u8], info: &[u8], out: &mut [u8]) -> Result<(), PrimitiveError>
where
    D: Digest + BlockSizeUser + Clone,
{
    let len = out.len();
    SimpleHkdf::<D>::new(Some(salt), secret).expand(info, out).map_err(|_| {
        PrimitiveError::InvalidParameter {
            message: format!("output of {len} bytes exceeds the HKDF limit").into(),
            context: Some("HKDF".into()),
        }
    })
}
