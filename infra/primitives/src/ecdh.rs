//! Elliptic-curve Diffie-Hellman over NIST P-256.
//!
//! Public keys travel as uncompressed SEC1 points (65 bytes), secret keys as 32-byte scalars.

use crate::error::PrimitiveError;
use crate::random::random_bytes;
use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::{PublicKey, SecretKey};
use zeroize::Zeroizing;

/// Length of a P-256 scalar and of the shared secret, in bytes.
pub const P256_SCALAR_LEN: usize = 32;

const MAX_GENERATE_ATTEMPTS: usize = 8;

/// A freshly generated P-256 key pair.
pub struct EcKeyPair {
    pub secret: Zeroizing<Vec<u8>>,
    pub public: Vec<u8>,
}

impl std::fmt::Debug for EcKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EcKeyPair")
            .field("secret", &"<redacted>")
            .field("public", &self.public.len())
            .finish()
    }
}

/// Generates a P-256 key pair from operating system randomness.
///
/// # Errors
/// * [`PrimitiveError::Random`] if the random source is unavailable.
/// * [`PrimitiveError::Internal`] if no valid scalar was drawn.
pub fn p256_generate() -> Result<EcKeyPair, PrimitiveError> {
    for _ in 0..MAX_GENERATE_ATTEMPTS {
        let candidate = Zeroizing::new(random_bytes(P256_SCALAR_LEN)?);
        // Zero or out-of-range scalars are rejected; draw again.
        if let Ok(secret) = SecretKey::from_slice(&candidate) {
            let public = secret.public_key().to_encoded_point(false).as_bytes().to_vec();
            return Ok(EcKeyPair { secret: candidate, public });
        }
    }
    Err(PrimitiveError::Internal {
        message: "failed to draw a valid P-256 scalar".into(),
        context: Some("ECDH".into()),
    })
}

/// Checks that `public` encodes a point on P-256.
///
/// # Errors
/// Returns [`PrimitiveError::InvalidKey`] if the encoding or the point is invalid.
pub fn p256_validate_public(public: &[u8]) -> Result<(), PrimitiveError> {
    parse_public(public).map(|_| ())
}

/// Computes the raw x-coordinate shared secret for `secret` and the peer's `public` point.
///
/// # Errors
/// Returns [`PrimitiveError::InvalidKey`] if either key is malformed.
pub fn p256_derive(secret: &[u8], public: &[u8]) -> Result<Zeroizing<Vec<u8>>, PrimitiveError> {
    let secret = SecretKey::from_slice(secret).map_err(|_| PrimitiveError::InvalidKey {
        message: "malformed P-256 secret scalar".into(),
        context: Some("ECDH".into()),
    })?;
    let public = parse_public(public)?;
    let shared = p256::ecdh::diffie_hellman(secret.to_nonzero_scalar(), public.as_affine());
    Ok(Zeroizing::new(shared.raw_secret_bytes().to_vec()))
}

fn parse_public(public: &[u8]) -> Result<PublicKey, PrimitiveError> {
    PublicKey::from_sec1_bytes(public).map_err(|_| PrimitiveError::InvalidKey {
        message: "malformed P-256 public point".into(),
        context: Some("ECDH".into()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_secret_agrees() {
        let alice = p256_generate().unwrap();
        let bob = p256_generate().unwrap();
        assert_eq!(alice.public.len(), 65);
        assert_eq!(alice.public[0], 0x04);

        let ab = p256_derive(&alice.secret, &bob.public).unwrap();
        let ba = p256_derive(&bob.secret, &alice.public).unwrap();
        assert_eq!(ab.len(), P256_SCALAR_LEN);
        assert_eq!(*ab, *ba);
    }

    #[test]
    fn test_rejects_invalid_public_point() {
        let mut point = p256_generate().unwrap().public;
        point[10] ^= 0xff;
        assert!(p256_validate_public(&point).is_err());
        assert!(p256_validate_public(&[0x04; 3]).is_err());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let pair = p256_generate().unwrap();
        let rendered = format!("{pair:?}");
        assert!(rendered.contains("<redacted>"));
    }
}
