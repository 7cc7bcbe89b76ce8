//! Operating system randomness.

use crate::error::PrimitiveError;

/// Returns `len` bytes from the operating system CSPRNG.
///
/// # Errors
/// Returns [`PrimitiveError::Random`] if the random source is unavailable.
pub fn random_bytes(len: usize) -> Result<Vec<u8>, PrimitiveError> {
    let mut buf = vec![0u8; len];
    getrandom::fill(&mut buf).map_err(|e| PrimitiveError::Random {
        message: e.to_string().into(),
        context: None,
    })?;
    Ok(buf)
}
