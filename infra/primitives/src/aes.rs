//! AES block cipher modes: CTR, CBC (PKCS#7), GCM and key wrap (RFC 3394).
//!
//! Key size selects AES-128/192/256 from the key length in bytes.

use crate::error::{PrimitiveError, invalid_key_length};
use aes::cipher::block_padding::Pkcs7;
use aes::cipher::consts::{U12, U13, U14, U15, U16};
use aes::cipher::{
    BlockCipher, BlockDecryptMut, BlockEncryptMut, KeyInit, KeyIvInit, StreamCipher,
};
use aes_gcm::AesGcm;
use aes_gcm::aead::{Aead, Nonce, Payload};
use aes_kw::Kek;
use ctr::{Ctr32BE, Ctr64BE, Ctr128BE};

/// AES block size in bytes; also the CBC IV and CTR counter block size.
pub const BLOCK_LEN: usize = 16;

/// The only GCM nonce size the primitives accept.
pub const GCM_IV_LEN: usize = 12;

/// Binds `$cipher` to the AES variant matching `$key_len` and evaluates `$body`.
macro_rules! with_aes_key {
    ($key_len:expr, $context:literal, $cipher:ident => $body:expr) => {
        match $key_len {
            16 => {
                type $cipher = ::aes::Aes128;
                $body
            },
            24 => {
                type $cipher = ::aes::Aes192;
                $body
            },
            32 => {
                type $cipher = ::aes::Aes256;
                $body
            },
            len => Err(invalid_key_length(len, $context)),
        }
    };
}

/// Applies the AES-CTR keystream; encryption and decryption are the same operation.
///
/// `length_bits` is the width of the incrementing counter portion of the counter block
/// (32, 64 or 128).
///
/// # Errors
/// * [`PrimitiveError::InvalidKey`] for key lengths other than 16/24/32 bytes.
/// * [`PrimitiveError::InvalidParameter`] for a malformed counter block, an unsupported counter
///   width, or when the counter space would be exhausted.
pub fn aes_ctr(
    key: &[u8],
    counter: &[u8],
    length_bits: u32,
    data: &[u8],
) -> Result<Vec<u8>, PrimitiveError> {
    if counter.len() != BLOCK_LEN {
        return Err(PrimitiveError::InvalidParameter {
            message: format!("counter block must be {BLOCK_LEN} bytes, got {}", counter.len())
                .into(),
            context: Some("AES-CTR".into()),
        });
    }

    with_aes_key!(key.len(), "AES-CTR", Cipher => match length_bits {
        32 => ctr_apply::<Ctr32BE<Cipher>>(key, counter, data),
        64 => ctr_apply::<Ctr64BE<Cipher>>(key, counter, data),
        128 => ctr_apply::<Ctr128BE<Cipher>>(key, counter, data),
        bits => Err(PrimitiveError::InvalidParameter {
            message: format!("unsupported counter width of {bits} bits").into(),
            context: Some("AES-CTR".into()),
        }),
    })
}

/// Encrypts with AES-CBC and PKCS#7 padding.
///
/// # Errors
/// * [`PrimitiveError::InvalidKey`] for key lengths other than 16/24/32 bytes.
/// * [`PrimitiveError::InvalidParameter`] if `iv` is not 16 bytes.
pub fn aes_cbc_encrypt(key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>, PrimitiveError> {
    check_cbc_iv(iv)?;
    with_aes_key!(key.len(), "AES-CBC", Cipher => cbc_encrypt_with::<Cipher>(key, iv, data))
}

/// Decrypts AES-CBC ciphertext and strips PKCS#7 padding.
///
/// # Errors
/// * [`PrimitiveError::InvalidKey`] for key lengths other than 16/24/32 bytes.
/// * [`PrimitiveError::InvalidParameter`] if `iv` is not 16 bytes.
/// * [`PrimitiveError::Cipher`] if the padding is invalid.
pub fn aes_cbc_decrypt(key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>, PrimitiveError> {
    check_cbc_iv(iv)?;
    with_aes_key!(key.len(), "AES-CBC", Cipher => cbc_decrypt_with::<Cipher>(key, iv, data))
}

/// Encrypts with AES-GCM, returning `ciphertext || tag`.
///
/// # Errors
/// * [`PrimitiveError::InvalidKey`] for key lengths other than 16/24/32 bytes.
/// * [`PrimitiveError::InvalidParameter`] for an IV other than 12 bytes or a tag length outside
///   12..=16 bytes.
pub fn aes_gcm_encrypt(
    key: &[u8],
    iv: &[u8],
    aad: &[u8],
    tag_len: usize,
    data: &[u8],
) -> Result<Vec<u8>, PrimitiveError> {
    check_gcm_iv(iv)?;
    with_aes_key!(key.len(), "AES-GCM", Cipher => match tag_len {
        12 => gcm_seal::<AesGcm<Cipher, U12, U12>>(key, iv, aad, data),
        13 => gcm_seal::<AesGcm<Cipher, U12, U13>>(key, iv, aad, data),
        14 => gcm_seal::<AesGcm<Cipher, U12, U14>>(key, iv, aad, data),
        15 => gcm_seal::<AesGcm<Cipher, U12, U15>>(key, iv, aad, data),
        16 => gcm_seal::<AesGcm<Cipher, U12, U16>>(key, iv, aad, data),
        len => Err(unsupported_tag(len)),
    })
}

/// Authenticates and decrypts AES-GCM `ciphertext || tag`.
///
/// # Errors
/// * [`PrimitiveError::InvalidKey`] for key lengths other than 16/24/32 bytes.
/// * [`PrimitiveError::InvalidParameter`] for an IV other than 12 bytes or a tag length outside
///   12..=16 bytes.
/// * [`PrimitiveError::Cipher`] if authentication fails.
pub fn aes_gcm_decrypt(
    key: &[u8],
    iv: &[u8],
    aad: &[u8],
    tag_len: usize,
    data: &[u8],
) -> Result<Vec<u8>, PrimitiveError> {
    check_gcm_iv(iv)?;
    with_aes_key!(key.len(), "AES-GCM", Cipher => match tag_len {
        12 => gcm_open::<AesGcm<Cipher, U12, U12>>(key, iv, aad, data),
        13 => gcm_open::<AesGcm<Cipher, U12, U13>>(key, iv, aad, data),
        14 => gcm_open::<AesGcm<Cipher, U12, U14>>(key, iv, aad, data),
        15 => gcm_open::<AesGcm<Cipher, U12, U15>>(key, iv, aad, data),
        16 => gcm_open::<AesGcm<Cipher, U12, U16>>(key, iv, aad, data),
        len => Err(unsupported_tag(len)),
    })
}

/// Wraps `data` with AES key wrap (RFC 3394).
///
/// # Errors
/// * [`PrimitiveError::InvalidKey`] for key-encryption-key lengths other than 16/24/32 bytes.
/// * [`PrimitiveError::Cipher`] if `data` is not a multiple of 8 bytes of at least 16 bytes.
pub fn aes_kw_wrap(key: &[u8], data: &[u8]) -> Result<Vec<u8>, PrimitiveError> {
    with_aes_key!(key.len(), "AES-KW", Cipher => {
        Kek::<Cipher>::try_from(key).and_then(|kek| kek.wrap_vec(data)).map_err(|e| {
            PrimitiveError::Cipher { message: e.to_string().into(), context: Some("AES-KW wrap".into()) }
        })
    })
}

/// Unwraps RFC 3394 wrapped key data and checks its integrity.
///
/// # Errors
/// * [`PrimitiveError::InvalidKey`] for key-encryption-key lengths other than 16/24/32 bytes.
/// * [`PrimitiveError::Cipher`] if the integrity check fails or the input is malformed.
pub fn aes_kw_unwrap(key: &[u8], data: &[u8]) -> Result<Vec<u8>, PrimitiveError> {
    with_aes_key!(key.len(), "AES-KW", Cipher => {
        Kek::<Cipher>::try_from(key).and_then(|kek| kek.unwrap_vec(data)).map_err(|e| {
            PrimitiveError::Cipher { message: e.to_string().into(), context: Some("AES-KW unwrap".into()) }
        })
    })
}

fn ctr_apply<S>(key: &[u8], counter: &[u8], data: &[u8]) -> Result<Vec<u8>, PrimitiveError>
where
    S: KeyIvInit + StreamCipher,
{
    let mut cipher =
        S::new_from_slices(key, counter).map_err(|_| invalid_key_length(key.len(), "AES-CTR"))?;
    let mut buf = data.to_vec();
    cipher.try_apply_keystream(&mut buf).map_err(|_| PrimitiveError::InvalidParameter {
        message: "counter space exhausted".into(),
        context: Some("AES-CTR".into()),
    })?;
    Ok(buf)
}

fn cbc_encrypt_with<C>(key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>, PrimitiveError>
where
    C: BlockEncryptMut + BlockCipher + KeyInit,
{
    let cipher = cbc::Encryptor::<C>::new_from_slices(key, iv)
        .map_err(|_| invalid_key_length(key.len(), "AES-CBC"))?;
    Ok(cipher.encrypt_padded_vec_mut::<Pkcs7>(data))
}

fn cbc_decrypt_with<C>(key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>, PrimitiveError>
where
    C: BlockDecryptMut + BlockCipher + KeyInit,
{
    let cipher = cbc::Decryptor::<C>::new_from_slices(key, iv)
        .map_err(|_| invalid_key_length(key.len(), "AES-CBC"))?;
    cipher.decrypt_padded_vec_mut::<Pkcs7>(data).map_err(|_| PrimitiveError::Cipher {
        message: "invalid padding".into(),
        context: Some("AES-CBC".into()),
    })
}

fn gcm_seal<C>(key: &[u8], iv: &[u8], aad: &[u8], data: &[u8]) -> Result<Vec<u8>, PrimitiveError>
where
    C: Aead + KeyInit,
{
    let cipher = C::new_from_slice(key).map_err(|_| invalid_key_length(key.len(), "AES-GCM"))?;
    cipher.encrypt(Nonce::<C>::from_slice(iv), Payload { msg: data, aad }).map_err(|_| {
        PrimitiveError::Cipher { message: "encryption failed".into(), context: Some("AES-GCM".into()) }
    })
}

fn gcm_open<C>(key: &[u8], iv: &[u8], aad: &[u8], data: &[u8]) -> Result<Vec<u8>, PrimitiveError>
where
    C: Aead + KeyInit,
{
    let cipher = C::new_from_slice(key).map_err(|_| invalid_key_length(key.len(), "AES-GCM"))?;
    cipher.decrypt(Nonce::<C>::from_slice(iv), Payload { msg: data, aad }).map_err(|_| {
        PrimitiveError::Cipher {
            message: "authentication failed".into(),
            context: Some("AES-GCM".into()),
        }
    })
}

fn check_cbc_iv(iv: &[u8]) -> Result<(), PrimitiveError> {
    if iv.len() == BLOCK_LEN {
        Ok(())
    } else {
        Err(PrimitiveError::InvalidParameter {
            message: format!("IV must be {BLOCK_LEN} bytes, got {}", iv.len()).into(),
            context: Some("AES-CBC".into()),
        })
    }
}

fn check_gcm_iv(iv: &[u8]) -> Result<(), PrimitiveError> {
    if iv.len() == GCM_IV_LEN {
        Ok(())
    } else {
        Err(PrimitiveError::InvalidParameter {
            message: format!("IV must be {GCM_IV_LEN} bytes, got {}", iv.len()).into(),
            context: Some("AES-GCM".into()),
        })
    }
}

fn unsupported_tag(len: usize) -> PrimitiveError {
    PrimitiveError::InvalidParameter {
        message: format!("unsupported tag length of {len} bytes").into(),
        context: Some("AES-GCM".into()),
    }
}
