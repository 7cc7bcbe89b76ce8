//! # Primitive Errors
//!
//! Failures reported by the byte-level primitives. The plugin layer carries these unmodified
//! to the caller.

use std::borrow::Cow;

/// A specialized [`PrimitiveError`] enum for primitive failures.
#[wcrypt_derive::wcrypt_error]
pub enum PrimitiveError {
    /// Key bytes have a length or encoding the primitive cannot use.
    #[error("Invalid key{}: {message}", format_context(.context))]
    InvalidKey { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A non-key input (IV, counter, output length) is out of range.
    #[error("Invalid parameter{}: {message}", format_context(.context))]
    InvalidParameter { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Authentication, padding or integrity check failed.
    ///
    /// This usually indicates a wrong key, tampered ciphertext or mismatched associated data.
    #[error("Cipher failure{}: {message}", format_context(.context))]
    Cipher { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The operating system random source is unavailable.
    #[error("Random source failure{}: {message}", format_context(.context))]
    Random { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Internal fallback for unexpected issues.
    #[error("Internal primitive error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

pub(crate) fn invalid_key_length(len: usize, context: &'static str) -> PrimitiveError {
    PrimitiveError::InvalidKey {
        message: format!("unsupported key length of {len} bytes").into(),
        context: Some(context.into()),
    }
}
