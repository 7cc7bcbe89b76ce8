//! # Crypto Errors
//!
//! This module defines the [`CryptoError`] enum used throughout the subtle crate. Every variant
//! reports the Web Crypto exception name it surfaces as through [`CryptoError::exception`].

use std::borrow::Cow;
use wcrypt_primitives::PrimitiveError;

/// A specialized [`CryptoError`] enum for registry, key and algorithm failures.
#[wcrypt_derive::wcrypt_error]
pub enum CryptoError {
    /// The algorithm is unknown for the requested operation, or a format or parameter value is
    /// recognised but not implemented.
    #[exception = "NotSupportedError"]
    #[error("Not supported{}: {message}", format_context(.context))]
    NotSupported { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Parameters are well-formed but out of range for the algorithm.
    #[exception = "OperationError"]
    #[error("Operation error{}: {message}", format_context(.context))]
    Operation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The key does not permit the requested operation.
    #[exception = "InvalidAccessError"]
    #[error("Invalid access{}: {message}", format_context(.context))]
    InvalidAccess { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Illegal usages or extractable flag for the key being created.
    #[exception = "SyntaxError"]
    #[error("Syntax error{}: {message}", format_context(.context))]
    Syntax { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A non-string algorithm identifier or a missing required member.
    #[exception = "TypeError"]
    #[error("Type mismatch{}: {message}", format_context(.context))]
    TypeMismatch { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Key data is malformed or inconsistent with the requested algorithm.
    #[exception = "DataError"]
    #[error("Data error{}: {message}", format_context(.context))]
    Data { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Failure reported by a byte-level primitive, carried unmodified.
    #[exception = "OperationError"]
    #[error("Primitive failure{}: {source}", format_context(.context))]
    Primitive { source: PrimitiveError, context: Option<Cow<'static, str>> },

    /// JSON Web Key or descriptor (de)serialization failure.
    #[exception = "DataError"]
    #[error("Serialization error{}: {source}", format_context(.context))]
    Serialization { source: serde_json::Error, context: Option<Cow<'static, str>> },

    /// The registry was assembled from an inconsistent plugin set.
    #[error("Invalid configuration{}: {message}", format_context(.context))]
    InvalidConfiguration { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Configuration sources could not be loaded or deserialized.
    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },

    /// Internal fallback for unexpected issues or logic errors.
    #[error("Internal crypto error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl CryptoError {
    pub(crate) fn not_supported(message: impl Into<Cow<'static, str>>) -> Self {
        Self::NotSupported { message: message.into(), context: None }
    }

    pub(crate) fn operation(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Operation { message: message.into(), context: None }
    }

    pub(crate) fn invalid_access(message: impl Into<Cow<'static, str>>) -> Self {
        Self::InvalidAccess { message: message.into(), context: None }
    }

    pub(crate) fn syntax(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Syntax { message: message.into(), context: None }
    }

    pub(crate) fn type_mismatch(message: impl Into<Cow<'static, str>>) -> Self {
        Self::TypeMismatch { message: message.into(), context: None }
    }

    pub(crate) fn data(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Data { message: message.into(), context: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exception_names() {
        assert_eq!(CryptoError::not_supported("x").exception(), "NotSupportedError");
        assert_eq!(CryptoError::type_mismatch("x").exception(), "TypeError");
        assert_eq!(CryptoError::syntax("x").exception(), "SyntaxError");
        assert_eq!(CryptoError::from("boom").exception(), "Error");
    }

    #[test]
    fn test_primitive_error_is_carried_unmodified() {
        let primitive =
            PrimitiveError::InvalidParameter { message: "bad".into(), context: Some("PBKDF2".into()) };
        let rendered = primitive.to_string();

        let err = CryptoError::from(primitive);
        assert_eq!(err.exception(), "OperationError");
        match err {
            CryptoError::Primitive { source, context } => {
                assert_eq!(source.to_string(), rendered);
                assert!(context.is_none());
            },
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn test_context_is_attached() {
        let result: Result<(), CryptoError> = Err(CryptoError::operation("length must be positive"));
        let err = result.context("PBKDF2").unwrap_err();
        assert_eq!(err.to_string(), "Operation error (PBKDF2): length must be positive");
    }
}
