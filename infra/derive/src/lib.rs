#![allow(unreachable_pub)]

//! # Macros
//!
//! Procedural macros for the wcrypt workspace.
//!
//! ## Usage
//! ```toml
//! [dependencies]
//! wcrypt-derive = { path = "../infra/derive" }
//! ```
//!
//! The macro docstrings below are `ignore`d to avoid compiling in this crate; the
//! `tests/ui` cases exercise them for real.

mod macros;

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

/// Attribute macro for the error enums of the workspace.
///
/// # Features
///
/// * **Automatic Derives**: Injects `#[derive(Debug, thiserror::Error)]` unless already present.
/// * **Context Support**: Generates a companion `<Name>Ext` trait adding `.context()` to any
///   `Result` that converts into this error type.
/// * **Source Conversions**: Implements `From<T>` for variants carrying a `source` field (or a
///   field marked `#[source]`/`#[from]`), so `?` works on upstream errors.
/// * **Internal Fallback**: `From<&'static str>` and `From<String>` when an `Internal` variant
///   exists.
/// * **Exception Names**: Each variant may carry `#[exception = "OperationError"]`. The macro
///   strips the attribute and generates `fn exception(&self) -> &'static str`; variants without
///   one report `"Error"`.
///
/// # Requirements
///
/// 1. The macro must be applied to an **enum** with named-field variants.
/// 2. A `context` field, when present, must be `Option<Cow<'static, str>>`.
/// 3. Variants with a source field must also have a `context` field.
///
/// # Example
///
/// ```rust,ignore
/// use std::borrow::Cow;
/// use wcrypt_derive::wcrypt_error;
///
/// #[wcrypt_error]
/// pub enum KeyError {
///     #[exception = "DataError"]
///     #[error("Malformed key{}: {message}", format_context(.context))]
///     Malformed { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
///
///     #[error("Internal fault{}: {message}", format_context(.context))]
///     Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
/// }
///
/// let err = KeyError::Malformed { message: "short".into(), context: None };
/// assert_eq!(err.exception(), "DataError");
/// ```
#[proc_macro_attribute]
pub fn wcrypt_error(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    macros::error::expand(input).into()
}
