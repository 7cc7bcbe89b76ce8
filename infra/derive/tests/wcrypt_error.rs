use std::borrow::Cow;
use wcrypt_derive::wcrypt_error;

#[wcrypt_error]
pub enum SampleError {
    #[exception = "NotSupportedError"]
    #[error("Unsupported{}: {message}", format_context(.context))]
    Unsupported { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[exception = "OperationError"]
    #[error("Parse error{}: {source}", format_context(.context))]
    Parse { source: std::num::ParseIntError, context: Option<Cow<'static, str>> },

    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn parse(input: &str) -> Result<u32, SampleError> {
    Ok(input.parse::<u32>()?)
}

#[test]
fn wcrypt_error_ui() {
    let t = trybuild::TestCases::new();
    t.pass("tests/ui/wcrypt_error_pass.rs");
}

#[test]
fn exception_names_follow_attributes() {
    let unsupported = SampleError::Unsupported { message: "AES-XTS".into(), context: None };
    assert_eq!(unsupported.exception(), "NotSupportedError");

    let internal = SampleError::from("unexpected");
    assert_eq!(internal.exception(), "Error");
}

#[test]
fn source_errors_convert_with_question_mark() {
    let err = parse("not-a-number").expect_err("parse should fail");
    assert!(matches!(err, SampleError::Parse { context: None, .. }));
    assert_eq!(err.exception(), "OperationError");
}

#[test]
fn context_is_attached_and_rendered() {
    let err = parse("x").context("reading iterations").expect_err("parse should fail");
    assert!(err.to_string().contains("(reading iterations)"));

    let plain: Result<(), SampleError> =
        Err(SampleError::Unsupported { message: "RSA-OAEP".into(), context: None });
    let err = plain.context("wrapKey").expect_err("still an error");
    assert_eq!(err.to_string(), "Unsupported (wrapKey): RSA-OAEP");
}

#[test]
fn internal_variant_accepts_owned_strings() {
    let err = SampleError::from(format!("slot {}", 3));
    assert!(matches!(err, SampleError::Internal { ref message, .. } if message == "slot 3"));
}
