use std::borrow::Cow;
use wcrypt_derive::wcrypt_error;

#[wcrypt_error]
pub enum DemoError {
    #[exception = "DataError"]
    #[error("IO error{}: {source}", format_context(.context))]
    Io {
        #[source]
        source: std::io::Error,
        context: Option<Cow<'static, str>>,
    },

    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn main() {
    let io = DemoError::from(std::io::Error::other("disk"));
    assert_eq!(io.exception(), "DataError");

    let internal = DemoError::from("boom");
    assert_eq!(internal.exception(), "Error");
}
