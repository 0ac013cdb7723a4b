//! Error types and helpers.
use {core::str::Utf8Error, thiserror::Error};

#[derive(Error, Debug)]
pub enum Error {
    #[error("Attempting to read {0} bytes")]
    ReadSizeLimit(usize),
    #[error("Attempting to write {0} bytes")]
    WriteSizeLimit(usize),
    #[error(
        "Encoded sequence length exceeded preallocation limit of {limit} bytes (needed {needed} \
         bytes)"
    )]
    PreallocationSizeLimit { needed: usize, limit: usize },
    #[error("Encoded sequence length would overflow {0}")]
    SizeHintOverflow(&'static str),
    #[error("Could not cast integer type to pointer sized type")]
    PointerSizedDecodeError,
    #[error("Invalid bool encoding: {0}")]
    InvalidBoolEncoding(u8),
    #[error("Invalid tag encoding: {0}")]
    InvalidTagEncoding(usize),
    #[error("Invalid duration encoding: {0} nanoseconds")]
    InvalidDurationEncoding(u32),
    #[error(transparent)]
    InvalidUtf8Encoding(#[from] Utf8Error),
    #[error("Encoded sequence length {actual} does not match fixed length {expected}")]
    SequenceLengthMismatch { expected: usize, actual: usize },
    #[error("Input has trailing bytes: {0}")]
    TrailingBytes(usize),
    #[error("Computing size of type would overflow usize::MAX")]
    SizeOfOverflow,
    #[error("Frame body of {needed} bytes exceeds configured limit of {limit} bytes")]
    FrameSizeLimit { needed: usize, limit: usize },
    #[cfg(feature = "std")]
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = core::result::Result<T, Error>;

#[cold]
pub const fn read_size_limit(len: usize) -> Error {
    Error::ReadSizeLimit(len)
}

#[cold]
pub const fn write_size_limit(len: usize) -> Error {
    Error::WriteSizeLimit(len)
}

#[cold]
pub const fn preallocation_size_limit(needed: usize, limit: usize) -> Error {
    Error::PreallocationSizeLimit { needed, limit }
}

#[cold]
pub const fn size_hint_overflow(max_length: &'static str) -> Error {
    Error::SizeHintOverflow(max_length)
}

#[cold]
pub const fn pointer_sized_decode_error() -> Error {
    Error::PointerSizedDecodeError
}

#[cold]
pub const fn invalid_bool_encoding(byte: u8) -> Error {
    Error::InvalidBoolEncoding(byte)
}

#[cold]
pub const fn invalid_tag_encoding(tag: usize) -> Error {
    Error::InvalidTagEncoding(tag)
}

#[cold]
pub const fn invalid_duration_encoding(nanos: u32) -> Error {
    Error::InvalidDurationEncoding(nanos)
}

#[cold]
pub const fn invalid_utf8_encoding(error: Utf8Error) -> Error {
    Error::InvalidUtf8Encoding(error)
}

#[cold]
pub const fn sequence_length_mismatch(expected: usize, actual: usize) -> Error {
    Error::SequenceLengthMismatch { expected, actual }
}

#[cold]
pub const fn trailing_bytes(len: usize) -> Error {
    Error::TrailingBytes(len)
}

#[cold]
pub const fn size_of_overflow() -> Error {
    Error::SizeOfOverflow
}

#[cold]
pub const fn frame_size_limit(needed: usize, limit: usize) -> Error {
    Error::FrameSizeLimit { needed, limit }
}
