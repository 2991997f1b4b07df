use std::io;

use thiserror::Error;

/// Errors produced while encoding or decoding a canonical on-disk/on-wire
/// structure.
#[derive(Error, Debug)]
pub enum CodecError {
    /// the input ended before a value could be fully decoded
    #[error("truncated input")]
    Truncated,
    /// the input had bytes left over after decoding a value
    #[error("trailing bytes after decoding")]
    TrailingBytes,
    /// a persisted struct's magic/version header didn't match what this
    /// build supports
    #[error("version mismatch")]
    VersionMismatch,
    /// a decoded field held a value outside its valid range (an oversized
    /// varint, an unrecognized enum tag, ...)
    #[error("field out of range")]
    FieldOutOfRange,
}

impl From<io::Error> for CodecError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::UnexpectedEof => CodecError::Truncated,
            _ => CodecError::Truncated,
        }
    }
}
