//! Library-wide error and result types.

use std::fmt;
use std::io;

/// Result alias used throughout wadkit.
pub type Result<T> = std::result::Result<T, Error>;

/// All errors the library can produce.
///
/// None of these are transient: a parse that fails is never retried, and no
/// partially populated [`crate::formats::wad::Wad`] is returned.
#[derive(Debug)]
pub enum Error {
    /// The first header field was not 32.
    HeaderSizeMismatch(u32),
    /// The section sizes declared in the header add up to more than the
    /// input length.
    DeclaredSizeExceedsInput { declared: u64, available: usize },
    /// A decrypted content block did not match the SHA-1 stored in the TMD.
    ContentIntegrityMismatch { content_id: u32 },
    /// The AES-CBC layer rejected its input (bad key, IV, or block length).
    Cipher(&'static str),
    /// A read would have gone past the end of the buffer.
    OutOfBoundsRead {
        offset: usize,
        len: usize,
        available: usize,
    },
    /// The TMD content table and the in-memory content list disagree in
    /// length.
    ContentCountMismatch { records: usize, contents: usize },
    /// A structural constraint was violated (message describes which one).
    Parse(&'static str),
    /// An underlying I/O operation failed.
    Io(io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::HeaderSizeMismatch(size) => {
                write!(f, "header size mismatch: expected 32, found {size}")
            }
            Error::DeclaredSizeExceedsInput {
                declared,
                available,
            } => write!(
                f,
                "declared section sizes ({declared} bytes) exceed input length ({available} bytes)"
            ),
            Error::ContentIntegrityMismatch { content_id } => {
                write!(f, "content {content_id:08x} does not match its TMD hash")
            }
            Error::Cipher(s) => write!(f, "cipher failure: {s}"),
            Error::OutOfBoundsRead {
                offset,
                len,
                available,
            } => write!(
                f,
                "read of {len} bytes at offset {offset:#x} exceeds buffer of {available} bytes"
            ),
            Error::ContentCountMismatch { records, contents } => write!(
                f,
                "TMD lists {records} content records but {contents} contents are loaded"
            ),
            Error::Parse(s) => write!(f, "parse error: {s}"),
            Error::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        if let Error::Io(e) = self {
            Some(e)
        } else {
            None
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}
