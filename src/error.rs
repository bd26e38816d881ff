use thiserror::Error;

use crate::ObjectId;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// An object has the wrong kind, e.g. the object is an Array where a Name would be expected.
    #[error("object has wrong type; expected type {expected} but found type {found}")]
    ObjectType {
        expected: &'static str,
        found: &'static str,
    },
    /// Array (or dictionary-by-index) access outside the container.
    #[error("index {index} is out of range for a container of length {len}")]
    IndexOutOfRange { index: usize, len: usize },
    /// The reference chain ended at a missing slot or exceeded the chain limit.
    #[error("could not resolve reference to object {0:?}")]
    DanglingReference(ObjectId),
    /// The calling code broke a usage rule of the object model.
    #[error("usage violation: {0}")]
    UsageViolation(&'static str),
    /// The handle outlived the document that owned its object.
    #[error("the document owning this object has been dropped")]
    DocumentDropped,
    /// No decoder is available for a stream filter.
    #[error("unsupported stream filter /{0}")]
    UnsupportedFilter(String),
    /// The stream couldn't be decompressed.
    #[error("couldn't decompress stream: {0}")]
    Decompress(#[from] DecompressError),
    /// The encountered character encoding is invalid.
    #[error("invalid character encoding")]
    CharacterEncoding,
    /// Decoding byte vector to UTF8 String failed.
    #[error("invalid UTF-8")]
    UTF8,
    /// IO error
    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum DecompressError {
    #[error("decoding Flate failed: {0}")]
    Flate(std::io::Error),
    #[error("decoding LZW failed: {0}")]
    Lzw(#[from] weezl::LzwError),
    #[error("decoding ASCIIHex failed: invalid digit {0:#04x}")]
    AsciiHex(u8),
    #[error("applying predictor failed: {0}")]
    Predictor(std::io::Error),
}

impl Error {
    pub(crate) fn object_type(expected: &'static str, found: crate::Kind) -> Self {
        Error::ObjectType {
            expected,
            found: found.as_str(),
        }
    }
}

impl From<std::string::FromUtf8Error> for Error {
    fn from(_err: std::string::FromUtf8Error) -> Self {
        Error::UTF8
    }
}

impl From<std::str::Utf8Error> for Error {
    fn from(_err: std::str::Utf8Error) -> Self {
        Error::UTF8
    }
}
