use crate::leb128::LebError;
use std::fmt;

/// The result for parsing operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// What went wrong while parsing a module.
///
/// The first block of codes are produced by the module header validator, the
/// section iterator and the section dispatcher. The remainder come from the
/// byte-level decoder and from individual section handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
#[non_exhaustive]
pub enum ErrorCode {
    /// The buffer is shorter than the 8-byte header or the magic number is
    /// wrong.
    #[error("illegal wasm file format")]
    IllegalWasmFileFormat,
    /// The header is valid but no section follows it.
    #[error("no wasm section found")]
    NoWasmSectionFound,
    /// A section's length could not be decoded.
    #[error("invalid section length")]
    InvalidSectionLength,
    /// A section's length runs past the end of the module.
    #[error("illegal section length")]
    IllegalSectionLength,
    /// A section id is neither the custom section id nor registered by any
    /// enabled feature.
    #[error("illegal section id")]
    IllegalSectionId,
    /// Too few bytes remain after a section to hold another section header.
    #[error("not enough space for another section")]
    NoEnoughSpace,
    /// A custom section's name is malformed, or its registered handler
    /// rejected the payload.
    #[error("invalid custom section")]
    InvalidCustomSection,

    /// The input ended in the middle of a value.
    #[error("unexpected end-of-file")]
    UnexpectedEof,
    /// A LEB128 integer is overlong or does not fit its type.
    #[error("invalid LEB128 integer")]
    InvalidLeb128,
    /// A string is not valid UTF-8.
    #[error("malformed UTF-8 encoding")]
    MalformedUtf8,
    /// The same section appeared twice.
    #[error("duplicate section")]
    DuplicateSection,
    /// Bytes remain after the contents of a section were decoded.
    #[error("trailing data at end of section")]
    TrailingData,
    /// The contents of a section do not match its declared shape.
    #[error("malformed section")]
    MalformedSection,
    /// The header declares a binary format version with no parser.
    #[error("unsupported binary format version")]
    UnsupportedVersion,
}

/// Extra context attached to an [`Error`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// The offending section id.
    SectionId(u8),
    /// The offending length or count.
    Length(u64),
    /// The status of a failed LEB128 decode.
    Leb(LebError),
    /// The name of the custom section involved.
    Name(String),
    /// The declared binary format version.
    Version(u32),
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::SectionId(id) => write!(f, "section id 0x{id:02x}"),
            Selector::Length(len) => write!(f, "length {len}"),
            Selector::Leb(status) => write!(f, "leb128 decode: {status}"),
            Selector::Name(name) => write!(f, "custom section `{name}`"),
            Selector::Version(version) => write!(f, "version {version}"),
        }
    }
}

/// An error that occurred while parsing a WebAssembly module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    // Boxed so that `Result<T, Error>` stays small and can be returned in
    // registers.
    inner: Box<ErrorInner>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ErrorInner {
    code: ErrorCode,
    offset: usize,
    selector: Option<Selector>,
    message: Option<String>,
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} (at offset 0x{:x})", self.message(), self.inner.offset)
    }
}

impl Error {
    /// Creates an error with `code` at `offset`, relative to the start of the
    /// module.
    #[cold]
    pub fn new(code: ErrorCode, offset: usize) -> Self {
        Error {
            inner: Box::new(ErrorInner {
                code,
                offset,
                selector: None,
                message: None,
            }),
        }
    }

    #[cold]
    pub(crate) fn fmt(code: ErrorCode, args: fmt::Arguments<'_>, offset: usize) -> Self {
        Error::new(code, offset).with_message(args.to_string())
    }

    #[cold]
    pub(crate) fn eof(offset: usize) -> Self {
        Error::new(ErrorCode::UnexpectedEof, offset)
    }

    #[cold]
    pub(crate) fn leb(status: LebError, offset: usize) -> Self {
        let code = match status {
            LebError::UnexpectedEof => ErrorCode::UnexpectedEof,
            LebError::TooLong | LebError::TooLarge => ErrorCode::InvalidLeb128,
        };
        Error::new(code, offset).with_selector(Selector::Leb(status))
    }

    /// Attaches `selector` to this error.
    pub fn with_selector(mut self, selector: Selector) -> Self {
        self.inner.selector = Some(selector);
        self
    }

    /// Replaces the human-readable message of this error.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.inner.message = Some(message.into());
        self
    }

    /// The kind of failure.
    pub fn code(&self) -> ErrorCode {
        self.inner.code
    }

    /// The byte offset, relative to the start of the module, at which the
    /// failure was detected.
    pub fn offset(&self) -> usize {
        self.inner.offset
    }

    /// Additional context about the failure, if any.
    pub fn selector(&self) -> Option<&Selector> {
        self.inner.selector.as_ref()
    }

    /// A human-readable description of the failure.
    pub fn message(&self) -> String {
        match &self.inner.message {
            Some(message) => format!("{}: {message}", self.inner.code),
            None => self.inner.code.to_string(),
        }
    }
}

macro_rules! format_err {
    ($code:ident, $offset:expr, $($arg:tt)*) => {
        $crate::Error::fmt($crate::ErrorCode::$code, format_args!($($arg)*), $offset)
    }
}

macro_rules! bail {
    ($($arg:tt)*) => {return Err($crate::error::format_err!($($arg)*))}
}

pub(crate) use {bail, format_err};
