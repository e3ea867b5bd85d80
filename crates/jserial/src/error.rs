//! Parse error type.

use jserial_buffers::ReadError;
use thiserror::Error;

/// Everything a parse can fail with.
///
/// Errors are wrapped with a context string at each propagation site via
/// [`Context`](ParseError::Context), so the rendered message reads outermost
/// to innermost, e.g. `error reading class field: unexpected end of input`.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("magic value STREAM_MAGIC not found")]
    BadMagic,
    #[error("protocol version not recognized: wanted 5 got {0}")]
    BadVersion(u16),
    #[error("unknown type 0x{0:02x}")]
    UnknownTag(u8),
    #[error("{0} not allowed here")]
    TagNotAllowedHere(&'static str),
    #[error("parsing {0} is currently not supported")]
    Unsupported(&'static str),
    #[error("unknown field type '{0}'")]
    UnknownFieldType(char),
    #[error("unable to deserialize class with flags 0x{0:x}")]
    UnknownClassFlags(u8),
    #[error("unable to parse version 1 external content")]
    Version1ExternalUnsupported,
    #[error("unable to read string larger than 2^32 bytes")]
    StringTooLong,
    #[error("invalid class name: '{0}'")]
    InvalidClassName(String),
    #[error("{0}")]
    UnexpectedContent(&'static str),
    #[error("unexpected shape: {0}")]
    UnexpectedShape(String),
    #[error(transparent)]
    Read(#[from] ReadError),
    #[error("{context}: {source}")]
    Context {
        context: &'static str,
        #[source]
        source: Box<ParseError>,
    },
}

impl ParseError {
    /// Peels off every [`Context`](ParseError::Context) layer.
    pub fn root_cause(&self) -> &ParseError {
        let mut err = self;
        while let ParseError::Context { source, .. } = err {
            err = source;
        }
        err
    }
}

pub(crate) trait ResultExt<T> {
    fn context(self, context: &'static str) -> Result<T, ParseError>;
}

impl<T, E: Into<ParseError>> ResultExt<T> for Result<T, E> {
    fn context(self, context: &'static str) -> Result<T, ParseError> {
        self.map_err(|e| ParseError::Context {
            context,
            source: Box::new(e.into()),
        })
    }
}
