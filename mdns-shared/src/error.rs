use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, PartialEq)]
#[non_exhaustive]
pub enum Error {
    // Wire buffer
    #[error("buffer: underflow")]
    ErrBufferUnderflow,
    #[error("buffer: overflow")]
    ErrBufferOverflow,

    // Decoding of untrusted input
    #[error("unknown resource type: {0}")]
    ErrUnknownType(u16),
    #[error("only class IN supported (got {0})")]
    ErrUnsupportedClass(u16),
    #[error("name too long")]
    ErrNameTooLong,
    #[error("segment length too long")]
    ErrSegTooLong,
    #[error("zero length segment")]
    ErrZeroSegLen,
    #[error("invalid compression pointer")]
    ErrInvalidPointer,
    #[error("reserved label type")]
    ErrReservedLabelType,
    #[error("invalid escape sequence in name")]
    ErrInvalidEscape,
    #[error("truncated message")]
    ErrTruncatedMessage,
    #[error("invalid resource data")]
    ErrInvalidRdata,

    // Encoding
    #[error("too many questions")]
    ErrTooManyQuestions,
    #[error("too many answers")]
    ErrTooManyAnswers,
    #[error("too many authorities")]
    ErrTooManyAuthorities,
    #[error("too many additionals")]
    ErrTooManyAdditionals,
    #[error("resource length too long")]
    ErrResTooLong,

    // Resolution
    #[error("host name must not be empty")]
    ErrHostnameEmpty,
    #[error("query timed out")]
    ErrQueryTimeout,
    #[error("resolver not started")]
    ErrNotStarted,
    #[error("connection closed")]
    ErrConnectionClosed,

    //Third Party Error
    #[error("{0}")]
    Io(#[source] IoError),
}

impl Error {
    /// Reports whether the error is the terminal "no answer before the deadline" result.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::ErrQueryTimeout)
    }

    /// Reports whether the error came from the socket layer.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Io(_))
    }

    /// Reports whether the error was raised while decoding or encoding DNS wire data.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Error::ErrBufferUnderflow
                | Error::ErrBufferOverflow
                | Error::ErrUnknownType(_)
                | Error::ErrUnsupportedClass(_)
                | Error::ErrNameTooLong
                | Error::ErrSegTooLong
                | Error::ErrZeroSegLen
                | Error::ErrInvalidPointer
                | Error::ErrReservedLabelType
                | Error::ErrInvalidEscape
                | Error::ErrTruncatedMessage
                | Error::ErrInvalidRdata
                | Error::ErrHostnameEmpty
        )
    }
}

#[derive(Debug, Error)]
#[error("io error: {0}")]
pub struct IoError(#[from] pub io::Error);

// Workaround for wanting PartialEq for io::Error.
impl PartialEq for IoError {
    fn eq(&self, other: &Self) -> bool {
        self.0.kind() == other.0.kind()
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(IoError(e))
    }
}
