//! Definition of errors.

use std::error::Error;
use std::fmt;

pub type Result<T, E = PerceptagError> = std::result::Result<T, E>;

#[derive(Debug)]
pub enum PerceptagError {
    InvalidModel(InvalidModelError),
    InvalidArgument(InvalidArgumentError),
    InvalidCorpus(InvalidCorpusError),
    DecodeError(bincode::error::DecodeError),
    EncodeError(bincode::error::EncodeError),
    IOError(std::io::Error),
}

impl PerceptagError {
    pub(crate) fn invalid_model<S>(msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::InvalidModel(InvalidModelError { msg: msg.into() })
    }

    pub(crate) fn invalid_argument<S>(arg: &'static str, msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::InvalidArgument(InvalidArgumentError {
            arg,
            msg: msg.into(),
        })
    }

    pub(crate) fn invalid_corpus<S>(line_no: usize, msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::InvalidCorpus(InvalidCorpusError {
            line_no,
            msg: msg.into(),
        })
    }
}

impl fmt::Display for PerceptagError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::InvalidModel(e) => e.fmt(f),
            Self::InvalidArgument(e) => e.fmt(f),
            Self::InvalidCorpus(e) => e.fmt(f),
            Self::DecodeError(e) => e.fmt(f),
            Self::EncodeError(e) => e.fmt(f),
            Self::IOError(e) => e.fmt(f),
        }
    }
}

impl Error for PerceptagError {}

/// Error used when the model is invalid.
#[derive(Debug)]
pub struct InvalidModelError {
    /// Error message.
    pub(crate) msg: String,
}

impl fmt::Display for InvalidModelError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "InvalidModelError: {}", self.msg)
    }
}

impl Error for InvalidModelError {}

/// Error used when the argument is invalid.
#[derive(Debug)]
pub struct InvalidArgumentError {
    /// Name of the argument.
    pub(crate) arg: &'static str,

    /// Error message.
    pub(crate) msg: String,
}

impl fmt::Display for InvalidArgumentError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "InvalidArgumentError: {}: {}", self.arg, self.msg)
    }
}

impl Error for InvalidArgumentError {}

/// Error used when a line of a labeled corpus cannot be parsed.
#[derive(Debug)]
pub struct InvalidCorpusError {
    /// 1-based line number in the input stream.
    pub(crate) line_no: usize,

    /// Error message.
    pub(crate) msg: String,
}

impl fmt::Display for InvalidCorpusError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "InvalidCorpusError: line {}: {}", self.line_no, self.msg)
    }
}

impl Error for InvalidCorpusError {}

impl From<bincode::error::DecodeError> for PerceptagError {
    fn from(error: bincode::error::DecodeError) -> Self {
        Self::DecodeError(error)
    }
}

impl From<bincode::error::EncodeError> for PerceptagError {
    fn from(error: bincode::error::EncodeError) -> Self {
        Self::EncodeError(error)
    }
}

impl From<std::io::Error> for PerceptagError {
    fn from(error: std::io::Error) -> Self {
        Self::IOError(error)
    }
}
