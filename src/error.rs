use thiserror::Error;

use crate::export::ExportError;
use crate::p3d::read::P3dReadError;

#[derive(Debug)]
pub struct Error {
    pub kind: ErrorKind,
}

#[derive(Error, Debug)]
pub enum ErrorKind {
    #[error("P3D decode error: {err}")]
    P3dRead {
        #[from]
        err: P3dReadError,
    },
    #[error("Error interpreting UTF-8 string: {err}")]
    Utf8Error {
        #[from]
        err: std::str::Utf8Error,
    },
    #[error("Export rejected: {err}")]
    Export {
        #[from]
        err: ExportError,
    },
    #[error("IO error")]
    IoError(#[from] std::io::Error),
}

impl std::convert::From<ExportError> for Error {
    fn from(x: ExportError) -> Error {
        Error { kind: x.into() }
    }
}

impl std::convert::From<P3dReadError> for Error {
    fn from(x: P3dReadError) -> Error {
        Error { kind: x.into() }
    }
}

impl std::convert::From<std::io::Error> for Error {
    fn from(x: std::io::Error) -> Error {
        Error { kind: x.into() }
    }
}

impl std::convert::From<std::str::Utf8Error> for Error {
    fn from(x: std::str::Utf8Error) -> Error {
        Error { kind: x.into() }
    }
}

pub type IResult<T> = Result<T, Error>;

pub fn failure_from_kind(kind: ErrorKind) -> Error {
    Error { kind }
}
