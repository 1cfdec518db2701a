use crate::device::errors::DeviceIoError;
use crate::pcr::PcrIndex;
use crate::tpm2::errors::CommandError;
use std::io;
use std::path::PathBuf;

// TrustRootError carries the diagnostic text reported by the trust root
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("{msg}")]
pub struct TrustRootError {
    pub msg: String,
}

impl TrustRootError {
    pub fn new(msg: impl Into<String>) -> Self {
        TrustRootError { msg: msg.into() }
    }
}

impl From<CommandError> for TrustRootError {
    fn from(e: CommandError) -> Self {
        Self { msg: e.to_string() }
    }
}

impl From<DeviceIoError> for TrustRootError {
    fn from(e: DeviceIoError) -> Self {
        Self { msg: e.msg }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error("failed to create context: {0}")]
    ContextCreateFailed(TrustRootError),
    #[error("failed to connect context: {0}")]
    ConnectFailed(TrustRootError),
    #[error("failed to get TPM object: {0}")]
    ObjectHandleFailed(TrustRootError),
    #[error("failed to tear down session: {0}")]
    TeardownFailed(TrustRootError),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum PcrError {
    #[error("invalid digest length: expected {expected} bytes, got {actual}")]
    InvalidDigestLength { expected: usize, actual: usize },
    #[error("failed to read PCR {index}: {source}")]
    ReadFailed { index: PcrIndex, source: TrustRootError },
    #[error("failed to extend PCR {index}: {source}")]
    ExtendFailed { index: PcrIndex, source: TrustRootError },
}

#[derive(thiserror::Error, Debug)]
pub enum HasherError {
    #[error("failed reading input: {0}")]
    ReadError(#[source] io::Error),
    #[error("{0}")]
    HashError(String),
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("configuration error: {0}")]
    ConfigError(String),
    #[error("I/O error on {}: {source}", .path.display())]
    IoError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("hash error: {0}")]
    HashError(String),
    #[error(transparent)]
    SessionError(#[from] SessionError),
    #[error(transparent)]
    PcrError(#[from] PcrError),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::IoError {
            path: path.into(),
            source,
        }
    }
}
