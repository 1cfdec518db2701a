use crate::tpm2::types::tcg;
use std::fmt;

#[derive(thiserror::Error, Debug)]
#[error("TpmError: {msg}")]
pub struct TpmError {
    pub msg: String,
}

// IoError is an error encountered while talking to the TPM
#[derive(thiserror::Error, Debug)]
#[error("IoError: {msg}")]
pub struct IoError {
    pub msg: String,
}

// ResponseError wraps a non-zero TPM response code
#[derive(thiserror::Error, Debug)]
pub struct ResponseError {
    pub error_code: tcg::TpmRc,
}

impl fmt::Display for ResponseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", tcg::rc_to_string(self.error_code))
    }
}

// DeserializationError indicates an error while deserializing a TPM response
#[derive(thiserror::Error, Debug)]
#[error("DeserializationError: {msg}")]
pub struct DeserializationError {
    pub msg: String,
}

// CommandError is an error raised while running a command towards the TPM
#[derive(thiserror::Error, Debug)]
pub enum CommandError {
    #[error(transparent)]
    TpmError(#[from] TpmError),
    #[error(transparent)]
    IoError(#[from] IoError),
    #[error(transparent)]
    ResponseError(#[from] ResponseError),
    #[error(transparent)]
    DeserializationError(#[from] DeserializationError),
}
