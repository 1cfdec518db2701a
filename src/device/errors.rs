use std::io;

// DeviceIoError is an error encountered while moving bytes to or from the
// TPM character device
#[derive(thiserror::Error, Debug)]
#[error("DeviceIoError: {msg}")]
pub struct DeviceIoError {
    pub msg: String,
}

impl From<io::Error> for DeviceIoError {
    fn from(e: io::Error) -> Self {
        Self { msg: e.to_string() }
    }
}
