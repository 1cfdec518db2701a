use crate::device::errors;
use crate::tpm2::serialization::inout;
use log::trace;
use std::fs::File;
use std::fs::OpenOptions;
use std::io;
use std::io::{Error, ErrorKind};
use std::path::{Path, PathBuf};
use std::result;

// Size of the largest TPM response we are willing to read back
pub const MAX_RESPONSE_SIZE: usize = 4096;

// Smallest valid response: tag, size and response code
const RESPONSE_HEADER_SIZE: usize = 10;

// Define a combined ReadWrite trait.
pub trait ReadWrite: io::Read + io::Write {}
impl<T: io::Read + io::Write> ReadWrite for T {}

// TpmRawIO implements communication with the TPM via /dev/tpm[0-9] or
// /dev/tpmrm[0-9] device file
pub struct TpmRawIO {
    path: PathBuf,
    device_file: Option<File>,
}

impl TpmRawIO {
    // open opens the device file for reading and writing. Only local
    // character devices are supported.
    pub fn open(path: &Path) -> result::Result<Self, errors::DeviceIoError> {
        match OpenOptions::new().read(true).write(true).open(path) {
            Err(err) => Err(errors::DeviceIoError {
                msg: format!("could not open {}: {}", path.display(), err),
            }),
            Ok(f) => Ok(TpmRawIO {
                path: path.to_path_buf(),
                device_file: Some(f),
            }),
        }
    }

    // close releases the device file. Closing twice is a no-op.
    pub fn close(&mut self) {
        if self.device_file.take().is_some() {
            trace!("closed {}", self.path.display());
        }
    }
}

impl io::Read for TpmRawIO {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.device_file {
            None => Err(Error::new(
                ErrorKind::NotConnected,
                "device file not open for reading",
            )),
            Some(f) => f.read(buf),
        }
    }
}

impl io::Write for TpmRawIO {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut self.device_file {
            None => Err(Error::new(
                ErrorKind::NotConnected,
                "device file is not set, cannot write input buffer",
            )),
            Some(f) => f.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.device_file {
            None => Ok(()),
            Some(f) => f.flush(),
        }
    }
}

// TpmDevice represents a TPM device implementing I/O operation
// via internal rw object
pub struct TpmDevice<'a> {
    pub rw: &'a mut dyn ReadWrite,
}

// TpmDeviceOps is a trait defining operations supported by TpmDevice objects
pub trait TpmDeviceOps {
    fn send_recv(
        &mut self,
        buff_command: &dyn inout::RwBytes,
        buff_answer: &mut dyn inout::RwBytes,
    ) -> result::Result<(), errors::DeviceIoError>;

    // close releases the underlying transport, if it holds one
    fn close(&mut self) {}
}

impl TpmDeviceOps for TpmRawIO {
    fn send_recv(
        &mut self,
        buff_command: &dyn inout::RwBytes,
        buff_answer: &mut dyn inout::RwBytes,
    ) -> result::Result<(), errors::DeviceIoError> {
        TpmDevice { rw: self }.send_recv(buff_command, buff_answer)
    }

    fn close(&mut self) {
        TpmRawIO::close(self)
    }
}

impl TpmDeviceOps for TpmDevice<'_> {
    fn send_recv(
        &mut self,
        buff_command: &dyn inout::RwBytes,
        buff_answer: &mut dyn inout::RwBytes,
    ) -> result::Result<(), errors::DeviceIoError> {
        // The TPM driver expects the whole command in a single write and
        // hands back the whole response in a single read
        if let Err(err) = self.rw.write_all(buff_command.to_bytes()) {
            return Err(errors::DeviceIoError {
                msg: format!("could not write command buffer to TPM: {}", err),
            });
        }

        let mut buff_in = [0; MAX_RESPONSE_SIZE];
        let n = loop {
            match self.rw.read(&mut buff_in) {
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => {
                    return Err(errors::DeviceIoError {
                        msg: format!("could not read answer from TPM: {}", err),
                    })
                }
                Ok(n) => break n,
            }
        };
        if n < RESPONSE_HEADER_SIZE {
            return Err(errors::DeviceIoError {
                msg: format!("short answer from TPM: {} bytes", n),
            });
        }
        trace!("read {} bytes from TPM", n);
        buff_answer.write_bytes(&buff_in[..n]);
        Ok(())
    }
}
