//! The trust root protocol and its TPM 2.0 binding.
//!
//! A [`TrustRoot`] is driven through a fixed sequence: context creation,
//! connect, object handle acquisition, then any number of PCR reads and
//! extends, and finally memory release and close. Buffers handed out by
//! `pcr_read` and `pcr_extend` belong to the context and live until
//! `free_memory`; callers copy them out before tearing down.

use crate::device::raw::{TpmDeviceOps, TpmRawIO};
use crate::errors::TrustRootError;
use crate::pcr::PcrIndex;
use crate::tpm2::commands::{capability, pcrextend, pcrread};
use crate::tpm2::types::tcg;
use log::debug;
use std::path::{Path, PathBuf};
use std::result;

// Default character device, served by the kernel resource manager
pub const DEFAULT_DEVICE: &str = "/dev/tpmrm0";

// PCR bank extended and read by this tool
pub const PCR_BANK: tcg::TpmAlgId = tcg::TPM_ALG_SHA1;

pub type Result<T> = result::Result<T, TrustRootError>;

pub trait TrustRoot {
    fn create_context(&mut self) -> Result<()>;

    // connect always targets the local trust root
    fn connect(&mut self) -> Result<()>;

    fn get_tpm_object(&mut self) -> Result<()>;

    // digest_size is the output size of the hash algorithm of the PCR bank
    fn digest_size(&self) -> usize;

    fn pcr_read(&mut self, index: PcrIndex) -> Result<&[u8]>;

    // pcr_extend extends PCR index with digest and returns the new value
    fn pcr_extend(&mut self, index: PcrIndex, digest: &[u8]) -> Result<&[u8]>;

    fn free_memory(&mut self) -> Result<()>;

    fn close(&mut self) -> Result<()>;
}

// Tpm2Context is the state of one invocation against the TPM
#[derive(Default)]
struct Tpm2Context {
    tpm: Option<Box<dyn TpmDeviceOps>>,
    bank: Option<tcg::TpmAlgId>,
    memory: Vec<Vec<u8>>,
}

impl Tpm2Context {
    fn tpm(&mut self) -> Result<&mut dyn TpmDeviceOps> {
        match self.tpm {
            Some(ref mut tpm) => Ok(&mut **tpm),
            None => Err(TrustRootError::new("context not connected")),
        }
    }

    // keep hands a buffer over to the context and returns a borrow of it
    fn keep(&mut self, buffer: Vec<u8>) -> &[u8] {
        self.memory.push(buffer);
        self.memory.last().map(|b| b.as_slice()).unwrap_or(&[])
    }
}

// Tpm2TrustRoot talks to a TPM 2.0 through a local character device
pub struct Tpm2TrustRoot {
    device_path: PathBuf,
    context: Option<Tpm2Context>,
}

impl Tpm2TrustRoot {
    pub fn new(device_path: &Path) -> Self {
        Tpm2TrustRoot {
            device_path: device_path.to_path_buf(),
            context: None,
        }
    }

    fn context(&mut self) -> Result<&mut Tpm2Context> {
        self.context
            .as_mut()
            .ok_or_else(|| TrustRootError::new("context not created"))
    }

    // with_device runs commands against the connected TPM once the PCR
    // bank is known
    fn with_device<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut dyn TpmDeviceOps, tcg::TpmAlgId) -> Result<T>,
    {
        let context = self.context()?;
        let bank = context
            .bank
            .ok_or_else(|| TrustRootError::new("TPM object not acquired"))?;
        f(context.tpm()?, bank)
    }
}

impl TrustRoot for Tpm2TrustRoot {
    fn create_context(&mut self) -> Result<()> {
        if self.context.is_some() {
            return Err(TrustRootError::new("context already created"));
        }
        self.context = Some(Tpm2Context::default());
        Ok(())
    }

    fn connect(&mut self) -> Result<()> {
        let path = self.device_path.clone();
        let context = self.context()?;
        if context.tpm.is_some() {
            return Err(TrustRootError::new("context already connected"));
        }
        context.tpm = Some(Box::new(TpmRawIO::open(&path)?));
        debug!("connected to {}", path.display());
        Ok(())
    }

    fn get_tpm_object(&mut self) -> Result<()> {
        let context = self.context()?;
        let banks = capability::tpm2_get_pcr_banks(context.tpm()?)?;
        let allocated = banks
            .pcr_selections
            .iter()
            .any(|selection| selection.hash == PCR_BANK && !selection.is_empty());
        if !allocated {
            return Err(TrustRootError::new(format!(
                "PCR bank {:#06x} is not allocated",
                PCR_BANK
            )));
        }
        context.bank = Some(PCR_BANK);
        debug!("using PCR bank {:#06x}", PCR_BANK);
        Ok(())
    }

    fn digest_size(&self) -> usize {
        let bank = self
            .context
            .as_ref()
            .and_then(|context| context.bank)
            .unwrap_or(PCR_BANK);
        tcg::digest_size(bank).unwrap_or(0)
    }

    fn pcr_read(&mut self, index: PcrIndex) -> Result<&[u8]> {
        let value = self.with_device(|tpm, bank| {
            Ok(pcrread::tpm2_pcr_read(tpm, bank, index.value())?)
        })?;
        Ok(self.context()?.keep(value))
    }

    fn pcr_extend(&mut self, index: PcrIndex, digest: &[u8]) -> Result<&[u8]> {
        let value = self.with_device(|tpm, bank| {
            pcrextend::tpm2_pcr_extend(tpm, bank, index.value(), digest)?;
            pcrread::tpm2_pcr_read(tpm, bank, index.value()).map_err(|err| {
                TrustRootError::new(format!(
                    "PCR {} extended, reading back new value failed: {}",
                    index, err
                ))
            })
        })?;
        Ok(self.context()?.keep(value))
    }

    fn free_memory(&mut self) -> Result<()> {
        if let Some(context) = self.context.as_mut() {
            context.memory.clear();
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if let Some(mut context) = self.context.take() {
            if let Some(mut tpm) = context.tpm.take() {
                tpm.close();
            }
        }
        Ok(())
    }
}
