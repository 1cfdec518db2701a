use crate::errors::PcrError;
use crate::hasher::Digest;
use crate::session::Session;
use crate::trustroot::TrustRoot;
use log::debug;
use std::fmt;
use std::result;

// PcrIndex identifies a PCR. Its upper bound is platform defined and is
// enforced by the trust root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PcrIndex(u32);

impl PcrIndex {
    pub fn new(index: u32) -> Self {
        PcrIndex(index)
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for PcrIndex {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// PcrValue is a PCR value copied out of the trust root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcrValue(Vec<u8>);

impl PcrValue {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&[u8]> for PcrValue {
    fn from(bytes: &[u8]) -> Self {
        PcrValue(bytes.to_vec())
    }
}

// ExtendOutcome holds the values of a PCR around an extend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendOutcome {
    pub before: PcrValue,
    pub after: PcrValue,
}

pub struct PcrReader;

impl PcrReader {
    // read returns the current value of PCR index
    pub fn read<T: TrustRoot + ?Sized>(
        session: &mut Session<T>,
        index: PcrIndex,
    ) -> result::Result<PcrValue, PcrError> {
        match session.root().pcr_read(index) {
            Ok(value) => {
                let value = PcrValue::from(value);
                debug!("read {} bytes from PCR {}", value.len(), index);
                Ok(value)
            }
            Err(source) => Err(PcrError::ReadFailed { index, source }),
        }
    }
}

pub struct PcrExtender;

impl PcrExtender {
    // extend extends PCR index with digest. The new value is computed by the
    // trust root; both the value before and after are returned.
    pub fn extend<T: TrustRoot + ?Sized>(
        session: &mut Session<T>,
        index: PcrIndex,
        digest: &Digest,
    ) -> result::Result<ExtendOutcome, PcrError> {
        let expected = session.root().digest_size();
        if digest.len() != expected {
            return Err(PcrError::InvalidDigestLength {
                expected,
                actual: digest.len(),
            });
        }

        let before = PcrReader::read(session, index)?;
        let after = match session.root().pcr_extend(index, digest.as_bytes()) {
            Ok(value) => PcrValue::from(value),
            Err(source) => return Err(PcrError::ExtendFailed { index, source }),
        };
        debug!("extended PCR {}", index);
        Ok(ExtendOutcome { before, after })
    }
}
