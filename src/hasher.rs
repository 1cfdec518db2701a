use crate::errors::HasherError;
use crate::tpm2::types::tcg;
use sha1::{Digest as _, Sha1};
use std::io::{ErrorKind, Read};
use std::result;

// Size of the chunks read from the input stream
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

// Digest is the output of a StreamHasher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digest(Vec<u8>);

impl Digest {
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

impl From<Vec<u8>> for Digest {
    fn from(bytes: Vec<u8>) -> Self {
        Digest(bytes)
    }
}

// StreamHasher digests a byte stream chunk by chunk, so that the input is
// never held in memory as a whole
pub struct StreamHasher {
    hasher: Sha1,
    chunk_size: usize,
}

impl StreamHasher {
    // new builds a hasher for the hash algorithm of a PCR bank. Only the
    // SHA-1 bank is supported.
    pub fn new(alg: tcg::TpmAlgId, chunk_size: usize) -> result::Result<Self, HasherError> {
        if alg != tcg::TPM_ALG_SHA1 {
            return Err(HasherError::HashError(format!(
                "unsupported hash algorithm {:#06x}",
                alg
            )));
        }
        if chunk_size == 0 {
            return Err(HasherError::HashError(String::from(
                "chunk size must not be zero",
            )));
        }
        Ok(StreamHasher {
            hasher: Sha1::new(),
            chunk_size,
        })
    }

    // update_from_stream consumes stream until end of file and returns the
    // digest of everything read
    pub fn update_from_stream<R: Read + ?Sized>(
        mut self,
        stream: &mut R,
    ) -> result::Result<Digest, HasherError> {
        let mut buf = vec![0u8; self.chunk_size];
        loop {
            match stream.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => self.hasher.update(&buf[..n]),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(HasherError::ReadError(err)),
            }
        }
        Ok(Digest(self.hasher.finalize().to_vec()))
    }
}
