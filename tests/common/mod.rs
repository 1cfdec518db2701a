#![allow(dead_code)]

use sha1::{Digest, Sha1};
use std::collections::HashMap;
use tpm2_pcr::errors::TrustRootError;
use tpm2_pcr::pcr::PcrIndex;
use tpm2_pcr::trustroot::{self, TrustRoot};

pub const PCR_SIZE: usize = 20;

// Step names one call of the trust root protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    CreateContext,
    Connect,
    GetTpmObject,
    PcrRead,
    PcrExtend,
    FreeMemory,
    Close,
}

// MockTrustRoot records every protocol step and fails the ones in fail_at.
// Extends are computed the way a SHA-1 PCR bank does.
pub struct MockTrustRoot {
    pub calls: Vec<Step>,
    pub fail_at: Vec<Step>,
    pub pcrs: HashMap<u32, Vec<u8>>,
    pub memory: Vec<Vec<u8>>,
}

impl MockTrustRoot {
    pub fn new() -> Self {
        MockTrustRoot {
            calls: Vec::new(),
            fail_at: Vec::new(),
            pcrs: HashMap::new(),
            memory: Vec::new(),
        }
    }

    pub fn failing_at(step: Step) -> Self {
        MockTrustRoot::failing_at_all(&[step])
    }

    pub fn failing_at_all(steps: &[Step]) -> Self {
        let mut root = MockTrustRoot::new();
        root.fail_at = steps.to_vec();
        root
    }

    pub fn count(&self, step: Step) -> usize {
        self.calls.iter().filter(|s| **s == step).count()
    }

    pub fn teardown_ran_once(&self) -> bool {
        let n = self.calls.len();
        self.count(Step::FreeMemory) == 1
            && self.count(Step::Close) == 1
            && n >= 2
            && self.calls[n - 2] == Step::FreeMemory
            && self.calls[n - 1] == Step::Close
    }

    fn step(&mut self, step: Step) -> trustroot::Result<()> {
        self.calls.push(step);
        if self.fail_at.contains(&step) {
            return Err(TrustRootError::new(format!("injected failure at {:?}", step)));
        }
        Ok(())
    }

    fn keep(&mut self, value: Vec<u8>) -> &[u8] {
        self.memory.push(value);
        self.memory.last().map(|v| v.as_slice()).unwrap_or(&[])
    }
}

impl TrustRoot for MockTrustRoot {
    fn create_context(&mut self) -> trustroot::Result<()> {
        self.step(Step::CreateContext)
    }

    fn connect(&mut self) -> trustroot::Result<()> {
        self.step(Step::Connect)
    }

    fn get_tpm_object(&mut self) -> trustroot::Result<()> {
        self.step(Step::GetTpmObject)
    }

    fn digest_size(&self) -> usize {
        PCR_SIZE
    }

    fn pcr_read(&mut self, index: PcrIndex) -> trustroot::Result<&[u8]> {
        self.step(Step::PcrRead)?;
        let value = self
            .pcrs
            .get(&index.value())
            .cloned()
            .unwrap_or_else(|| vec![0; PCR_SIZE]);
        Ok(self.keep(value))
    }

    fn pcr_extend(&mut self, index: PcrIndex, digest: &[u8]) -> trustroot::Result<&[u8]> {
        self.step(Step::PcrExtend)?;
        let before = self
            .pcrs
            .get(&index.value())
            .cloned()
            .unwrap_or_else(|| vec![0; PCR_SIZE]);
        let mut hasher = Sha1::new();
        hasher.update(&before);
        hasher.update(digest);
        let after = hasher.finalize().to_vec();
        self.pcrs.insert(index.value(), after.clone());
        Ok(self.keep(after))
    }

    fn free_memory(&mut self) -> trustroot::Result<()> {
        self.memory.clear();
        self.step(Step::FreeMemory)
    }

    fn close(&mut self) -> trustroot::Result<()> {
        self.step(Step::Close)
    }
}
