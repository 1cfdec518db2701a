use crate::device::raw::TpmDeviceOps;
use crate::tpm2::commands::run;
use crate::tpm2::errors;
use crate::tpm2::serialization::inout;
use crate::tpm2::serialization::inout::Tpm2StructIn;
use crate::tpm2::types::tcg;
use std::result;

// TPM2_PCR_Read response parameters
#[derive(Default, Debug)]
pub struct PcrReadResponse {
    pub pcr_update_counter: u32,
    pub pcr_selection_out: tcg::TpmlPcrSelection,
    pub pcr_values: tcg::TpmlDigest,
}

impl inout::Tpm2StructIn for PcrReadResponse {
    fn unpack(&mut self, buff: &mut dyn inout::RwBytes) -> result::Result<(), errors::DeserializationError> {
        self.pcr_update_counter.unpack(buff)?;
        self.pcr_selection_out.unpack(buff)?;
        self.pcr_values.unpack(buff)?;
        Ok(())
    }
}

impl PcrReadResponse {
    // new builds a PcrReadResponse structure from a bytes buffer
    pub fn new(buff: &mut dyn inout::RwBytes) -> result::Result<Self, errors::DeserializationError> {
        let mut resp = PcrReadResponse::default();
        resp.unpack(buff)?;
        Ok(resp)
    }
}

// tpm2_pcr_read issues a TPM2_PCR_Read command selecting a single PCR in the
// bank of hash algorithm alg, and returns its value
pub fn tpm2_pcr_read(
    tpm: &mut dyn TpmDeviceOps,
    alg: tcg::TpmAlgId,
    index: u32,
) -> result::Result<Vec<u8>, errors::CommandError> {
    let pcr_selection = tcg::TpmlPcrSelection {
        pcr_selections: vec![tcg::TpmsPcrSelection::for_index(alg, index)?],
    };

    let mut resp_buff = run::run_command(tpm, tcg::TPM_CC_PCR_READ, &[], &[], &[&pcr_selection])?;
    let resp = PcrReadResponse::new(&mut resp_buff)?;

    // The TPM silently drops PCRs which are not allocated in the bank
    let selected = resp
        .pcr_selection_out
        .pcr_selections
        .iter()
        .any(|selection| selection.hash == alg && selection.is_selected(index));
    match resp.pcr_values.digests.into_iter().next() {
        Some(digest) if selected => Ok(digest.buffer),
        _ => Err(errors::CommandError::TpmError(errors::TpmError {
            msg: format!("PCR {} is not allocated in bank {:#06x}", index, alg),
        })),
    }
}
