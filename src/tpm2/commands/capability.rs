use crate::device::raw::TpmDeviceOps;
use crate::tpm2::commands::run;
use crate::tpm2::errors;
use crate::tpm2::serialization::inout;
use crate::tpm2::serialization::inout::Tpm2StructIn;
use crate::tpm2::types::tcg;
use std::result;

// TPM2_GetCapability response parameters for TPM_CAP_PCRS
#[derive(Default, Debug)]
pub struct PcrsCapabilityResponse {
    pub more_data: u8,
    pub capability: tcg::TpmCap,
    pub assigned_pcrs: tcg::TpmlPcrSelection,
}

impl inout::Tpm2StructIn for PcrsCapabilityResponse {
    fn unpack(&mut self, buff: &mut dyn inout::RwBytes) -> result::Result<(), errors::DeserializationError> {
        self.more_data.unpack(buff)?;
        self.capability.unpack(buff)?;
        if self.capability != tcg::TPM_CAP_PCRS {
            return Err(errors::DeserializationError {
                msg: format!("unexpected capability {:#010x}", self.capability),
            });
        }
        self.assigned_pcrs.unpack(buff)?;
        Ok(())
    }
}

// tpm2_get_pcr_banks returns the PCR banks allocated in the TPM, with the
// PCRs assigned to each of them
pub fn tpm2_get_pcr_banks(
    tpm: &mut dyn TpmDeviceOps,
) -> result::Result<tcg::TpmlPcrSelection, errors::CommandError> {
    let property: u32 = 0;
    let property_count: u32 = 1;
    let mut resp_buff = run::run_command(
        tpm,
        tcg::TPM_CC_GET_CAPABILITY,
        &[],
        &[],
        &[&tcg::TPM_CAP_PCRS, &property, &property_count],
    )?;

    let mut resp = PcrsCapabilityResponse::default();
    resp.unpack(&mut resp_buff)?;
    Ok(resp.assigned_pcrs)
}
