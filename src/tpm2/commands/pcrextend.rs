use crate::device::raw::TpmDeviceOps;
use crate::tpm2::commands::run;
use crate::tpm2::errors;
use crate::tpm2::types::tcg;
use std::result;

// tpm2_pcr_extend issues a TPM2_PCR_Extend command on PCR index, with a
// single digest for the bank of hash algorithm alg. The PCR handle is the
// PCR index itself and is authorized with an empty password.
pub fn tpm2_pcr_extend(
    tpm: &mut dyn TpmDeviceOps,
    alg: tcg::TpmAlgId,
    index: u32,
    digest: &[u8],
) -> result::Result<(), errors::CommandError> {
    let digests = tcg::TpmlDigestValues {
        digests: vec![tcg::TpmtHa {
            hash_alg: alg,
            digest: digest.to_vec(),
        }],
    };

    run::run_command(
        tpm,
        tcg::TPM_CC_PCR_EXTEND,
        &[index],
        &[tcg::TpmsAuthCommand::password()],
        &[&digests],
    )?;
    Ok(())
}
