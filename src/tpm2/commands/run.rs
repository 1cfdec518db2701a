use crate::device::raw::TpmDeviceOps;
use crate::tpm2::commands::commands::CommandHeader;
use crate::tpm2::commands::commands::ResponseHeader;
use crate::tpm2::commands::commands::HEADER_SIZE;
use crate::tpm2::errors;
use crate::tpm2::serialization::inout;
use crate::tpm2::serialization::inout::RwBytes;
use crate::tpm2::serialization::inout::Tpm2StructIn;
use crate::tpm2::serialization::inout::Tpm2StructOut;
use crate::tpm2::types::tcg;
use bytebuffer::ByteBuffer;
use log::trace;
use std::result;

// run_command assembles a command out of handles, authorizations and
// parameters, sends it to the TPM and returns a buffer holding only the
// response parameters. None of the commands issued through here return
// handles in the response.
pub fn run_command(
    tpm: &mut dyn TpmDeviceOps,
    command_code: tcg::TpmCc,
    handles: &[tcg::Handle],
    auths: &[tcg::TpmsAuthCommand],
    params: &[&dyn inout::Tpm2StructOut],
) -> result::Result<ByteBuffer, errors::CommandError> {
    //
    // Assemble the body of the command, including handle area,
    // auth area, params area
    //
    let mut body_buff = ByteBuffer::new();
    for handle in handles.iter() {
        handle.pack(&mut body_buff);
    }
    if !auths.is_empty() {
        let mut auth_buff = ByteBuffer::new();
        for auth in auths.iter() {
            auth.pack(&mut auth_buff);
        }
        let size_auth = RwBytes::to_bytes(&auth_buff).len() as u32;
        size_auth.pack(&mut body_buff);
        RwBytes::write_bytes(&mut body_buff, RwBytes::to_bytes(&auth_buff));
    }
    inout::pack(params, &mut body_buff);

    //
    // Assemble the final command, packing header and body together
    //
    let tag = if auths.is_empty() {
        tcg::TPM_ST_NO_SESSIONS
    } else {
        tcg::TPM_ST_SESSIONS
    };
    let body = RwBytes::to_bytes(&body_buff);
    let header = CommandHeader::new(tag, HEADER_SIZE + body.len() as u32, command_code);
    let mut command_buff = ByteBuffer::new();
    header.pack(&mut command_buff);
    RwBytes::write_bytes(&mut command_buff, body);

    trace!(
        "command {:#010x}: {}",
        command_code,
        hex::encode(RwBytes::to_bytes(&command_buff))
    );

    let mut resp_buff = ByteBuffer::new();
    if let Err(err) = tpm.send_recv(&command_buff, &mut resp_buff) {
        return Err(errors::CommandError::IoError(errors::IoError {
            msg: err.to_string(),
        }));
    }

    trace!(
        "response {:#010x}: {}",
        command_code,
        hex::encode(RwBytes::to_bytes(&resp_buff))
    );

    let header = ResponseHeader::new(&mut resp_buff)?;
    if header.response_code != tcg::TPM_RC_SUCCESS {
        return Err(errors::CommandError::ResponseError(errors::ResponseError {
            error_code: header.response_code,
        }));
    }
    if header.response_size < HEADER_SIZE
        || (header.response_size - HEADER_SIZE) as usize > RwBytes::remaining(&resp_buff)
    {
        return Err(errors::CommandError::DeserializationError(
            errors::DeserializationError {
                msg: format!(
                    "response size {} does not match the {} bytes received",
                    header.response_size,
                    RwBytes::to_bytes(&resp_buff).len()
                ),
            },
        ));
    }

    // With sessions, the parameter area is prefixed by its own size and
    // followed by the authorization area
    let params_size = if header.tag == tcg::TPM_ST_SESSIONS {
        let mut parameter_size: u32 = 0;
        parameter_size.unpack(&mut resp_buff)?;
        parameter_size as usize
    } else {
        (header.response_size - HEADER_SIZE) as usize
    };

    let params = RwBytes::read_bytes(&mut resp_buff, params_size)?;
    Ok(ByteBuffer::from_bytes(&params))
}
