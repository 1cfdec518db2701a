use crate::tpm2::errors;
use crate::tpm2::serialization::inout;
use crate::tpm2::serialization::inout::RwBytes;
use std::result;

// Types
pub type TpmiStCommandTag = u16;
pub type TpmCc = u32;
pub type TpmAlgId = u16;
pub type TpmRc = u32;
pub type TpmCap = u32;
pub type Handle = u32;
pub type TpmaSession = u8;

// TPM2 command codes
pub const TPM_CC_GET_CAPABILITY: TpmCc = 0x0000017A;
pub const TPM_CC_PCR_READ: TpmCc = 0x0000017E;
pub const TPM_CC_PCR_EXTEND: TpmCc = 0x00000182;

// Command tags
pub const TPM_ST_NO_SESSIONS: TpmiStCommandTag = 0x8001;
pub const TPM_ST_SESSIONS: TpmiStCommandTag = 0x8002;

// Algorithms
pub const TPM_ALG_SHA1: TpmAlgId = 0x0004;
pub const TPM_ALG_SHA256: TpmAlgId = 0x000B;
pub const TPM_ALG_SHA384: TpmAlgId = 0x000C;
pub const TPM_ALG_SHA512: TpmAlgId = 0x000D;

// Capabilities
pub const TPM_CAP_PCRS: TpmCap = 0x00000005;

// Permanent handles
pub const TPM_RS_PW: Handle = 0x40000009;

// Response codes
pub const TPM_RC_SUCCESS: TpmRc = 0x000;

// Minimum size of a PCR select bitmap, covering PCRs 0-23
pub const PCR_SELECT_MIN: usize = 3;

// Upper bounds accepted when unmarshalling lists
pub const HASH_COUNT: u32 = 16;
pub const MAX_DIGEST_SIZE: u16 = 64;

// digest_size returns the output size of a PCR bank hash algorithm
pub fn digest_size(alg: TpmAlgId) -> Option<usize> {
    match alg {
        TPM_ALG_SHA1 => Some(20),
        TPM_ALG_SHA256 => Some(32),
        TPM_ALG_SHA384 => Some(48),
        TPM_ALG_SHA512 => Some(64),
        _ => None,
    }
}

// rc_to_string decodes a TPM 2.0 response code into a human readable text.
pub fn rc_to_string(rc: TpmRc) -> String {
    // Format-one codes carry the failing parameter, handle or session number
    if rc & 0x080 != 0 {
        let base = 0x080 | (rc & 0x03F);
        let n = (rc >> 8) & 0xF;
        let location = if rc & 0x040 != 0 {
            format!("parameter {}", n)
        } else if n < 8 {
            format!("handle {}", n)
        } else {
            format!("session {}", n - 8)
        };
        let text = match base {
            0x081 => "asymmetric algorithm not supported or not correct",
            0x082 => "inconsistent attributes",
            0x083 => "hash algorithm not supported or not appropriate",
            0x084 => "value is out of range or is not correct for the context",
            0x085 => "hierarchy is not enabled or is not correct for the use",
            0x087 => "key size is not supported",
            0x088 => "mask generation function not supported",
            0x089 => "mode of operation not supported",
            0x08A => "the type of the value is not appropriate for the use",
            0x08B => "the handle is not correct for the use",
            0x08C => "unsupported key derivation function",
            0x08D => "value was out of allowed range",
            0x08E => "the authorization HMAC check failed and DA counter incremented",
            0x08F => "invalid nonce size or nonce value mismatch",
            0x095 => "structure is the wrong size",
            0x096 => "unsupported symmetric algorithm or key size",
            0x098 => "incorrect structure tag",
            0x09A => "union selector is incorrect",
            0x09C => "the TPM was unable to unmarshal a value because there were not enough octets",
            0x0A2 => "authorization failure without DA implications",
            _ => "unknown format-one error",
        };
        return format!("TPM_RC {:#05x}: {} ({})", rc, text, location);
    }

    let text = match rc {
        0x100 => "TPM not initialized by TPM2_Startup or already initialized",
        0x101 => "commands not being accepted because of a TPM failure",
        0x103 => "improper use of a sequence handle",
        0x143 => "command code not supported",
        0x144 => "the value of authorizationSize is out of range",
        0x145 => "use of an authorization session with a context command",
        0x149 => "the command is disabled",
        0x14C => "the command requires an authorization session but none is present",
        0x901 => "gap for context ID is too large",
        0x902 => "out of memory for object contexts",
        0x903 => "out of memory for session contexts",
        0x904 => "out of shared object/session memory",
        0x905 => "out of session handles",
        0x906 => "out of object handles",
        0x907 => "bad locality",
        0x908 => "the TPM has suspended operation on the command",
        0x909 => "the command was canceled",
        0x90A => "TPM is performing self-tests",
        0x921 => "authorizations for objects subject to DA protection are not allowed at this time",
        0x922 => "the TPM is not available, retry later",
        _ => "unknown error",
    };
    format!("TPM_RC {:#05x}: {}", rc, text)
}

// TPM2B_DIGEST
#[derive(Default, Debug, Clone, PartialEq)]
pub struct Tpm2bDigest {
    pub buffer: Vec<u8>,
}

impl inout::Tpm2StructOut for Tpm2bDigest {
    fn pack(&self, buff: &mut dyn RwBytes) {
        (self.buffer.len() as u16).pack(buff);
        buff.write_bytes(&self.buffer);
    }
}

impl inout::Tpm2StructIn for Tpm2bDigest {
    fn unpack(&mut self, buff: &mut dyn RwBytes) -> result::Result<(), errors::DeserializationError> {
        let mut size: u16 = 0;
        size.unpack(buff)?;
        if size > MAX_DIGEST_SIZE {
            return Err(errors::DeserializationError {
                msg: format!("digest size {} exceeds {}", size, MAX_DIGEST_SIZE),
            });
        }
        self.buffer = buff.read_bytes(size as usize)?;
        Ok(())
    }
}

// TPML_DIGEST
#[derive(Default, Debug)]
pub struct TpmlDigest {
    pub digests: Vec<Tpm2bDigest>,
}

impl inout::Tpm2StructIn for TpmlDigest {
    fn unpack(&mut self, buff: &mut dyn RwBytes) -> result::Result<(), errors::DeserializationError> {
        let mut count: u32 = 0;
        count.unpack(buff)?;
        if count > HASH_COUNT {
            return Err(errors::DeserializationError {
                msg: format!("TPML_DIGEST count {} exceeds {}", count, HASH_COUNT),
            });
        }
        self.digests.clear();
        for _ in 0..count {
            let mut digest = Tpm2bDigest::default();
            digest.unpack(buff)?;
            self.digests.push(digest);
        }
        Ok(())
    }
}

// TPMT_HA
#[derive(Debug)]
pub struct TpmtHa {
    pub hash_alg: TpmAlgId,
    pub digest: Vec<u8>,
}

impl inout::Tpm2StructOut for TpmtHa {
    fn pack(&self, buff: &mut dyn RwBytes) {
        self.hash_alg.pack(buff);
        buff.write_bytes(&self.digest);
    }
}

// TPML_DIGEST_VALUES
#[derive(Default, Debug)]
pub struct TpmlDigestValues {
    pub digests: Vec<TpmtHa>,
}

impl inout::Tpm2StructOut for TpmlDigestValues {
    fn pack(&self, buff: &mut dyn RwBytes) {
        (self.digests.len() as u32).pack(buff);
        for digest in self.digests.iter() {
            digest.pack(buff);
        }
    }
}

// TPMS_PCR_SELECTION
#[derive(Default, Debug, Clone, PartialEq)]
pub struct TpmsPcrSelection {
    pub hash: TpmAlgId,
    pub pcr_select: Vec<u8>,
}

impl TpmsPcrSelection {
    // for_index builds a selection of a single PCR in the bank of hash
    // algorithm alg. The bitmap is never shorter than PCR_SELECT_MIN.
    pub fn for_index(alg: TpmAlgId, index: u32) -> result::Result<Self, errors::TpmError> {
        let octets = std::cmp::max(PCR_SELECT_MIN, index as usize / 8 + 1);
        if octets > u8::MAX as usize {
            return Err(errors::TpmError {
                msg: format!("PCR index {} cannot be expressed in a PCR selection", index),
            });
        }
        let mut pcr_select = vec![0; octets];
        pcr_select[index as usize / 8] = 1 << (index % 8);
        Ok(TpmsPcrSelection {
            hash: alg,
            pcr_select,
        })
    }

    // is_selected reports whether PCR index is set in the bitmap
    pub fn is_selected(&self, index: u32) -> bool {
        match self.pcr_select.get(index as usize / 8) {
            Some(octet) => octet & (1 << (index % 8)) != 0,
            None => false,
        }
    }

    // is_empty reports whether no PCR at all is selected
    pub fn is_empty(&self) -> bool {
        self.pcr_select.iter().all(|octet| *octet == 0)
    }
}

impl inout::Tpm2StructOut for TpmsPcrSelection {
    fn pack(&self, buff: &mut dyn RwBytes) {
        self.hash.pack(buff);
        (self.pcr_select.len() as u8).pack(buff);
        buff.write_bytes(&self.pcr_select);
    }
}

impl inout::Tpm2StructIn for TpmsPcrSelection {
    fn unpack(&mut self, buff: &mut dyn RwBytes) -> result::Result<(), errors::DeserializationError> {
        self.hash.unpack(buff)?;
        let mut sizeof_select: u8 = 0;
        sizeof_select.unpack(buff)?;
        self.pcr_select = buff.read_bytes(sizeof_select as usize)?;
        Ok(())
    }
}

// TPML_PCR_SELECTION
#[derive(Default, Debug, Clone, PartialEq)]
pub struct TpmlPcrSelection {
    pub pcr_selections: Vec<TpmsPcrSelection>,
}

impl inout::Tpm2StructOut for TpmlPcrSelection {
    fn pack(&self, buff: &mut dyn RwBytes) {
        (self.pcr_selections.len() as u32).pack(buff);
        for pcr_selection in self.pcr_selections.iter() {
            pcr_selection.pack(buff);
        }
    }
}

impl inout::Tpm2StructIn for TpmlPcrSelection {
    fn unpack(&mut self, buff: &mut dyn RwBytes) -> result::Result<(), errors::DeserializationError> {
        let mut count: u32 = 0;
        count.unpack(buff)?;
        if count > HASH_COUNT {
            return Err(errors::DeserializationError {
                msg: format!("TPML_PCR_SELECTION count {} exceeds {}", count, HASH_COUNT),
            });
        }
        self.pcr_selections.clear();
        for _ in 0..count {
            let mut selection = TpmsPcrSelection::default();
            selection.unpack(buff)?;
            self.pcr_selections.push(selection);
        }
        Ok(())
    }
}

// TPMS_AUTH_COMMAND
#[derive(Debug)]
pub struct TpmsAuthCommand {
    pub session_handle: Handle,
    pub nonce: Tpm2bDigest,
    pub session_attributes: TpmaSession,
    pub hmac: Tpm2bDigest,
}

impl TpmsAuthCommand {
    // password builds a password authorization with an empty auth value,
    // which is what PCRs with default authorization accept
    pub fn password() -> Self {
        TpmsAuthCommand {
            session_handle: TPM_RS_PW,
            nonce: Tpm2bDigest::default(),
            session_attributes: 0,
            hmac: Tpm2bDigest::default(),
        }
    }
}

impl inout::Tpm2StructOut for TpmsAuthCommand {
    fn pack(&self, buff: &mut dyn RwBytes) {
        self.session_handle.pack(buff);
        self.nonce.pack(buff);
        self.session_attributes.pack(buff);
        self.hmac.pack(buff);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tpm2::serialization::inout::{Tpm2StructIn, Tpm2StructOut};
    use bytebuffer::ByteBuffer;

    #[test]
    fn selection_for_low_index() {
        let selection = TpmsPcrSelection::for_index(TPM_ALG_SHA1, 16).unwrap();
        assert_eq!(selection.pcr_select, vec![0x00, 0x00, 0x01]);
        assert!(selection.is_selected(16));
        assert!(!selection.is_selected(15));
    }

    #[test]
    fn selection_grows_past_minimum() {
        let selection = TpmsPcrSelection::for_index(TPM_ALG_SHA1, 30).unwrap();
        assert_eq!(selection.pcr_select, vec![0x00, 0x00, 0x00, 0x40]);
    }

    #[test]
    fn selection_rejects_unrepresentable_index() {
        assert!(TpmsPcrSelection::for_index(TPM_ALG_SHA1, 255 * 8).is_err());
        assert!(TpmsPcrSelection::for_index(TPM_ALG_SHA1, 255 * 8 - 1).is_ok());
    }

    #[test]
    fn password_auth_layout() {
        let mut buff = ByteBuffer::new();
        TpmsAuthCommand::password().pack(&mut buff);
        assert_eq!(
            RwBytes::to_bytes(&buff),
            &[0x40, 0x00, 0x00, 0x09, 0x00, 0x00, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn pcr_selection_list_unpacks() {
        let mut buff = ByteBuffer::from_bytes(&[
            0x00, 0x00, 0x00, 0x02, // count
            0x00, 0x04, 0x03, 0xFF, 0xFF, 0xFF, // sha1, all PCRs
            0x00, 0x0B, 0x03, 0x00, 0x00, 0x00, // sha256, none
        ]);
        let mut list = TpmlPcrSelection::default();
        list.unpack(&mut buff).unwrap();
        assert_eq!(list.pcr_selections.len(), 2);
        assert_eq!(list.pcr_selections[0].hash, TPM_ALG_SHA1);
        assert!(!list.pcr_selections[0].is_empty());
        assert!(list.pcr_selections[1].is_empty());
    }

    #[test]
    fn oversized_digest_is_rejected() {
        let mut buff = ByteBuffer::from_bytes(&[0x00, 0x41]);
        let mut digest = Tpm2bDigest::default();
        assert!(digest.unpack(&mut buff).is_err());
    }

    #[test]
    fn response_codes_are_decoded() {
        assert_eq!(
            rc_to_string(0x1C4),
            "TPM_RC 0x1c4: value is out of range or is not correct for the context (parameter 1)"
        );
        assert_eq!(
            rc_to_string(0x18B),
            "TPM_RC 0x18b: the handle is not correct for the use (handle 1)"
        );
        assert_eq!(rc_to_string(0x907), "TPM_RC 0x907: bad locality");
    }
}
