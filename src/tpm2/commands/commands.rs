use crate::tpm2::errors;
use crate::tpm2::serialization::inout;
use crate::tpm2::serialization::inout::Tpm2StructIn;
use crate::tpm2::types::tcg;
use std::mem;
use std::result;

// Size of the header shared by every command and response
pub const HEADER_SIZE: u32 = (mem::size_of::<tcg::TpmiStCommandTag>()
    + mem::size_of::<u32>()
    + mem::size_of::<tcg::TpmCc>()) as u32;

#[derive(Debug)]
pub struct CommandHeader {
    pub tag: tcg::TpmiStCommandTag,
    pub command_size: u32,
    pub command_code: tcg::TpmCc,
}

impl CommandHeader {
    pub fn new(tag: tcg::TpmiStCommandTag, command_size: u32, command_code: tcg::TpmCc) -> Self {
        CommandHeader {
            tag,
            command_size,
            command_code,
        }
    }
}

impl inout::Tpm2StructOut for CommandHeader {
    fn pack(&self, buff: &mut dyn inout::RwBytes) {
        self.tag.pack(buff);
        self.command_size.pack(buff);
        self.command_code.pack(buff);
    }
}

#[derive(Default, Debug)]
pub struct ResponseHeader {
    pub tag: tcg::TpmiStCommandTag,
    pub response_size: u32,
    pub response_code: tcg::TpmRc,
}

impl ResponseHeader {
    // new builds a ResponseHeader structure from a bytes buffer
    pub fn new(buff: &mut dyn inout::RwBytes) -> result::Result<Self, errors::DeserializationError> {
        let mut header = ResponseHeader::default();
        header.unpack(buff)?;
        Ok(header)
    }
}

impl inout::Tpm2StructIn for ResponseHeader {
    fn unpack(&mut self, buff: &mut dyn inout::RwBytes) -> result::Result<(), errors::DeserializationError> {
        self.tag.unpack(buff)?;
        self.response_size.unpack(buff)?;
        self.response_code.unpack(buff)?;
        Ok(())
    }
}
