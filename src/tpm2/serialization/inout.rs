use crate::tpm2::errors;
use bytebuffer::ByteBuffer;
use std::result;

// RwBytes is a generic interface for reading and writing bytes.
pub trait RwBytes {
    // write_bytes appends bytes to the underlying buffer, moving the
    // write pointer
    fn write_bytes(&mut self, bytes: &[u8]);
    // read_bytes reads a certain amount of bytes from the underlying
    // buffer, moving the read pointer
    fn read_bytes(&mut self, size: usize) -> result::Result<Vec<u8>, errors::DeserializationError>;
    // remaining returns the number of bytes not consumed yet
    fn remaining(&self) -> usize;
    // to_bytes returns a slice representation of the whole buffer
    fn to_bytes(&self) -> &[u8];
}

impl RwBytes for ByteBuffer {
    fn write_bytes(&mut self, bytes: &[u8]) {
        ByteBuffer::write_bytes(self, bytes);
    }

    fn read_bytes(&mut self, size: usize) -> result::Result<Vec<u8>, errors::DeserializationError> {
        if size > RwBytes::remaining(self) {
            return Err(errors::DeserializationError {
                msg: format!(
                    "buffer length not sufficient for read_bytes: {} > {}",
                    size,
                    RwBytes::remaining(self)
                ),
            });
        }
        ByteBuffer::read_bytes(self, size).map_err(|err| errors::DeserializationError {
            msg: err.to_string(),
        })
    }

    fn remaining(&self) -> usize {
        self.len().saturating_sub(self.get_rpos())
    }

    fn to_bytes(&self) -> &[u8] {
        self.as_bytes()
    }
}

// Tpm2StructOut is a trait for TPM objects which can be serialized in
// big endian byte stream for TPM operations
pub trait Tpm2StructOut {
    fn pack(&self, buff: &mut dyn RwBytes);
}

// Tpm2StructIn is a trait for TPM objects which can be deserialized from
// a byte stream
pub trait Tpm2StructIn {
    fn unpack(&mut self, buff: &mut dyn RwBytes) -> result::Result<(), errors::DeserializationError>;
}

// impl_tpm2_io is a macro which implments Tpm2StructIn and Tpm2StructOut for
// primitive types.
macro_rules! impl_tpm2_io {
    ($T: ident) => {
        impl Tpm2StructOut for $T {
            fn pack(&self, buff: &mut dyn RwBytes) {
                buff.write_bytes(&self.to_be_bytes()[..]);
            }
        }

        impl Tpm2StructIn for $T {
            fn unpack(&mut self, buff: &mut dyn RwBytes) -> result::Result<(), errors::DeserializationError> {
                let bytes = buff.read_bytes(size_of!($T))?;
                match <[u8; size_of!($T)]>::try_from(&bytes[..]) {
                    Ok(byte_array) => {
                        *self = $T::from_be_bytes(byte_array);
                        Ok(())
                    }
                    Err(_) => Err(errors::DeserializationError {
                        msg: String::from("could not prepare byteArray"),
                    }),
                }
            }
        }
    };
}

impl_tpm2_io! { u8 }
impl_tpm2_io! { u16 }
impl_tpm2_io! { u32 }
impl_tpm2_io! { u64 }

// pack serializes a list of heterogeneous fields one after the other
pub fn pack(fields: &[&dyn Tpm2StructOut], buff: &mut dyn RwBytes) {
    for field in fields.iter() {
        field.pack(buff)
    }
}
