use crate::{byte_reader::ByteReader, byte_writer::ByteWrite, error::SerdeErr, serde::Serde};

// Each encoded byte carries 7 value bits (least significant first) and a
// "proceed" flag in the high bit.
const VALUE_BITS: u32 = 7;
const PROCEED_FLAG: u8 = 0b1000_0000;
const VALUE_MASK: u8 = 0b0111_1111;
// ceil(64 / 7)
const MAX_ENCODED_BYTES: usize = 10;

/// An unsigned integer written with as few bytes as its magnitude needs.
/// Used for every length prefix in the protocol.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Default)]
pub struct UnsignedVariableInteger {
    inner_value: u64,
}

impl UnsignedVariableInteger {
    pub fn new<T: Into<u64>>(value: T) -> Self {
        Self {
            inner_value: value.into(),
        }
    }

    pub fn get(&self) -> u64 {
        self.inner_value
    }

    pub fn set<T: Into<u64>>(&mut self, value: T) {
        self.inner_value = value.into();
    }

    /// Reads a length prefix and checks it against `max`, so a corrupt prefix
    /// can never drive an allocation
    pub fn de_length(reader: &mut ByteReader, max: usize) -> Result<usize, SerdeErr> {
        let length = Self::de(reader)?.get();
        if length > max as u64 {
            return Err(SerdeErr::LengthOverflow {
                length,
                max: max as u64,
            });
        }
        Ok(length as usize)
    }
}

impl Serde for UnsignedVariableInteger {
    fn ser(&self, writer: &mut dyn ByteWrite) {
        let mut value = self.inner_value;
        loop {
            let proceed = value > VALUE_MASK as u64;
            let mut byte = (value as u8) & VALUE_MASK;
            if proceed {
                byte |= PROCEED_FLAG;
            }
            writer.write_byte(byte);
            value >>= VALUE_BITS;
            if !proceed {
                return;
            }
        }
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        let mut output: u64 = 0;
        for index in 0..MAX_ENCODED_BYTES {
            let byte = reader.read_byte()?;
            let shift = index as u32 * VALUE_BITS;
            let bits = (byte & VALUE_MASK) as u64;
            // the tenth byte may only contribute the single remaining bit
            if shift == 63 && bits > 1 {
                return Err(SerdeErr::InvalidValue {
                    type_name: "UnsignedVariableInteger",
                });
            }
            output |= bits << shift;
            if byte & PROCEED_FLAG == 0 {
                return Ok(Self::new(output));
            }
        }
        Err(SerdeErr::InvalidValue {
            type_name: "UnsignedVariableInteger",
        })
    }

    fn byte_length(&self) -> usize {
        let mut output = 1;
        let mut value = self.inner_value >> VALUE_BITS;
        while value > 0 {
            output += 1;
            value >>= VALUE_BITS;
        }
        output
    }
}

impl From<usize> for UnsignedVariableInteger {
    fn from(value: usize) -> Self {
        Self::new(value as u64)
    }
}

// Tests
