use crate::{
    byte_reader::ByteReader, byte_writer::ByteWrite, error::SerdeErr,
    integer::UnsignedVariableInteger,
    serde::{ConstByteLength, Serde},
};

// Scalars are little-endian on the wire regardless of host byte order.
macro_rules! impl_serde_for_scalar {
    ($($t:ty),*) => {$(
        impl Serde for $t {
            fn ser(&self, writer: &mut dyn ByteWrite) {
                writer.write_bytes(&self.to_le_bytes());
            }

            fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
                let bytes = reader.read_array::<{ std::mem::size_of::<$t>() }>()?;
                Ok(<$t>::from_le_bytes(bytes))
            }

            fn byte_length(&self) -> usize {
                std::mem::size_of::<$t>()
            }
        }

        impl ConstByteLength for $t {
            fn const_byte_length() -> usize {
                std::mem::size_of::<$t>()
            }
        }
    )*};
}

impl_serde_for_scalar!(u8, i8, u16, i16, u32, i32, u64, i64, f32, f64);

impl Serde for bool {
    fn ser(&self, writer: &mut dyn ByteWrite) {
        writer.write_byte(if *self { 1 } else { 0 });
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        match reader.read_byte()? {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(SerdeErr::InvalidValue { type_name: "bool" }),
        }
    }

    fn byte_length(&self) -> usize {
        1
    }
}

impl ConstByteLength for bool {
    fn const_byte_length() -> usize {
        1
    }
}

impl Serde for String {
    fn ser(&self, writer: &mut dyn ByteWrite) {
        UnsignedVariableInteger::from(self.len()).ser(writer);
        writer.write_bytes(self.as_bytes());
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        let length = UnsignedVariableInteger::de(reader)?.get();
        if length > reader.remaining() as u64 {
            return Err(SerdeErr::Truncated {
                needed: length.min(usize::MAX as u64) as usize,
                remaining: reader.remaining(),
            });
        }
        let bytes = reader.read_bytes(length as usize)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| SerdeErr::InvalidValue {
            type_name: "String",
        })
    }

    fn byte_length(&self) -> usize {
        UnsignedVariableInteger::from(self.len()).byte_length() + self.len()
    }
}

impl<T: Serde> Serde for Vec<T> {
    fn ser(&self, writer: &mut dyn ByteWrite) {
        UnsignedVariableInteger::from(self.len()).ser(writer);
        for item in self {
            item.ser(writer);
        }
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        let count = UnsignedVariableInteger::de(reader)?.get();
        // every element takes at least one byte, so a count larger than what
        // is left can only mean the buffer was cut short
        if count > reader.remaining() as u64 {
            return Err(SerdeErr::Truncated {
                needed: count.min(usize::MAX as u64) as usize,
                remaining: reader.remaining(),
            });
        }
        let mut output = Vec::with_capacity(count as usize);
        for _ in 0..count {
            output.push(T::de(reader)?);
        }
        Ok(output)
    }

    fn byte_length(&self) -> usize {
        let items: usize = self.iter().map(Serde::byte_length).sum();
        UnsignedVariableInteger::from(self.len()).byte_length() + items
    }
}

impl<T: Serde> Serde for Option<T> {
    fn ser(&self, writer: &mut dyn ByteWrite) {
        match self {
            Some(value) => {
                true.ser(writer);
                value.ser(writer);
            }
            None => {
                false.ser(writer);
            }
        }
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        if bool::de(reader)? {
            Ok(Some(T::de(reader)?))
        } else {
            Ok(None)
        }
    }

    fn byte_length(&self) -> usize {
        1 + self.as_ref().map(Serde::byte_length).unwrap_or(0)
    }
}
