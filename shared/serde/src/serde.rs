use crate::{byte_reader::ByteReader, byte_writer::ByteWrite, error::SerdeErr};

/// A type that can be written to and read from a byte stream
pub trait Serde: Sized + Clone + PartialEq {
    /// Writes the value into the given writer
    fn ser(&self, writer: &mut dyn ByteWrite);

    /// Reads a value back out of the reader, consuming exactly the bytes
    /// `ser` produced
    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr>;

    /// Number of bytes `ser` will produce for this value
    fn byte_length(&self) -> usize;
}

/// Implemented by types whose encoding always takes the same number of bytes
pub trait ConstByteLength {
    fn const_byte_length() -> usize;
}
