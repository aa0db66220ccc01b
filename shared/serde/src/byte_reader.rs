use crate::{error::SerdeErr, serde::ConstByteLength};

/// Cursor over a borrowed byte slice. Every read is bounds-checked and reports
/// `SerdeErr::Truncated` instead of reading past the end.
pub struct ByteReader<'b> {
    buffer: &'b [u8],
    index: usize,
}

impl<'b> ByteReader<'b> {
    pub fn new(buffer: &'b [u8]) -> Self {
        Self { buffer, index: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.index
    }

    pub fn position(&self) -> usize {
        self.index
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Whether `count` more bytes are available
    pub fn can_read_bytes(&self, count: usize) -> bool {
        count <= self.remaining()
    }

    /// Whether a fixed-width `T` could be read without consuming anything
    pub fn can_read<T: ConstByteLength>(&self) -> bool {
        self.can_read_bytes(T::const_byte_length())
    }

    pub fn peek_byte(&self) -> Result<u8, SerdeErr> {
        self.buffer
            .get(self.index)
            .copied()
            .ok_or(SerdeErr::Truncated {
                needed: 1,
                remaining: 0,
            })
    }

    pub fn read_byte(&mut self) -> Result<u8, SerdeErr> {
        let byte = self.peek_byte()?;
        self.index += 1;
        Ok(byte)
    }

    pub fn read_bytes(&mut self, count: usize) -> Result<&'b [u8], SerdeErr> {
        if !self.can_read_bytes(count) {
            return Err(SerdeErr::Truncated {
                needed: count,
                remaining: self.remaining(),
            });
        }
        let start = self.index;
        self.index += count;
        Ok(&self.buffer[start..self.index])
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], SerdeErr> {
        let bytes = self.read_bytes(N)?;
        let mut output = [0u8; N];
        output.copy_from_slice(bytes);
        Ok(output)
    }

    /// Splits off the next `count` bytes as an independent reader, advancing
    /// this one past them. A codec handed the sub reader cannot overrun into
    /// whatever follows.
    pub fn sub_reader(&mut self, count: usize) -> Result<ByteReader<'b>, SerdeErr> {
        let bytes = self.read_bytes(count)?;
        Ok(ByteReader::new(bytes))
    }
}
