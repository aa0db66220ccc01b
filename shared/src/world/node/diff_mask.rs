use std::fmt;

use lumen_serde::{ByteReader, ByteWrite, Serde, SerdeErr};

// 255 groups at most, one bit each
const MAX_MASK_BYTES: usize = 32;

/// Which attribute groups of a node changed since its last flush. Bit `n`
/// stands for group `n` of the node's kind.
#[derive(Clone, Default)]
pub struct DiffMask {
    mask: Vec<u8>,
}

impl DiffMask {
    /// An empty mask sized for `group_count` groups
    pub fn new(group_count: u8) -> Self {
        let byte_count = (usize::from(group_count) + 7) / 8;
        Self {
            mask: vec![0; byte_count],
        }
    }

    /// A mask with every one of `group_count` groups set
    pub fn full(group_count: u8) -> Self {
        let mut mask = Self::new(group_count);
        for group in 0..group_count {
            mask.set_bit(group, true);
        }
        mask
    }

    pub fn byte_count(&self) -> usize {
        self.mask.len()
    }

    pub fn byte(&self, index: usize) -> u8 {
        self.mask.get(index).copied().unwrap_or(0)
    }

    pub fn bit(&self, index: u8) -> Option<bool> {
        let byte = self.mask.get(usize::from(index / 8))?;
        Some(byte & (1 << (index % 8)) != 0)
    }

    /// Sets a group bit, growing the mask if needed
    pub fn set_bit(&mut self, index: u8, value: bool) {
        let byte_index = usize::from(index / 8);
        if byte_index >= self.mask.len() {
            if !value {
                return;
            }
            self.mask.resize(byte_index + 1, 0);
        }
        let bit = 1 << (index % 8);
        if value {
            self.mask[byte_index] |= bit;
        } else {
            self.mask[byte_index] &= !bit;
        }
    }

    pub fn clear(&mut self) {
        for byte in self.mask.iter_mut() {
            *byte = 0;
        }
    }

    pub fn is_clear(&self) -> bool {
        self.mask.iter().all(|byte| *byte == 0)
    }

    pub fn or(&mut self, other: &DiffMask) {
        if other.mask.len() > self.mask.len() {
            self.mask.resize(other.mask.len(), 0);
        }
        for (byte, other_byte) in self.mask.iter_mut().zip(other.mask.iter()) {
            *byte |= *other_byte;
        }
    }

    /// Indices of every set group, ascending
    pub fn groups(&self) -> impl Iterator<Item = u8> + '_ {
        (0..=u8::MAX).filter(move |index| self.bit(*index) == Some(true))
    }

    /// Number of groups set
    pub fn count(&self) -> u32 {
        self.mask.iter().map(|byte| byte.count_ones()).sum()
    }
}

// masks that differ only in trailing zero bytes are the same mask
impl PartialEq for DiffMask {
    fn eq(&self, other: &Self) -> bool {
        let len = self.mask.len().max(other.mask.len());
        (0..len).all(|index| self.byte(index) == other.byte(index))
    }
}

impl Eq for DiffMask {}

impl fmt::Debug for DiffMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.groups()).finish()
    }
}

impl Serde for DiffMask {
    fn ser(&self, writer: &mut dyn ByteWrite) {
        // trailing zero bytes carry nothing
        let used = self
            .mask
            .iter()
            .rposition(|byte| *byte != 0)
            .map(|index| index + 1)
            .unwrap_or(0);
        writer.write_byte(used as u8);
        writer.write_bytes(&self.mask[..used]);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        let byte_count = usize::from(reader.read_byte()?);
        if byte_count > MAX_MASK_BYTES {
            return Err(SerdeErr::LengthOverflow {
                length: byte_count as u64,
                max: MAX_MASK_BYTES as u64,
            });
        }
        let mask = reader.read_bytes(byte_count)?.to_vec();
        Ok(Self { mask })
    }

    fn byte_length(&self) -> usize {
        let used = self
            .mask
            .iter()
            .rposition(|byte| *byte != 0)
            .map(|index| index + 1)
            .unwrap_or(0);
        1 + used
    }
}
