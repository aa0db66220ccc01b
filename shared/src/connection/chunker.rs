use std::collections::HashMap;

use log::debug;

use lumen_serde::{ByteReader, ByteWrite, ByteWriter, Serde};

use crate::{
    connection::error::ChunkError,
    constants::CHUNK_HEADER_BYTES,
    wrapping_number::group_greater_than,
};

/// Prefixed to every datagram. All chunks of one frame share a group id.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkHeader {
    pub group_id: u32,
    pub index: u16,
    pub count: u16,
    pub total_len: u32,
}

impl ChunkHeader {
    fn write(&self, writer: &mut ByteWriter) {
        self.group_id.ser(writer);
        self.index.ser(writer);
        self.count.ser(writer);
        self.total_len.ser(writer);
    }

    fn read(datagram: &[u8]) -> Result<(Self, &[u8]), ChunkError> {
        let malformed = ChunkError::MalformedHeader {
            length: datagram.len(),
        };
        if datagram.len() < CHUNK_HEADER_BYTES {
            return Err(malformed);
        }
        let mut reader = ByteReader::new(datagram);
        let header = Self {
            group_id: u32::de(&mut reader).map_err(|_| malformed.clone())?,
            index: u16::de(&mut reader).map_err(|_| malformed.clone())?,
            count: u16::de(&mut reader).map_err(|_| malformed.clone())?,
            total_len: u32::de(&mut reader).map_err(|_| malformed.clone())?,
        };
        Ok((header, &datagram[CHUNK_HEADER_BYTES..]))
    }
}

/// Splits frames into datagram-sized chunks
pub struct PacketChunker {
    chunk_size: usize,
    max_frame_bytes: usize,
    next_group: u32,
}

impl PacketChunker {
    pub fn new(chunk_size: usize, max_frame_bytes: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            max_frame_bytes,
            next_group: 0,
        }
    }

    /// Splits a frame into datagrams, header included
    pub fn chunk(&mut self, frame: &[u8]) -> Result<Vec<Vec<u8>>, ChunkError> {
        let too_large = ChunkError::FrameTooLarge {
            length: frame.len(),
            max: self.max_frame_bytes,
        };
        if frame.len() > self.max_frame_bytes {
            return Err(too_large);
        }
        let total_len = u32::try_from(frame.len()).map_err(|_| too_large.clone())?;
        let count = frame.len().div_ceil(self.chunk_size).max(1);
        let count = u16::try_from(count).map_err(|_| too_large)?;

        let group_id = self.next_group;
        // group 0 only ever marks a fresh start
        self.next_group = match self.next_group.wrapping_add(1) {
            0 => 1,
            next => next,
        };

        let mut datagrams = Vec::with_capacity(usize::from(count));
        for index in 0..count {
            let start = usize::from(index) * self.chunk_size;
            let end = (start + self.chunk_size).min(frame.len());
            let mut writer = ByteWriter::with_capacity(CHUNK_HEADER_BYTES + end - start);
            ChunkHeader {
                group_id,
                index,
                count,
                total_len,
            }
            .write(&mut writer);
            writer.write_bytes(&frame[start..end]);
            datagrams.push(writer.to_bytes());
        }
        Ok(datagrams)
    }

    /// Starts group numbering over, which tells the peer to drop partial groups
    pub fn reset(&mut self) {
        self.next_group = 0;
    }
}

struct PartialGroup {
    count: u16,
    total_len: u32,
    chunks: Vec<Option<Vec<u8>>>,
    received: u16,
    bytes: usize,
}

/// Reassembles frames from chunks that may arrive out of order, duplicated,
/// or not at all
pub struct PacketDechunker {
    max_frame_bytes: usize,
    max_partial_groups: usize,
    partials: HashMap<u32, PartialGroup>,
    newest_complete: Option<u32>,
}

impl PacketDechunker {
    pub fn new(max_frame_bytes: usize, max_partial_groups: usize) -> Self {
        Self {
            max_frame_bytes,
            max_partial_groups: max_partial_groups.max(1),
            partials: HashMap::new(),
            newest_complete: None,
        }
    }

    /// Feeds one datagram in. Returns a frame when this datagram completes one.
    pub fn receive(&mut self, datagram: &[u8]) -> Result<Option<Vec<u8>>, ChunkError> {
        let (header, payload) = ChunkHeader::read(datagram)?;
        let ChunkHeader {
            group_id,
            index,
            count,
            total_len,
        } = header;

        if count == 0 || index >= count {
            return Err(ChunkError::InvalidChunk {
                group_id,
                index,
                count,
                total_len,
            });
        }
        let total_bytes = total_len as usize;
        if total_bytes > self.max_frame_bytes {
            return Err(ChunkError::FrameTooLarge {
                length: total_bytes,
                max: self.max_frame_bytes,
            });
        }

        let restarted = self.newest_complete.is_some() || self.partials.keys().any(|id| *id != 0);
        if group_id == 0 && index == 0 && restarted {
            debug!("peer restarted its chunk groups, dropping partial frames");
            self.reset();
        }
        if let Some(newest) = self.newest_complete {
            if !group_greater_than(group_id, newest) {
                // late chunk of a frame already superseded
                return Ok(None);
            }
        }

        if count == 1 {
            if payload.len() != total_bytes {
                return Err(ChunkError::LengthMismatch {
                    group_id,
                    expected: total_bytes,
                    actual: payload.len(),
                });
            }
            self.complete(group_id);
            return Ok(Some(payload.to_vec()));
        }

        if !self.partials.contains_key(&group_id) && self.partials.len() >= self.max_partial_groups {
            self.evict_oldest(group_id);
        }
        let group = self.partials.entry(group_id).or_insert_with(|| PartialGroup {
            count,
            total_len,
            chunks: vec![None; usize::from(count)],
            received: 0,
            bytes: 0,
        });
        if group.count != count || group.total_len != total_len {
            self.partials.remove(&group_id);
            return Err(ChunkError::InconsistentGroup { group_id });
        }

        let slot = &mut group.chunks[usize::from(index)];
        if slot.is_some() {
            return Ok(None);
        }
        group.bytes += payload.len();
        if group.bytes > total_bytes {
            let actual = group.bytes;
            self.partials.remove(&group_id);
            return Err(ChunkError::LengthMismatch {
                group_id,
                expected: total_bytes,
                actual,
            });
        }
        *slot = Some(payload.to_vec());
        group.received += 1;
        if group.received < group.count {
            return Ok(None);
        }

        let Some(group) = self.partials.remove(&group_id) else {
            return Ok(None);
        };
        let mut frame = Vec::with_capacity(total_bytes);
        for chunk in group.chunks.into_iter().flatten() {
            frame.extend_from_slice(&chunk);
        }
        if frame.len() != total_bytes {
            return Err(ChunkError::LengthMismatch {
                group_id,
                expected: total_bytes,
                actual: frame.len(),
            });
        }
        self.complete(group_id);
        Ok(Some(frame))
    }

    pub fn reset(&mut self) {
        self.partials.clear();
        self.newest_complete = None;
    }

    /// Incomplete groups currently held
    pub fn partial_count(&self) -> usize {
        self.partials.len()
    }

    fn complete(&mut self, group_id: u32) {
        let is_newest = self
            .newest_complete
            .map_or(true, |newest| group_greater_than(group_id, newest));
        if is_newest {
            self.newest_complete = Some(group_id);
        }
        // anything older can never be used now
        self.partials
            .retain(|partial_id, _| group_greater_than(*partial_id, group_id));
    }

    fn evict_oldest(&mut self, incoming: u32) {
        let oldest = self
            .partials
            .keys()
            .copied()
            .max_by_key(|partial_id| incoming.wrapping_sub(*partial_id));
        if let Some(oldest) = oldest {
            debug!("too many partial frames, dropping group {}", oldest);
            self.partials.remove(&oldest);
        }
    }
}
