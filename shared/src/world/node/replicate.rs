use std::any::Any;

use lumen_serde::{ByteReader, ByteWrite, SerdeErr};

use super::diff_mask::DiffMask;

/// The per-kind codec of a replicated node. A kind splits its attributes into
/// numbered groups; only the groups set in a mask travel on the wire.
pub trait Replicate: Any + Send + Sync {
    /// Stable name of the kind, hashed into its type tag
    fn kind_name(&self) -> &'static str;

    /// Number of attribute groups this kind has
    fn group_count(&self) -> u8;

    /// Writes every group whose bit is set in `mask`, in ascending group order
    fn write_groups(&self, mask: &DiffMask, writer: &mut dyn ByteWrite);

    /// Reads back exactly the groups `write_groups` wrote for the same mask
    fn read_groups(&mut self, mask: &DiffMask, reader: &mut ByteReader) -> Result<(), SerdeErr>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// A concrete node kind the registry can build blank instances of
pub trait NodeKind: Replicate + Default {
    const NAME: &'static str;
}
