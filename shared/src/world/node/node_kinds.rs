use std::{any::TypeId, collections::HashMap, fmt};

use lumen_serde::{ByteReader, ByteWrite, ConstByteLength, Serde, SerdeErr};

use super::{
    error::RegistryError,
    replicate::{NodeKind, Replicate},
};

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// Identifies a node kind on the wire. Derived from the kind's name, so both
/// roles agree on it without registering kinds in the same order.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeTag(u16);

impl TypeTag {
    /// FNV-1a over the name, folded to 16 bits
    pub fn from_name(name: &str) -> Self {
        let mut hash = FNV_OFFSET_BASIS;
        for byte in name.bytes() {
            hash ^= u32::from(byte);
            hash = hash.wrapping_mul(FNV_PRIME);
        }
        Self(((hash >> 16) ^ (hash & 0xFFFF)) as u16)
    }

    pub fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    pub fn get(&self) -> u16 {
        self.0
    }

    pub fn is_reserved(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeTag({:#06x})", self.0)
    }
}

impl Serde for TypeTag {
    fn ser(&self, writer: &mut dyn ByteWrite) {
        self.0.ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self(u16::de(reader)?))
    }

    fn byte_length(&self) -> usize {
        <Self as ConstByteLength>::const_byte_length()
    }
}

impl ConstByteLength for TypeTag {
    fn const_byte_length() -> usize {
        2
    }
}

type NodeBuilder = Box<dyn Fn() -> Box<dyn Replicate> + Send + Sync>;

struct KindEntry {
    name: &'static str,
    builder: NodeBuilder,
}

/// Registry of node kinds, mapping each type tag to a builder of blank nodes
/// that decoding fills in
#[derive(Default)]
pub struct NodeKinds {
    kinds: HashMap<TypeTag, KindEntry>,
    type_to_tag: HashMap<TypeId, TypeTag>,
}

impl NodeKinds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a kind, panicking if it collides with one already present
    pub fn add_kind<K: NodeKind>(&mut self) -> TypeTag {
        match self.try_add_kind::<K>() {
            Ok(tag) => tag,
            Err(error) => panic!("{}", error),
        }
    }

    pub fn try_add_kind<K: NodeKind>(&mut self) -> Result<TypeTag, RegistryError> {
        let tag = self.register(K::NAME, || Box::new(K::default()))?;
        self.type_to_tag.insert(TypeId::of::<K>(), tag);
        Ok(tag)
    }

    /// Registers a builder under a kind name. The builder must produce nodes
    /// reporting that same name.
    pub fn register<F>(&mut self, name: &'static str, builder: F) -> Result<TypeTag, RegistryError>
    where
        F: Fn() -> Box<dyn Replicate> + Send + Sync + 'static,
    {
        let built = builder().kind_name();
        if built != name {
            return Err(RegistryError::BuilderMismatch {
                registered: name,
                built,
            });
        }

        let tag = TypeTag::from_name(name);
        if tag.is_reserved() {
            return Err(RegistryError::ReservedTag { name });
        }
        if let Some(existing) = self.kinds.get(&tag) {
            if existing.name == name {
                return Err(RegistryError::AlreadyRegistered { name });
            }
            return Err(RegistryError::TagCollision {
                tag,
                existing: existing.name,
                new: name,
            });
        }

        self.kinds.insert(
            tag,
            KindEntry {
                name,
                builder: Box::new(builder),
            },
        );
        Ok(tag)
    }

    /// Builds a blank node of the tagged kind, or None for an unknown tag
    pub fn build(&self, tag: TypeTag) -> Option<Box<dyn Replicate>> {
        self.kinds.get(&tag).map(|entry| (entry.builder)())
    }

    pub fn contains(&self, tag: TypeTag) -> bool {
        self.kinds.contains_key(&tag)
    }

    pub fn name(&self, tag: TypeTag) -> Option<&'static str> {
        self.kinds.get(&tag).map(|entry| entry.name)
    }

    pub fn tag_of<K: NodeKind>(&self) -> Option<TypeTag> {
        self.type_to_tag.get(&TypeId::of::<K>()).copied()
    }

    /// The tag of a registered kind name
    pub fn tag_for_name(&self, name: &str) -> Option<TypeTag> {
        let tag = TypeTag::from_name(name);
        match self.kinds.get(&tag) {
            Some(entry) if entry.name == name => Some(tag),
            _ => None,
        }
    }

    /// Every registered tag, sorted
    pub fn tags(&self) -> Vec<TypeTag> {
        let mut tags: Vec<TypeTag> = self.kinds.keys().copied().collect();
        tags.sort();
        tags
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}
