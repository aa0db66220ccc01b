//! # Lumen Serde
//! Bounds-checked, byte-aligned serialization for the lumen replication
//! protocol. Every read on untrusted input returns a `SerdeErr` rather than
//! panicking.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod byte_reader;
mod byte_writer;
mod error;
mod impls;
mod integer;
mod serde;

pub use byte_reader::ByteReader;
pub use byte_writer::{ByteWrite, ByteWriter};
pub use error::SerdeErr;
pub use integer::UnsignedVariableInteger;
pub use serde::{ConstByteLength, Serde};
