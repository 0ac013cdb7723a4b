//! fieldwire is a description-driven little-endian binary codec with a
//! framed stream packager.
//!
//! A user type becomes encodable by declaring its field list once with the
//! [`describe!`] macro; that declaration is the single source of truth for
//! the wire layout. The [`frame`] module wraps encoded values with a start
//! marker, a length prefix and optional checksums so frames can be located
//! and recovered from corrupted, stream-oriented input.
//!
//! # Quickstart
//!
//! The codec traits are implemented for the built-in shapes (integers,
//! floats, `bool`, `Option`, tuples, arrays, sequences, maps, `Duration`).
//! Aggregates opt in through [`describe!`]:
//!
//! ```
//! # use fieldwire::describe;
//! #[derive(Debug, PartialEq, Eq)]
//! struct Reading {
//!     sensor: u16,
//!     value: i64,
//!     label: Option<String>,
//! }
//!
//! describe! {
//!     Reading {
//!         sensor: u16,
//!         value: i64,
//!         label: Option<String>,
//!     }
//! }
//!
//! let reading = Reading { sensor: 3, value: -40, label: None };
//! let bytes = fieldwire::serialize::<Reading>(&reading).unwrap();
//! let decoded = fieldwire::deserialize::<Reading>(&bytes).unwrap();
//! assert_eq!(reading, decoded);
//! ```
//!
//! # Framing
//!
//! For byte streams that can drop or corrupt data, wrap values in frames.
//! The configuration is type-level, so peers that disagree on it fail to
//! interoperate at the type system rather than at runtime:
//!
//! ```
//! # use fieldwire::frame::{FrameConfig, NoChecksum, Packager, Unpacked};
//! # use fieldwire::len::U16Len;
//! struct Wire;
//!
//! impl FrameConfig for Wire {
//!     type Len = U16Len;
//!     type Crc = NoChecksum;
//!     const PACKAGE_START: &'static [u8] = &[0xCD, 0xAB]; // 0xABCD
//!     const MAX_SIZE: usize = 1024;
//! }
//!
//! let mut stream = vec![0x00, 0x7F]; // line noise ahead of the frame
//! Packager::<Wire>::pack::<u64>(&mut stream, &7).unwrap();
//!
//! match Packager::<Wire>::unpack::<u64>(&stream) {
//!     Unpacked::Frame { value, consumed } => {
//!         assert_eq!(value, 7);
//!         assert_eq!(consumed, stream.len());
//!     }
//!     Unpacked::NeedMore => unreachable!(),
//! }
//! ```
//!
//! # Wire format
//!
//! Everything is little-endian, fields encode in declaration order, and
//! there is no padding and no self-description: the only tags on the wire
//! are variant discriminants and sequence length prefixes. Length prefixes
//! default to `u32` ([`len::U32Len`]); per-field treatments, like bulk byte
//! copies for trivial element types or a narrower prefix, are chosen with
//! the wrappers in [`containers`].
#![cfg_attr(not(feature = "std"), no_std)]
#[cfg(feature = "alloc")]
extern crate alloc;

pub mod error;
pub use error::{Error, Result};
pub mod describe;
pub use describe::{Described, SizeVisitor, Visit, VisitNamed, WriteVisitor};
pub mod frame;
pub use frame::{Checksum, CrcValue, FrameConfig, NoChecksum, Packager, Unpacked};
pub mod io;
pub mod len;
mod schema;
pub use schema::*;

#[cfg(feature = "alloc")]
use alloc::vec::Vec;
use io::{Reader, Writer};

/// Get the encoded size of `value` under schema `T`.
pub fn serialized_size<T: SchemaWrite>(value: &T::Src) -> Result<usize> {
    T::size_of(value)
}

/// Serialize `value` under schema `T` into a fresh, exactly-sized buffer.
#[cfg(feature = "alloc")]
pub fn serialize<T: SchemaWrite>(value: &T::Src) -> Result<Vec<u8>> {
    let size = T::size_of(value)?;
    let mut buffer = Vec::with_capacity(size);
    T::write(&mut buffer, value)?;
    debug_assert_eq!(buffer.len(), size);
    Ok(buffer)
}

/// Serialize `value` under schema `T` into `writer`.
pub fn serialize_into<T: SchemaWrite>(writer: &mut impl Writer, value: &T::Src) -> Result<()> {
    T::write(writer, value)
}

/// Deserialize a value under schema `T` from `bytes`, requiring the whole
/// input to be consumed.
pub fn deserialize<T: SchemaRead>(bytes: &[u8]) -> Result<T::Dst> {
    let mut reader = Reader::new(bytes);
    let value = T::read(&mut reader)?;
    if reader.remaining() != 0 {
        return Err(error::trailing_bytes(reader.remaining()));
    }
    Ok(value)
}

/// Deserialize a value under schema `T` from `reader`, leaving any
/// remaining bytes in place.
pub fn deserialize_from<T: SchemaRead>(reader: &mut Reader<'_>) -> Result<T::Dst> {
    T::read(reader)
}

/// Serialization entry points, callable on any [`SchemaWrite`] type.
pub trait Serialize: SchemaWrite {
    #[cfg(feature = "alloc")]
    fn serialize(src: &Self::Src) -> Result<Vec<u8>>
    where
        Self: Sized,
    {
        crate::serialize::<Self>(src)
    }

    fn serialize_into(writer: &mut impl Writer, src: &Self::Src) -> Result<()>
    where
        Self: Sized,
    {
        crate::serialize_into::<Self>(writer, src)
    }

    fn serialized_size(src: &Self::Src) -> Result<usize>
    where
        Self: Sized,
    {
        crate::serialized_size::<Self>(src)
    }
}

impl<T: SchemaWrite> Serialize for T {}

/// Deserialization entry points, callable on any [`SchemaRead`] type.
pub trait Deserialize: SchemaRead {
    fn deserialize(bytes: &[u8]) -> Result<Self::Dst>
    where
        Self: Sized,
    {
        crate::deserialize::<Self>(bytes)
    }

    fn deserialize_from(reader: &mut Reader<'_>) -> Result<Self::Dst>
    where
        Self: Sized,
    {
        crate::deserialize_from::<Self>(reader)
    }
}

impl<T: SchemaRead> Deserialize for T {}
