//! Schema traits.
//!
//! A schema type decides how a value is laid out on the wire. For most
//! types the schema is the type itself (`u32`, `Option<T>`, tuples, or
//! anything run through [`describe!`](crate::describe)); the
//! [`containers`] module provides wrapper schemas that select alternate
//! treatments, like bulk byte copies or a different length prefix, for a
//! target type they do not own.
//!
//! # Example
//!
//! ```
//! # use fieldwire::{describe, containers::{self, Pod}};
//! #[derive(Debug, PartialEq, Eq)]
//! struct Telemetry {
//!     source: u16,
//!     samples: Vec<u32>,
//!     blob: Vec<u8>,
//! }
//!
//! describe! {
//!     Telemetry {
//!         source: u16,
//!         samples: Vec<u32>,
//!         blob: containers::Vec<Pod<u8>>,
//!     }
//! }
//!
//! let telemetry = Telemetry { source: 7, samples: vec![1, 2, 3], blob: vec![0xAA; 4] };
//! let bytes = fieldwire::serialize::<Telemetry>(&telemetry).unwrap();
//! let decoded = fieldwire::deserialize::<Telemetry>(&bytes).unwrap();
//! assert_eq!(telemetry, decoded);
//! ```
#[cfg(feature = "alloc")]
use crate::error::read_size_limit;
use crate::{
    error::{Error, Result},
    io::{Reader, Writer},
    len::SeqLen,
};

pub mod containers;
mod impls;

/// Types that can be written (serialized) to a byte buffer.
pub trait SchemaWrite {
    type Src: ?Sized;
    /// Get the serialized size of `Self::Src`.
    fn size_of(src: &Self::Src) -> Result<usize>;
    /// Write `Self::Src` to `writer`.
    fn write(writer: &mut impl Writer, src: &Self::Src) -> Result<()>;
}

/// Types that can be read (deserialized) from a byte buffer.
pub trait SchemaRead {
    type Dst;
    /// Read a `Self::Dst` from `reader`.
    ///
    /// Fails fast on the first malformed sub-field; any partially decoded
    /// state is dropped, never returned.
    fn read(reader: &mut Reader<'_>) -> Result<Self::Dst>;
}

#[inline(always)]
fn size_of_elem_iter<'a, T, Len>(value: impl ExactSizeIterator<Item = &'a T::Src>) -> Result<usize>
where
    Len: SeqLen,
    T: SchemaWrite + 'a,
    T::Src: Sized,
{
    Ok(Len::bytes_needed(value.len())?
        + value
            .map(T::size_of)
            .try_fold(0, |acc, x| Ok::<_, Error>(acc + x?))?)
}

#[inline(always)]
fn write_elem_iter<'a, T, Len>(
    writer: &mut impl Writer,
    src: impl ExactSizeIterator<Item = &'a T::Src>,
) -> Result<()>
where
    Len: SeqLen,
    T: SchemaWrite + 'a,
    T::Src: Sized,
{
    Len::encode_len(writer, src.len())?;
    for item in src {
        T::write(writer, item)?;
    }
    Ok(())
}

/// Read a sequence length prefix, bounded by both the length encoding's
/// preallocation limit and the remaining input.
#[cfg(feature = "alloc")]
#[inline(always)]
fn read_seq_len<T, Len: SeqLen>(reader: &mut Reader<'_>) -> Result<usize> {
    let len = Len::size_hint_cautious::<T>(reader)?;
    // Every element with a non-zero-sized destination occupies at least one
    // encoded byte, so a prefix larger than the remaining input can never
    // complete. Checking up front keeps allocation independent of the
    // attacker-supplied prefix.
    if size_of::<T>() != 0 && len > reader.remaining() {
        return Err(read_size_limit(len));
    }
    Ok(len)
}
