//! This module provides specialized "container" types that can be used to opt
//! into optimized read/write implementations or specialized length encodings.
//!
//! # Examples
//!
//! Raw byte vec with the default `u32` length prefix:
//!
//! ```
//! # use fieldwire::{describe, containers::{self, Pod}, Serialize, Deserialize};
//! #[derive(Debug, PartialEq, Eq)]
//! struct MyStruct {
//!     vec: Vec<u8>,
//! }
//!
//! describe! {
//!     MyStruct {
//!         vec: containers::Vec<Pod<u8>>,
//!     }
//! }
//!
//! let my_struct = MyStruct { vec: vec![1, 2, 3] };
//! let bytes = fieldwire::serialize::<MyStruct>(&my_struct).unwrap();
//! assert_eq!(bytes, [3, 0, 0, 0, 1, 2, 3]);
//! ```
//!
//! Vector with non-trivial elements and a `u16` length prefix:
//!
//! ```
//! # use fieldwire::{describe, containers::{self, Elem}, len::U16Len, Serialize, Deserialize};
//! #[derive(Debug, PartialEq, Eq)]
//! struct Point {
//!     x: u64,
//!     y: u64,
//! }
//!
//! describe! {
//!     Point {
//!         x: u64,
//!         y: u64,
//!     }
//! }
//!
//! #[derive(Debug, PartialEq, Eq)]
//! struct MyStruct {
//!     points: Vec<Point>,
//! }
//!
//! describe! {
//!     MyStruct {
//!         points: containers::Vec<Elem<Point>, U16Len>,
//!     }
//! }
//!
//! let my_struct = MyStruct { points: vec![Point { x: 1, y: 2 }] };
//! let bytes = fieldwire::serialize::<MyStruct>(&my_struct).unwrap();
//! let decoded = fieldwire::deserialize::<MyStruct>(&bytes).unwrap();
//! assert_eq!(my_struct, decoded);
//! ```
use {
    super::{SchemaRead, SchemaWrite},
    crate::{
        error::{sequence_length_mismatch, Result},
        io::{Reader, Writer},
        len::{SeqLen, U32Len},
    },
    core::marker::PhantomData,
};
#[cfg(target_endian = "little")]
use core::ptr;
#[cfg(feature = "alloc")]
use {
    super::{read_seq_len, size_of_elem_iter, write_elem_iter},
    alloc::{boxed::Box, collections, string::String as StdString, vec},
};

/// Indicates that the type is an element of a sequence, composable with [`containers`](self).
///
/// Prefer [`Pod`] for types representable as raw bytes.
pub struct Elem<T>(PhantomData<T>);

/// Indicates that the type is represented by raw bytes, composable with
/// sequence [`containers`](self) for a bulk read/write implementation.
///
/// On little-endian targets a `Pod` sequence is moved with a single byte
/// copy; on big-endian targets it falls back to per-element encoding so the
/// wire format stays identical.
///
/// Use [`Elem`] with [`containers`](self) that aren't comprised of trivial
/// elements.
pub struct Pod<T>(PhantomData<T>);

/// Marker for types whose in-memory byte image on a little-endian target is
/// exactly their encoding.
///
/// # Safety
///
/// Implementors must be `Copy`, free of padding and pointers, valid for any
/// bit pattern, and encode as exactly `size_of::<Self>()` bytes.
pub unsafe trait Trivial: Copy {}

unsafe impl Trivial for u8 {}
unsafe impl Trivial for i8 {}
unsafe impl Trivial for u16 {}
unsafe impl Trivial for i16 {}
unsafe impl Trivial for u32 {}
unsafe impl Trivial for i32 {}
unsafe impl Trivial for u64 {}
unsafe impl Trivial for i64 {}
unsafe impl Trivial for u128 {}
unsafe impl Trivial for i128 {}
unsafe impl Trivial for f32 {}
unsafe impl Trivial for f64 {}
unsafe impl<T: Trivial, const N: usize> Trivial for [T; N] {}

#[inline(always)]
fn write_pod_slice<T>(writer: &mut impl Writer, src: &[T]) -> Result<()>
where
    T: Trivial + SchemaWrite<Src = T>,
{
    #[cfg(target_endian = "little")]
    {
        // SAFETY: `Trivial` guarantees a padding-free byte image that
        // matches the wire encoding on little-endian targets.
        let bytes =
            unsafe { core::slice::from_raw_parts(src.as_ptr().cast::<u8>(), size_of_val(src)) };
        writer.write(bytes)
    }
    #[cfg(target_endian = "big")]
    {
        for item in src {
            T::write(writer, item)?;
        }
        Ok(())
    }
}

impl<T> SchemaWrite for Pod<T>
where
    T: Trivial + SchemaWrite<Src = T>,
{
    type Src = T;

    #[inline]
    fn size_of(_src: &Self::Src) -> Result<usize> {
        Ok(size_of::<T>())
    }

    #[inline(always)]
    fn write(writer: &mut impl Writer, src: &Self::Src) -> Result<()> {
        write_pod_slice(writer, core::slice::from_ref(src))
    }
}

impl<T> SchemaRead for Pod<T>
where
    T: Trivial + SchemaRead<Dst = T>,
{
    type Dst = T;

    #[inline(always)]
    fn read(reader: &mut Reader<'_>) -> Result<Self::Dst> {
        #[cfg(target_endian = "little")]
        {
            let bytes = reader.take(size_of::<T>())?;
            // SAFETY: `Trivial` guarantees any byte pattern is a valid `T`;
            // the read is unaligned-safe.
            Ok(unsafe { ptr::read_unaligned(bytes.as_ptr().cast::<T>()) })
        }
        #[cfg(target_endian = "big")]
        {
            T::read(reader)
        }
    }
}

/// A [`Vec`](alloc::vec::Vec) with a customizable length encoding and
/// bulk read/write implementation for [`Pod`].
#[cfg(feature = "alloc")]
pub struct Vec<T, Len = U32Len>(PhantomData<Len>, PhantomData<T>);

/// A [`VecDeque`](alloc::collections::VecDeque) with a customizable length
/// encoding and bulk read/write implementation for [`Pod`].
#[cfg(feature = "alloc")]
pub struct VecDeque<T, Len = U32Len>(PhantomData<Len>, PhantomData<T>);

/// A [`Box<[T]>`](alloc::boxed::Box) with a customizable length encoding
/// and bulk read/write implementation for [`Pod`].
#[cfg(feature = "alloc")]
pub struct BoxedSlice<T, Len = U32Len>(PhantomData<Len>, PhantomData<T>);

/// A [`String`](alloc::string::String) with a customizable length encoding.
#[cfg(feature = "alloc")]
pub struct String<Len = U32Len>(PhantomData<Len>);

/// A length-prefixed `[T; N]`.
///
/// Unlike the bare `[T; N]` schema, which writes elements with no prefix,
/// this wrapper carries the element count on the wire and fails to decode
/// unless the count equals `N`.
pub struct Array<T, const N: usize, Len = U32Len>(PhantomData<Len>, PhantomData<T>);

#[cfg(feature = "alloc")]
impl<T, Len> SchemaWrite for Vec<Elem<T>, Len>
where
    Len: SeqLen,
    T: SchemaWrite,
    T::Src: Sized,
{
    type Src = vec::Vec<T::Src>;

    #[inline(always)]
    fn size_of(src: &Self::Src) -> Result<usize> {
        size_of_elem_iter::<T, Len>(src.iter())
    }

    #[inline(always)]
    fn write(writer: &mut impl Writer, src: &Self::Src) -> Result<()> {
        write_elem_iter::<T, Len>(writer, src.iter())
    }
}

#[cfg(feature = "alloc")]
impl<T, Len> SchemaRead for Vec<Elem<T>, Len>
where
    Len: SeqLen,
    T: SchemaRead,
{
    type Dst = vec::Vec<T::Dst>;

    fn read(reader: &mut Reader<'_>) -> Result<Self::Dst> {
        let len = read_seq_len::<T::Dst, Len>(reader)?;
        let mut vec = vec::Vec::with_capacity(len);
        for _ in 0..len {
            vec.push(T::read(reader)?);
        }
        Ok(vec)
    }
}

#[cfg(feature = "alloc")]
impl<T, Len> SchemaWrite for Vec<Pod<T>, Len>
where
    Len: SeqLen,
    T: Trivial + SchemaWrite<Src = T>,
{
    type Src = vec::Vec<T>;

    #[inline]
    fn size_of(src: &Self::Src) -> Result<usize> {
        Ok(Len::bytes_needed(src.len())? + size_of_val(src.as_slice()))
    }

    #[inline]
    fn write(writer: &mut impl Writer, src: &Self::Src) -> Result<()> {
        Len::encode_len(writer, src.len())?;
        write_pod_slice(writer, src.as_slice())
    }
}

#[cfg(feature = "alloc")]
impl<T, Len> SchemaRead for Vec<Pod<T>, Len>
where
    Len: SeqLen,
    T: Trivial + SchemaRead<Dst = T>,
{
    type Dst = vec::Vec<T>;

    fn read(reader: &mut Reader<'_>) -> Result<Self::Dst> {
        let len = Len::size_hint_cautious::<T>(reader)?;
        #[cfg(target_endian = "little")]
        {
            // `size_hint_cautious` already proved this cannot overflow.
            let byte_len = len * size_of::<T>();
            // Bound the allocation by the input before reserving anything.
            let bytes = reader.take(byte_len)?;
            let mut vec = vec::Vec::<T>::with_capacity(len);
            // SAFETY: `Trivial` guarantees `T` is initialized by raw byte
            // reads; `bytes` holds exactly `len` elements and the fresh
            // allocation cannot overlap the source buffer.
            unsafe {
                ptr::copy_nonoverlapping(bytes.as_ptr(), vec.as_mut_ptr().cast::<u8>(), byte_len);
                vec.set_len(len);
            }
            Ok(vec)
        }
        #[cfg(target_endian = "big")]
        {
            if len > reader.remaining() {
                return Err(crate::error::read_size_limit(len));
            }
            let mut vec = vec::Vec::with_capacity(len);
            for _ in 0..len {
                vec.push(T::read(reader)?);
            }
            Ok(vec)
        }
    }
}

#[cfg(feature = "alloc")]
impl<T, Len> SchemaWrite for VecDeque<Elem<T>, Len>
where
    Len: SeqLen,
    T: SchemaWrite,
    T::Src: Sized,
{
    type Src = collections::VecDeque<T::Src>;

    #[inline(always)]
    fn size_of(src: &Self::Src) -> Result<usize> {
        size_of_elem_iter::<T, Len>(src.iter())
    }

    #[inline(always)]
    fn write(writer: &mut impl Writer, src: &Self::Src) -> Result<()> {
        write_elem_iter::<T, Len>(writer, src.iter())
    }
}

#[cfg(feature = "alloc")]
impl<T, Len> SchemaRead for VecDeque<Elem<T>, Len>
where
    Len: SeqLen,
    T: SchemaRead,
{
    type Dst = collections::VecDeque<T::Dst>;

    #[inline(always)]
    fn read(reader: &mut Reader<'_>) -> Result<Self::Dst> {
        // Leverage the `Vec` impl; `From<Vec<T>>` for `VecDeque<T>` is
        // basically free.
        Ok(<Vec<Elem<T>, Len>>::read(reader)?.into())
    }
}

#[cfg(feature = "alloc")]
impl<T, Len> SchemaWrite for VecDeque<Pod<T>, Len>
where
    Len: SeqLen,
    T: Trivial + SchemaWrite<Src = T>,
{
    type Src = collections::VecDeque<T>;

    #[inline(always)]
    fn size_of(src: &Self::Src) -> Result<usize> {
        Ok(Len::bytes_needed(src.len())? + size_of::<T>() * src.len())
    }

    #[inline(always)]
    fn write(writer: &mut impl Writer, src: &Self::Src) -> Result<()> {
        Len::encode_len(writer, src.len())?;
        let (front, back) = src.as_slices();
        write_pod_slice(writer, front)?;
        write_pod_slice(writer, back)
    }
}

#[cfg(feature = "alloc")]
impl<T, Len> SchemaRead for VecDeque<Pod<T>, Len>
where
    Len: SeqLen,
    T: Trivial + SchemaRead<Dst = T>,
{
    type Dst = collections::VecDeque<T>;

    #[inline(always)]
    fn read(reader: &mut Reader<'_>) -> Result<Self::Dst> {
        Ok(<Vec<Pod<T>, Len>>::read(reader)?.into())
    }
}

#[cfg(feature = "alloc")]
impl<T, Len> SchemaWrite for BoxedSlice<Elem<T>, Len>
where
    Len: SeqLen,
    T: SchemaWrite,
    T::Src: Sized,
{
    type Src = Box<[T::Src]>;

    #[inline(always)]
    fn size_of(src: &Self::Src) -> Result<usize> {
        size_of_elem_iter::<T, Len>(src.iter())
    }

    #[inline(always)]
    fn write(writer: &mut impl Writer, src: &Self::Src) -> Result<()> {
        write_elem_iter::<T, Len>(writer, src.iter())
    }
}

#[cfg(feature = "alloc")]
impl<T, Len> SchemaRead for BoxedSlice<Elem<T>, Len>
where
    Len: SeqLen,
    T: SchemaRead,
{
    type Dst = Box<[T::Dst]>;

    #[inline(always)]
    fn read(reader: &mut Reader<'_>) -> Result<Self::Dst> {
        Ok(<Vec<Elem<T>, Len>>::read(reader)?.into_boxed_slice())
    }
}

#[cfg(feature = "alloc")]
impl<T, Len> SchemaWrite for BoxedSlice<Pod<T>, Len>
where
    Len: SeqLen,
    T: Trivial + SchemaWrite<Src = T>,
{
    type Src = Box<[T]>;

    #[inline]
    fn size_of(src: &Self::Src) -> Result<usize> {
        Ok(Len::bytes_needed(src.len())? + size_of_val(&src[..]))
    }

    #[inline]
    fn write(writer: &mut impl Writer, src: &Self::Src) -> Result<()> {
        Len::encode_len(writer, src.len())?;
        write_pod_slice(writer, src)
    }
}

#[cfg(feature = "alloc")]
impl<T, Len> SchemaRead for BoxedSlice<Pod<T>, Len>
where
    Len: SeqLen,
    T: Trivial + SchemaRead<Dst = T>,
{
    type Dst = Box<[T]>;

    #[inline(always)]
    fn read(reader: &mut Reader<'_>) -> Result<Self::Dst> {
        Ok(<Vec<Pod<T>, Len>>::read(reader)?.into_boxed_slice())
    }
}

#[cfg(feature = "alloc")]
impl<Len: SeqLen> SchemaWrite for String<Len> {
    type Src = StdString;

    #[inline]
    fn size_of(src: &Self::Src) -> Result<usize> {
        Ok(Len::bytes_needed(src.len())? + src.len())
    }

    #[inline]
    fn write(writer: &mut impl Writer, src: &Self::Src) -> Result<()> {
        Len::encode_len(writer, src.len())?;
        writer.write(src.as_bytes())
    }
}

#[cfg(feature = "alloc")]
impl<Len: SeqLen> SchemaRead for String<Len> {
    type Dst = StdString;

    #[inline]
    fn read(reader: &mut Reader<'_>) -> Result<Self::Dst> {
        let len = read_seq_len::<u8, Len>(reader)?;
        let bytes = reader.take(len)?;
        let str = core::str::from_utf8(bytes).map_err(crate::error::invalid_utf8_encoding)?;
        Ok(str.into())
    }
}

impl<T, const N: usize, Len> SchemaWrite for Array<T, N, Len>
where
    Len: SeqLen,
    T: SchemaWrite,
    T::Src: Sized,
{
    type Src = [T::Src; N];

    #[inline]
    fn size_of(src: &Self::Src) -> Result<usize> {
        Ok(Len::bytes_needed(N)? + <[T; N]>::size_of(src)?)
    }

    #[inline]
    fn write(writer: &mut impl Writer, src: &Self::Src) -> Result<()> {
        Len::encode_len(writer, N)?;
        <[T; N]>::write(writer, src)
    }
}

impl<T, const N: usize, Len> SchemaRead for Array<T, N, Len>
where
    Len: SeqLen,
    T: SchemaRead,
{
    type Dst = [T::Dst; N];

    fn read(reader: &mut Reader<'_>) -> Result<Self::Dst> {
        let len = Len::size_hint(reader)?;
        if len != N {
            return Err(sequence_length_mismatch(N, len));
        }
        <[T; N]>::read(reader)
    }
}
