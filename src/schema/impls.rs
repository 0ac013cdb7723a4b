//! Shape rules for built-in types.
//!
//! The blanket sequence implementations must stay fully general (we need to
//! support `Vec<T>` for any schema `T`), so elements are encoded one at a
//! time and the default `U32Len` prefix is assumed. Fields that want the
//! bulk byte-copy treatment or a different prefix width opt in through the
//! [`containers`](super::containers) wrappers.
#[cfg(feature = "alloc")]
use {
    super::{
        containers::{self, Elem},
        read_seq_len,
    },
    alloc::{
        boxed::Box,
        collections::{BTreeMap, BTreeSet, VecDeque},
        string::{String, ToString},
        vec::Vec,
    },
    crate::error::invalid_utf8_encoding,
};
#[cfg(feature = "std")]
use {
    core::hash::Hash,
    std::collections::{HashMap, HashSet},
};
use {
    super::{size_of_elem_iter, write_elem_iter, SchemaRead, SchemaWrite},
    crate::{
        error::{
            invalid_bool_encoding, invalid_duration_encoding, invalid_tag_encoding,
            pointer_sized_decode_error, Error, Result,
        },
        io::{Reader, Writer},
        len::{SeqLen, U32Len},
    },
    core::{mem::MaybeUninit, ptr, time::Duration},
};

macro_rules! impl_trivial {
    ($type:ty) => {
        impl SchemaWrite for $type {
            type Src = $type;

            #[inline(always)]
            fn size_of(_src: &Self::Src) -> Result<usize> {
                Ok(size_of::<$type>())
            }

            #[inline(always)]
            fn write(writer: &mut impl Writer, src: &Self::Src) -> Result<()> {
                writer.write(&src.to_le_bytes())
            }
        }

        impl SchemaRead for $type {
            type Dst = $type;

            #[inline(always)]
            fn read(reader: &mut Reader<'_>) -> Result<Self::Dst> {
                Ok(<$type>::from_le_bytes(reader.read_array()?))
            }
        }
    };

    ($type:ty as $cast:ty) => {
        impl SchemaWrite for $type {
            type Src = $type;

            #[inline]
            fn size_of(_src: &Self::Src) -> Result<usize> {
                Ok(size_of::<$cast>())
            }

            #[inline]
            fn write(writer: &mut impl Writer, src: &Self::Src) -> Result<()> {
                writer.write(&(*src as $cast).to_le_bytes())
            }
        }

        impl SchemaRead for $type {
            type Dst = $type;

            #[inline]
            fn read(reader: &mut Reader<'_>) -> Result<Self::Dst> {
                let casted = <$cast>::from_le_bytes(reader.read_array()?);
                casted
                    .try_into()
                    .map_err(|_| pointer_sized_decode_error())
            }
        }
    };
}

impl_trivial!(u8);
impl_trivial!(i8);
impl_trivial!(u16);
impl_trivial!(i16);
impl_trivial!(u32);
impl_trivial!(i32);
impl_trivial!(u64);
impl_trivial!(i64);
impl_trivial!(u128);
impl_trivial!(i128);
impl_trivial!(f32);
impl_trivial!(f64);
impl_trivial!(usize as u64);
impl_trivial!(isize as i64);

impl SchemaWrite for bool {
    type Src = bool;

    #[inline]
    fn size_of(_src: &Self::Src) -> Result<usize> {
        Ok(size_of::<u8>())
    }

    #[inline]
    fn write(writer: &mut impl Writer, src: &Self::Src) -> Result<()> {
        u8::write(writer, &(*src as u8))
    }
}

impl SchemaRead for bool {
    type Dst = bool;

    #[inline]
    fn read(reader: &mut Reader<'_>) -> Result<Self::Dst> {
        match reader.read_byte()? {
            0 => Ok(false),
            1 => Ok(true),
            byte => Err(invalid_bool_encoding(byte)),
        }
    }
}

impl<T> SchemaWrite for Option<T>
where
    T: SchemaWrite,
    T::Src: Sized,
{
    type Src = Option<T::Src>;

    #[inline]
    fn size_of(src: &Self::Src) -> Result<usize> {
        match src {
            Some(value) => Ok(1 + T::size_of(value)?),
            None => Ok(1),
        }
    }

    #[inline]
    fn write(writer: &mut impl Writer, src: &Self::Src) -> Result<()> {
        match src {
            Some(value) => {
                u8::write(writer, &1)?;
                T::write(writer, value)
            }
            None => u8::write(writer, &0),
        }
    }
}

impl<T> SchemaRead for Option<T>
where
    T: SchemaRead,
{
    type Dst = Option<T::Dst>;

    #[inline]
    fn read(reader: &mut Reader<'_>) -> Result<Self::Dst> {
        match reader.read_byte()? {
            0 => Ok(None),
            1 => Ok(Some(T::read(reader)?)),
            flag => Err(invalid_tag_encoding(flag as usize)),
        }
    }
}

/// Durations are encoded as whole seconds (`u64`) followed by the
/// subsecond nanoseconds (`u32`); a nanosecond field of one second or more
/// is rejected.
impl SchemaWrite for Duration {
    type Src = Duration;

    #[inline]
    fn size_of(_src: &Self::Src) -> Result<usize> {
        Ok(size_of::<u64>() + size_of::<u32>())
    }

    #[inline]
    fn write(writer: &mut impl Writer, src: &Self::Src) -> Result<()> {
        u64::write(writer, &src.as_secs())?;
        u32::write(writer, &src.subsec_nanos())
    }
}

impl SchemaRead for Duration {
    type Dst = Duration;

    #[inline]
    fn read(reader: &mut Reader<'_>) -> Result<Self::Dst> {
        const NANOS_PER_SEC: u32 = 1_000_000_000;
        let secs = u64::read(reader)?;
        let nanos = u32::read(reader)?;
        if nanos >= NANOS_PER_SEC {
            return Err(invalid_duration_encoding(nanos));
        }
        Ok(Duration::new(secs, nanos))
    }
}

impl<'a, T> SchemaWrite for &'a T
where
    T: SchemaWrite,
{
    type Src = &'a T::Src;

    #[inline]
    fn size_of(src: &Self::Src) -> Result<usize> {
        T::size_of(src)
    }

    #[inline]
    fn write(writer: &mut impl Writer, src: &Self::Src) -> Result<()> {
        T::write(writer, src)
    }
}

impl<T> SchemaWrite for [T]
where
    T: SchemaWrite,
    T::Src: Sized,
{
    type Src = [T::Src];

    #[inline]
    fn size_of(src: &Self::Src) -> Result<usize> {
        size_of_elem_iter::<T, U32Len>(src.iter())
    }

    #[inline]
    fn write(writer: &mut impl Writer, src: &Self::Src) -> Result<()> {
        write_elem_iter::<T, U32Len>(writer, src.iter())
    }
}

impl<T, const N: usize> SchemaWrite for [T; N]
where
    T: SchemaWrite,
    T::Src: Sized,
{
    type Src = [T::Src; N];

    #[inline]
    fn size_of(src: &Self::Src) -> Result<usize> {
        src.iter()
            .map(T::size_of)
            .try_fold(0, |acc, x| Ok::<_, Error>(acc + x?))
    }

    #[inline]
    fn write(writer: &mut impl Writer, src: &Self::Src) -> Result<()> {
        for item in src {
            T::write(writer, item)?;
        }
        Ok(())
    }
}

impl<T, const N: usize> SchemaRead for [T; N]
where
    T: SchemaRead,
{
    type Dst = [T::Dst; N];

    fn read(reader: &mut Reader<'_>) -> Result<Self::Dst> {
        let mut dst: [MaybeUninit<T::Dst>; N] = [const { MaybeUninit::uninit() }; N];
        for (i, slot) in dst.iter_mut().enumerate() {
            match T::read(reader) {
                Ok(value) => {
                    slot.write(value);
                }
                Err(e) => {
                    // SAFETY: the first `i` slots were initialized above.
                    for slot in &mut dst[..i] {
                        unsafe { slot.assume_init_drop() };
                    }
                    return Err(e);
                }
            }
        }
        // SAFETY: every slot was initialized; `MaybeUninit<T>` has the same
        // layout as `T` and does not drop, so reading the array out moves
        // the elements exactly once.
        Ok(unsafe { ptr::read(dst.as_ptr().cast::<[T::Dst; N]>()) })
    }
}

impl SchemaWrite for str {
    type Src = str;

    #[inline]
    fn size_of(src: &Self::Src) -> Result<usize> {
        Ok(<U32Len>::bytes_needed(src.len())? + src.len())
    }

    #[inline]
    fn write(writer: &mut impl Writer, src: &Self::Src) -> Result<()> {
        <U32Len>::encode_len(writer, src.len())?;
        writer.write(src.as_bytes())
    }
}

#[cfg(feature = "alloc")]
impl SchemaWrite for String {
    type Src = String;

    #[inline]
    fn size_of(src: &Self::Src) -> Result<usize> {
        str::size_of(src)
    }

    #[inline]
    fn write(writer: &mut impl Writer, src: &Self::Src) -> Result<()> {
        str::write(writer, src)
    }
}

#[cfg(feature = "alloc")]
impl SchemaRead for String {
    type Dst = String;

    #[inline]
    fn read(reader: &mut Reader<'_>) -> Result<Self::Dst> {
        let len = read_seq_len::<u8, U32Len>(reader)?;
        let bytes = reader.take(len)?;
        let str = core::str::from_utf8(bytes).map_err(invalid_utf8_encoding)?;
        Ok(str.to_string())
    }
}

#[cfg(feature = "alloc")]
impl<T> SchemaWrite for Vec<T>
where
    T: SchemaWrite,
    T::Src: Sized,
{
    type Src = Vec<T::Src>;

    #[inline]
    fn size_of(src: &Self::Src) -> Result<usize> {
        <containers::Vec<Elem<T>, U32Len>>::size_of(src)
    }

    #[inline]
    fn write(writer: &mut impl Writer, src: &Self::Src) -> Result<()> {
        <containers::Vec<Elem<T>, U32Len>>::write(writer, src)
    }
}

#[cfg(feature = "alloc")]
impl<T> SchemaRead for Vec<T>
where
    T: SchemaRead,
{
    type Dst = Vec<T::Dst>;

    #[inline]
    fn read(reader: &mut Reader<'_>) -> Result<Self::Dst> {
        <containers::Vec<Elem<T>, U32Len>>::read(reader)
    }
}

#[cfg(feature = "alloc")]
impl<T> SchemaWrite for VecDeque<T>
where
    T: SchemaWrite,
    T::Src: Sized,
{
    type Src = VecDeque<T::Src>;

    #[inline]
    fn size_of(src: &Self::Src) -> Result<usize> {
        <containers::VecDeque<Elem<T>, U32Len>>::size_of(src)
    }

    #[inline]
    fn write(writer: &mut impl Writer, src: &Self::Src) -> Result<()> {
        <containers::VecDeque<Elem<T>, U32Len>>::write(writer, src)
    }
}

#[cfg(feature = "alloc")]
impl<T> SchemaRead for VecDeque<T>
where
    T: SchemaRead,
{
    type Dst = VecDeque<T::Dst>;

    #[inline]
    fn read(reader: &mut Reader<'_>) -> Result<Self::Dst> {
        <containers::VecDeque<Elem<T>, U32Len>>::read(reader)
    }
}

#[cfg(feature = "alloc")]
impl<T> SchemaWrite for Box<T>
where
    T: SchemaWrite,
{
    type Src = Box<T::Src>;

    #[inline]
    fn size_of(src: &Self::Src) -> Result<usize> {
        T::size_of(src)
    }

    #[inline]
    fn write(writer: &mut impl Writer, src: &Self::Src) -> Result<()> {
        T::write(writer, src)
    }
}

#[cfg(feature = "alloc")]
impl<T> SchemaRead for Box<T>
where
    T: SchemaRead,
{
    type Dst = Box<T::Dst>;

    #[inline]
    fn read(reader: &mut Reader<'_>) -> Result<Self::Dst> {
        Ok(Box::new(T::read(reader)?))
    }
}

#[cfg(feature = "alloc")]
impl<T> SchemaWrite for Box<[T]>
where
    T: SchemaWrite,
    T::Src: Sized,
{
    type Src = Box<[T::Src]>;

    #[inline]
    fn size_of(src: &Self::Src) -> Result<usize> {
        <containers::BoxedSlice<Elem<T>, U32Len>>::size_of(src)
    }

    #[inline]
    fn write(writer: &mut impl Writer, src: &Self::Src) -> Result<()> {
        <containers::BoxedSlice<Elem<T>, U32Len>>::write(writer, src)
    }
}

#[cfg(feature = "alloc")]
impl<T> SchemaRead for Box<[T]>
where
    T: SchemaRead,
{
    type Dst = Box<[T::Dst]>;

    #[inline]
    fn read(reader: &mut Reader<'_>) -> Result<Self::Dst> {
        <containers::BoxedSlice<Elem<T>, U32Len>>::read(reader)
    }
}

#[cfg(feature = "alloc")]
impl<K, V> SchemaWrite for BTreeMap<K, V>
where
    K: SchemaWrite,
    K::Src: Sized,
    V: SchemaWrite,
    V::Src: Sized,
{
    type Src = BTreeMap<K::Src, V::Src>;

    #[inline]
    fn size_of(src: &Self::Src) -> Result<usize> {
        Ok(<U32Len>::bytes_needed(src.len())?
            + src.iter().try_fold(0usize, |acc, (k, v)| {
                Ok::<_, Error>(acc + K::size_of(k)? + V::size_of(v)?)
            })?)
    }

    fn write(writer: &mut impl Writer, src: &Self::Src) -> Result<()> {
        <U32Len>::encode_len(writer, src.len())?;
        for (k, v) in src {
            K::write(writer, k)?;
            V::write(writer, v)?;
        }
        Ok(())
    }
}

#[cfg(feature = "alloc")]
impl<K, V> SchemaRead for BTreeMap<K, V>
where
    K: SchemaRead,
    K::Dst: Ord,
    V: SchemaRead,
{
    type Dst = BTreeMap<K::Dst, V::Dst>;

    fn read(reader: &mut Reader<'_>) -> Result<Self::Dst> {
        let len = read_seq_len::<(K::Dst, V::Dst), U32Len>(reader)?;
        let mut map = BTreeMap::new();
        for _ in 0..len {
            let key = K::read(reader)?;
            let value = V::read(reader)?;
            map.insert(key, value);
        }
        Ok(map)
    }
}

#[cfg(feature = "alloc")]
impl<K> SchemaWrite for BTreeSet<K>
where
    K: SchemaWrite,
    K::Src: Sized,
{
    type Src = BTreeSet<K::Src>;

    #[inline]
    fn size_of(src: &Self::Src) -> Result<usize> {
        size_of_elem_iter::<K, U32Len>(src.iter())
    }

    #[inline]
    fn write(writer: &mut impl Writer, src: &Self::Src) -> Result<()> {
        write_elem_iter::<K, U32Len>(writer, src.iter())
    }
}

#[cfg(feature = "alloc")]
impl<K> SchemaRead for BTreeSet<K>
where
    K: SchemaRead,
    K::Dst: Ord,
{
    type Dst = BTreeSet<K::Dst>;

    fn read(reader: &mut Reader<'_>) -> Result<Self::Dst> {
        let len = read_seq_len::<K::Dst, U32Len>(reader)?;
        let mut set = BTreeSet::new();
        for _ in 0..len {
            set.insert(K::read(reader)?);
        }
        Ok(set)
    }
}

#[cfg(feature = "std")]
impl<K, V> SchemaWrite for HashMap<K, V>
where
    K: SchemaWrite,
    K::Src: Sized,
    V: SchemaWrite,
    V::Src: Sized,
{
    type Src = HashMap<K::Src, V::Src>;

    #[inline]
    fn size_of(src: &Self::Src) -> Result<usize> {
        Ok(<U32Len>::bytes_needed(src.len())?
            + src.iter().try_fold(0usize, |acc, (k, v)| {
                Ok::<_, Error>(acc + K::size_of(k)? + V::size_of(v)?)
            })?)
    }

    fn write(writer: &mut impl Writer, src: &Self::Src) -> Result<()> {
        <U32Len>::encode_len(writer, src.len())?;
        for (k, v) in src {
            K::write(writer, k)?;
            V::write(writer, v)?;
        }
        Ok(())
    }
}

#[cfg(feature = "std")]
impl<K, V> SchemaRead for HashMap<K, V>
where
    K: SchemaRead,
    K::Dst: Hash + Eq,
    V: SchemaRead,
{
    type Dst = HashMap<K::Dst, V::Dst>;

    fn read(reader: &mut Reader<'_>) -> Result<Self::Dst> {
        let len = read_seq_len::<(K::Dst, V::Dst), U32Len>(reader)?;
        let mut map = HashMap::with_capacity(len);
        for _ in 0..len {
            let key = K::read(reader)?;
            let value = V::read(reader)?;
            map.insert(key, value);
        }
        Ok(map)
    }
}

#[cfg(feature = "std")]
impl<K> SchemaWrite for HashSet<K>
where
    K: SchemaWrite,
    K::Src: Sized,
{
    type Src = HashSet<K::Src>;

    #[inline]
    fn size_of(src: &Self::Src) -> Result<usize> {
        size_of_elem_iter::<K, U32Len>(src.iter())
    }

    #[inline]
    fn write(writer: &mut impl Writer, src: &Self::Src) -> Result<()> {
        write_elem_iter::<K, U32Len>(writer, src.iter())
    }
}

#[cfg(feature = "std")]
impl<K> SchemaRead for HashSet<K>
where
    K: SchemaRead,
    K::Dst: Hash + Eq,
{
    type Dst = HashSet<K::Dst>;

    fn read(reader: &mut Reader<'_>) -> Result<Self::Dst> {
        let len = read_seq_len::<K::Dst, U32Len>(reader)?;
        let mut set = HashSet::with_capacity(len);
        for _ in 0..len {
            set.insert(K::read(reader)?);
        }
        Ok(set)
    }
}

macro_rules! impl_tuple {
    ($($schema:ident: $field:tt),+) => {
        impl<$($schema),+> SchemaWrite for ($($schema),+)
        where
            $($schema: SchemaWrite),+,
            $($schema::Src: Sized),+
        {
            type Src = ($($schema::Src),+);

            #[inline]
            fn size_of(src: &Self::Src) -> Result<usize> {
                Ok(0 $(+ <$schema as SchemaWrite>::size_of(&src.$field)?)+)
            }

            #[inline]
            fn write(writer: &mut impl Writer, src: &Self::Src) -> Result<()> {
                $(<$schema as SchemaWrite>::write(writer, &src.$field)?;)+
                Ok(())
            }
        }

        impl<$($schema),+> SchemaRead for ($($schema),+)
        where
            $($schema: SchemaRead),+,
        {
            type Dst = ($($schema::Dst),+);

            #[inline]
            fn read(reader: &mut Reader<'_>) -> Result<Self::Dst> {
                Ok(($(<$schema as SchemaRead>::read(reader)?),+))
            }
        }
    };
}

impl_tuple! { A: 0, B: 1 }
impl_tuple! { A: 0, B: 1, C: 2 }
impl_tuple! { A: 0, B: 1, C: 2, D: 3 }
impl_tuple! { A: 0, B: 1, C: 2, D: 3, E: 4 }
impl_tuple! { A: 0, B: 1, C: 2, D: 3, E: 4, F: 5 }
impl_tuple! { A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6 }
impl_tuple! { A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7 }
impl_tuple! { A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7, I: 8 }
impl_tuple! { A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7, I: 8, J: 9 }
impl_tuple! { A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7, I: 8, J: 9, K: 10 }
impl_tuple! { A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7, I: 8, J: 9, K: 10, L: 11 }
impl_tuple! { A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7, I: 8, J: 9, K: 10, L: 11, M: 12 }
impl_tuple! { A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7, I: 8, J: 9, K: 10, L: 11, M: 12, N: 13 }
impl_tuple! { A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7, I: 8, J: 9, K: 10, L: 11, M: 12, N: 13, O: 14 }
impl_tuple! { A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7, I: 8, J: 9, K: 10, L: 11, M: 12, N: 13, O: 14, P: 15 }
