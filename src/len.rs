//! Support for heterogenous sequence length encoding.
use crate::{
    error::{preallocation_size_limit, size_hint_overflow, Result},
    io::{Reader, Writer},
};

/// Behavior to support heterogenous sequence length encoding.
///
/// Length and count prefixes are written with a fixed width chosen at
/// compile time. Both sides of a connection must agree on the width; a
/// mismatch is a wire-format mismatch, not a recoverable error.
pub trait SeqLen {
    /// Number of bytes an encoded length occupies.
    const WIDTH: usize;
    /// Largest length this encoding can represent.
    const MAX_LEN: usize;

    /// Read the length of a sequence from the reader.
    fn size_hint(reader: &mut Reader<'_>) -> Result<usize>;

    /// Get the length of a sequence from the reader, potentially
    /// returning an error if some length condition is not met
    /// (e.g., size constraints, overflow, etc.).
    #[inline(always)]
    fn size_hint_cautious<T>(reader: &mut Reader<'_>) -> Result<usize> {
        Self::size_hint(reader)
    }

    /// Write the length of a sequence to the writer.
    fn encode_len(writer: &mut impl Writer, len: usize) -> Result<()>;

    /// Calculate the number of bytes needed to encode the given length.
    fn bytes_needed(len: usize) -> Result<usize>;
}

const DEFAULT_PREALLOC_LIMIT: usize = 4 << 20; // 4 MiB

macro_rules! impl_seq_len {
    ($(#[$doc:meta])* $name:ident, $int:ty, $max_name:literal) => {
        $(#[$doc])*
        ///
        /// The `LIMIT` constant bounds the preallocation size (in bytes) for
        /// heap allocated structures, as a precaution against malicious
        /// input causing OOM. The default is 4 MiB.
        pub struct $name<const LIMIT: usize = DEFAULT_PREALLOC_LIMIT>;

        impl<const LIMIT: usize> SeqLen for $name<LIMIT> {
            const WIDTH: usize = size_of::<$int>();
            const MAX_LEN: usize = <$int>::MAX as usize;

            #[inline(always)]
            fn size_hint(reader: &mut Reader<'_>) -> Result<usize> {
                Ok(<$int>::from_le_bytes(reader.read_array()?) as usize)
            }

            #[inline(always)]
            fn size_hint_cautious<T>(reader: &mut Reader<'_>) -> Result<usize> {
                let len = Self::size_hint(reader)?;
                let needed = len
                    .checked_mul(size_of::<T>())
                    .ok_or_else(|| size_hint_overflow("usize::MAX"))?;
                if needed > LIMIT {
                    return Err(preallocation_size_limit(needed, LIMIT));
                }
                Ok(len)
            }

            #[inline(always)]
            fn encode_len(writer: &mut impl Writer, len: usize) -> Result<()> {
                if len > Self::MAX_LEN {
                    return Err(size_hint_overflow($max_name));
                }
                writer.write(&(len as $int).to_le_bytes())
            }

            #[inline(always)]
            fn bytes_needed(len: usize) -> Result<usize> {
                if len > Self::MAX_LEN {
                    return Err(size_hint_overflow($max_name));
                }
                Ok(Self::WIDTH)
            }
        }
    };
}

impl_seq_len!(
    /// [`SeqLen`] encoding lengths as little-endian `u16`.
    U16Len,
    u16,
    "u16::MAX"
);
impl_seq_len!(
    /// [`SeqLen`] encoding lengths as little-endian `u32`.
    ///
    /// This is the crate-wide default for container prefixes.
    U32Len,
    u32,
    "u32::MAX"
);

#[cfg(all(test, feature = "alloc"))]
mod tests {
    use {super::*, crate::error::Error, alloc::vec::Vec};

    #[test]
    fn u32_len_round_trip() {
        let mut buf = Vec::new();
        <U32Len>::encode_len(&mut buf, 0x0102_0304).unwrap();
        assert_eq!(buf, [0x04, 0x03, 0x02, 0x01]);
        let mut reader = Reader::new(&buf);
        assert_eq!(<U32Len>::size_hint(&mut reader).unwrap(), 0x0102_0304);
    }

    #[test]
    fn u16_len_round_trip() {
        let mut buf = Vec::new();
        <U16Len>::encode_len(&mut buf, 0xABCD).unwrap();
        assert_eq!(buf, [0xCD, 0xAB]);
        let mut reader = Reader::new(&buf);
        assert_eq!(<U16Len>::size_hint(&mut reader).unwrap(), 0xABCD);
    }

    #[test]
    fn u16_len_rejects_oversized() {
        let mut buf = Vec::new();
        assert!(matches!(
            <U16Len>::encode_len(&mut buf, 0x1_0000),
            Err(Error::SizeHintOverflow("u16::MAX"))
        ));
        assert!(buf.is_empty());
    }

    #[test]
    fn cautious_hint_enforces_preallocation_limit() {
        let mut buf = Vec::new();
        <U32Len>::encode_len(&mut buf, 1 << 20).unwrap();
        let mut reader = Reader::new(&buf);
        // 1 Mi u64 elements would preallocate 8 MiB against a 1 MiB limit.
        assert!(matches!(
            <U32Len<{ 1 << 20 }>>::size_hint_cautious::<u64>(&mut reader),
            Err(Error::PreallocationSizeLimit { .. })
        ));
    }

    #[test]
    fn cautious_hint_allows_small_sequences() {
        let mut buf = Vec::new();
        <U32Len>::encode_len(&mut buf, 128).unwrap();
        let mut reader = Reader::new(&buf);
        assert_eq!(<U32Len>::size_hint_cautious::<u64>(&mut reader).unwrap(), 128);
    }
}
