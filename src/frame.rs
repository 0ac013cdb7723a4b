//! Frame packaging and recovery.
//!
//! A frame wraps one encoded value so it can be located and validated
//! inside a raw byte stream:
//!
//! ```text
//! +----------------+-----------+-------------+--------------+-----------+
//! | PackageStart?  | BodySize  | HeaderCrc?  | <body bytes> | BodyCrc?  |
//! | (configured)   | (Len)     | (Crc width) | (BodySize -  | (Crc      |
//! |                |           |             |  Crc width)  |  width)   |
//! +----------------+-----------+-------------+--------------+-----------+
//! ```
//!
//! `BodySize` counts the body bytes plus the trailing body checksum. When a
//! header checksum is configured the body checksum covers the body bytes
//! only; otherwise it covers everything from the start marker up to (but
//! not including) the checksum itself.
//!
//! [`Packager::unpack`] scans for the next valid frame and recovers from
//! corrupted or fabricated prefixes by resynchronising: advancing a single
//! byte past a bad candidate and fast-forwarding to the next possible
//! start-marker byte. A corrupted prefix can therefore never mask a later
//! valid frame.
#[cfg(feature = "alloc")]
use {alloc::vec::Vec, crate::error::frame_size_limit};
use {
    crate::{
        error::Result,
        io::{Reader, Writer},
        len::SeqLen,
        schema::{SchemaRead, SchemaWrite},
    },
    core::marker::PhantomData,
};

/// Fixed-width integer carried by a [`Checksum`].
pub trait CrcValue: Copy + PartialEq {
    /// Encoded width in bytes.
    const SIZE: usize;
    /// Append the little-endian image of the value.
    fn write(self, writer: &mut impl Writer) -> Result<()>;
    /// Read a little-endian value.
    fn read(reader: &mut Reader<'_>) -> Result<Self>;
}

impl CrcValue for () {
    const SIZE: usize = 0;

    #[inline]
    fn write(self, _writer: &mut impl Writer) -> Result<()> {
        Ok(())
    }

    #[inline]
    fn read(_reader: &mut Reader<'_>) -> Result<Self> {
        Ok(())
    }
}

macro_rules! impl_crc_value {
    ($($int:ty),+) => {
        $(
            impl CrcValue for $int {
                const SIZE: usize = size_of::<$int>();

                #[inline]
                fn write(self, writer: &mut impl Writer) -> Result<()> {
                    writer.write(&self.to_le_bytes())
                }

                #[inline]
                fn read(reader: &mut Reader<'_>) -> Result<Self> {
                    Ok(<$int>::from_le_bytes(reader.read_array()?))
                }
            }
        )+
    };
}

impl_crc_value!(u8, u16, u32, u64);

/// User-supplied checksum over a contiguous byte range.
///
/// The function must be pure: the same input always yields the same value.
/// No other algorithmic properties are assumed.
pub trait Checksum {
    type Value: CrcValue;
    fn calc(data: &[u8]) -> Self::Value;
}

/// Disables frame checksums.
pub struct NoChecksum;

impl Checksum for NoChecksum {
    type Value = ();

    #[inline]
    fn calc(_data: &[u8]) -> Self::Value {}
}

/// Static, per-instantiation frame configuration.
///
/// Both peers must use the same configuration; it is part of the wire
/// format. Invalid combinations are rejected at compile time.
pub trait FrameConfig {
    /// Width of the body-size field.
    type Len: SeqLen;
    /// Frame checksum; [`NoChecksum`] disables validation.
    type Crc: Checksum;
    /// Protect the marker and size field with their own checksum. Requires
    /// a real checksum type.
    const HEADER_CRC: bool = false;
    /// Little-endian start-marker bytes. Empty disables the marker.
    const PACKAGE_START: &'static [u8] = &[];
    /// Upper bound on the body-size field, including the body checksum.
    /// Must be representable in [`Self::Len`].
    const MAX_SIZE: usize;
}

/// Decision of a single [`Packager::unpack`] call.
#[derive(Debug, PartialEq, Eq)]
pub enum Unpacked<T> {
    /// A frame was decoded. `consumed` bytes, any junk prefix included,
    /// may be discarded from the front of the input.
    Frame { value: T, consumed: usize },
    /// The input is too short to decide; retry once more bytes arrive.
    NeedMore,
}

/// Packs values into frames and recovers them from byte streams.
pub struct Packager<C>(PhantomData<C>);

impl<C: FrameConfig> Packager<C> {
    /// Width of the encoded start marker.
    pub const START_SIZE: usize = C::PACKAGE_START.len();
    /// Width of a checksum value (zero when checksums are disabled).
    pub const CRC_SIZE: usize = <<C::Crc as Checksum>::Value as CrcValue>::SIZE;
    /// Marker + size field + optional header checksum.
    pub const HEADER_SIZE: usize = Self::START_SIZE
        + <C::Len as SeqLen>::WIDTH
        + if C::HEADER_CRC { Self::CRC_SIZE } else { 0 };

    const CONFIG_OK: () = {
        assert!(
            !C::HEADER_CRC || Self::CRC_SIZE > 0,
            "header checksums require a checksum type"
        );
        assert!(
            C::MAX_SIZE <= <C::Len as SeqLen>::MAX_LEN,
            "MAX_SIZE must be representable in the size field"
        );
    };

    /// Append one frame carrying `value` to `buffer`.
    ///
    /// Fails if the encoded body (checksum included) would exceed
    /// [`FrameConfig::MAX_SIZE`], leaving `buffer` untouched in that case.
    #[cfg(feature = "alloc")]
    pub fn pack<T: SchemaWrite>(buffer: &mut Vec<u8>, value: &T::Src) -> Result<()> {
        let () = Self::CONFIG_OK;
        let body_len = T::size_of(value)?;
        let body_size = body_len + Self::CRC_SIZE;
        if body_size > C::MAX_SIZE {
            return Err(frame_size_limit(body_size, C::MAX_SIZE));
        }
        buffer.reserve(Self::HEADER_SIZE + body_size);

        let frame_start = buffer.len();
        buffer.extend_from_slice(C::PACKAGE_START);
        C::Len::encode_len(buffer, body_size)?;
        if C::HEADER_CRC {
            let crc = C::Crc::calc(&buffer[frame_start..]);
            crc.write(buffer)?;
        }

        let body_start = buffer.len();
        T::write(buffer, value)?;
        debug_assert_eq!(buffer.len() - body_start, body_len);

        if Self::CRC_SIZE > 0 {
            // The body checksum covers the body alone when the header has
            // its own checksum, and the whole frame so far otherwise.
            let covered = if C::HEADER_CRC {
                &buffer[body_start..]
            } else {
                &buffer[frame_start..]
            };
            let crc = C::Crc::calc(covered);
            crc.write(buffer)?;
        }
        Ok(())
    }

    /// Scan `buffer` for one frame, decode it, and report how many bytes
    /// may be discarded from the front.
    ///
    /// The input is never mutated and never read past its end, so repeated
    /// calls over the same bytes reach the same decision. Malformed
    /// candidates (bad marker, failed checksum, oversized or inconsistent
    /// size field, undecodable body) resynchronise; only a shortage of
    /// input yields [`Unpacked::NeedMore`].
    pub fn unpack<T: SchemaRead>(buffer: &[u8]) -> Unpacked<T::Dst> {
        let () = Self::CONFIG_OK;
        let mut offset = 0;
        loop {
            let input = &buffer[offset..];
            if input.len() < Self::HEADER_SIZE + Self::CRC_SIZE {
                return Unpacked::NeedMore;
            }

            if !C::PACKAGE_START.is_empty() && !input.starts_with(C::PACKAGE_START) {
                offset = Self::resync(buffer, offset);
                continue;
            }

            let mut header = Reader::new(&input[Self::START_SIZE..Self::HEADER_SIZE]);
            let Ok(body_size) = C::Len::size_hint(&mut header) else {
                return Unpacked::NeedMore;
            };

            if C::HEADER_CRC {
                let Ok(stored) = <<C::Crc as Checksum>::Value as CrcValue>::read(&mut header)
                else {
                    return Unpacked::NeedMore;
                };
                let covered = &input[..Self::START_SIZE + <C::Len as SeqLen>::WIDTH];
                if stored != C::Crc::calc(covered) {
                    offset = Self::resync(buffer, offset);
                    continue;
                }
            }

            if body_size > C::MAX_SIZE || body_size < Self::CRC_SIZE {
                offset = Self::resync(buffer, offset);
                continue;
            }

            let total = Self::HEADER_SIZE + body_size;
            if total > input.len() {
                return Unpacked::NeedMore;
            }

            let body_end = total - Self::CRC_SIZE;
            if Self::CRC_SIZE > 0 {
                let covered = if C::HEADER_CRC {
                    &input[Self::HEADER_SIZE..body_end]
                } else {
                    &input[..body_end]
                };
                let mut trailer = Reader::new(&input[body_end..total]);
                let Ok(stored) = <<C::Crc as Checksum>::Value as CrcValue>::read(&mut trailer)
                else {
                    return Unpacked::NeedMore;
                };
                if stored != C::Crc::calc(covered) {
                    offset = Self::resync(buffer, offset);
                    continue;
                }
            }

            let mut body = Reader::new(&input[Self::HEADER_SIZE..body_end]);
            match T::read(&mut body) {
                // The body must be consumed exactly; trailing bytes mean
                // the candidate was not a frame of `T`.
                Ok(value) if body.remaining() == 0 => {
                    return Unpacked::Frame {
                        value,
                        consumed: offset + total,
                    };
                }
                _ => offset = Self::resync(buffer, offset),
            }
        }
    }

    /// Advance one byte past a bad candidate, then fast-forward to the
    /// next byte that could begin a start marker.
    ///
    /// The single-byte step is what guarantees progress: an adversarial
    /// pattern can force rescans but can never mask a later valid frame.
    fn resync(buffer: &[u8], offset: usize) -> usize {
        let offset = offset + 1;
        if C::PACKAGE_START.is_empty() || offset >= buffer.len() {
            return offset;
        }
        let lead = C::PACKAGE_START[0];
        match buffer[offset..].iter().position(|&b| b == lead) {
            Some(found) => offset + found,
            None => buffer.len(),
        }
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use {
        super::*,
        crate::{
            describe,
            len::{U16Len, U32Len},
        },
        proptest::prelude::*,
    };

    /// Additive checksum, deliberately simple: the packager only requires
    /// purity, not error-detection strength.
    struct SumCrc;

    impl Checksum for SumCrc {
        type Value = u32;

        fn calc(data: &[u8]) -> u32 {
            data.iter().fold(0u32, |acc, &b| acc.wrapping_add(b as u32))
        }
    }

    // 0xABCD, little-endian.
    const START: &[u8] = &[0xCD, 0xAB];

    struct Minimal;
    impl FrameConfig for Minimal {
        type Len = U32Len;
        type Crc = NoChecksum;
        const MAX_SIZE: usize = 1000;
    }

    struct MarkerOnly;
    impl FrameConfig for MarkerOnly {
        type Len = U32Len;
        type Crc = NoChecksum;
        const PACKAGE_START: &'static [u8] = START;
        const MAX_SIZE: usize = 1000;
    }

    struct CrcOnly;
    impl FrameConfig for CrcOnly {
        type Len = U32Len;
        type Crc = SumCrc;
        const MAX_SIZE: usize = 1000;
    }

    struct CrcWithHeader;
    impl FrameConfig for CrcWithHeader {
        type Len = U32Len;
        type Crc = SumCrc;
        const HEADER_CRC: bool = true;
        const MAX_SIZE: usize = 1000;
    }

    struct Full;
    impl FrameConfig for Full {
        type Len = U32Len;
        type Crc = SumCrc;
        const HEADER_CRC: bool = true;
        const PACKAGE_START: &'static [u8] = START;
        const MAX_SIZE: usize = 1000;
    }

    struct FullNoHeaderCrc;
    impl FrameConfig for FullNoHeaderCrc {
        type Len = U32Len;
        type Crc = SumCrc;
        const PACKAGE_START: &'static [u8] = START;
        const MAX_SIZE: usize = 1000;
    }

    struct ShortLen;
    impl FrameConfig for ShortLen {
        type Len = U16Len;
        type Crc = SumCrc;
        const HEADER_CRC: bool = true;
        const PACKAGE_START: &'static [u8] = START;
        const MAX_SIZE: usize = 512;
    }

    struct Tiny;
    impl FrameConfig for Tiny {
        type Len = U32Len;
        type Crc = NoChecksum;
        const MAX_SIZE: usize = 8;
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Primitive {
        a: i8,
        b: i16,
        c: i32,
        d: i64,
        e: u8,
        f: u16,
        g: u32,
        h: u64,
        x: f32,
        y: f64,
        flag: bool,
    }

    describe! {
        Primitive {
            a: i8,
            b: i16,
            c: i32,
            d: i64,
            e: u8,
            f: u16,
            g: u32,
            h: u64,
            x: f32,
            y: f64,
            flag: bool,
        }
    }

    fn sample_primitive() -> Primitive {
        Primitive {
            a: -42,
            b: -1234,
            c: -123_456,
            d: -1_234_567_890,
            e: 42,
            f: 1234,
            g: 123_456,
            h: 1_234_567_890,
            x: 1.5,
            y: -2.25,
            flag: true,
        }
    }

    fn round_trip<C: FrameConfig>() {
        let value = sample_primitive();
        let mut buffer = Vec::new();
        Packager::<C>::pack::<Primitive>(&mut buffer, &value).unwrap();
        match Packager::<C>::unpack::<Primitive>(&buffer) {
            Unpacked::Frame {
                value: decoded,
                consumed,
            } => {
                assert_eq!(consumed, buffer.len());
                assert_eq!(decoded, value);
            }
            Unpacked::NeedMore => panic!("complete frame reported as incomplete"),
        }
    }

    #[test]
    fn round_trip_every_config() {
        round_trip::<Minimal>();
        round_trip::<MarkerOnly>();
        round_trip::<CrcOnly>();
        round_trip::<CrcWithHeader>();
        round_trip::<Full>();
        round_trip::<FullNoHeaderCrc>();
        round_trip::<ShortLen>();
    }

    #[test]
    fn frame_layout_is_deterministic() {
        let mut buffer = Vec::new();
        Packager::<Full>::pack::<u32>(&mut buffer, &0x0403_0201).unwrap();

        // Marker, then BodySize = 4 body bytes + 4 checksum bytes.
        assert_eq!(&buffer[..2], START);
        assert_eq!(&buffer[2..6], 8u32.to_le_bytes());
        // Header checksum over marker + size field.
        let header_crc = SumCrc::calc(&buffer[..6]);
        assert_eq!(&buffer[6..10], header_crc.to_le_bytes());
        // Body, then body checksum over the body alone.
        assert_eq!(&buffer[10..14], [0x01, 0x02, 0x03, 0x04]);
        let body_crc = SumCrc::calc(&buffer[10..14]);
        assert_eq!(&buffer[14..18], body_crc.to_le_bytes());
        assert_eq!(buffer.len(), 18);

        let repacked = {
            let mut again = Vec::new();
            Packager::<Full>::pack::<u32>(&mut again, &0x0403_0201).unwrap();
            again
        };
        assert_eq!(buffer, repacked);
    }

    #[test]
    fn body_crc_covers_header_without_header_crc() {
        let mut buffer = Vec::new();
        Packager::<FullNoHeaderCrc>::pack::<u32>(&mut buffer, &7).unwrap();
        // Marker + size + body, then a checksum over all of it.
        let crc = SumCrc::calc(&buffer[..10]);
        assert_eq!(&buffer[10..14], crc.to_le_bytes());
    }

    #[test]
    fn junk_prefix_is_consumed_with_the_frame() {
        let value = sample_primitive();
        let mut frame = Vec::new();
        Packager::<Full>::pack::<Primitive>(&mut frame, &value).unwrap();

        let mut stream = vec![0x11, 0x22, 0x33];
        stream.extend_from_slice(&frame);

        match Packager::<Full>::unpack::<Primitive>(&stream) {
            Unpacked::Frame {
                value: decoded,
                consumed,
            } => {
                assert_eq!(consumed, 3 + frame.len());
                assert_eq!(decoded, value);
            }
            Unpacked::NeedMore => panic!("frame behind junk not recovered"),
        }
    }

    #[test]
    fn corrupt_body_crc_resynchronises_to_need_more() {
        let mut buffer = Vec::new();
        Packager::<Full>::pack::<Primitive>(&mut buffer, &sample_primitive()).unwrap();
        let last = buffer.len() - 1;
        buffer[last] ^= 0xFF;
        assert_eq!(
            Packager::<Full>::unpack::<Primitive>(&buffer),
            Unpacked::NeedMore
        );
    }

    #[test]
    fn corrupt_header_crc_resynchronises() {
        let mut buffer = Vec::new();
        Packager::<Full>::pack::<Primitive>(&mut buffer, &sample_primitive()).unwrap();
        // Flip a bit in the size field; the header checksum must catch it.
        buffer[3] ^= 0x01;
        assert_eq!(
            Packager::<Full>::unpack::<Primitive>(&buffer),
            Unpacked::NeedMore
        );
    }

    #[test]
    fn corruption_never_masks_a_following_frame() {
        let good = sample_primitive();
        let mut stream = Vec::new();
        Packager::<Full>::pack::<Primitive>(&mut stream, &good).unwrap();
        // Corrupt the first frame's body.
        stream[Packager::<Full>::HEADER_SIZE + 1] ^= 0x80;
        Packager::<Full>::pack::<Primitive>(&mut stream, &good).unwrap();

        match Packager::<Full>::unpack::<Primitive>(&stream) {
            Unpacked::Frame {
                value: decoded,
                consumed,
            } => {
                assert_eq!(consumed, stream.len());
                assert_eq!(decoded, good);
            }
            Unpacked::NeedMore => panic!("valid second frame not recovered"),
        }
    }

    #[test]
    fn oversized_size_field_is_skipped() {
        let value = sample_primitive();

        // Fabricate a header that claims MAX_SIZE + 1 body bytes.
        let mut stream = Vec::new();
        stream.extend_from_slice(START);
        <U32Len>::encode_len(&mut stream, Full::MAX_SIZE + 1).unwrap();
        let crc = SumCrc::calc(&stream[..]);
        crc.write(&mut stream).unwrap();
        let fabricated = stream.len();

        Packager::<Full>::pack::<Primitive>(&mut stream, &value).unwrap();

        match Packager::<Full>::unpack::<Primitive>(&stream) {
            Unpacked::Frame {
                value: decoded,
                consumed,
            } => {
                assert_eq!(consumed, stream.len());
                assert_eq!(decoded, value);
                assert!(consumed > fabricated);
            }
            Unpacked::NeedMore => panic!("frame behind oversized header not recovered"),
        }
    }

    #[test]
    fn truncation_yields_need_more_at_every_boundary() {
        let mut buffer = Vec::new();
        Packager::<Full>::pack::<Primitive>(&mut buffer, &sample_primitive()).unwrap();
        for cut in 0..buffer.len() {
            assert_eq!(
                Packager::<Full>::unpack::<Primitive>(&buffer[..cut]),
                Unpacked::NeedMore,
                "truncation at byte {cut} must not decode"
            );
        }
    }

    #[test]
    fn unpack_is_idempotent() {
        let mut buffer = vec![0x55, 0x66];
        Packager::<Full>::pack::<Primitive>(&mut buffer, &sample_primitive()).unwrap();
        let first = Packager::<Full>::unpack::<Primitive>(&buffer);
        let second = Packager::<Full>::unpack::<Primitive>(&buffer);
        assert_eq!(first, second);
    }

    #[test]
    fn back_to_back_frames_decode_in_order() {
        let one = sample_primitive();
        let two = Primitive {
            a: 1,
            flag: false,
            ..sample_primitive()
        };
        let mut stream = Vec::new();
        Packager::<CrcOnly>::pack::<Primitive>(&mut stream, &one).unwrap();
        let first_len = stream.len();
        Packager::<CrcOnly>::pack::<Primitive>(&mut stream, &two).unwrap();

        let Unpacked::Frame { value, consumed } = Packager::<CrcOnly>::unpack::<Primitive>(&stream)
        else {
            panic!("first frame missing");
        };
        assert_eq!(value, one);
        assert_eq!(consumed, first_len);

        let Unpacked::Frame { value, consumed } =
            Packager::<CrcOnly>::unpack::<Primitive>(&stream[first_len..])
        else {
            panic!("second frame missing");
        };
        assert_eq!(value, two);
        assert_eq!(consumed, stream.len() - first_len);
    }

    #[test]
    fn pack_rejects_bodies_beyond_max_size() {
        let mut buffer = Vec::new();
        let err = Packager::<Tiny>::pack::<Primitive>(&mut buffer, &sample_primitive());
        assert!(matches!(
            err,
            Err(crate::Error::FrameSizeLimit { limit: 8, .. })
        ));
        assert!(buffer.is_empty());
    }

    #[test]
    fn empty_input_needs_more() {
        assert_eq!(
            Packager::<Full>::unpack::<Primitive>(&[]),
            Unpacked::NeedMore
        );
    }

    proptest! {
        #[test]
        fn junk_without_marker_lead_is_skipped_exactly(
            junk in proptest::collection::vec(0x00u8..0xCD, 0..=32),
            value in any::<u64>(),
        ) {
            let mut stream = junk.clone();
            let mut frame = Vec::new();
            Packager::<Full>::pack::<u64>(&mut frame, &value).unwrap();
            stream.extend_from_slice(&frame);

            match Packager::<Full>::unpack::<u64>(&stream) {
                Unpacked::Frame { value: decoded, consumed } => {
                    prop_assert_eq!(consumed, junk.len() + frame.len());
                    prop_assert_eq!(decoded, value);
                }
                Unpacked::NeedMore => prop_assert!(false, "frame behind junk not recovered"),
            }
        }

        #[test]
        fn single_byte_corruption_never_panics_or_lies(
            flip in 0usize..18,
            value in any::<u32>(),
        ) {
            let mut buffer = Vec::new();
            Packager::<Full>::pack::<u32>(&mut buffer, &value).unwrap();
            prop_assume!(flip < buffer.len());
            buffer[flip] ^= 0xFF;

            // Whatever happens, the call terminates, stays in bounds, and
            // never reports the corrupted frame as the original value.
            if let Unpacked::Frame { value: decoded, consumed } =
                Packager::<Full>::unpack::<u32>(&buffer)
            {
                prop_assert!(consumed <= buffer.len());
                prop_assert_ne!(decoded, value);
            }
        }

        #[test]
        fn arbitrary_garbage_never_decodes_spuriously(
            garbage in proptest::collection::vec(any::<u8>(), 0..=64),
        ) {
            // With a header checksum in place, random input must not
            // produce out-of-bounds consumption.
            if let Unpacked::Frame { consumed, .. } =
                Packager::<Full>::unpack::<u64>(&garbage)
            {
                prop_assert!(consumed <= garbage.len());
            }
        }
    }
}
