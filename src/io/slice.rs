use {
    super::Writer,
    crate::error::{write_size_limit, Result},
};

/// Writer over a fixed byte buffer that fails once capacity is exceeded.
pub struct SliceWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> SliceWriter<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Number of bytes written so far.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Get the number of bytes written to the buffer.
    #[inline]
    pub fn finish(self) -> usize {
        self.pos
    }
}

impl Writer for SliceWriter<'_> {
    #[inline]
    fn write(&mut self, src: &[u8]) -> Result<()> {
        let Some(end) = self.pos.checked_add(src.len()) else {
            return Err(write_size_limit(src.len()));
        };
        let Some(dst) = self.buf.get_mut(self.pos..end) else {
            return Err(write_size_limit(src.len()));
        };
        dst.copy_from_slice(src);
        self.pos = end;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use {super::*, crate::error::Error};

    #[test]
    fn writes_in_order() {
        let mut buf = [0u8; 6];
        let mut writer = SliceWriter::new(&mut buf);
        writer.write(&[1, 2, 3]).unwrap();
        writer.write(&[]).unwrap();
        writer.write(&[4, 5]).unwrap();
        assert_eq!(writer.finish(), 5);
        assert_eq!(buf, [1, 2, 3, 4, 5, 0]);
    }

    #[test]
    fn fails_on_overflow_without_partial_write() {
        let mut buf = [0u8; 4];
        let mut writer = SliceWriter::new(&mut buf);
        writer.write(&[1, 2, 3]).unwrap();
        assert!(matches!(
            writer.write(&[4, 5]),
            Err(Error::WriteSizeLimit(2))
        ));
        assert_eq!(writer.position(), 3);
        assert_eq!(buf, [1, 2, 3, 0]);
    }
}
