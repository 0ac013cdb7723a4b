use {super::Writer, crate::error::Result};

/// Writer adapter forwarding to a [`std::io::Write`] sink.
///
/// Sink failures surface as [`Error::Io`](crate::Error::Io). The adapter
/// does not buffer; callers wanting buffered output should wrap the sink in
/// a [`std::io::BufWriter`] first.
pub struct IoWriter<W> {
    inner: W,
}

impl<W: std::io::Write> IoWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Flush the sink and return it.
    pub fn into_inner(mut self) -> Result<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

impl<W: std::io::Write> Writer for IoWriter<W> {
    #[inline]
    fn write(&mut self, src: &[u8]) -> Result<()> {
        self.inner.write_all(src)?;
        Ok(())
    }
}
