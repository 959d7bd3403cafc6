//! Formatting into fixed byte buffers without allocation.

use core::fmt;

/// A `core::fmt::Write` adapter over a byte slice.
///
/// Writes fail once the slice is full; `len()` is then the number of bytes
/// that did fit.
pub(crate) struct SliceWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> SliceWriter<'a> {
    #[inline]
    pub(crate) fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.pos
    }

    /// Append raw bytes.
    #[inline]
    pub(crate) fn write_bytes(&mut self, bytes: &[u8]) -> fmt::Result {
        let end = self.pos + bytes.len();
        if end > self.buf.len() {
            return Err(fmt::Error);
        }
        self.buf[self.pos..end].copy_from_slice(bytes);
        self.pos = end;
        Ok(())
    }
}

impl fmt::Write for SliceWriter<'_> {
    #[inline]
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.write_bytes(s.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::fmt::Write;

    #[test]
    fn test_writes_until_full() {
        let mut buf = [0u8; 8];
        let mut w = SliceWriter::new(&mut buf);
        assert!(write!(w, "ACK {}", 12).is_ok());
        assert_eq!(w.len(), 6);
        assert!(w.write_str("345").is_err());
        assert_eq!(w.len(), 6);
        assert_eq!(&buf[..6], b"ACK 12");
    }
}
