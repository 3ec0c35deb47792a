use super::MAX_CODE_WIDTH;
use crate::error::{ParserError, Result};

/// Packs fixed-width codes into a caller owned buffer using the same bit order
/// as [`BitReader`](super::BitReader).
#[derive(Debug)]
pub struct BitWriter<'a> {
    buf: &'a mut [u8],
    position: usize,
}

impl<'a> BitWriter<'a> {
    /// Wraps `buf` and zeroes it, appended bits are or-ed into place.
    pub fn new(buf: &'a mut [u8]) -> Self {
        buf.fill(0);
        Self { buf, position: 0 }
    }

    pub fn capacity(&self) -> usize {
        self.buf.len() * 8
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Note the strict comparison: a code that would end exactly on the last
    /// bit of the buffer is reported as not appendable.
    pub fn can_append(&self, width: u8) -> bool {
        width <= MAX_CODE_WIDTH && self.position + usize::from(width) < self.capacity()
    }

    /// Writes the low `width` bits of `value` and advances the cursor.
    pub fn append(&mut self, value: u16, width: u8) -> Result<()> {
        if width == 0 || width > MAX_CODE_WIDTH {
            return Err(ParserError::InvalidCodeWidth(width));
        }

        let available = self.capacity() - self.position;
        if usize::from(width) > available {
            return Err(ParserError::WriterOverflow {
                needed: width.into(),
                available,
            });
        }

        let value = u32::from(value) & ((1 << width) - 1);
        let mut written: u8 = 0;
        while written < width {
            let byte_idx = self.position / 8;
            let shift = (self.position % 8) as u8;
            let take = (8 - shift).min(width - written);

            let bits = (value >> written) & ((1 << take) - 1);
            self.buf[byte_idx] |= (bits << shift) as u8;

            written += take;
            self.position += usize::from(take);
        }

        Ok(())
    }

    /// The filled prefix of the buffer, rounded up past the byte the cursor is in.
    pub fn written(&self) -> &[u8] {
        let end = (self.position / 8 + 1).min(self.buf.len());
        &self.buf[..end]
    }
}
