use super::MAX_CODE_WIDTH;

/// Reads fixed-width codes from a byte buffer, least significant bit first.
///
/// A code that spans several bytes takes its low bits from the current byte and
/// its high bits from the bytes that follow. Reading past the end of the buffer
/// does not fail, the missing bits are read as zero.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    buf: &'a [u8],
    // index by bit instead of by byte
    position: usize,
    length: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self::with_offset(buf, 0)
    }

    pub fn with_offset(buf: &'a [u8], bit_offset: usize) -> Self {
        let length = buf.len() * 8;
        Self {
            buf,
            position: bit_offset.min(length),
            length,
        }
    }

    /// Reads `width` bits (1 to 12) and advances the cursor.
    pub fn consume_code(&mut self, width: u8) -> u16 {
        debug_assert!((1..=MAX_CODE_WIDTH).contains(&width), "code width {width} out of range");
        let width = width.min(MAX_CODE_WIDTH);

        let mut value: u32 = 0;
        let mut filled: u8 = 0;
        while filled < width {
            let byte_idx = self.position / 8;
            let shift = (self.position % 8) as u8;
            let take = (8 - shift).min(width - filled);

            if let Some(byte) = self.buf.get(byte_idx) {
                let bits = (u32::from(*byte) >> shift) & ((1 << take) - 1);
                value |= bits << filled;
            }

            filled += take;
            self.position += usize::from(take);
        }
        self.position = self.position.min(self.length);

        value as u16
    }

    /// True when fewer than `width` bits are left, or the width can never be read.
    pub fn is_complete(&self, width: u8) -> bool {
        width > MAX_CODE_WIDTH || self.position + usize::from(width) > self.length
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }
}

#[cfg(test)]
mod tests {
    use super::BitReader;

    #[test]
    fn it_works() {
        let buffer = &[
            0b10000100,
            0b10001111,
            0b10101001,
            0b11001011,
            0b11101101,
            0b00001111,
            0b10100011
        ];
        let mut reader = BitReader::new(buffer);
        assert_eq!(reader.consume_code(3), 0b00000100);
        assert_eq!(reader.consume_code(3), 0b00000000);
        assert_eq!(reader.consume_code(3), 0b00000110);
        assert_eq!(reader.consume_code(3), 0b00000111);
        assert_eq!(reader.consume_code(3), 0b00000000);
        assert_eq!(reader.consume_code(3), 0b00000011);
        assert_eq!(reader.consume_code(3), 0b00000010);
        assert_eq!(reader.consume_code(3), 0b00000101);
    }

    #[test]
    fn reads_powers_of_two_at_width_7() {
        // 1, 2, 4, 8, 16, 32 packed with a width of 7
        let buffer = &[
            0b0_0000001,
            0b00_000001,
            0b000_00001,
            0b0000_0001,
            0b00000_001,
            0b000000_01,
        ];
        let mut reader = BitReader::new(buffer);

        for i in 0..6 {
            assert!(!reader.is_complete(7));
            assert_eq!(reader.consume_code(7), 1 << i);
        }
        assert!(reader.is_complete(7));
    }

    #[test]
    fn reads_width_5_across_byte_boundaries() {
        let buffer = &[1, 1, 1, 1, 1, 1];
        let mut reader = BitReader::new(buffer);

        let mut output = Vec::new();
        for _ in 0..9 {
            assert!(!reader.is_complete(5));
            output.push(reader.consume_code(5));
        }

        assert!(reader.is_complete(5));
        assert_eq!(output, [1, 8, 0, 2, 16, 0, 4, 0, 1]);
    }

    #[test]
    fn twelve_bit_code_can_span_three_bytes() {
        // 7 bits of padding, then 0xabc, then 5
        let buffer = &[0b0000_0001, 0b0101_1110, 0b0010_1101, 0];
        let mut reader = BitReader::new(buffer);

        assert_eq!(reader.consume_code(7), 1);
        assert_eq!(reader.consume_code(12), 0xabc);
        assert_eq!(reader.consume_code(5), 5);
        assert_eq!(reader.position(), 24);
    }

    #[test]
    fn starts_at_bit_offset() {
        let mut reader = BitReader::with_offset(&[0b1111_0000], 4);
        assert_eq!(reader.consume_code(4), 0b1111);
        assert!(reader.is_complete(1));
    }

    #[test]
    fn missing_bits_at_the_end_read_as_zero() {
        let mut reader = BitReader::new(&[0xff]);
        reader.consume_code(6);

        assert!(reader.is_complete(4));
        assert_eq!(reader.consume_code(4), 0b11);
        assert_eq!(reader.position(), reader.len());
    }

    #[test]
    fn widths_above_twelve_are_never_readable() {
        let reader = BitReader::new(&[0; 8]);
        assert!(reader.is_complete(13));
        assert!(!reader.is_complete(12));
    }
}
