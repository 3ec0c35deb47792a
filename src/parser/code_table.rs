use super::{MAX_CODES, MAX_CODE_WIDTH};
use crate::error::{ParserError, Result};

/// The smallest alphabet a GIF code stream may declare.
pub const MIN_SYMBOL_WIDTH: u8 = 2;
/// Literals are single bytes, so the alphabet can't be wider than 8 bits.
pub const MAX_SYMBOL_WIDTH: u8 = 8;

/// LZW dictionary mapping codes to the index sequences they expand to.
///
/// Codes `0..2^n` are one-byte literals, `2^n` is the clear code and `2^n + 1`
/// marks the end of information. Both reserved codes expand to nothing.
#[derive(Debug, Clone)]
pub struct CodeTable {
    symbol_width: u8,
    code_width: u8,
    entries: Vec<Vec<u8>>,
}

impl CodeTable {
    pub fn new(symbol_width: u8) -> Result<Self> {
        if !(MIN_SYMBOL_WIDTH..=MAX_SYMBOL_WIDTH).contains(&symbol_width) {
            return Err(ParserError::InvalidCodeWidth(symbol_width));
        }

        let mut table = Self {
            symbol_width,
            code_width: symbol_width + 1,
            entries: Vec::with_capacity(MAX_CODES),
        };
        table.reset();
        Ok(table)
    }

    /// Drops every learned entry and returns to the initial code width.
    pub fn reset(&mut self) {
        let literals = 1u16 << self.symbol_width;

        self.entries.clear();
        self.entries.extend((0..literals).map(|literal| vec![literal as u8]));
        // clear code and end of information
        self.entries.push(Vec::new());
        self.entries.push(Vec::new());

        self.code_width = self.symbol_width + 1;
    }

    pub fn symbol_width(&self) -> u8 {
        self.symbol_width
    }

    /// Width in bits of the next code to read.
    pub fn code_width(&self) -> u8 {
        self.code_width
    }

    pub fn clear_code(&self) -> u16 {
        1 << self.symbol_width
    }

    pub fn end_of_information_code(&self) -> u16 {
        self.clear_code() + 1
    }

    /// The code the next appended entry will receive.
    pub fn next_code(&self) -> u16 {
        self.entries.len() as u16
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= MAX_CODES
    }

    pub fn get(&self, code: u16) -> Option<&[u8]> {
        self.entries.get(usize::from(code)).map(Vec::as_slice)
    }

    /// Stores `sequence` under the next free code and widens codes once the
    /// table holds `2^width` entries. Returns `None` when the table is full.
    pub fn append(&mut self, sequence: Vec<u8>) -> Option<u16> {
        if self.is_full() {
            return None;
        }

        let code = self.next_code();
        self.entries.push(sequence);

        if self.entries.len() >= 1 << self.code_width && self.code_width < MAX_CODE_WIDTH {
            self.code_width += 1;
        }
        Some(code)
    }
}

#[cfg(test)]
mod tests {
    use super::CodeTable;
    use crate::error::ParserError;

    #[test]
    fn initial_entries() {
        let table = CodeTable::new(2).unwrap();

        assert_eq!(table.len(), 6);
        assert_eq!(table.code_width(), 3);
        assert_eq!(table.clear_code(), 4);
        assert_eq!(table.end_of_information_code(), 5);
        for literal in 0..4u8 {
            assert_eq!(table.get(literal.into()), Some(&[literal][..]));
        }
        assert_eq!(table.get(4), Some(&[][..]));
        assert_eq!(table.get(5), Some(&[][..]));
        assert_eq!(table.get(6), None);
    }

    #[test]
    fn eight_bit_alphabet() {
        let table = CodeTable::new(8).unwrap();

        assert_eq!(table.len(), 258);
        assert_eq!(table.code_width(), 9);
        assert_eq!(table.get(255), Some(&[255][..]));
        assert_eq!(table.clear_code(), 256);
    }

    #[test]
    fn rejects_unsupported_symbol_widths() {
        assert_eq!(CodeTable::new(1).unwrap_err(), ParserError::InvalidCodeWidth(1));
        assert_eq!(CodeTable::new(9).unwrap_err(), ParserError::InvalidCodeWidth(9));
    }

    #[test]
    fn width_grows_when_entry_count_reaches_power_of_two() {
        for n in 2..=8u8 {
            let mut table = CodeTable::new(n).unwrap();
            let boundary = 1usize << (n + 1);

            while table.len() < boundary - 1 {
                table.append(vec![0, 0]);
                assert_eq!(table.code_width(), n + 1);
            }

            // the 2^(n+1)-th entry
            table.append(vec![0, 1]);
            assert_eq!(table.len(), boundary);
            assert_eq!(table.code_width(), n + 2);

            table.reset();
            assert_eq!(table.code_width(), n + 1);
            assert_eq!(table.len(), (1 << n) + 2);
        }
    }

    #[test]
    fn append_assigns_sequential_codes() {
        let mut table = CodeTable::new(2).unwrap();

        assert_eq!(table.append(vec![1, 1]), Some(6));
        assert_eq!(table.append(vec![1, 1, 2]), Some(7));
        assert_eq!(table.get(7), Some(&[1, 1, 2][..]));
        assert_eq!(table.next_code(), 8);
    }

    #[test]
    fn stops_at_twelve_bits() {
        let mut table = CodeTable::new(8).unwrap();
        while !table.is_full() {
            table.append(vec![7; 2]);
        }

        assert_eq!(table.len(), 4096);
        assert_eq!(table.code_width(), 12);
        assert_eq!(table.append(vec![1, 2]), None);
        assert_eq!(table.len(), 4096);
    }
}
