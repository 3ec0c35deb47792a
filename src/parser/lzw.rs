use std::collections::HashMap;

use log::{trace, warn};

use super::bit_reader::BitReader;
use super::bit_writer::BitWriter;
use super::code_table::{CodeTable, MAX_SYMBOL_WIDTH, MIN_SYMBOL_WIDTH};
use super::{MAX_CODES, MAX_CODE_WIDTH};
use crate::error::{ParserError, Result};

/// Decodes codes from `reader` into `output` until the end of information code
/// is read or the reader runs dry. Returns how many bytes were appended.
///
/// With `omit_initial_clear_code` the first code is treated as data and
/// `table` is used in whatever state the caller left it in.
pub fn decompress(
    table: &mut CodeTable,
    reader: &mut BitReader<'_>,
    output: &mut Vec<u8>,
    omit_initial_clear_code: bool,
) -> Result<usize> {
    decompress_with_limit(table, reader, output, omit_initial_clear_code, usize::MAX)
}

/// Like [`decompress`], but stops once `limit` bytes have been appended. The
/// code that crosses the limit is cut short and the rest of the stream is left
/// unread.
pub fn decompress_with_limit(
    table: &mut CodeTable,
    reader: &mut BitReader<'_>,
    output: &mut Vec<u8>,
    omit_initial_clear_code: bool,
    limit: usize,
) -> Result<usize> {
    let clear_code = table.clear_code();
    let end_of_information_code = table.end_of_information_code();
    let start = output.len();

    if !omit_initial_clear_code {
        let first = reader.consume_code(table.code_width());
        if first != clear_code {
            return Err(ParserError::MissingClearCode {
                expected: clear_code,
                found: first,
            });
        }
        table.reset();
    }

    // {CODE-1}, empty right after a clear code
    let mut previous: Option<Vec<u8>> = None;

    while output.len() - start < limit && !reader.is_complete(table.code_width()) {
        let code = reader.consume_code(table.code_width());

        if code == end_of_information_code {
            trace!("end of information after {} bytes", output.len() - start);
            break;
        }

        if code == clear_code {
            trace!("cleared at bit {}", reader.position());
            table.reset();
            previous = None;
            continue;
        }

        let indices = match (table.get(code), previous.as_deref()) {
            // output {CODE} to index stream
            (Some(indices), _) => indices.to_vec(),
            // {CODE-1}+K where K is the first index of {CODE-1}
            (None, Some(last)) => {
                let mut indices = last.to_vec();
                indices.push(last[0]);
                indices
            },
            (None, None) => {
                warn!("code {code} is undefined and there is no previous code to build it from, skipping");
                continue;
            },
        };

        output.extend_from_slice(&indices);
        if output.len() - start >= limit {
            output.truncate(start + limit);
            trace!("output full after {limit} bytes, stopping at bit {}", reader.position());
            break;
        }

        if let Some(mut entry) = previous.take() {
            // {CODE-1}+K where K is the first index of {CODE}
            entry.push(indices[0]);
            table.append(entry);
        }
        previous = Some(indices);
    }

    Ok(output.len() - start)
}

/// Greedy longest match encoder, the inverse of [`decompress`].
///
/// Returns the written prefix of the writer's buffer.
pub fn compress<'w>(
    initial_code_width: u8,
    data: &[u8],
    writer: &'w mut BitWriter<'_>,
    omit_clear_code: bool,
    omit_end_of_information: bool,
) -> Result<&'w [u8]> {
    let mut dictionary = Dictionary::new(initial_code_width)?;

    if !omit_clear_code {
        writer.append(dictionary.clear_code(), dictionary.code_width)?;
    }

    let mut prefix: Option<u16> = None;
    for &symbol in data {
        if u16::from(symbol) >= dictionary.clear_code() {
            return Err(ParserError::SymbolOutOfRange {
                symbol,
                code_width: initial_code_width,
            });
        }

        let Some(code) = prefix else {
            prefix = Some(symbol.into());
            continue;
        };

        if let Some(extended) = dictionary.find(code, symbol) {
            prefix = Some(extended);
            continue;
        }

        dictionary.emit(writer, code)?;
        if !dictionary.insert(code, symbol) {
            trace!("code table full, clearing");
            writer.append(dictionary.clear_code(), dictionary.code_width)?;
            dictionary.reset();
        }
        prefix = Some(symbol.into());
    }

    if let Some(code) = prefix {
        dictionary.emit(writer, code)?;
    }

    if !omit_end_of_information {
        writer.append(dictionary.clear_code() + 1, dictionary.code_width)?;
    }

    Ok(writer.written())
}

/// Decodes a complete code stream that starts with a clear code.
pub fn lzw_decode(buf: &[u8], minimum_code_size: u8) -> Result<Vec<u8>> {
    let mut table = CodeTable::new(minimum_code_size)?;
    let mut reader = BitReader::new(buf);
    let mut indices = Vec::with_capacity(buf.len() * 2);

    decompress(&mut table, &mut reader, &mut indices, false)?;
    Ok(indices)
}

/// Encodes `data` into a freshly allocated, clear code prefixed stream.
pub fn lzw_encode(data: &[u8], minimum_code_size: u8) -> Result<Vec<u8>> {
    // one code per symbol in the worst case, plus the clears and the two framing codes
    let codes = data.len() + data.len() / (MAX_CODES / 2) + 4;
    let mut buffer = vec![0; codes * usize::from(MAX_CODE_WIDTH) / 8 + 1];

    let mut writer = BitWriter::new(&mut buffer);
    let written = compress(minimum_code_size, data, &mut writer, false, false)?.len();

    buffer.truncate(written);
    Ok(buffer)
}

/// Encoder side dictionary keyed by (prefix code, next symbol).
///
/// The decoder learns an entry one code later than the encoder creates it, so
/// the width is tracked against the decoder's table size rather than ours.
struct Dictionary {
    symbol_width: u8,
    entries: HashMap<(u16, u8), u16>,
    next_code: u16,
    decoder_len: usize,
    code_width: u8,
    emitted: bool,
}

impl Dictionary {
    fn new(symbol_width: u8) -> Result<Self> {
        if !(MIN_SYMBOL_WIDTH..=MAX_SYMBOL_WIDTH).contains(&symbol_width) {
            return Err(ParserError::InvalidCodeWidth(symbol_width));
        }

        let mut dictionary = Self {
            symbol_width,
            entries: HashMap::new(),
            next_code: 0,
            decoder_len: 0,
            code_width: 0,
            emitted: false,
        };
        dictionary.reset();
        Ok(dictionary)
    }

    fn reset(&mut self) {
        let first_free = self.clear_code() + 2;

        self.entries.clear();
        self.next_code = first_free;
        self.decoder_len = first_free.into();
        self.code_width = self.symbol_width + 1;
        self.emitted = false;
    }

    fn clear_code(&self) -> u16 {
        1 << self.symbol_width
    }

    fn find(&self, prefix: u16, symbol: u8) -> Option<u16> {
        self.entries.get(&(prefix, symbol)).copied()
    }

    /// Registers prefix+symbol, false when there is no free code left.
    fn insert(&mut self, prefix: u16, symbol: u8) -> bool {
        if usize::from(self.next_code) >= MAX_CODES {
            return false;
        }
        self.entries.insert((prefix, symbol), self.next_code);
        self.next_code += 1;
        true
    }

    fn emit(&mut self, writer: &mut BitWriter<'_>, code: u16) -> Result<()> {
        writer.append(code, self.code_width)?;

        // every data code after the first one grows the decoder's table by one entry
        if self.emitted && self.decoder_len < MAX_CODES {
            self.decoder_len += 1;
            if self.decoder_len >= 1 << self.code_width && self.code_width < MAX_CODE_WIDTH {
                self.code_width += 1;
            }
        }
        self.emitted = true;
        Ok(())
    }
}
