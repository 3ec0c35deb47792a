use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParserError {
    #[error("signature is invalid")]
    InvalidSignature,

    #[error("version {0} in the header is unsupported")]
    UnsupportedVersion(String),

    #[error("expected clear code {expected} at the start of compressed image data, read {found}")]
    MissingClearCode {
        expected: u16,
        found: u16,
    },

    #[error("input ended at offset {offset} while {needed} more byte(s) were expected")]
    Truncated {
        offset: usize,
        needed: usize,
    },

    #[error("code width {0} is not supported")]
    InvalidCodeWidth(u8),

    #[error("color table with {0} entries is invalid, expected a power of two between 2 and 256")]
    InvalidColorTableLength(usize),

    #[error("symbol {symbol} cannot be encoded as a literal with a {code_width} bit alphabet")]
    SymbolOutOfRange {
        symbol: u8,
        code_width: u8,
    },

    #[error("bit writer needs {needed} bit(s) but only {available} remain")]
    WriterOverflow {
        needed: usize,
        available: usize,
    },
}

pub type Result<T> = std::result::Result<T, ParserError>;
