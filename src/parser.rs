mod bit_reader;
mod bit_writer;
mod blocks;
mod code_table;
mod color_table;
mod decoder;
pub mod lzw;

pub use bit_reader::BitReader;
pub use bit_writer::BitWriter;
pub use blocks::{
    ApplicationExtension, Block, Frame, GraphicControlExtension, Header, Image, ImageDescriptor,
    LogicalScreenDescriptor, PlainTextExtension,
};
pub use code_table::CodeTable;
pub use color_table::{ColorTable, FixedColorTable, Palette, Rgb};
pub use decoder::{parse, parse_with_options, Decoder, DecoderOptions, Gif};

/// Codes never grow past 12 bits.
pub const MAX_CODE_WIDTH: u8 = 12;
pub const MAX_CODES: usize = 1 << MAX_CODE_WIDTH;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisposalMethod {
    DoNotDispose = 1,
    RestoreToBackgroundColor = 2,
    RestoreToPrevious = 3,
}

impl DisposalMethod {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(DisposalMethod::DoNotDispose),
            2 => Some(DisposalMethod::RestoreToBackgroundColor),
            3 => Some(DisposalMethod::RestoreToPrevious),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    V87a,
    V89a,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopCount {
    Infinite,
    Number(u16),
}
