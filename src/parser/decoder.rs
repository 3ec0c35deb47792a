use super::bit_reader::BitReader;
use super::blocks::{
    ApplicationExtension, Block, Frame, GraphicControlExtension, Header, Image, ImageDescriptor,
    LogicalScreenDescriptor, PlainTextExtension,
};
use super::code_table::CodeTable;
use super::color_table::{ColorTable, Palette, Rgb};
use super::lzw;
use super::{DisposalMethod, LoopCount, Version};
use crate::error::{ParserError, Result};

use log::{debug, warn};

const EXTENSION_INTRODUCER: u8 = 0x21;
const IMAGE_DESCRIPTOR_LABEL: u8 = 0x2c;
const TRAILER_LABEL: u8 = 0x3b;

// Extension labels
const APPLICATION_EXTENSION: u8 = 0xff;
const COMMENT_EXTENSION: u8 = 0xfe;
const GRAPHIC_CONTROL_EXTENSION: u8 = 0xf9;
const PLAIN_TEXT_EXTENSION: u8 = 0x01;

#[derive(Debug)]
enum ExtensionType {
    Application,
    Comment,
    GraphicControl,
    PlainText,
    Unknown(u8),
}

impl From<u8> for ExtensionType {
    fn from(value: u8) -> Self {
        use ExtensionType::*;

        match value {
            APPLICATION_EXTENSION => Application,
            COMMENT_EXTENSION => Comment,
            GRAPHIC_CONTROL_EXTENSION => GraphicControl,
            PLAIN_TEXT_EXTENSION => PlainText,

            label => Unknown(label),
        }
    }
}

impl TryFrom<&str> for Version {
    type Error = ParserError;

    fn try_from(value: &str) -> std::result::Result<Self, Self::Error> {
        match value {
            "87a" => Ok(Version::V87a),
            "89a" => Ok(Version::V89a),
            version => Err(ParserError::UnsupportedVersion(version.into()))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderOptions {
    /// Size local color tables from the image descriptor's own size field.
    /// When false the global table's size field is used instead, which some
    /// older decoders did.
    pub strict_local_color_table_size: bool,
}

impl Default for DecoderOptions {
    fn default() -> Self {
        Self {
            strict_local_color_table_size: true,
        }
    }
}

#[derive(Debug)]
enum ParserState {
    ProcessTrailer,

    DetermineNextBlock,
    ProcessExtension(u8),
    ProcessImageDescriptor,
    ProcessLocalColorTable(ImageDescriptor),
    ProcessImageData(ImageDescriptor, Option<ColorTable>),

    Done,
}

/// A fully decoded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gif {
    header: Header,
    global_color_table: Option<ColorTable>,
    blocks: Vec<Block>,
    loop_count: Option<LoopCount>,
}

impl Gif {
    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn global_color_table(&self) -> Option<&ColorTable> {
        self.global_color_table.as_ref()
    }

    /// Every block in file order.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn images(&self) -> impl Iterator<Item = &Image> {
        self.blocks.iter().filter_map(|block| match block {
            Block::Image(image) => Some(image),
            _ => None,
        })
    }

    pub fn comments(&self) -> impl Iterator<Item = &str> {
        self.blocks.iter().filter_map(|block| match block {
            Block::Comment(text) => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn loop_count(&self) -> Option<LoopCount> {
        self.loop_count
    }

    /// Pairs each image with the graphic control extension right before it.
    pub fn frames(&self) -> Vec<Frame<'_>> {
        let mut frames = Vec::new();
        let mut pending = None;

        for block in &self.blocks {
            match block {
                Block::GraphicControl(control) => pending = Some(control),
                Block::Image(image) => frames.push(Frame {
                    graphic_control: pending.take(),
                    image,
                }),
                // plain text is a graphic rendering block too and consumes the extension
                Block::PlainText(_) => pending = None,
                Block::Comment(_) | Block::Application(_) => {},
            }
        }

        frames
    }

    /// The local table of `image`, falling back to the global one.
    pub fn color_table_for<'g>(&'g self, image: &'g Image) -> Option<&'g ColorTable> {
        image.local_color_table().or(self.global_color_table())
    }

    pub fn color_at(&self, image: &Image, x: u16, y: u16) -> Option<Rgb> {
        let index = image.index_at(x, y)?;
        self.color_table_for(image)?.color(index)
    }

    /// Colors of `image` row by row. `None` when there is no color table or an
    /// index points past its end.
    pub fn rgb_raster(&self, image: &Image) -> Option<Vec<Rgb>> {
        let table = self.color_table_for(image)?;
        image
            .rows()
            .flatten()
            .map(|&index| table.color(index))
            .collect()
    }
}

/// Parses a complete GIF held in memory with the default options.
pub fn parse(data: &[u8]) -> Result<Gif> {
    Decoder::new(data).parse()
}

pub fn parse_with_options(data: &[u8], options: DecoderOptions) -> Result<Gif> {
    Decoder::with_options(data, options).parse()
}

#[derive(Debug)]
pub struct Decoder<'a> {
    data: &'a [u8],
    position: usize,
    options: DecoderOptions,
    blocks: Vec<Block>,
    loop_count: Option<LoopCount>,
}

impl<'a> Decoder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_options(data, DecoderOptions::default())
    }

    pub fn with_options(data: &'a [u8], options: DecoderOptions) -> Self {
        Self {
            data,
            position: 0,
            options,
            blocks: Vec::new(),
            loop_count: None,
        }
    }

    pub fn parse(mut self) -> Result<Gif> {
        let header = self.process_header()?;

        let global_color_table = if header.logical_screen.global_color_table_flag {
            let table = self.read_color_table(header.logical_screen.global_color_table_len())?;
            debug!("processed global color table with {} entries", table.len());
            Some(table)
        } else {
            None
        };

        let mut state = ParserState::DetermineNextBlock;
        loop {
            debug!("begin parsing state {:?} at offset {}", state, self.position);

            state = self.process_next_state(state, &header)?;
            if let ParserState::Done = state {
                break;
            }
        }

        Ok(Gif {
            header,
            global_color_table,
            blocks: self.blocks,
            loop_count: self.loop_count,
        })
    }

    // Signature and version, then the logical screen descriptor:
    //   0  screen width      u16
    //   2  screen height     u16
    //   4  packed fields     u8   GCCCSTTT
    //   5  background index  u8
    //   6  aspect ratio      u8
    fn process_header(&mut self) -> Result<Header> {
        let signature = self.read_bytes(3)?;
        if signature != Header::SIGNATURE {
            return Err(ParserError::InvalidSignature);
        }

        let version = Version::try_from(self.read_str(3)?.as_str())?;
        debug!("processed signature and version, got {:?}", version);

        let screen_width = self.read_u16()?;
        let screen_height = self.read_u16()?;

        let packed_fields = self.read_byte()?;

        // packed field start
        let global_color_table_flag = packed_fields & 0b10000000 != 0;
        let color_resolution = (packed_fields >> 4) & 0b00000111;
        let sort_flag = packed_fields & 0b00001000 != 0;
        let global_color_table_size = packed_fields & 0b00000111;
        // packed field end

        let background_color_index = self.read_byte()?;
        let pixel_aspect_ratio = self.read_byte()?;

        let logical_screen = LogicalScreenDescriptor {
            screen_width,
            screen_height,
            global_color_table_flag,
            color_resolution,
            sort_flag,
            global_color_table_size,
            background_color_index,
            pixel_aspect_ratio,
        };
        debug!("processed logical screen descriptor, got: {:#?}", logical_screen);
        debug_assert_eq!(self.position, Header::LEN);

        Ok(Header {
            version,
            logical_screen,
        })
    }

    fn process_next_state(&mut self, next_state: ParserState, header: &Header) -> Result<ParserState> {
        use ParserState::*;

        match next_state {
            ProcessTrailer => Ok(Done),
            DetermineNextBlock => {
                let introducer_or_label = self.read_byte()?;

                match introducer_or_label {
                    // extension introducer means that a label follows determining what exact type
                    // of extension it is.
                    EXTENSION_INTRODUCER => Ok(ProcessExtension(self.read_byte()?)),
                    IMAGE_DESCRIPTOR_LABEL => Ok(ProcessImageDescriptor),
                    TRAILER_LABEL => Ok(ProcessTrailer),
                    label => {
                        warn!("skipping unexpected label 0x{label:02x} at offset {}", self.position - 1);
                        Ok(DetermineNextBlock)
                    },
                }
            },
            ProcessExtension(label) => self.process_extension(ExtensionType::from(label)),
            ProcessImageDescriptor => {
                let left_position = self.read_u16()?;
                let top_position = self.read_u16()?;

                let width = self.read_u16()?;
                let height = self.read_u16()?;

                let packed_fields = self.read_byte()?;

                let descriptor = ImageDescriptor {
                    left_position,
                    top_position,
                    width,
                    height,
                    local_color_table_flag: packed_fields & 0b10000000 != 0,
                    interlace_flag: packed_fields & 0b01000000 != 0,
                    sort_flag: packed_fields & 0b00100000 != 0,
                    reserved: (packed_fields >> 3) & 0b00000011,
                    local_color_table_size: packed_fields & 0b00000111,
                };
                debug!("processed image descriptor, got: {:#?}", descriptor);

                let next_state = if descriptor.local_color_table_flag {
                    ProcessLocalColorTable(descriptor)
                } else {
                    ProcessImageData(descriptor, None)
                };

                Ok(next_state)
            },
            ProcessLocalColorTable(descriptor) => {
                let len = if self.options.strict_local_color_table_size {
                    descriptor.local_color_table_len()
                } else {
                    header.logical_screen.global_color_table_len()
                };

                let table = self.read_color_table(len)?;
                Ok(ProcessImageData(descriptor, Some(table)))
            },
            ProcessImageData(descriptor, local_color_table) => {
                let lzw_code_size = self.read_byte()?;
                let data_stream = self.read_data_sub_blocks()?;

                let indices = decode_indices(&descriptor, lzw_code_size, &data_stream)?;
                self.blocks.push(Block::Image(Image::new(descriptor, local_color_table, indices)));

                Ok(DetermineNextBlock)
            },
            Done => Ok(Done),
        }
    }

    fn process_extension(&mut self, label: ExtensionType) -> Result<ParserState> {
        use ExtensionType::*;

        debug!("processing extension type: {:?}", label);
        match label {
            Application => {
                let block_size = self.read_byte()?;
                if block_size != 11 {
                    warn!("application extension header is {block_size} bytes, expected 11");
                }
                let application_header = self.read_bytes(block_size.into())?;

                let identifier_len = application_header.len().min(8);
                let identifier =
                    String::from_utf8_lossy(&application_header[..identifier_len]).into_owned();

                let mut authentication_code = [0; 3];
                for (code, byte) in authentication_code.iter_mut().zip(&application_header[identifier_len..]) {
                    *code = *byte;
                }

                let data = self.read_data_sub_blocks()?;

                let extension = ApplicationExtension {
                    identifier,
                    authentication_code,
                    data,
                };

                if let Some(loop_count) = extension.loop_count() {
                    self.loop_count = Some(loop_count);
                } else if extension.identifier == "NETSCAPE" {
                    warn!("ignoring malformed NETSCAPE extension with {} data bytes", extension.data.len());
                }

                debug!("processed application block, got: {:#?}", extension);
                self.blocks.push(Block::Application(extension));
                Ok(ParserState::DetermineNextBlock)
            },
            Comment => {
                // sequence of data sub-blocks
                let data = self.read_data_sub_blocks()?;
                let text = String::from_utf8_lossy(&data).into_owned();
                debug!("processed comment block, got: {}", text);

                self.blocks.push(Block::Comment(text));
                Ok(ParserState::DetermineNextBlock)
            },
            GraphicControl => {
                let block_size = self.read_byte()?;
                if block_size != 4 {
                    warn!("graphic control extension is {block_size} bytes, expected 4");
                }

                let fields = self.read_bytes(block_size.into())?;
                let field = |index: usize| fields.get(index).copied().unwrap_or(0);

                let packed_fields = field(0);
                // packed fields definition
                // XXXYYYZW
                // XXX = reserved, not needed
                // YYY = disposal method, indicates what to do with graphic after displaying
                // Z = user input flag
                // W = transparent color flag
                let disposal_method = DisposalMethod::from_u8((packed_fields >> 2) & 0b00000111);
                let user_input_flag = packed_fields & 0b00000010 != 0;
                let transparent_color_flag = packed_fields & 0b00000001 != 0;

                let delay_time = u16::from_le_bytes([field(1), field(2)]);
                let transparent_color_index = field(3);

                // normally just the block terminator
                self.read_data_sub_blocks()?;

                let graphic_control_extension = GraphicControlExtension {
                    packed_fields,
                    disposal_method,
                    user_input_flag,
                    transparent_color_flag,

                    delay_time,
                    transparent_color_index,
                };

                debug!("processed GraphicControlExtension: {:#?}", graphic_control_extension);

                self.blocks.push(Block::GraphicControl(graphic_control_extension));
                Ok(ParserState::DetermineNextBlock)
            },
            PlainText => {
                let block_size = self.read_byte()?;
                if block_size < 12 {
                    warn!("plain text extension header is {block_size} bytes, expected 12");
                }
                let start = self.position;

                let extension = PlainTextExtension {
                    text_grid_left: self.read_u16()?,
                    text_grid_top: self.read_u16()?,
                    text_grid_width: self.read_u16()?,
                    text_grid_height: self.read_u16()?,
                    cell_width: self.read_byte()?,
                    cell_height: self.read_byte()?,
                    foreground_color_index: self.read_byte()?,
                    background_color_index: self.read_byte()?,
                };

                // the text itself is not decoded, only stepped over
                self.position = self.position.max(start + usize::from(block_size));
                self.read_data_sub_blocks()?;

                debug!("processed plain text header, got: {:#?}", extension);
                self.blocks.push(Block::PlainText(extension));
                Ok(ParserState::DetermineNextBlock)
            },
            Unknown(label) => {
                warn!("skipping extension with unknown label 0x{label:02x}");
                self.read_data_sub_blocks()?;
                Ok(ParserState::DetermineNextBlock)
            },
        }
    }

    fn read_color_table(&mut self, len: usize) -> Result<ColorTable> {
        let bytes = self.read_bytes(len * 3)?;
        ColorTable::from_rgb_bytes(bytes)
    }

    fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        let end = self.position + count;
        let bytes = self.data.get(self.position..end).ok_or_else(|| ParserError::Truncated {
            offset: self.data.len(),
            needed: end - self.data.len(),
        })?;

        self.position = end;
        Ok(bytes)
    }

    fn read_byte(&mut self) -> Result<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    fn read_u16(&mut self) -> Result<u16> {
        // GIF89a: Unless otherwise stated, multi-byte numeric fields are ordered with the Least
        // Significant Byte first.
        let bytes = self.read_bytes(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    fn read_str(&mut self, count: usize) -> Result<String> {
        let bytes = self.read_bytes(count)?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    fn read_data_sub_blocks(&mut self) -> Result<Vec<u8>> {
        let mut block_size = self.read_byte()?;

        // there could be more than one block, but we do know we'll at least have 1 sub-block.
        // allocate capacity to account for it.
        let mut result = Vec::with_capacity(block_size.into());

        // we might have read the block terminator at the end of the while loop, stop right there
        // because we're done.
        while block_size != 0 {
            result.extend_from_slice(self.read_bytes(block_size.into())?);
            block_size = self.read_byte()?;
        }

        Ok(result)
    }
}

/// Runs the LZW decoder over an image's joined sub-blocks until the image is
/// full. Codes freely cross sub-block boundaries, so the blocks are decoded as
/// one stream with a single code table.
fn decode_indices(
    descriptor: &ImageDescriptor,
    lzw_code_size: u8,
    data_stream: &[u8],
) -> Result<Box<[u8]>> {
    let pixel_count = descriptor.pixel_count();
    let mut indices = Vec::with_capacity(pixel_count);

    if data_stream.is_empty() {
        warn!("image has no data sub-blocks, leaving {pixel_count} pixels at index 0");
    } else {
        let mut table = CodeTable::new(lzw_code_size)?;
        let mut reader = BitReader::new(data_stream);
        let decoded =
            lzw::decompress_with_limit(&mut table, &mut reader, &mut indices, false, pixel_count)?;

        if decoded < pixel_count {
            warn!("image data decoded to {decoded} indices, expected {pixel_count}");
        }
    }

    indices.resize(pixel_count, 0);
    Ok(indices.into_boxed_slice())
}
