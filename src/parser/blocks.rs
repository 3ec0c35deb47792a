use super::color_table::ColorTable;
use super::{DisposalMethod, LoopCount, Version};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogicalScreenDescriptor {
    pub screen_width: u16,
    pub screen_height: u16,

    pub global_color_table_flag: bool,
    /// Bits per primary color minus one, as stored.
    pub color_resolution: u8,
    pub sort_flag: bool,
    /// Raw 3 bit size field, the table holds `2^(size + 1)` entries.
    pub global_color_table_size: u8,

    pub background_color_index: u8,
    pub pixel_aspect_ratio: u8,
}

impl LogicalScreenDescriptor {
    pub fn global_color_table_len(&self) -> usize {
        ColorTable::len_for_size_field(self.global_color_table_size)
    }

    /// Bits per primary color of the source image, 1 to 8.
    pub fn color_depth(&self) -> u8 {
        self.color_resolution + 1
    }

    /// Width over height of a pixel, `None` when the file doesn't say.
    pub fn aspect_ratio(&self) -> Option<f32> {
        match self.pixel_aspect_ratio {
            0 => None,
            ratio => Some((f32::from(ratio) + 15.0) / 64.0),
        }
    }
}

/// The fixed 13 byte block at the start of every file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub version: Version,
    pub logical_screen: LogicalScreenDescriptor,
}

impl Header {
    pub const SIGNATURE: &'static [u8; 3] = b"GIF";
    pub const LEN: usize = 13;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDescriptor {
    pub left_position: u16,
    pub top_position: u16,

    pub width: u16,
    pub height: u16,

    pub local_color_table_flag: bool,
    pub interlace_flag: bool,
    pub sort_flag: bool,
    pub reserved: u8,
    /// Raw 3 bit size field of the local color table.
    pub local_color_table_size: u8,
}

impl ImageDescriptor {
    pub fn local_color_table_len(&self) -> usize {
        ColorTable::len_for_size_field(self.local_color_table_size)
    }

    pub fn pixel_count(&self) -> usize {
        usize::from(self.width) * usize::from(self.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphicControlExtension {
    pub packed_fields: u8,
    pub disposal_method: Option<DisposalMethod>,
    pub user_input_flag: bool,
    pub transparent_color_flag: bool,

    /// Hundredths of a second to wait before continuing.
    pub delay_time: u16,
    pub transparent_color_index: u8,
}

impl GraphicControlExtension {
    pub fn transparent_index(&self) -> Option<u8> {
        self.transparent_color_flag.then_some(self.transparent_color_index)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationExtension {
    pub identifier: String,
    pub authentication_code: [u8; 3],
    /// Concatenated data sub-blocks.
    pub data: Vec<u8>,
}

impl ApplicationExtension {
    /// Loop count carried by a NETSCAPE2.0 looping extension.
    pub fn loop_count(&self) -> Option<LoopCount> {
        if self.identifier != "NETSCAPE" || &self.authentication_code != b"2.0" {
            return None;
        }

        match self.data.as_slice() {
            [1, low, high] => Some(match u16::from_le_bytes([*low, *high]) {
                0 => LoopCount::Infinite,
                number => LoopCount::Number(number),
            }),
            _ => None,
        }
    }
}

/// Header fields of a plain text extension, the text itself is skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlainTextExtension {
    pub text_grid_left: u16,
    pub text_grid_top: u16,
    pub text_grid_width: u16,
    pub text_grid_height: u16,
    pub cell_width: u8,
    pub cell_height: u8,
    pub foreground_color_index: u8,
    pub background_color_index: u8,
}

/// A decoded table based image. Indices are kept in stream order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    descriptor: ImageDescriptor,
    local_color_table: Option<ColorTable>,
    indices: Box<[u8]>,
}

impl Image {
    pub(crate) fn new(
        descriptor: ImageDescriptor,
        local_color_table: Option<ColorTable>,
        indices: Box<[u8]>,
    ) -> Self {
        debug_assert_eq!(indices.len(), descriptor.pixel_count());
        Self {
            descriptor,
            local_color_table,
            indices,
        }
    }

    pub fn descriptor(&self) -> &ImageDescriptor {
        &self.descriptor
    }

    pub fn width(&self) -> u16 {
        self.descriptor.width
    }

    pub fn height(&self) -> u16 {
        self.descriptor.height
    }

    pub fn is_interlaced(&self) -> bool {
        self.descriptor.interlace_flag
    }

    pub fn local_color_table(&self) -> Option<&ColorTable> {
        self.local_color_table.as_ref()
    }

    /// Raw color indices in the order they were decoded.
    pub fn indices(&self) -> &[u8] {
        &self.indices
    }

    /// Color index of the pixel at column `x` of display row `y`.
    pub fn index_at(&self, x: u16, y: u16) -> Option<u8> {
        if x >= self.width() || y >= self.height() {
            return None;
        }
        let row = self.stored_row(usize::from(y));
        self.indices
            .get(row * usize::from(self.width()) + usize::from(x))
            .copied()
    }

    /// Rows from top to bottom, undoing interlacing.
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> + '_ {
        let width = usize::from(self.width());
        (0..usize::from(self.height())).map(move |y| {
            let start = self.stored_row(y) * width;
            &self.indices[start..start + width]
        })
    }

    // Interlaced images store every 8th row starting at 0, then every 8th
    // starting at 4, every 4th starting at 2 and finally the odd rows.
    fn stored_row(&self, y: usize) -> usize {
        if !self.is_interlaced() {
            return y;
        }

        let height = usize::from(self.height());
        let first_pass = (height + 7) / 8;
        let second_pass = (height + 3) / 8;
        let third_pass = (height + 1) / 4;

        match y % 8 {
            0 => y / 8,
            4 => first_pass + y / 8,
            2 | 6 => first_pass + second_pass + y / 4,
            _ => first_pass + second_pass + third_pass + y / 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Comment(String),
    GraphicControl(GraphicControlExtension),
    Application(ApplicationExtension),
    PlainText(PlainTextExtension),
    Image(Image),
}

/// An image together with the graphic control extension that precedes it.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub graphic_control: Option<&'a GraphicControlExtension>,
    pub image: &'a Image,
}

impl Frame<'_> {
    pub fn delay_time(&self) -> u16 {
        self.graphic_control.map_or(0, |control| control.delay_time)
    }

    pub fn transparent_index(&self) -> Option<u8> {
        self.graphic_control.and_then(GraphicControlExtension::transparent_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(width: u16, height: u16, interlace_flag: bool, indices: Vec<u8>) -> Image {
        let descriptor = ImageDescriptor {
            left_position: 0,
            top_position: 0,
            width,
            height,
            local_color_table_flag: false,
            interlace_flag,
            sort_flag: false,
            reserved: 0,
            local_color_table_size: 0,
        };
        Image::new(descriptor, None, indices.into_boxed_slice())
    }

    #[test]
    fn progressive_rows_are_stored_in_order() {
        let image = image(2, 3, false, vec![0, 1, 2, 3, 4, 5]);

        let rows: Vec<&[u8]> = image.rows().collect();
        let expected: [&[u8]; 3] = [&[0, 1], &[2, 3], &[4, 5]];
        assert_eq!(rows, expected);
        assert_eq!(image.index_at(1, 2), Some(5));
        assert_eq!(image.index_at(2, 0), None);
        assert_eq!(image.index_at(0, 3), None);
    }

    #[test]
    fn interlaced_rows_are_reordered() {
        // one column, each stored row holds its display row number
        let stored = vec![0, 8, 4, 2, 6, 1, 3, 5, 7, 9];
        let image = image(1, 10, true, stored);

        let rows: Vec<u8> = image.rows().map(|row| row[0]).collect();
        assert_eq!(rows, (0..10).collect::<Vec<u8>>());
        for y in 0..10 {
            assert_eq!(image.index_at(0, y), Some(y as u8));
        }
    }

    #[test]
    fn short_interlaced_images() {
        for height in 1..=9u16 {
            let mut display_rows: Vec<u16> = (0..height).step_by(8).collect();
            display_rows.extend((4..height).step_by(8));
            display_rows.extend((2..height).step_by(4));
            display_rows.extend((1..height).step_by(2));

            let stored = display_rows.iter().map(|&row| row as u8).collect();
            let image = image(1, height, true, stored);

            let rows: Vec<u8> = image.rows().map(|row| row[0]).collect();
            assert_eq!(rows, (0..height as u8).collect::<Vec<u8>>(), "height {height}");
        }
    }

    #[test]
    fn netscape_loop_count() {
        let mut extension = ApplicationExtension {
            identifier: "NETSCAPE".into(),
            authentication_code: *b"2.0",
            data: vec![1, 0, 0],
        };
        assert_eq!(extension.loop_count(), Some(LoopCount::Infinite));

        extension.data = vec![1, 5, 1];
        assert_eq!(extension.loop_count(), Some(LoopCount::Number(261)));

        extension.data = vec![1, 5];
        assert_eq!(extension.loop_count(), None);

        extension.identifier = "XMP Data".into();
        extension.data = vec![1, 5, 1];
        assert_eq!(extension.loop_count(), None);
    }

    #[test]
    fn aspect_ratio() {
        let mut screen = LogicalScreenDescriptor {
            screen_width: 1,
            screen_height: 1,
            global_color_table_flag: false,
            color_resolution: 7,
            sort_flag: false,
            global_color_table_size: 7,
            background_color_index: 0,
            pixel_aspect_ratio: 0,
        };
        assert_eq!(screen.aspect_ratio(), None);
        assert_eq!(screen.color_depth(), 8);
        assert_eq!(screen.global_color_table_len(), 256);

        screen.pixel_aspect_ratio = 49;
        assert_eq!(screen.aspect_ratio(), Some(1.0));
    }
}
