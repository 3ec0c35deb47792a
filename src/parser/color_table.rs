use std::fmt;

use crate::error::{ParserError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Rgb {
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{: >3}, {: >3}, {: >3}]", self.red, self.green, self.blue)
    }
}

/// Index to color lookup shared by the fixed and the heap backed tables.
pub trait Palette {
    fn colors(&self) -> &[Rgb];

    fn len(&self) -> usize {
        self.colors().len()
    }

    fn is_empty(&self) -> bool {
        self.colors().is_empty()
    }

    fn color(&self, index: u8) -> Option<Rgb> {
        self.colors().get(usize::from(index)).copied()
    }

    /// Index of the first entry equal to `color`.
    fn index_of(&self, color: Rgb) -> Option<u8> {
        self.colors()
            .iter()
            .position(|&entry| entry == color)
            .map(|index| index as u8)
    }
}

fn check_len(len: usize) -> Result<()> {
    if (2..=256).contains(&len) && len.is_power_of_two() {
        Ok(())
    } else {
        Err(ParserError::InvalidColorTableLength(len))
    }
}

/// Color table as stored in a GIF, `2^(size + 1)` RGB triples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorTable {
    colors: Box<[Rgb]>,
}

impl ColorTable {
    pub fn new(colors: Vec<Rgb>) -> Result<Self> {
        check_len(colors.len())?;
        Ok(Self {
            colors: colors.into_boxed_slice(),
        })
    }

    /// Builds a table from packed `r, g, b` bytes, trailing partial triples are ignored.
    pub fn from_rgb_bytes(bytes: &[u8]) -> Result<Self> {
        let colors = bytes
            .chunks_exact(3)
            .map(|rgb| Rgb::new(rgb[0], rgb[1], rgb[2]))
            .collect();
        Self::new(colors)
    }

    /// Number of entries described by a packed 3 bit size field.
    pub fn len_for_size_field(size: u8) -> usize {
        1 << ((size & 0b111) + 1)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rgb> {
        self.colors.iter()
    }
}

impl Palette for ColorTable {
    fn colors(&self) -> &[Rgb] {
        &self.colors
    }
}

/// Stack allocated table with its size fixed at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedColorTable<const N: usize> {
    colors: [Rgb; N],
}

impl<const N: usize> FixedColorTable<N> {
    pub fn new(colors: [Rgb; N]) -> Result<Self> {
        check_len(N)?;
        Ok(Self { colors })
    }
}

impl<const N: usize> Palette for FixedColorTable<N> {
    fn colors(&self) -> &[Rgb] {
        &self.colors
    }
}

impl<const N: usize> TryFrom<&ColorTable> for FixedColorTable<N> {
    type Error = ParserError;

    fn try_from(table: &ColorTable) -> std::result::Result<Self, Self::Error> {
        let colors: [Rgb; N] = table
            .colors()
            .try_into()
            .map_err(|_| ParserError::InvalidColorTableLength(table.len()))?;
        Self::new(colors)
    }
}
