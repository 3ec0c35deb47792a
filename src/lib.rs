//! Decoder for GIF87a/89a containers and the variable width LZW codec used by
//! their image data.
//!
//! ```no_run
//! # fn main() -> jif::Result<()> {
//! # let bytes: Vec<u8> = Vec::new();
//! let gif = jif::parse(&bytes)?;
//! for image in gif.images() {
//!     let raster = gif.rgb_raster(image);
//!     println!("{}x{} -> {:?} pixels", image.width(), image.height(), raster.map(|r| r.len()));
//! }
//! # Ok(())
//! # }
//! ```

mod error;
pub mod parser;

pub use error::{ParserError, Result};
pub use parser::{
    lzw, parse, parse_with_options, Block, ColorTable, DecoderOptions, DisposalMethod, Gif, Image,
    LoopCount, Palette, Rgb, Version,
};
