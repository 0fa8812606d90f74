//! Binary container for animation libraries.
//!
//! Integers are base-128 variable length (VL) unless noted. Signed VL
//! values are zig-zag encoded first. Fixed-width values are little-endian.
//!
//! ## File Structure
//!
//! ```text
//! +---------------------+
//! | Magic: "ANLIB"      |  8 bytes, zero padded
//! +---------------------+
//! | Version             |  VL
//! +---------------------+
//! | ms per frame        |  VL
//! +---------------------+
//! | Flags               |  1 byte (bit 0: mipmaps)
//! +---------------------+
//! | String pool         |  VL count + (VL len + UTF-8) per string
//! +---------------------+
//! | Atlas count         |  VL
//! +---------------------+
//! | Sound count         |  VL
//! +---------------------+
//! | Symbols             |  VL count + records
//! +---------------------+
//! ```
//!
//! Atlases and sounds are not embedded. They go to an [`AssetSink`] and
//! records refer to them by dense index.

mod assets;
mod format;
mod quantize;
mod reader;
mod sink;
mod stream;
mod strings;
mod varint;
pub mod writer;

pub use assets::*;
pub use format::*;
pub use reader::*;
pub use sink::*;
pub use stream::{IStream, OStream};
pub use strings::StringPool;
pub use varint::*;
pub use writer::*;
