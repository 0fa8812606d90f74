//! # anlib
//!
//! Compact binary container for vector-animation symbol libraries.
//!
//! A [`model::Library`] holds shapes, morph shapes, text fields, sounds and
//! movie clips. Encoding externalizes atlas images and sound data through
//! an [`container::AssetSink`] and writes everything else into one
//! self-describing byte stream: a string pool, fixed-point geometry and
//! delta-encoded keyframe timelines.
//!
//! ## Modules
//!
//! - [`util`] - Errors, rectangles, color transforms, identity keys
//! - [`model`] - In-memory library model
//! - [`container`] - Binary format: writer, reader, asset sinks
//!
//! ## Example
//!
//! ```ignore
//! use anlib::prelude::*;
//!
//! let mut library = Library::new(41);
//! library.add_symbol(Symbol::new(1, Some("empty"), SymbolKind::Empty));
//!
//! futures::executor::block_on(write_library_file(&library, "out.ani", &ExportConfig::default()))?;
//! let decoded = ILibrary::open("out.ani")?;
//! ```

pub mod container;
pub mod model;
pub mod util;

pub use util::{Error, Result};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::container::{
        encode_library, encode_library_blocking, write_library_file, AssetSink, ExportConfig,
        FileSink, ILibrary, ISymbol, ISymbolKind, MemorySink, OArchive,
    };
    pub use crate::model::*;
    pub use crate::util::{ColorTransform, DAffine2, DVec2, Error, IRect, Rect, Result};
}
