//! In-memory animation library model.
//!
//! The container codec only reads these types. Symbols are a closed
//! enum; atlases and sub-timelines are shared through `Arc` and are
//! deduplicated by identity when written.

mod symbol;
mod timeline;

pub use symbol::*;
pub use timeline::*;
