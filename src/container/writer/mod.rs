//! Container writer.
//!
//! Encoding runs in two phases. The asset pre-pass collects atlases and
//! sounds, assigns dense ids and awaits every sink write. The main stream
//! is then written synchronously in fixed section order:
//! magic, version, frame rate, flags, string pool, atlas count, sound
//! count, symbol table.

mod symbol;
mod timeline;

use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::assets::AssetTable;
use super::format::*;
use super::sink::{AssetSink, FileSink};
use super::stream::OStream;
use super::strings::StringPool;
use crate::model::{Library, SymbolKind};
use crate::util::Result;

pub use timeline::{FrameChanges, FrameState};

/// Export options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Quality knob for atlas encoding, passed to the sink verbatim.
    pub compression: f64,
    /// Keep authoring vector paths in shape records.
    pub keep_paths: bool,
    /// Set the mipmaps hint flag in the header.
    pub mipmaps: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self { compression: 1.0, keep_paths: false, mipmaps: true }
    }
}

impl ExportConfig {
    pub fn with_compression(mut self, compression: f64) -> Self {
        self.compression = compression;
        self
    }

    pub fn with_keep_paths(mut self, keep_paths: bool) -> Self {
        self.keep_paths = keep_paths;
        self
    }

    pub fn with_mipmaps(mut self, mipmaps: bool) -> Self {
        self.mipmaps = mipmaps;
        self
    }

    /// Parse from JSON; missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Counters collected while writing symbols.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodeStats {
    pub shapes: usize,
    pub morph_shapes: usize,
    pub movie_clips: usize,
    pub sub_timelines: usize,
    pub timelines: usize,
    pub frames: usize,
}

/// Lookups shared by every symbol record of one pass.
pub(crate) struct EncodeContext<'p, 'a> {
    pub strings: &'p StringPool,
    pub assets: &'p AssetTable<'a>,
}

/// Visit every string any record will reference and freeze the pool.
pub fn collect_strings(library: &Library) -> StringPool {
    let mut pool = StringPool::new();
    for symbol in &library.symbols {
        pool.add(symbol.name.as_deref());
        match &symbol.kind {
            SymbolKind::MovieClip(clip) => {
                for state in &clip.states {
                    pool.add(Some(&state.name));
                    pool.add(state.sub_timeline.next_state.as_deref());
                    for timeline in &state.sub_timeline.timelines {
                        for frame in &timeline.frames {
                            pool.add(frame.name.as_deref());
                        }
                    }
                }
            }
            SymbolKind::TextField(text) => pool.add(Some(&text.initial_html)),
            SymbolKind::Empty
            | SymbolKind::Sound(_)
            | SymbolKind::Shape(_)
            | SymbolKind::MorphShape(_)
            | SymbolKind::Bitmap => {}
        }
    }
    pool.finalize();
    pool
}

/// Container writer over any byte sink.
pub struct OArchive<W: Write> {
    stream: OStream<W>,
    config: ExportConfig,
    stats: EncodeStats,
}

impl<W: Write> OArchive<W> {
    pub fn new(writer: W, config: ExportConfig) -> Self {
        Self { stream: OStream::new(writer), config, stats: EncodeStats::default() }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    pub fn stats(&self) -> &EncodeStats {
        &self.stats
    }

    /// Write the whole container for `library`.
    ///
    /// `assets` must come from [`AssetTable::collect`] on the same library;
    /// its sink writes are expected to be done already.
    #[tracing::instrument(skip_all, fields(symbols = library.symbols.len()))]
    pub fn write_library(&mut self, library: &Library, assets: &AssetTable<'_>) -> Result<()> {
        self.write_header(library)?;

        let strings = collect_strings(library);
        strings.write(&mut self.stream)?;
        tracing::debug!("string pool: {} entries", strings.len());

        self.stream.write_len_vl(assets.atlas_count())?;
        self.stream.write_len_vl(assets.sound_count())?;

        let ctx = EncodeContext { strings: &strings, assets };
        self.stream.write_len_vl(library.symbols.len())?;
        for symbol in &library.symbols {
            self.write_symbol(&ctx, symbol)?;
        }

        let s = &self.stats;
        tracing::debug!(
            "wrote {} bytes: {} shapes, {} morph shapes, {} movie clips, {} sub-timelines, {} timelines, {} frames",
            self.stream.pos(),
            s.shapes,
            s.morph_shapes,
            s.movie_clips,
            s.sub_timelines,
            s.timelines,
            s.frames
        );
        Ok(())
    }

    fn write_header(&mut self, library: &Library) -> Result<()> {
        self.stream.write_fixed(MAGIC, MAGIC_SIZE)?;
        self.stream.write_u_vl(CURRENT_VERSION)?;
        self.stream.write_u_vl(library.ms_per_frame)?;
        self.stream.write_u8(pack_flags(&[(self.config.mipmaps, FLAG_MIPMAPS)]))
    }

    /// Flush and return the underlying writer.
    pub fn finish(mut self) -> Result<W> {
        self.stream.flush()?;
        Ok(self.stream.into_inner())
    }
}

/// Encode `library`, sending atlases and sounds to `sink`.
///
/// Every sink write completes before the container bytes are produced.
/// Any sink failure aborts the encode.
pub async fn encode_library<S: AssetSink + ?Sized>(
    library: &Library,
    config: &ExportConfig,
    sink: &S,
) -> Result<Vec<u8>> {
    let assets = AssetTable::collect(library);
    assets.persist(sink, config.compression).await?;

    let mut archive = OArchive::new(Vec::new(), config.clone());
    archive.write_library(library, &assets)?;
    archive.finish()
}

/// Blocking wrapper around [`encode_library`].
pub fn encode_library_blocking<S: AssetSink + ?Sized>(
    library: &Library,
    config: &ExportConfig,
    sink: &S,
) -> Result<Vec<u8>> {
    futures::executor::block_on(encode_library(library, config, sink))
}

/// Write the container to `path` and its assets next to it.
///
/// See [`FileSink`] for the sibling naming.
pub async fn write_library_file(
    library: &Library,
    path: impl AsRef<Path>,
    config: &ExportConfig,
) -> Result<()> {
    let path = path.as_ref();
    let sink = FileSink::new(path);
    let bytes = encode_library(library, config, &sink).await?;
    std::fs::write(path, &bytes)?;
    tracing::info!("wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}
