//! External asset sinks.
//!
//! Atlas pixels and sound payloads never go into the container itself.
//! They are handed to an [`AssetSink`] under their dense index.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use futures::future::BoxFuture;
use futures::FutureExt;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ExtendedColorType, ImageEncoder, RgbaImage};
use parking_lot::Mutex;

use crate::util::Result;

/// Destination for externally stored assets.
///
/// Calls for different indices may be in flight at the same time.
pub trait AssetSink: Send + Sync {
    /// Persist atlas `index`. `compression` is the export quality knob,
    /// passed through untouched.
    fn write_atlas<'a>(
        &'a self,
        index: usize,
        atlas: &'a RgbaImage,
        compression: f64,
    ) -> BoxFuture<'a, Result<()>>;

    /// Persist sound `index`. Sounds without data get an empty slice.
    fn write_sound<'a>(&'a self, index: usize, data: &'a [u8]) -> BoxFuture<'a, Result<()>>;
}

/// Map the compression knob (`0.0..=1.0`) onto PNG deflate levels.
pub fn png_compression(compression: f64) -> CompressionType {
    if compression >= 0.75 {
        CompressionType::Best
    } else if compression >= 0.25 {
        CompressionType::Default
    } else {
        CompressionType::Fast
    }
}

/// Encode an atlas as PNG.
pub fn encode_png(atlas: &RgbaImage, compression: f64) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let encoder = PngEncoder::new_with_quality(&mut out, png_compression(compression), FilterType::Adaptive);
    encoder.write_image(atlas.as_raw(), atlas.width(), atlas.height(), ExtendedColorType::Rgba8)?;
    Ok(out)
}

/// Writes assets as siblings of the container file.
///
/// For `hero.ani` atlas 0 goes to `hero.ani.0.png` and sound 0 to
/// `hero.ani.0.mp3`.
#[derive(Debug, Clone)]
pub struct FileSink {
    base: PathBuf,
}

impl FileSink {
    pub fn new(container_path: impl AsRef<Path>) -> Self {
        Self { base: container_path.as_ref().to_path_buf() }
    }

    pub fn atlas_path(&self, index: usize) -> PathBuf {
        self.base.with_extension(format!("ani.{index}.png"))
    }

    pub fn sound_path(&self, index: usize) -> PathBuf {
        self.base.with_extension(format!("ani.{index}.mp3"))
    }
}

impl AssetSink for FileSink {
    fn write_atlas<'a>(
        &'a self,
        index: usize,
        atlas: &'a RgbaImage,
        compression: f64,
    ) -> BoxFuture<'a, Result<()>> {
        async move {
            let png = encode_png(atlas, compression)?;
            let path = self.atlas_path(index);
            tracing::trace!("atlas {} -> {} ({} bytes)", index, path.display(), png.len());
            std::fs::write(path, png)?;
            Ok(())
        }
        .boxed()
    }

    fn write_sound<'a>(&'a self, index: usize, data: &'a [u8]) -> BoxFuture<'a, Result<()>> {
        async move {
            let path = self.sound_path(index);
            tracing::trace!("sound {} -> {} ({} bytes)", index, path.display(), data.len());
            std::fs::write(path, data)?;
            Ok(())
        }
        .boxed()
    }
}

/// Keeps written assets in memory, keyed by index.
#[derive(Debug, Default)]
pub struct MemorySink {
    atlases: Mutex<BTreeMap<usize, RgbaImage>>,
    sounds: Mutex<BTreeMap<usize, Vec<u8>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atlases received so far.
    pub fn atlases(&self) -> BTreeMap<usize, RgbaImage> {
        self.atlases.lock().clone()
    }

    /// Sounds received so far.
    pub fn sounds(&self) -> BTreeMap<usize, Vec<u8>> {
        self.sounds.lock().clone()
    }
}

impl AssetSink for MemorySink {
    fn write_atlas<'a>(
        &'a self,
        index: usize,
        atlas: &'a RgbaImage,
        _compression: f64,
    ) -> BoxFuture<'a, Result<()>> {
        async move {
            self.atlases.lock().insert(index, atlas.clone());
            Ok(())
        }
        .boxed()
    }

    fn write_sound<'a>(&'a self, index: usize, data: &'a [u8]) -> BoxFuture<'a, Result<()>> {
        async move {
            self.sounds.lock().insert(index, data.to_vec());
            Ok(())
        }
        .boxed()
    }
}
