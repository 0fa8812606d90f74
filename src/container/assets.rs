//! Asset pre-pass: dense ids for atlases and sounds.
//!
//! Symbol bodies embed these ids, so the table is fully built before any
//! symbol is written. Ids live for one encode pass only.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use futures::future::{try_join, try_join_all};
use image::RgbaImage;

use super::sink::AssetSink;
use crate::model::{Atlas, Library, SoundSymbol, SymbolKind};
use crate::util::{AssetKind, ByAddress, Error, Result};

/// Dense id maps for one library.
#[derive(Debug, Default)]
pub struct AssetTable<'a> {
    atlases: Vec<&'a Atlas>,
    atlas_ids: HashMap<ByAddress<'a, RgbaImage>, u32>,
    sounds: Vec<&'a SoundSymbol>,
    /// Sound symbol id -> dense sound id.
    sound_ids: HashMap<u32, u32>,
}

impl<'a> AssetTable<'a> {
    /// Collect atlases and sounds from `library`.
    ///
    /// Atlases come from all shapes, then all morph shapes, in declaration
    /// order, deduplicated by instance. Sounds are numbered in declaration
    /// order.
    pub fn collect(library: &'a Library) -> Self {
        let mut table = Self::default();

        for symbol in &library.symbols {
            if let SymbolKind::Shape(shape) = &symbol.kind {
                table.add_atlas(&shape.texture.atlas);
            }
        }
        for symbol in &library.symbols {
            if let SymbolKind::MorphShape(morph) = &symbol.kind {
                for texture in morph.textures.values() {
                    table.add_atlas(&texture.atlas);
                }
            }
        }
        for symbol in &library.symbols {
            if let SymbolKind::Sound(sound) = &symbol.kind {
                let id = table.sounds.len() as u32;
                table.sounds.push(sound);
                table.sound_ids.insert(symbol.id, id);
            }
        }

        tracing::debug!(
            "asset pre-pass: {} atlases, {} sounds",
            table.atlases.len(),
            table.sounds.len()
        );
        table
    }

    fn add_atlas(&mut self, atlas: &'a Atlas) {
        let next = self.atlases.len() as u32;
        if let Entry::Vacant(e) = self.atlas_ids.entry(ByAddress(atlas)) {
            e.insert(next);
            self.atlases.push(atlas);
        }
    }

    pub fn atlas_count(&self) -> usize {
        self.atlases.len()
    }

    pub fn sound_count(&self) -> usize {
        self.sounds.len()
    }

    /// Dense id of an atlas instance.
    pub fn atlas_id(&self, atlas: &Atlas) -> Result<u32> {
        self.atlas_ids
            .get(&ByAddress(atlas))
            .copied()
            .ok_or(Error::AtlasNotRegistered)
    }

    /// Dense id of the sound symbol with `symbol_id`.
    pub fn sound_id(&self, symbol_id: u32) -> Result<u32> {
        self.sound_ids
            .get(&symbol_id)
            .copied()
            .ok_or(Error::SoundNotRegistered(symbol_id))
    }

    /// Hand every atlas and sound to `sink` and wait for all of them.
    ///
    /// Writes run concurrently. The first failure aborts the rest.
    #[tracing::instrument(skip_all, fields(atlases = self.atlases.len(), sounds = self.sounds.len()))]
    pub async fn persist<S: AssetSink + ?Sized>(&self, sink: &S, compression: f64) -> Result<()> {
        let atlases = self.atlases.iter().enumerate().map(|(index, atlas)| async move {
            sink.write_atlas(index, atlas, compression)
                .await
                .map_err(|e| Error::asset_write(AssetKind::Atlas, index, e))
        });
        let sounds = self.sounds.iter().enumerate().map(|(index, sound)| async move {
            let data = sound.data.as_deref().unwrap_or(&[]);
            sink.write_sound(index, data)
                .await
                .map_err(|e| Error::asset_write(AssetKind::Sound, index, e))
        });
        try_join(try_join_all(atlases), try_join_all(sounds)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::sink::MemorySink;
    use crate::model::{MorphShapeSymbol, ShapeSymbol, Symbol, TextureRef};
    use crate::util::{IRect, Rect};
    use futures::executor::block_on;
    use futures::future::BoxFuture;
    use futures::FutureExt;
    use std::sync::Arc;

    fn shape(atlas: &Atlas) -> SymbolKind {
        SymbolKind::Shape(ShapeSymbol {
            texture: TextureRef::new(Arc::clone(atlas), IRect::new(0, 0, 2, 2), Rect::new(0.0, 0.0, 2.0, 2.0), 1.0),
            bounds: Rect::new(0.0, 0.0, 2.0, 2.0),
            path: None,
        })
    }

    #[test]
    fn test_same_instance_same_id_equal_pixels_distinct_ids() -> Result<()> {
        let a = Arc::new(RgbaImage::from_pixel(2, 2, image::Rgba([9, 9, 9, 255])));
        let b = Arc::new(RgbaImage::from_pixel(2, 2, image::Rgba([9, 9, 9, 255])));
        assert_eq!(*a, *b);

        let mut lib = Library::new(41);
        lib.add_symbol(Symbol::new(1, Some("s1"), shape(&a)));
        lib.add_symbol(Symbol::new(2, Some("s2"), shape(&a)));
        lib.add_symbol(Symbol::new(3, Some("s3"), shape(&b)));

        let table = AssetTable::collect(&lib);
        assert_eq!(table.atlas_count(), 2);
        assert_eq!(table.atlas_id(&a)?, 0);
        assert_eq!(table.atlas_id(&b)?, 1);
        Ok(())
    }

    #[test]
    fn test_morph_atlases_after_shapes() -> Result<()> {
        let morph_only = Arc::new(RgbaImage::new(1, 1));
        let shared = Arc::new(RgbaImage::new(1, 1));

        let mut morph = MorphShapeSymbol::default();
        morph.textures.insert(0, TextureRef::new(Arc::clone(&morph_only), IRect::default(), Rect::default(), 1.0));
        morph.textures.insert(1000, TextureRef::new(Arc::clone(&shared), IRect::default(), Rect::default(), 1.0));

        let mut lib = Library::new(41);
        lib.add_symbol(Symbol::new(1, None, SymbolKind::MorphShape(morph)));
        lib.add_symbol(Symbol::new(2, None, shape(&shared)));

        let table = AssetTable::collect(&lib);
        assert_eq!(table.atlas_id(&shared)?, 0);
        assert_eq!(table.atlas_id(&morph_only)?, 1);
        Ok(())
    }

    #[test]
    fn test_sound_ids_in_declaration_order() -> Result<()> {
        let mut lib = Library::new(41);
        lib.add_symbol(Symbol::new(10, None, SymbolKind::Sound(SoundSymbol { data: Some(vec![1, 2]) })));
        lib.add_symbol(Symbol::new(4, None, SymbolKind::Empty));
        lib.add_symbol(Symbol::new(7, None, SymbolKind::Sound(SoundSymbol { data: None })));

        let table = AssetTable::collect(&lib);
        assert_eq!(table.sound_id(10)?, 0);
        assert_eq!(table.sound_id(7)?, 1);
        assert!(matches!(table.sound_id(4), Err(Error::SoundNotRegistered(4))));

        let sink = MemorySink::new();
        block_on(table.persist(&sink, 1.0))?;
        let sounds = sink.sounds();
        assert_eq!(sounds[&0], vec![1, 2]);
        assert!(sounds[&1].is_empty());
        Ok(())
    }

    #[test]
    fn test_unknown_atlas() {
        let lib = Library::new(41);
        let table = AssetTable::collect(&lib);
        let stray = Arc::new(RgbaImage::new(1, 1));
        assert!(matches!(table.atlas_id(&stray), Err(Error::AtlasNotRegistered)));
    }

    struct FailingSink;

    impl AssetSink for FailingSink {
        fn write_atlas<'a>(&'a self, _: usize, _: &'a RgbaImage, _: f64) -> BoxFuture<'a, Result<()>> {
            async { Err(Error::other("disk full")) }.boxed()
        }

        fn write_sound<'a>(&'a self, _: usize, _: &'a [u8]) -> BoxFuture<'a, Result<()>> {
            async { Ok(()) }.boxed()
        }
    }

    #[test]
    fn test_sink_failure_propagates() {
        let atlas = Arc::new(RgbaImage::new(1, 1));
        let mut lib = Library::new(41);
        lib.add_symbol(Symbol::new(1, None, shape(&atlas)));

        let table = AssetTable::collect(&lib);
        let err = block_on(table.persist(&FailingSink, 1.0)).unwrap_err();
        assert!(matches!(err, Error::AssetWrite { kind: AssetKind::Atlas, index: 0, .. }));
    }
}
