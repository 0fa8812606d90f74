//! Per-kind symbol records.

use std::io::Write;

use super::{EncodeContext, OArchive};
use crate::container::format::*;
use crate::container::quantize;
use crate::model::{MorphShapeSymbol, ShapeSymbol, Symbol, SymbolKind, TextureRef};
use crate::util::{IRect, Rect, Result};

impl<W: Write> OArchive<W> {
    /// Symbol header (id, name, kind tag) followed by the kind body.
    pub(super) fn write_symbol(&mut self, ctx: &EncodeContext<'_, '_>, symbol: &Symbol) -> Result<()> {
        self.stream.write_u_vl(symbol.id)?;
        self.stream.write_u_vl(ctx.strings.lookup(symbol.name.as_deref())?)?;

        match &symbol.kind {
            SymbolKind::Empty => {
                self.stream.write_u_vl(SYMBOL_TYPE_EMPTY)?;
            }
            SymbolKind::Sound(_) => {
                self.stream.write_u_vl(SYMBOL_TYPE_SOUND)?;
                self.stream.write_u_vl(ctx.assets.sound_id(symbol.id)?)?;
            }
            SymbolKind::TextField(text) => {
                self.stream.write_u_vl(SYMBOL_TYPE_TEXT)?;
                self.stream.write_u_vl(ctx.strings.lookup(Some(&text.initial_html))?)?;
                self.write_rect(&text.bounds)?;
            }
            SymbolKind::Shape(shape) => {
                self.stats.shapes += 1;
                self.stream.write_u_vl(SYMBOL_TYPE_SHAPE)?;
                self.write_shape(ctx, shape)?;
            }
            SymbolKind::MorphShape(morph) => {
                self.stats.morph_shapes += 1;
                self.stream.write_u_vl(SYMBOL_TYPE_MORPH_SHAPE)?;
                self.write_morph_shape(ctx, morph)?;
            }
            SymbolKind::Bitmap => {
                self.stream.write_u_vl(SYMBOL_TYPE_BITMAP)?;
            }
            SymbolKind::MovieClip(clip) => {
                self.stats.movie_clips += 1;
                self.stream.write_u_vl(SYMBOL_TYPE_MOVIE_CLIP)?;
                self.write_movie_clip(ctx, clip)?;
            }
        }
        Ok(())
    }

    fn write_shape(&mut self, ctx: &EncodeContext<'_, '_>, shape: &ShapeSymbol) -> Result<()> {
        let texture = &shape.texture;
        self.stream.write_f32(texture.scale as f32)?;
        self.stream.write_u_vl(ctx.assets.atlas_id(&texture.atlas)?)?;
        self.write_irect(&texture.region)?;
        self.write_rect(&shape.bounds)?;

        match (&shape.path, self.config.keep_paths) {
            (Some(path), true) => {
                self.stream.write_u_vl(1)?;
                self.stream.write_len_vl(path.commands.len())?;
                self.stream.write_bytes(&path.commands)?;
                self.stream.write_len_vl(path.data.len())?;
                for &v in &path.data {
                    self.stream.write_f32(v as f32)?;
                }
            }
            _ => self.stream.write_u_vl(0)?,
        }
        Ok(())
    }

    fn write_morph_shape(&mut self, ctx: &EncodeContext<'_, '_>, morph: &MorphShapeSymbol) -> Result<()> {
        self.stream.write_len_vl(morph.textures.len())?;
        for (&ratio1000, texture) in &morph.textures {
            self.stream.write_u_vl(ratio1000)?;
            self.write_morph_texture(ctx, texture)?;
        }
        Ok(())
    }

    fn write_morph_texture(&mut self, ctx: &EncodeContext<'_, '_>, texture: &TextureRef) -> Result<()> {
        self.stream.write_f32(texture.scale as f32)?;
        self.stream.write_u_vl(ctx.assets.atlas_id(&texture.atlas)?)?;
        self.write_rect(&texture.bounds)?;
        self.write_irect(&texture.region)
    }

    /// Rectangle in 1/20 units, signed VL.
    pub(super) fn write_rect(&mut self, r: &Rect) -> Result<()> {
        self.stream.write_s_vl(quantize::coord(r.x, "rect.x")?)?;
        self.stream.write_s_vl(quantize::coord(r.y, "rect.y")?)?;
        self.stream.write_s_vl(quantize::coord(r.width, "rect.width")?)?;
        self.stream.write_s_vl(quantize::coord(r.height, "rect.height")?)
    }

    /// Pixel rectangle, signed VL, unscaled.
    fn write_irect(&mut self, r: &IRect) -> Result<()> {
        self.stream.write_s_vl(r.x)?;
        self.stream.write_s_vl(r.y)?;
        self.stream.write_s_vl(r.width)?;
        self.stream.write_s_vl(r.height)
    }
}
