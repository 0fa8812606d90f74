//! Container reader.
//!
//! Decodes a container into plain data. Geometry and colors come back
//! dequantized, so they match the source only to the precision of the
//! encoding. Atlases and sounds are referenced by dense index.

use std::fs::File;
use std::path::Path;

use memmap2::Mmap;

use super::format::*;
use super::quantize;
use super::stream::IStream;
use crate::model::{
    Action, ActionList, Frame, MovieClipLimits, SubTimeline, Timeline, UidInfo, VectorPath, NO_UID,
};
use crate::util::{affine_components, affine_from_components, ColorTransform, Error, IRect, Rect, Result};

/// Texture reference as stored: atlas by dense index.
#[derive(Clone, Debug, PartialEq)]
pub struct ITexture {
    pub scale: f32,
    pub atlas_index: u32,
    pub region: IRect,
    pub bounds: Rect,
}

/// Shape record. Its atlas region is drawn at `bounds`.
#[derive(Clone, Debug, PartialEq)]
pub struct IShape {
    pub scale: f32,
    pub atlas_index: u32,
    pub region: IRect,
    pub bounds: Rect,
    pub path: Option<VectorPath>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct IMorphEntry {
    /// Morph ratio in `0..=1000`.
    pub ratio1000: u32,
    pub texture: ITexture,
}

/// Named state pointing into [`IMovieClip::sub_timelines`].
#[derive(Clone, Debug, PartialEq)]
pub struct IState {
    pub name: String,
    pub start_time: u32,
    pub sub_timeline: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct IMovieClip {
    pub limits: MovieClipLimits,
    pub uid_info: Vec<UidInfo>,
    pub nine_patch: Option<Rect>,
    /// Distinct sub-timelines; play-sound actions hold symbol ids.
    pub sub_timelines: Vec<SubTimeline>,
    pub states: Vec<IState>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ISymbolKind {
    Empty,
    Sound { sound_index: u32 },
    TextField { initial_html: String, bounds: Rect },
    Shape(IShape),
    MorphShape(Vec<IMorphEntry>),
    Bitmap,
    MovieClip(IMovieClip),
}

#[derive(Clone, Debug, PartialEq)]
pub struct ISymbol {
    pub id: u32,
    pub name: Option<String>,
    pub kind: ISymbolKind,
}

/// A decoded container.
#[derive(Clone, Debug, PartialEq)]
pub struct ILibrary {
    pub version: u32,
    pub ms_per_frame: u32,
    pub mipmaps: bool,
    /// Pool strings, index 1 first.
    pub strings: Vec<String>,
    pub atlas_count: usize,
    pub sound_count: usize,
    pub symbols: Vec<ISymbol>,
}

impl ILibrary {
    /// Memory-map and decode a container file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let size = file.metadata()?.len();
        if size < MAGIC_SIZE as u64 {
            return Err(Error::UnexpectedEof(size));
        }
        // Safety: the file is opened read-only and not modified while mapped.
        let mmap = unsafe { Mmap::map(&file) }.map_err(|e| Error::MmapFailed(e.to_string()))?;
        Self::from_bytes(&mmap)
    }

    /// Decode a container held in memory.
    #[tracing::instrument(skip_all, fields(len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        LibraryReader { stream: IStream::new(data), strings: Vec::new() }.read_library()
    }

    pub fn symbol(&self, id: u32) -> Option<&ISymbol> {
        self.symbols.iter().find(|s| s.id == id)
    }
}

struct LibraryReader<'a> {
    stream: IStream<'a>,
    strings: Vec<String>,
}

impl LibraryReader<'_> {
    fn read_library(mut self) -> Result<ILibrary> {
        let magic = self.stream.read_bytes(MAGIC_SIZE)?;
        if !magic.starts_with(MAGIC) || magic[MAGIC.len()..].iter().any(|&b| b != 0) {
            return Err(Error::InvalidMagic);
        }
        let version = self.stream.read_u_vl()?;
        if version != CURRENT_VERSION {
            return Err(Error::UnsupportedVersion(version));
        }
        let ms_per_frame = self.stream.read_u_vl()?;
        let flags = self.stream.read_u8()?;

        let count = self.stream.read_len_vl()?;
        let mut strings = Vec::with_capacity(count.min(4096));
        for _ in 0..count {
            strings.push(self.stream.read_string_vl()?);
        }
        self.strings = strings;

        let atlas_count = self.stream.read_len_vl()?;
        let sound_count = self.stream.read_len_vl()?;

        let symbol_count = self.stream.read_len_vl()?;
        let mut symbols = Vec::with_capacity(symbol_count.min(4096));
        for _ in 0..symbol_count {
            symbols.push(self.read_symbol()?);
        }
        resolve_sound_actions(&mut symbols)?;

        tracing::debug!("read {} symbols, {} strings", symbols.len(), self.strings.len());
        Ok(ILibrary {
            version,
            ms_per_frame,
            mipmaps: has_flag(flags, FLAG_MIPMAPS),
            strings: self.strings,
            atlas_count,
            sound_count,
            symbols,
        })
    }

    /// Pool string for `index`, `None` for the reserved index 0.
    fn string(&self, index: u32) -> Result<Option<String>> {
        if index == 0 {
            return Ok(None);
        }
        self.strings
            .get(index as usize - 1)
            .cloned()
            .map(Some)
            .ok_or_else(|| Error::invalid(format!("string index {} out of range", index)))
    }

    fn read_string_ref(&mut self) -> Result<Option<String>> {
        let index = self.stream.read_u_vl()?;
        self.string(index)
    }

    fn read_symbol(&mut self) -> Result<ISymbol> {
        let id = self.stream.read_u_vl()?;
        let name = self.read_string_ref()?;
        let tag = self.stream.read_u_vl()?;

        let kind = match tag {
            SYMBOL_TYPE_EMPTY => ISymbolKind::Empty,
            SYMBOL_TYPE_SOUND => ISymbolKind::Sound { sound_index: self.stream.read_u_vl()? },
            SYMBOL_TYPE_TEXT => ISymbolKind::TextField {
                initial_html: self.read_string_ref()?.unwrap_or_default(),
                bounds: self.read_rect()?,
            },
            SYMBOL_TYPE_SHAPE => ISymbolKind::Shape(self.read_shape()?),
            SYMBOL_TYPE_BITMAP => ISymbolKind::Bitmap,
            SYMBOL_TYPE_MOVIE_CLIP => ISymbolKind::MovieClip(self.read_movie_clip()?),
            SYMBOL_TYPE_MORPH_SHAPE => {
                let count = self.stream.read_len_vl()?;
                let mut entries = Vec::with_capacity(count.min(1024));
                for _ in 0..count {
                    let ratio1000 = self.stream.read_u_vl()?;
                    let scale = self.stream.read_f32()?;
                    let atlas_index = self.stream.read_u_vl()?;
                    let bounds = self.read_rect()?;
                    let region = self.read_irect()?;
                    entries.push(IMorphEntry {
                        ratio1000,
                        texture: ITexture { scale, atlas_index, region, bounds },
                    });
                }
                ISymbolKind::MorphShape(entries)
            }
            other => return Err(Error::UnknownSymbolKind(other)),
        };
        Ok(ISymbol { id, name, kind })
    }

    fn read_shape(&mut self) -> Result<IShape> {
        let scale = self.stream.read_f32()?;
        let atlas_index = self.stream.read_u_vl()?;
        let region = self.read_irect()?;
        let bounds = self.read_rect()?;

        let path = match self.stream.read_u_vl()? {
            0 => None,
            1 => {
                let count = self.stream.read_len_vl()?;
                let commands = self.stream.read_bytes(count)?.to_vec();
                let count = self.stream.read_len_vl()?;
                let mut data = Vec::with_capacity(count.min(1 << 16));
                for _ in 0..count {
                    data.push(self.stream.read_f32()? as f64);
                }
                Some(VectorPath { commands, data })
            }
            other => return Err(Error::invalid(format!("invalid shape path flag {}", other))),
        };

        Ok(IShape { scale, atlas_index, region, bounds, path })
    }

    fn read_rect(&mut self) -> Result<Rect> {
        Ok(Rect::new(
            quantize::dequantize_coord(self.stream.read_s_vl()?),
            quantize::dequantize_coord(self.stream.read_s_vl()?),
            quantize::dequantize_coord(self.stream.read_s_vl()?),
            quantize::dequantize_coord(self.stream.read_s_vl()?),
        ))
    }

    fn read_irect(&mut self) -> Result<IRect> {
        Ok(IRect::new(
            self.stream.read_s_vl()?,
            self.stream.read_s_vl()?,
            self.stream.read_s_vl()?,
            self.stream.read_s_vl()?,
        ))
    }

    fn read_movie_clip(&mut self) -> Result<IMovieClip> {
        let flags = self.stream.read_u8()?;
        let total_depths = self.stream.read_u_vl()?;
        let total_frames = self.stream.read_u_vl()?;
        let total_time = self.stream.read_u_vl()?;

        let uid_count = self.stream.read_len_vl()?;
        let mut uid_info = Vec::with_capacity(uid_count.min(4096));
        for _ in 0..uid_count {
            let character_id = self.stream.read_u_vl()?;
            let json = self.stream.read_string_vl()?;
            let extra_props = if json.is_empty() {
                serde_json::Map::new()
            } else {
                serde_json::from_str(&json)?
            };
            uid_info.push(UidInfo { character_id, extra_props });
        }

        let nine_patch = if has_flag(flags, CLIP_FLAG_NINE_PATCH) {
            Some(self.read_rect()?)
        } else {
            None
        };

        let count = self.stream.read_len_vl()?;
        let mut sub_timelines = Vec::with_capacity(count.min(1024));
        for _ in 0..count {
            sub_timelines.push(self.read_sub_timeline(total_depths)?);
        }

        let count = self.stream.read_len_vl()?;
        let mut states = Vec::with_capacity(count.min(1024));
        for _ in 0..count {
            let name = self.read_string_ref()?.unwrap_or_default();
            let start_time = self.stream.read_u_vl()?;
            let sub_timeline = self.stream.read_len_vl()?;
            if sub_timeline >= sub_timelines.len() {
                return Err(Error::invalid(format!(
                    "state {:?} references sub-timeline {} of {}",
                    name,
                    sub_timeline,
                    sub_timelines.len()
                )));
            }
            states.push(IState { name, start_time, sub_timeline });
        }

        Ok(IMovieClip {
            limits: MovieClipLimits {
                total_depths,
                total_frames,
                total_time,
                total_uids: uid_count as u32,
            },
            uid_info,
            nine_patch,
            sub_timelines,
            states,
        })
    }

    fn read_sub_timeline(&mut self, depths: u32) -> Result<SubTimeline> {
        let total_time = self.stream.read_u_vl()?;
        let flags = self.stream.read_u8()?;
        let next_state = self.read_string_ref()?;

        let mut st = SubTimeline {
            total_time,
            next_state,
            next_state_play: has_flag(flags, SUB_TIMELINE_FLAG_NEXT_STATE_PLAY),
            ..SubTimeline::default()
        };

        let count = self.stream.read_len_vl()?;
        for _ in 0..count {
            let time = self.stream.read_u_vl()?;
            let n = self.stream.read_len_vl()?;
            let mut actions = ActionList::new();
            for _ in 0..n {
                match self.stream.read_u8()? {
                    ACTION_PLAY_SOUND => {
                        actions.push(Action::PlaySound { sound_id: self.stream.read_u_vl()? })
                    }
                    tag => return Err(Error::invalid(format!("unknown action tag {}", tag))),
                }
            }
            st.actions.insert(time, actions);
        }

        for _ in 0..depths {
            st.timelines.push(self.read_timeline()?);
        }
        Ok(st)
    }

    fn read_timeline(&mut self) -> Result<Timeline> {
        let count = self.stream.read_len_vl()?;
        let mut frames = Vec::with_capacity(count.min(1 << 16));
        let mut last = Frame::new(0, NO_UID);
        for _ in 0..count {
            let frame = self.read_frame(&last)?;
            frames.push(frame.clone());
            last = frame;
        }
        Ok(Timeline { frames })
    }

    /// Apply one delta record on top of `last`.
    fn read_frame(&mut self, last: &Frame) -> Result<Frame> {
        let time = self.stream.read_u_vl()?;
        let mask = self.stream.read_u8()?;
        let mut frame = Frame { time, ..last.clone() };

        if has_flag(mask, FRAME_UID) {
            frame.uid = self.stream.read_u_vl()? as i32;
        }
        if has_flag(mask, FRAME_CLIP_DEPTH) {
            frame.clip_depth = self.stream.read_i16()? as i32;
        }
        if has_flag(mask, FRAME_NAME) {
            frame.name = self.read_string_ref()?;
        }

        if has_flag(mask, FRAME_ALPHA) {
            frame.color_transform.m_a = quantize::dequantize_color_multiplier(self.stream.read_u8()?);
        } else if has_flag(mask, FRAME_COLOR_TRANSFORM) {
            let sub = self.stream.read_u8()?;
            let mut m = frame.color_transform.multipliers();
            let mut a = frame.color_transform.offsets();
            for i in 0..8u8 {
                if !has_flag(sub, i) {
                    continue;
                }
                let i = i as usize;
                if i < 4 {
                    m[i] = quantize::dequantize_color_multiplier(self.stream.read_u8()?);
                } else {
                    a[i - 4] = quantize::dequantize_color_offset(self.stream.read_i8()?);
                }
            }
            frame.color_transform = ColorTransform::from_parts(m, a);
        }

        if has_flag(mask, FRAME_MATRIX) {
            let sub = self.stream.read_u8()?;
            let mut c = affine_components(&frame.transform);
            for i in 0..6u8 {
                if !has_flag(sub, i) {
                    continue;
                }
                let v = self.stream.read_s_vl()?;
                let i = i as usize;
                c[i] = if i < 4 {
                    quantize::dequantize_matrix_linear(v)
                } else {
                    quantize::dequantize_coord(v)
                };
            }
            frame.transform = affine_from_components(c);
        }

        if has_flag(mask, FRAME_RATIO) {
            frame.ratio = quantize::dequantize_ratio(self.stream.read_u8()?);
        }
        Ok(frame)
    }
}

/// Rewrite play-sound actions from dense sound indices to symbol ids.
fn resolve_sound_actions(symbols: &mut [ISymbol]) -> Result<()> {
    let mut by_index = std::collections::HashMap::new();
    for symbol in symbols.iter() {
        if let ISymbolKind::Sound { sound_index } = symbol.kind {
            by_index.insert(sound_index, symbol.id);
        }
    }
    for symbol in symbols.iter_mut() {
        let ISymbolKind::MovieClip(clip) = &mut symbol.kind else {
            continue;
        };
        for st in &mut clip.sub_timelines {
            for actions in st.actions.values_mut() {
                for action in actions.iter_mut() {
                    let Action::PlaySound { sound_id } = action;
                    *sound_id = *by_index
                        .get(sound_id)
                        .ok_or_else(|| Error::invalid(format!("play-sound references unknown sound {}", sound_id)))?;
                }
            }
        }
    }
    Ok(())
}
