//! Library symbols.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use image::RgbaImage;

use super::timeline::{NamedState, SubTimeline};
use crate::util::{ByAddress, IRect, Rect};

/// Shared atlas image. Identity is the `Arc` allocation.
pub type Atlas = Arc<RgbaImage>;

/// Region of an atlas used to draw a shape.
#[derive(Clone, Debug)]
pub struct TextureRef {
    pub atlas: Atlas,
    /// Pixel bounds inside the atlas.
    pub region: IRect,
    /// Bounds in scene units before scaling.
    pub bounds: Rect,
    /// Rasterization scale of the region.
    pub scale: f64,
}

impl TextureRef {
    pub fn new(atlas: Atlas, region: IRect, bounds: Rect, scale: f64) -> Self {
        Self { atlas, region, bounds, scale }
    }
}

/// Authoring vector path kept alongside a rasterized shape.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VectorPath {
    /// One byte per path command.
    pub commands: Vec<u8>,
    /// Coordinates consumed by the commands.
    pub data: Vec<f64>,
}

#[derive(Clone, Debug, Default)]
pub struct SoundSymbol {
    /// Encoded audio, if the source had any.
    pub data: Option<Vec<u8>>,
}

#[derive(Clone, Debug)]
pub struct TextFieldSymbol {
    pub initial_html: String,
    pub bounds: Rect,
}

#[derive(Clone, Debug)]
pub struct ShapeSymbol {
    pub texture: TextureRef,
    pub bounds: Rect,
    pub path: Option<VectorPath>,
}

#[derive(Clone, Debug, Default)]
pub struct MorphShapeSymbol {
    /// Texture per morph ratio, ratio in `0..=1000`.
    pub textures: BTreeMap<u32, TextureRef>,
}

/// Summary counters of a movie clip used by players to preallocate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MovieClipLimits {
    pub total_depths: u32,
    pub total_frames: u32,
    pub total_time: u32,
    pub total_uids: u32,
}

impl MovieClipLimits {
    /// Derive limits from the clip contents.
    ///
    /// Depths and time are maxima over distinct sub-timelines, frames are
    /// summed over distinct sub-timelines.
    pub fn compute(uid_info: &[UidInfo], states: &[NamedState]) -> Self {
        let mut seen: HashSet<ByAddress<'_, SubTimeline>> = HashSet::new();
        let mut limits = Self {
            total_uids: uid_info.len() as u32,
            ..Self::default()
        };
        for state in states {
            if !seen.insert(ByAddress(&state.sub_timeline)) {
                continue;
            }
            let st = &state.sub_timeline;
            limits.total_depths = limits.total_depths.max(st.timelines.len() as u32);
            limits.total_frames += st.frame_count() as u32;
            limits.total_time = limits.total_time.max(st.total_time);
        }
        limits
    }
}

/// Per-instance entry of a movie clip's uid table.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UidInfo {
    /// Symbol id of the placed child.
    pub character_id: u32,
    /// Free-form instance properties, stored as JSON.
    pub extra_props: serde_json::Map<String, serde_json::Value>,
}

impl UidInfo {
    pub fn new(character_id: u32) -> Self {
        Self { character_id, extra_props: serde_json::Map::new() }
    }
}

#[derive(Clone, Debug, Default)]
pub struct MovieClipSymbol {
    pub limits: MovieClipLimits,
    pub uid_info: Vec<UidInfo>,
    pub nine_patch: Option<Rect>,
    /// Named states in declaration order; names are unique.
    pub states: Vec<NamedState>,
}

impl MovieClipSymbol {
    /// Build a clip and compute its limits.
    pub fn new(uid_info: Vec<UidInfo>, states: Vec<NamedState>) -> Self {
        let limits = MovieClipLimits::compute(&uid_info, &states);
        Self { limits, uid_info, nine_patch: None, states }
    }
}

/// Closed set of symbol kinds.
#[derive(Clone, Debug)]
pub enum SymbolKind {
    Empty,
    Sound(SoundSymbol),
    TextField(TextFieldSymbol),
    Shape(ShapeSymbol),
    MorphShape(MorphShapeSymbol),
    Bitmap,
    MovieClip(MovieClipSymbol),
}

/// A reusable library asset.
#[derive(Clone, Debug)]
pub struct Symbol {
    pub id: u32,
    pub name: Option<String>,
    pub kind: SymbolKind,
}

impl Symbol {
    pub fn new(id: u32, name: Option<&str>, kind: SymbolKind) -> Self {
        Self { id, name: name.map(str::to_string), kind }
    }
}

/// An animation library: symbols plus playback rate.
#[derive(Clone, Debug, Default)]
pub struct Library {
    pub ms_per_frame: u32,
    pub symbols: Vec<Symbol>,
}

impl Library {
    pub fn new(ms_per_frame: u32) -> Self {
        Self { ms_per_frame, symbols: Vec::new() }
    }

    pub fn add_symbol(&mut self, symbol: Symbol) {
        self.symbols.push(symbol);
    }
}
