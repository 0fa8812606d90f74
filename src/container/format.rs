//! Container format constants and bit-flag helpers.

/// Magic bytes at the start of a container, zero-padded to [`MAGIC_SIZE`].
pub const MAGIC: &[u8] = b"ANLIB";

/// Size of the magic field in bytes.
pub const MAGIC_SIZE: usize = 8;

/// Current container format version.
pub const CURRENT_VERSION: u32 = 1;

/// Global flags: mipmaps enabled (decode hint).
pub const FLAG_MIPMAPS: u8 = 0;

// Symbol kind tags.
pub const SYMBOL_TYPE_EMPTY: u32 = 0;
pub const SYMBOL_TYPE_SOUND: u32 = 1;
pub const SYMBOL_TYPE_TEXT: u32 = 2;
pub const SYMBOL_TYPE_SHAPE: u32 = 3;
pub const SYMBOL_TYPE_BITMAP: u32 = 4;
pub const SYMBOL_TYPE_MOVIE_CLIP: u32 = 5;
pub const SYMBOL_TYPE_MORPH_SHAPE: u32 = 6;

/// Movie clip flags: nine-patch rectangle present.
pub const CLIP_FLAG_NINE_PATCH: u8 = 0;

/// Sub-timeline flags: next state plays automatically.
pub const SUB_TIMELINE_FLAG_NEXT_STATE_PLAY: u8 = 0;

/// Action tag: play sound.
pub const ACTION_PLAY_SOUND: u8 = 0;

// Per-frame change mask bits.
pub const FRAME_UID: u8 = 0;
pub const FRAME_NAME: u8 = 1;
pub const FRAME_COLOR_TRANSFORM: u8 = 2;
pub const FRAME_MATRIX: u8 = 3;
pub const FRAME_CLIP_DEPTH: u8 = 4;
pub const FRAME_RATIO: u8 = 5;
/// Only the alpha multiplier changed; one byte replaces the color sub-mask.
pub const FRAME_ALPHA: u8 = 6;

/// Scale for rectangle coordinates and matrix translation (1/20 unit).
pub const COORD_SCALE: f64 = 20.0;

/// Scale for matrix linear coefficients.
pub const MATRIX_SCALE: f64 = 16384.0;

/// Maximum bytes of a 32-bit VL integer.
pub const MAX_VARINT32_BYTES: usize = 5;

/// Maximum bytes of a 64-bit VL integer.
pub const MAX_VARINT64_BYTES: usize = 10;

/// Pack `(condition, bit)` pairs into a mask.
///
/// Every bitmask in the container goes through this helper so bit order
/// stays consistent between sites.
#[inline]
pub fn pack_flags(flags: &[(bool, u8)]) -> u8 {
    flags
        .iter()
        .fold(0u8, |mask, &(set, bit)| if set { mask | (1 << bit) } else { mask })
}

/// Check a bit of a mask.
#[inline]
pub const fn has_flag(mask: u8, bit: u8) -> bool {
    (mask >> bit) & 1 != 0
}

/// Pack a slice of conditions, element `i` at bit `i`.
#[inline]
pub fn pack_bits(bits: &[bool]) -> u8 {
    debug_assert!(bits.len() <= 8);
    let mut pairs = [(false, 0u8); 8];
    for (i, &set) in bits.iter().enumerate() {
        pairs[i] = (set, i as u8);
    }
    pack_flags(&pairs[..bits.len()])
}
